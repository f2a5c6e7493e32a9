use alloy_primitives::{Address, U256};
use client::{types::EventFilter, BridgeSettings};
use config::{NetworkConfig, NetworkConfigBuilder, NetworkType};
use serde::{Deserialize, Serialize};
use std::{
    num::NonZeroU32,
    path::{Path, PathBuf},
    time::Duration,
};
use withdrawal::RequestScheduler;

/// Top-level relayer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// L1 RPC endpoint url
    pub l1_rpc_url: String,

    /// L2 RPC endpoint url
    pub l2_rpc_url: String,

    /// Network preset the contract addresses start from
    #[serde(default = "default_network")]
    pub network: NetworkType,

    /// Directory of the persisted caches
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Log actions without submitting transactions
    #[serde(default)]
    pub dry_run: bool,

    /// Uniswap-style token lists imported at startup
    #[serde(default)]
    pub token_lists: Vec<PathBuf>,

    #[serde(default)]
    pub contracts: ContractOverrides,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub deposit: DepositConfig,

    #[serde(default)]
    pub relayer: LoopConfig,
}

/// Addresses replacing the network preset's.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractOverrides {
    pub inbox: Option<Address>,
    pub outbox: Option<Address>,
    pub l1_gateway_router: Option<Address>,
    pub l2_gateway_router: Option<Address>,
    pub gateways: Option<Vec<Address>>,
}

/// Block range scanned for withdrawals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    /// Split log queries into ranges of this many blocks
    pub log_chunk_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub requests_per_second: u32,
    pub max_in_flight: usize,
    pub request_timeout_secs: u64,
    pub confirmation_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            max_in_flight: 8,
            request_timeout_secs: 30,
            confirmation_timeout_secs: 900,
        }
    }
}

/// Retryable ticket parameters for token deposits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepositConfig {
    pub max_gas: u64,
    pub gas_price_bid_wei: u64,
    pub token_calldata_size: u64,
}

impl Default for DepositConfig {
    fn default() -> Self {
        Self {
            max_gas: 300_000,
            gas_price_bid_wei: 1_000_000_000,
            token_calldata_size: 1_024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Seconds between cycles
    pub interval_secs: u64,
    /// Redeem confirmed withdrawals automatically
    pub auto_redeem: bool,
    /// Prometheus exporter port; no exporter when unset
    pub metrics_port: Option<u16>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            auto_redeem: true,
            metrics_port: None,
        }
    }
}

const fn default_network() -> NetworkType {
    NetworkType::Mainnet
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".relayer")
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        Ok(config)
    }

    /// Network preset with the configured overrides applied.
    pub fn network_config(&self) -> NetworkConfig {
        let overrides = &self.contracts;
        let mut builder = NetworkConfigBuilder::from_network_type(self.network);

        if let Some(inbox) = overrides.inbox {
            builder = builder.inbox(inbox);
        }
        if let Some(outbox) = overrides.outbox {
            builder = builder.outbox(outbox);
        }
        if let Some(router) = overrides.l1_gateway_router {
            builder = builder.l1_gateway_router(router);
        }
        if let Some(router) = overrides.l2_gateway_router {
            builder = builder.l2_gateway_router(router);
        }
        if let Some(gateways) = &overrides.gateways {
            builder = builder.gateways(gateways.clone());
        }

        builder.build()
    }

    pub fn bridge_settings(&self) -> BridgeSettings {
        BridgeSettings {
            request_timeout: Duration::from_secs(self.limits.request_timeout_secs),
            confirmation_timeout: Duration::from_secs(self.limits.confirmation_timeout_secs),
            deposit_max_gas: U256::from(self.deposit.max_gas),
            deposit_gas_price_bid: U256::from(self.deposit.gas_price_bid_wei),
            token_calldata_size: U256::from(self.deposit.token_calldata_size),
            log_chunk_size: self.scan.log_chunk_size,
        }
    }

    pub const fn event_filter(&self) -> EventFilter {
        EventFilter::new(self.scan.from_block, self.scan.to_block)
    }

    pub fn scheduler(&self) -> RequestScheduler {
        let rate = NonZeroU32::new(self.limits.requests_per_second).unwrap_or(NonZeroU32::MIN);
        RequestScheduler::new(rate, self.limits.max_in_flight)
    }

    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.relayer.interval_secs)
    }
}
