//! Network configuration for the token bridge.
//!
//! Provides chain-specific contract addresses for the base chain (L1) and the
//! rollup (L2) on each supported network.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

/// Network type (mainnet or testnet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Testnet,
}

/// Base chain (L1) configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthereumConfig {
    /// Chain ID
    pub chain_id: u64,
    /// Rollup Inbox contract (ETH deposits)
    pub inbox: Address,
    /// Rollup Outbox contract (message execution)
    pub outbox: Address,
    /// L1 token gateway router (token deposits)
    pub gateway_router: Address,
}

impl EthereumConfig {
    /// Ethereum mainnet configuration.
    pub const fn mainnet() -> Self {
        Self {
            chain_id: 1,
            inbox: address!("4Dbd4fc535Ac27206064B68FfCf827b0A60BAB3f"),
            outbox: address!("760723CD2e632826c38Fef8CD438A4CC7E7E1A40"),
            gateway_router: address!("72Ce9c846789fdB6fC1f34aC4AD25Dd9ef7031ef"),
        }
    }

    /// Rinkeby testnet configuration.
    pub const fn rinkeby() -> Self {
        Self {
            chain_id: 4,
            inbox: address!("578BAde599406A8fE3d24Fd7f7211c0911F5B29e"),
            outbox: address!("2360A33905dc1c72b12d975d975F42BaBdcef9F3"),
            gateway_router: address!("70C143928eCfFaf9F5b406f7f4fC28Dc43d68380"),
        }
    }
}

/// Rollup (L2) configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbitrumConfig {
    /// Chain ID
    pub chain_id: u64,
    /// L2 token gateway router (token withdrawals)
    pub gateway_router: Address,
    /// L2 token gateways scanned for `WithdrawalInitiated` events
    pub gateways: Vec<Address>,
}

impl ArbitrumConfig {
    /// Arbitrum One configuration.
    pub fn mainnet() -> Self {
        Self {
            chain_id: 42161,
            gateway_router: address!("5288c571Fd7aD117beA99bF60FE0846C4E84F933"),
            gateways: vec![
                // standard ERC20 gateway
                address!("09e9222E96E7B4AE2a407B98d48e330053351EEe"),
                // custom gateway
                address!("096760F208390250649E3e8763348E783AEF5562"),
                // WETH gateway
                address!("6c411aD3E74De3E7Bd422b94A27770f5B86C623B"),
            ],
        }
    }

    /// Arbitrum Rinkeby configuration.
    pub fn rinkeby() -> Self {
        Self {
            chain_id: 421611,
            gateway_router: address!("9413AD42910c1eA60c737dB5f58d1C504498a3cD"),
            gateways: vec![
                address!("195C107F3F75c4C93Eba7d9a1312F19305d6375f"),
                address!("9b014455AcC2Fe90c52803849d0002aeEC184a06"),
                address!("f94bc045c4E926CC0b34e8D1c41Cd7a043304ac9"),
            ],
        }
    }
}

/// Complete network configuration for bridge operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network type (mainnet or testnet)
    pub network_type: NetworkType,
    /// Base chain configuration
    pub ethereum: EthereumConfig,
    /// Rollup configuration
    pub arbitrum: ArbitrumConfig,
}

impl NetworkConfig {
    /// Create mainnet configuration.
    pub fn mainnet() -> Self {
        Self {
            network_type: NetworkType::Mainnet,
            ethereum: EthereumConfig::mainnet(),
            arbitrum: ArbitrumConfig::mainnet(),
        }
    }

    /// Create testnet (Rinkeby) configuration.
    pub fn testnet() -> Self {
        Self {
            network_type: NetworkType::Testnet,
            ethereum: EthereumConfig::rinkeby(),
            arbitrum: ArbitrumConfig::rinkeby(),
        }
    }

    /// Create configuration from network type.
    pub fn from_network_type(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::Mainnet => Self::mainnet(),
            NetworkType::Testnet => Self::testnet(),
        }
    }
}

/// Builder for custom network configurations.
#[derive(Debug, Clone)]
pub struct NetworkConfigBuilder {
    config: NetworkConfig,
}

impl NetworkConfigBuilder {
    /// Start with mainnet defaults.
    pub fn mainnet() -> Self {
        Self {
            config: NetworkConfig::mainnet(),
        }
    }

    /// Start with testnet defaults.
    pub fn testnet() -> Self {
        Self {
            config: NetworkConfig::testnet(),
        }
    }

    /// Start from the defaults of `network_type`.
    pub fn from_network_type(network_type: NetworkType) -> Self {
        Self {
            config: NetworkConfig::from_network_type(network_type),
        }
    }

    /// Override the L1 Inbox address.
    pub const fn inbox(mut self, address: Address) -> Self {
        self.config.ethereum.inbox = address;
        self
    }

    /// Override the L1 Outbox address.
    pub const fn outbox(mut self, address: Address) -> Self {
        self.config.ethereum.outbox = address;
        self
    }

    /// Override the L1 gateway router address.
    pub const fn l1_gateway_router(mut self, address: Address) -> Self {
        self.config.ethereum.gateway_router = address;
        self
    }

    /// Override the L2 gateway router address.
    pub const fn l2_gateway_router(mut self, address: Address) -> Self {
        self.config.arbitrum.gateway_router = address;
        self
    }

    /// Replace the list of scanned L2 gateways.
    pub fn gateways(mut self, gateways: Vec<Address>) -> Self {
        self.config.arbitrum.gateways = gateways;
        self
    }

    /// Build the network configuration.
    pub fn build(self) -> NetworkConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_config() {
        let config = NetworkConfig::mainnet();
        assert_eq!(config.ethereum.chain_id, 1);
        assert_eq!(config.arbitrum.chain_id, 42161);
        assert_eq!(config.network_type, NetworkType::Mainnet);
        assert_eq!(config.arbitrum.gateways.len(), 3);
    }

    #[test]
    fn test_testnet_config() {
        let config = NetworkConfig::testnet();
        assert_eq!(config.ethereum.chain_id, 4);
        assert_eq!(config.arbitrum.chain_id, 421611);
        assert_eq!(config.network_type, NetworkType::Testnet);
    }

    #[test]
    fn test_custom_config_builder() {
        let custom_outbox = address!("1111111111111111111111111111111111111111");
        let gateway = address!("2222222222222222222222222222222222222222");

        let config = NetworkConfigBuilder::mainnet()
            .outbox(custom_outbox)
            .gateways(vec![gateway])
            .build();

        assert_eq!(config.ethereum.outbox, custom_outbox);
        assert_eq!(config.arbitrum.gateways, vec![gateway]);
        assert_eq!(config.ethereum.inbox, EthereumConfig::mainnet().inbox);
    }

    #[test]
    fn test_network_type_lowercase_serde() {
        #[derive(Deserialize)]
        struct Wrapper {
            network: NetworkType,
        }

        let parsed: Wrapper = toml::from_str("network = \"testnet\"").unwrap();
        assert_eq!(parsed.network, NetworkType::Testnet);
    }
}
