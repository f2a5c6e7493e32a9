pub mod config;
pub mod metrics;
pub mod session;

use crate::{
    config::Config,
    metrics::{ExecutionOutcome, Metrics},
    session::BridgeSession,
};
use client::{types::OutgoingMessageState, ArbitrumBridge, BridgeClient};
use std::{path::Path, sync::Arc, time::Instant};
use storage::{JsonFileStore, Store};
use token::TokenList;
use tracing::{error, info, warn};

/// What one cycle did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub pending: usize,
    pub confirmed: usize,
    pub skipped: usize,
    pub redeemed: usize,
    pub reverted: usize,
    pub failed: usize,
}

/// Connect to both chains and open a session over the configured state
/// directory.
pub fn connect(config: &Config, private_key: &str) -> eyre::Result<BridgeSession<impl BridgeClient>> {
    let network = config.network_config();
    let wallet = client::parse_signer(private_key)?.address();

    let l1_provider = client::create_wallet_provider(&config.l1_rpc_url, private_key)?;
    let l2_provider = client::create_wallet_provider(&config.l2_rpc_url, private_key)?;

    let gateways = network.arbitrum.gateways.clone();
    let bridge = ArbitrumBridge::new(
        l1_provider,
        l2_provider,
        wallet,
        network,
        config.bridge_settings(),
    );

    let store: Arc<dyn Store> = Arc::new(JsonFileStore::open(&config.state_dir)?);
    let session = BridgeSession::open(
        Arc::new(bridge),
        store,
        gateways,
        config.event_filter(),
        config.scheduler(),
    )?;

    Ok(session)
}

/// Import the token lists named in the config and restore cached tokens.
pub async fn load_tokens<B: BridgeClient>(
    session: &BridgeSession<B>,
    lists: &[impl AsRef<Path>],
) -> eyre::Result<()> {
    for path in lists {
        let contents = std::fs::read_to_string(path)?;
        let list: TokenList = serde_json::from_str(&contents)?;
        session.import_token_list(&list);
    }

    let restored = session.load_cached_tokens().await?;
    info!(restored = restored.len(), "Loaded cached tokens");
    Ok(())
}

/// Rebuild the ledger and, unless `auto_redeem` is off, redeem every
/// confirmed withdrawal.
///
/// A failed redemption is logged and counted; the remaining withdrawals are
/// still attempted.
pub async fn run_cycle<B: BridgeClient>(
    session: &BridgeSession<B>,
    metrics: &Metrics,
    auto_redeem: bool,
    dry_run: bool,
) -> eyre::Result<CycleReport> {
    let summary = session.refresh().await?;
    metrics.record_rebuild(summary.skipped);

    let ledger = session.ledger();
    let confirmed = ledger.by_state(OutgoingMessageState::Confirmed);
    metrics.set_pending_withdrawals(OutgoingMessageState::Confirmed, confirmed.len());
    metrics.set_pending_withdrawals(
        OutgoingMessageState::Unconfirmed,
        ledger.by_state(OutgoingMessageState::Unconfirmed).len(),
    );

    let mut report = CycleReport {
        pending: summary.pending,
        confirmed: confirmed.len(),
        skipped: summary.skipped,
        ..Default::default()
    };

    if !auto_redeem {
        return Ok(report);
    }

    for record in confirmed {
        if dry_run {
            info!(
                id = %record.id,
                amount = %record.display_amount(),
                symbol = %record.symbol,
                "[DRY-RUN] Would redeem withdrawal"
            );
            continue;
        }

        match session.redeem(&record.id).await {
            Ok(receipt) if receipt.success => {
                metrics.record_execution(ExecutionOutcome::Success);
                report.redeemed += 1;
            }
            Ok(receipt) => {
                metrics.record_execution(ExecutionOutcome::Reverted);
                warn!(id = %record.id, tx_hash = %receipt.tx_hash, "Redemption reverted");
                report.reverted += 1;
            }
            Err(e) => {
                metrics.record_execution(ExecutionOutcome::Error);
                error!(id = %record.id, error = %e, "Redemption failed");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// [`run_cycle`] with timing and cycle metrics.
pub async fn timed_cycle<B: BridgeClient>(
    session: &BridgeSession<B>,
    metrics: &Metrics,
    config: &Config,
) -> eyre::Result<CycleReport> {
    let started = Instant::now();
    let result = run_cycle(session, metrics, config.relayer.auto_redeem, config.dry_run).await;
    let success = matches!(&result, Ok(report) if report.failed == 0);
    metrics.record_cycle(success, started.elapsed());
    result
}
