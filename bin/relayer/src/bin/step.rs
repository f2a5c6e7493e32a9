//! CLI tool to run individual relayer operations.
//!
//! Every command opens a session over the configured state directory, does
//! one thing and exits:
//! - `list-pending`: rebuild and print pending withdrawals as JSON
//! - `execute <id>` / `execute-all`: redeem withdrawals on L1
//! - `withdraw-eth`, `withdraw-token`: start a withdrawal on L2
//! - `deposit-eth`, `deposit-token`, `approve`: move funds into L2
//! - `add-token`, `import-token-list`, `clear-cache`: manage local caches
//!
//! Amounts are given in base units (wei for ETH).

use alloy_primitives::{Address, U256};
use clap::{Parser, Subcommand, ValueEnum};
use client::types::OutgoingMessageState;
use relayer::{config::Config, metrics::Metrics, run_cycle};
use std::path::PathBuf;
use token::TokenList;
use tracing::info;

#[derive(Parser)]
#[command(name = "step")]
#[command(about = "Run individual relayer operations")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Private key for signing transactions (hex string, with or without 0x prefix)
    #[arg(short = 'k', long, env = "PRIVATE_KEY")]
    private_key: String,

    /// Dry-run mode: log actions without executing transactions
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the pending ledger and print it
    ListPending {
        /// Only withdrawals in this state
        #[arg(long)]
        state: Option<StateArg>,
    },

    /// Redeem one confirmed withdrawal by id
    Execute { id: String },

    /// Redeem every confirmed withdrawal
    ExecuteAll,

    /// Withdraw ETH to L1
    WithdrawEth {
        #[arg(value_parser = parse_amount)]
        amount: U256,
    },

    /// Withdraw an ERC20 to L1
    WithdrawToken {
        /// L1 token address
        #[arg(value_parser = parse_address)]
        token: Address,
        #[arg(value_parser = parse_amount)]
        amount: U256,
    },

    /// Deposit ETH into L2
    DepositEth {
        #[arg(value_parser = parse_amount)]
        amount: U256,
    },

    /// Deposit an ERC20 into L2
    DepositToken {
        /// L1 token address
        #[arg(value_parser = parse_address)]
        token: Address,
        #[arg(value_parser = parse_amount)]
        amount: U256,
    },

    /// Approve the token's L1 gateway
    Approve {
        #[arg(value_parser = parse_address)]
        token: Address,
    },

    /// Register a token by its L1 address
    AddToken {
        #[arg(value_parser = parse_address)]
        token: Address,
    },

    /// Import a Uniswap-style token list
    ImportTokenList { path: PathBuf },

    /// Forget locally cached state
    ClearCache {
        #[arg(value_enum)]
        which: CacheArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StateArg {
    Unconfirmed,
    Confirmed,
}

impl From<StateArg> for OutgoingMessageState {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::Unconfirmed => Self::Unconfirmed,
            StateArg::Confirmed => Self::Confirmed,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CacheArg {
    /// Executed outbound messages
    Executed,
    /// Remembered token addresses
    Tokens,
    All,
}

fn parse_address(s: &str) -> Result<Address, String> {
    s.parse().map_err(|e| format!("invalid address: {e}"))
}

fn parse_amount(s: &str) -> Result<U256, String> {
    s.parse().map_err(|e| format!("invalid amount: {e}"))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_file(&cli.config)?;

    // Override dry_run from CLI flag
    if cli.dry_run {
        config.dry_run = true;
    }

    info!("Loaded config:");
    info!("  Network: {:?}", config.network);
    info!("  State dir: {}", config.state_dir.display());
    if config.dry_run {
        info!("  Mode: DRY-RUN (no transactions will be executed)");
    }

    let session = relayer::connect(&config, &cli.private_key)?;
    info!("  Wallet: {}", session.wallet());

    match cli.command {
        Command::ListPending { state } => {
            session.refresh().await?;
            let records = match state {
                Some(state) => session.ledger().by_state(state.into()),
                None => session.pending(),
            };
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Execute { id } => {
            session.refresh().await?;
            if config.dry_run {
                info!(id = %id, "[DRY-RUN] Would redeem withdrawal");
                return Ok(());
            }

            let receipt = session.redeem(&id).await?;
            info!(
                tx_hash = %receipt.tx_hash,
                success = receipt.success,
                "Step completed: execute"
            );
        }
        Command::ExecuteAll => {
            let report = run_cycle(&session, &Metrics::new(), true, config.dry_run).await?;
            info!(
                redeemed = report.redeemed,
                reverted = report.reverted,
                failed = report.failed,
                "Step completed: execute-all"
            );
        }
        Command::WithdrawEth { amount } => {
            withdraw(&session, action::Asset::Native, amount, config.dry_run).await?;
        }
        Command::WithdrawToken { token, amount } => {
            withdraw(&session, action::Asset::Token(token), amount, config.dry_run).await?;
        }
        Command::DepositEth { amount } => {
            deposit(&session, action::Asset::Native, amount, config.dry_run).await?;
        }
        Command::DepositToken { token, amount } => {
            deposit(&session, action::Asset::Token(token), amount, config.dry_run).await?;
        }
        Command::Approve { token } => {
            if config.dry_run {
                info!(token = %token, "[DRY-RUN] Would approve token");
                return Ok(());
            }
            match session.approve(token).await? {
                Some(receipt) => info!(tx_hash = %receipt.tx_hash, success = receipt.success, "Step completed: approve"),
                None => info!("Nothing to approve"),
            }
        }
        Command::AddToken { token } => {
            session.add_token(token).await?;
            let token = session.tokens().get(&token);
            println!("{}", serde_json::to_string_pretty(&token)?);
        }
        Command::ImportTokenList { path } => {
            let list: TokenList = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
            let imported = session.import_token_list(&list);
            info!(imported, "Step completed: import-token-list");
        }
        Command::ClearCache { which } => {
            if matches!(which, CacheArg::Executed | CacheArg::All) {
                session.clear_executed()?;
            }
            if matches!(which, CacheArg::Tokens | CacheArg::All) {
                session.expire_token_caches()?;
            }
            info!("Step completed: clear-cache");
        }
    }

    Ok(())
}

async fn withdraw<B: client::BridgeClient>(
    session: &relayer::session::BridgeSession<B>,
    asset: action::Asset,
    amount: U256,
    dry_run: bool,
) -> eyre::Result<()> {
    if dry_run {
        info!(asset = ?asset, amount = %amount, "[DRY-RUN] Would withdraw");
        return Ok(());
    }

    let (receipt, record) = session.withdraw(asset, amount).await?;
    info!(
        tx_hash = %receipt.tx_hash,
        success = receipt.success,
        id = record.as_ref().map(|r| r.id.as_str()),
        "Step completed: withdraw"
    );
    Ok(())
}

async fn deposit<B: client::BridgeClient>(
    session: &relayer::session::BridgeSession<B>,
    asset: action::Asset,
    amount: U256,
    dry_run: bool,
) -> eyre::Result<()> {
    if dry_run {
        info!(asset = ?asset, amount = %amount, "[DRY-RUN] Would deposit");
        return Ok(());
    }

    let (receipt, sequence_number) = session.deposit(asset, amount).await?;
    info!(
        tx_hash = %receipt.tx_hash,
        success = receipt.success,
        inbox_sequence_number = ?sequence_number,
        "Step completed: deposit"
    );
    Ok(())
}
