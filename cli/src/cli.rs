//! # CLI Interface
//!
//! Defines the command-line argument structure for `symbol-wallet` using
//! `clap` derive. Node and network settings are global flags that also read
//! `SYMBOL_*` environment variables.

use clap::{Args, Parser, Subcommand};

use symbol_wallet::config::{FeeStrategy, NetworkType, DEFAULT_NODE_URL};

/// Symbol (XYM) wallet.
///
/// Creates accounts, queries balances, and sends transfers to a Symbol
/// node, following each transfer until it is confirmed.
#[derive(Parser, Debug)]
#[command(
    name = "symbol-wallet",
    about = "Symbol (XYM) wallet client",
    version,
    propagate_version = true
)]
pub struct WalletCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Settings shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// REST endpoint of the node.
    #[arg(long, global = true, env = "SYMBOL_NODE_URL", default_value = DEFAULT_NODE_URL)]
    pub node_url: String,

    /// Push-channel endpoint. Derived from the node URL when omitted.
    #[arg(long, global = true, env = "SYMBOL_WS_URL")]
    pub websocket_url: Option<String>,

    /// Network new accounts are created on: mainnet or testnet.
    #[arg(long, global = true, env = "SYMBOL_NETWORK", default_value = "testnet")]
    pub network: NetworkType,

    /// Which node fee multiplier to pay: average, median, highest, lowest, minimum.
    #[arg(long, global = true, env = "SYMBOL_FEE_STRATEGY", default_value = "average")]
    pub fee_strategy: FeeStrategy,

    /// Seconds to wait for a confirmation before giving up.
    #[arg(long, global = true, env = "SYMBOL_CONFIRM_TIMEOUT_SECS", default_value_t = 300)]
    pub confirm_timeout_secs: u64,

    /// Log format on stderr: pretty or json.
    #[arg(long, global = true, env = "SYMBOL_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, env = "SYMBOL_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Print results as JSON on stdout.
    #[arg(long, global = true)]
    pub json: bool,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Account management.
    #[command(subcommand)]
    Account(AccountCommand),
    /// Native currency balance of an address.
    Balance(BalanceArgs),
    /// Build, sign and announce a transfer, then wait for confirmation.
    Send(SendArgs),
    /// Wait for an already announced transaction.
    Wait(WaitArgs),
    /// Convert between display and atomic amounts.
    #[command(subcommand)]
    Amount(AmountCommand),
    /// Print version information and exit.
    Version,
}

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Generate a new keypair. The secret is printed once and never stored.
    New,
}

#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Address, with or without hyphens.
    pub address: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Recipient address.
    #[arg(long)]
    pub to: String,

    /// Amount in XYM, e.g. `1.5`.
    #[arg(long)]
    pub amount: String,

    /// Plain-text message attached to the transfer.
    #[arg(long, default_value = "")]
    pub message: String,

    /// Name of the environment variable holding the sender's secret.
    #[arg(long, default_value = "SYMBOL_SENDER_SECRET", conflicts_with = "secret_stdin")]
    pub secret_env: String,

    /// Read the sender's secret from the first line of stdin instead.
    #[arg(long)]
    pub secret_stdin: bool,

    /// Return right after the node accepts the transfer.
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Args, Debug)]
pub struct WaitArgs {
    /// Transaction hash (64 hex characters).
    #[arg(long)]
    pub hash: String,

    /// Address of the transaction's signer.
    #[arg(long)]
    pub signer: String,
}

#[derive(Subcommand, Debug)]
pub enum AmountCommand {
    /// `1.5` -> `1500000`
    ToAtomic { value: String },
    /// `1500000` -> `1.5`
    ToDisplay { value: u64 },
}
