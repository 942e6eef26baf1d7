// Copyright (c) 2026 The symbol-wallet Authors. MIT License.
// See LICENSE for details.

//! # Symbol Wallet CLI
//!
//! Entry point for the `symbol-wallet` binary. Parses CLI arguments,
//! initializes logging, and drives the wallet core against a live node.
//!
//! - `account new` : generate a keypair
//! - `balance`     : native currency balance of an address
//! - `send`        : build, sign, announce, and (by default) await confirmation
//! - `wait`        : await confirmation of an announced transaction
//! - `amount`      : display/atomic conversion
//! - `version`     : print build version information

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::json;
use std::io::BufRead;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use symbol_wallet::config::{ClientConfig, CURRENCY_TICKER};
use symbol_wallet::identity::Address;
use symbol_wallet::lifecycle::ConfirmationState;
use symbol_wallet::transaction::TransactionHash;
use symbol_wallet::{to_atomic, to_display, WalletClient, WalletError};

use cli::{AccountCommand, AmountCommand, Commands, GlobalArgs, WalletCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = WalletCli::parse();
    logging::init_logging(&cli.global.log_level, LogFormat::from_str_lossy(&cli.global.log_format));

    match cli.command {
        Commands::Account(AccountCommand::New) => create_account(&cli.global),
        Commands::Balance(args) => show_balance(&cli.global, &args.address).await,
        Commands::Send(args) => send(&cli.global, args).await,
        Commands::Wait(args) => wait(&cli.global, args).await,
        Commands::Amount(command) => convert_amount(&cli.global, command),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn client_config(global: &GlobalArgs) -> ClientConfig {
    ClientConfig {
        node_url: global.node_url.clone(),
        websocket_url: global.websocket_url.clone(),
        network: global.network,
        confirmation_timeout: Duration::from_secs(global.confirm_timeout_secs),
        fee_strategy: global.fee_strategy,
        ..ClientConfig::default()
    }
}

fn connect(global: &GlobalArgs) -> Result<WalletClient> {
    WalletClient::new(client_config(global)).context("invalid client configuration")
}

fn create_account(global: &GlobalArgs) -> Result<()> {
    let client = connect(global)?;
    let keypair = client.create_account();

    if global.json {
        println!(
            "{}",
            json!({
                "network": keypair.network(),
                "address": keypair.address(),
                "publicKey": keypair.public_key().to_hex(),
                "privateKey": keypair.private_key_hex(),
            })
        );
    } else {
        println!("Account created. Store the private key now; it is not saved anywhere.");
        println!("  Network     : {}", keypair.network());
        println!("  Address     : {}", keypair.address().pretty());
        println!("  Public key  : {}", keypair.public_key().to_hex());
        println!("  Private key : {}", keypair.private_key_hex());
    }
    Ok(())
}

async fn show_balance(global: &GlobalArgs, address: &str) -> Result<()> {
    let client = connect(global)?;
    let balance = client
        .get_balance(address)
        .await
        .with_context(|| format!("failed to fetch balance of {}", address))?;

    if global.json {
        println!(
            "{}",
            json!({ "address": address, "atomic": balance, "display": to_display(balance) })
        );
    } else {
        println!("{} {}", to_display(balance), CURRENCY_TICKER);
    }
    Ok(())
}

async fn send(global: &GlobalArgs, args: cli::SendArgs) -> Result<()> {
    let secret = read_secret(&args)?;
    let client = connect(global)?;

    let sent = client
        .send_transfer(&args.to, &args.amount, &args.message, &secret)
        .await
        .context("transfer failed")?;
    let hash = sent.signed.hash();

    if global.json {
        println!("{}", json!({ "announced": sent.receipt, "payloadSize": sent.signed.payload().len() }));
    } else {
        println!("Announced {}", hash);
        println!("  From   : {}", sent.keypair.address().pretty());
        println!("  To     : {}", args.to);
        println!("  Amount : {} {}", args.amount, CURRENCY_TICKER);
    }

    if args.no_wait {
        return Ok(());
    }
    let cancel = cancel_on_ctrl_c();
    let state = client
        .await_confirmation_with(
            sent.keypair.address(),
            hash,
            client.config().confirmation_timeout,
            &cancel,
        )
        .await;
    report_confirmation(global, hash, state)
}

async fn wait(global: &GlobalArgs, args: cli::WaitArgs) -> Result<()> {
    let hash: TransactionHash = args.hash.parse().context("invalid transaction hash")?;
    let signer = Address::parse(&args.signer).context("invalid signer address")?;
    let client = connect(global)?;

    let cancel = cancel_on_ctrl_c();
    let state = client
        .await_confirmation_with(&signer, hash, client.config().confirmation_timeout, &cancel)
        .await;
    report_confirmation(global, hash, state)
}

fn report_confirmation(global: &GlobalArgs, hash: TransactionHash, state: ConfirmationState) -> Result<()> {
    match state {
        ConfirmationState::Confirmed(confirmed) => {
            if global.json {
                println!("{}", json!({ "hash": hash, "confirmed": true, "height": confirmed.height }));
            } else {
                println!("Confirmed {} at height {}", hash, confirmed.height);
            }
            Ok(())
        }
        ConfirmationState::Failed(err) => Err(WalletError::from(err)).context("confirmation failed"),
        ConfirmationState::Pending => bail!("confirmation wait ended without an outcome"),
    }
}

fn convert_amount(global: &GlobalArgs, command: AmountCommand) -> Result<()> {
    let (atomic, display) = match command {
        AmountCommand::ToAtomic { value } => {
            let atomic = to_atomic(&value).with_context(|| format!("cannot convert '{}'", value))?;
            (atomic, value)
        }
        AmountCommand::ToDisplay { value } => (value, to_display(value)),
    };
    if global.json {
        println!("{}", json!({ "atomic": atomic, "display": display }));
    } else {
        println!("{} = {} atomic units", display, atomic);
    }
    Ok(())
}

/// The sender's secret, from stdin or the named environment variable.
/// Never taken from argv.
fn read_secret(args: &cli::SendArgs) -> Result<String> {
    if args.secret_stdin {
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed to read secret from stdin")?;
        return Ok(line.trim().to_string());
    }
    std::env::var(&args.secret_env)
        .with_context(|| format!("environment variable {} is not set", args.secret_env))
}

/// Token cancelled on Ctrl+C, so an interrupted wait still closes its
/// subscription.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, cancelling wait");
            child.cancel();
        }
    });
    token
}

fn print_version() {
    println!("symbol-wallet {}", env!("CARGO_PKG_VERSION"));
    println!("rustc         {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
