//! Command-line access to the Binance Pay merchant API.
//!
//! # Usage
//!
//! ```bash
//! # Spot wallet balance, all currencies
//! cargo run -p bpay-cli -- balance
//!
//! # Funding wallet, one currency
//! cargo run -p bpay-cli -- balance --wallet FUNDING_WALLET --currency USDT
//!
//! # Create, query, close and re-query a throwaway order
//! cargo run -p bpay-cli -- test-order --amount 0.5 --currency BUSD
//!
//! # Configure logging level
//! RUST_LOG=debug cargo run -p bpay-cli -- balance
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `bpay.toml`)
//! - `BINANCE_KEY`, `BINANCE_SECRET`, `BINANCE_API_URL` - Credentials and base
//!   URL when the file does not set them
//! - `RUST_LOG` - Log level filter (default: `info`)
//!
//! A `.env` file in the working directory is loaded first.

use std::io;
use std::path::PathBuf;

use bpay::proto::{OrderCurrency, Wallet};
use bpay_cli::commands;
use bpay_cli::config::{CliConfig, DEFAULT_CONFIG_PATH};
use bpay_http::{PaymentClient, ReqwestTransport};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bpay", version, about)]
struct Cli {
    /// Configuration file.
    #[arg(long, global = true, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show wallet balances.
    Balance {
        /// Wallet to read.
        #[arg(long, value_enum, default_value_t = Wallet::SpotWallet)]
        wallet: Wallet,

        /// Restrict to one currency, e.g. USDT.
        #[arg(long)]
        currency: Option<String>,
    },

    /// Create, query and close a throwaway order.
    TestOrder {
        /// Order amount.
        #[arg(long, default_value = "1")]
        amount: Decimal,

        /// Order currency.
        #[arg(long, value_enum, default_value_t = OrderCurrency::Usdt)]
        currency: OrderCurrency,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("bpay failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::load_from(&cli.config)?;
    tracing::debug!(?config, path = %cli.config.display(), "Loaded configuration");

    let client = build_client(&config)?;
    tracing::info!(api_url = %client.create_order_url(), "Client ready");

    let steps = match cli.command {
        Command::Balance { wallet, currency } => {
            vec![commands::balance(&client, wallet, currency.as_deref()).await]
        }
        Command::TestOrder { amount, currency } => {
            let order = commands::test_order_request(amount, currency)?;
            commands::test_order(&client, &order).await
        }
    };

    commands::write_steps(io::stdout().lock(), &steps)?;
    Ok(())
}

fn build_client(config: &CliConfig) -> Result<PaymentClient, Box<dyn std::error::Error>> {
    let mut transport = ReqwestTransport::new();
    if let Some(timeout) = config.timeout() {
        transport = transport.with_timeout(timeout);
    }

    let mut client = PaymentClient::try_new(&config.client_config()?)?.with_transport(transport);
    if let Some(routes) = config.route_table() {
        client = client.with_resolver(routes);
    }
    Ok(client)
}
