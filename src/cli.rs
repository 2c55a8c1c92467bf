use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::adapters::PostgresTransactionRepository;
use crate::config::Config;
use crate::use_cases::{PlaceOrder, PlaceOrderInput};

#[derive(Parser)]
#[command(name = "payme-merchant")]
#[command(about = "Payme merchant API webhook endpoint", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Order management commands
    #[command(subcommand)]
    Order(OrderCommands),

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

#[derive(Subcommand)]
pub enum OrderCommands {
    /// Register a payable order and print its checkout link
    Place {
        /// Paying user id
        #[arg(long)]
        user_id: i64,

        /// Amount in whole currency units
        #[arg(long)]
        amount: i64,

        /// Where the gateway sends the payer afterwards
        #[arg(long)]
        return_url: String,
    },
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config).await?;

    tracing::info!("Running database migrations...");
    crate::db::run_migrations(&pool).await?;

    println!("✓ Database migrations completed");
    Ok(())
}

pub async fn handle_order_place(
    config: &Config,
    user_id: i64,
    amount: i64,
    return_url: String,
) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config).await?;
    let repository = Arc::new(PostgresTransactionRepository::new(pool));
    let use_case = PlaceOrder::new(repository, config.payme.clone());

    let output = use_case
        .execute(PlaceOrderInput {
            user_id,
            amount,
            return_url,
        })
        .await?;

    println!("✓ Order placed");
    println!("  Order ID: {}", output.order_id);
    println!("  Amount (minor units): {}", output.amount);
    println!("  Checkout link: {}", output.checkout_url);
    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");
    crate::startup::validate_config(config)?;

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Database URL: {}", mask_password(&config.database_url));
    println!("  Payme Base URL: {}", config.payme.base_url);
    println!("  Payme Merchant ID: {}", config.payme.merchant_id);
    println!("  Payme Key: ****");

    println!("✓ Configuration is valid");
    Ok(())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user = &url[slash_pos + 2..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
