use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use perk_ledger::db::init_db;
use perk_ledger::services::{AccountService, InventoryService, RedemptionService};
use perk_ledger::{LedgerConfig, LedgerError};

#[derive(Parser)]
#[command(name = "perk-admin")]
#[command(about = "Operator tools for the perk ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a reward payload to the stock queue
    AddStock {
        /// Opaque reward text handed out on redemption
        payload: String,
    },
    /// List unclaimed stock items in claim order
    StockList,
    /// Show how many unclaimed items remain
    StockCount,
    /// Show a user's balance and referral count
    Balance {
        user_id: i64,
    },
    /// Credit (or with a negative amount, debit) a user's balance
    Credit {
        user_id: i64,
        amount: i64,
    },
    /// Run a redemption for a user at the configured cost
    Redeem {
        user_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let pool = init_db().await?;
    let config = LedgerConfig::from_env();

    let accounts = AccountService::new(pool.clone(), config.clone());
    let inventory = InventoryService::new(pool.clone());
    let redemptions = RedemptionService::new(accounts.clone(), inventory.clone());

    match cli.command {
        Commands::AddStock { payload } => {
            let id = inventory.add_item(&payload).await?;
            println!("Stock item {} added.", id);
        }
        Commands::StockList => {
            let items = inventory.list_unclaimed().await?;
            if items.is_empty() {
                println!("Stock is empty.");
            } else {
                for item in items {
                    println!("{}\t{}", item.id, item.payload);
                }
            }
        }
        Commands::StockCount => {
            println!("{} unclaimed item(s).", inventory.count().await?);
        }
        Commands::Balance { user_id } => {
            let balance = accounts.get_balance(user_id).await?;
            let referrals = accounts.referral_count(user_id).await?;
            println!("User {}: balance {}, referrals {}", user_id, balance, referrals);
        }
        Commands::Credit { user_id, amount } => {
            let new_balance = accounts.adjust_balance(user_id, amount).await?;
            println!("User {}: balance now {}", user_id, new_balance);
        }
        Commands::Redeem { user_id } => match redemptions.redeem(user_id, config.redeem_cost).await {
            Ok(redemption) => {
                println!(
                    "User {} redeemed item {} (balance now {}): {}",
                    user_id, redemption.item.id, redemption.new_balance, redemption.item.payload
                );
            }
            Err(err @ (LedgerError::InsufficientFunds { .. } | LedgerError::OutOfStock)) => {
                println!("Redemption refused: {}", err);
            }
            Err(err) => return Err(err.into()),
        },
    }

    Ok(())
}
