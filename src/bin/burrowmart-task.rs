use burrowmart::config::StoreConfig;
use burrowmart::db::Database;
use burrowmart::error::StoreError;
use burrowmart::tasks;
use clap::{Parser, Subcommand};
use leptos::logging::{error, log};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "burrowmart-task")]
#[command(about = "Burrowmart one-shot maintenance tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending review migrations, or revert the newest ones.
    Migrate {
        #[arg(long)]
        revert: Option<usize>,
    },
    /// Load the demo catalog, locations and a customer order.
    Seed,
    ListProducts,
    CheckPrices,
    ListCategories,
    /// Delete every product together with its variants and prices.
    ClearProducts,
    /// Rename categories positionally, in listing order.
    RenameCategories {
        #[arg(required = true)]
        names: Vec<String>,
    },
    PublishProducts,
    /// Sign a bearer token for local testing.
    IssueToken {
        #[arg(long)]
        actor_id: String,
        #[arg(long, default_value_t = false)]
        admin: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("[TASK] Failed: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), StoreError> {
    let config = StoreConfig::from_env().map_err(|e| StoreError::Invalid(e.to_string()))?;

    if let Command::IssueToken { actor_id, admin } = &command {
        println!("{}", tasks::issue_local_token(&config, actor_id, *admin)?);
        return Ok(());
    }

    let db = Database::new(&config.database_path)?;
    db.create_schema().await?;

    match command {
        Command::Migrate { revert } => {
            for name in tasks::migrate(&db, revert).await? {
                println!("{}", name);
            }
        }
        Command::Seed => {
            tasks::migrate(&db, None).await?;
            let summary = tasks::seed_demo_data(&db).await?;
            println!(
                "Seeded {} collections, {} categories, {} products, {} locations",
                summary.collections, summary.categories, summary.products, summary.locations
            );
            println!("Demo customer {} with order {}", summary.customer_id, summary.order_id);
        }
        Command::ListProducts => {
            let products = tasks::list_products(&db).await?;
            for product in &products {
                println!(
                    "{}\t{}\t{}\t{} variants",
                    product.id, product.title, product.status, product.variant_count
                );
            }
            log!("[TASK] {} products", products.len());
        }
        Command::CheckPrices => {
            let report = tasks::check_prices(&db).await?;
            for variant in &report.priced {
                let prices: Vec<String> = variant
                    .prices
                    .iter()
                    .map(|p| format!("{} {}", p.amount, p.currency_code))
                    .collect();
                println!(
                    "{} / {}: {}",
                    variant.product_title,
                    variant.variant_title,
                    prices.join(", ")
                );
            }
            for variant in &report.missing {
                println!(
                    "MISSING PRICE {} / {} ({})",
                    variant.product_title, variant.variant_title, variant.variant_id
                );
            }
        }
        Command::ListCategories => {
            for category in tasks::list_categories(&db).await? {
                println!("{}\t{}\t{}\t{}", category.rank, category.id, category.name, category.handle);
            }
        }
        Command::ClearProducts => {
            println!("Deleted {} products", tasks::clear_products(&db).await?);
        }
        Command::RenameCategories { names } => {
            println!("Renamed {} categories", tasks::rename_categories(&db, &names).await?);
        }
        Command::PublishProducts => {
            println!("Published {} products", tasks::publish_products(&db).await?);
        }
        Command::IssueToken { .. } => {}
    }
    Ok(())
}
