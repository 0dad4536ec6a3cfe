//! # Seed Data Generator
//!
//! Provisions reference currencies and a sample price list for development.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by PRICING_DB_PATH (default ./pricing.db)
//! cargo run -p pricing-service --bin seed
//!
//! # Specify database path
//! PRICING_DB_PATH=./data/pricing.db cargo run -p pricing-service --bin seed
//! ```
//!
//! Currencies that already exist are left alone, so the tool can run
//! against a seeded database. Each run adds one more sample price list.

use anyhow::Context;
use chrono::{Duration, Utc};
use pricing_core::{
    CreateCurrency, CreateMoneyAmount, CreatePriceList, CreatePriceListInput, CurrencyFilter,
    FindConfig, PriceListStatus, PriceListType,
};
use pricing_db::{Database, PricingConfig};
use pricing_service::SqlitePricingService;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// (code, name, symbol, decimal digits)
const CURRENCIES: &[(&str, &str, &str, u32)] = &[
    ("usd", "US Dollar", "$", 2),
    ("eur", "Euro", "€", 2),
    ("gbp", "British Pound", "£", 2),
    ("jpy", "Japanese Yen", "¥", 0),
    ("kwd", "Kuwaiti Dinar", "KD", 3),
];

/// (currency, amount in minor units, min quantity, max quantity)
const SAMPLE_PRICES: &[(&str, i64, Option<i64>, Option<i64>)] = &[
    ("usd", 1999, None, Some(9)),
    ("usd", 1799, Some(10), None),
    ("eur", 1899, None, None),
    ("jpy", 2800, None, None),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = PricingConfig::load().context("invalid pricing configuration")?;
    info!(path = %config.database_path, "Seeding pricing database");

    let db = Database::new(config.db_config())
        .await
        .context("failed to open pricing database")?;
    let (total, applied) = db.migration_status().await?;
    info!(total, applied, "Migrations");

    let service = SqlitePricingService::from_database(db.clone());

    let existing = service
        .list_currencies(&CurrencyFilter::default(), &FindConfig::new(), None)
        .await?;
    let missing: Vec<CreateCurrency> = CURRENCIES
        .iter()
        .filter(|(code, ..)| !existing.iter().any(|c| c.code == *code))
        .map(|&(code, name, symbol, digits)| {
            CreateCurrency::new(code, name, symbol).decimal_digits(digits)
        })
        .collect();
    let created = service.create_currencies(missing, None).await?;
    info!(
        created = created.len(),
        skipped = CURRENCIES.len() - created.len(),
        "Currencies provisioned"
    );

    let now = Utc::now();
    let mut sale = CreatePriceList::new("Summer Sale");
    sale.description = "Seasonal discounts".to_string();
    sale.list_type = PriceListType::Sale;
    sale.status = PriceListStatus::Active;
    sale.starts_at = Some(now);
    sale.ends_at = Some(now + Duration::days(30));

    let input = SAMPLE_PRICES.iter().fold(
        CreatePriceListInput::new(sale),
        |input, &(code, amount, min, max)| {
            input.with_price(CreateMoneyAmount::new(code, amount).tier(min, max))
        },
    );

    let lists = service.create_price_lists(vec![input], None).await?;

    for list in &lists {
        info!(id = %list.id, name = %list.name, "Created price list");
        for price in list.prices.iter().flatten() {
            let code = price.currency_code.as_deref().unwrap_or("?");
            let digits = CURRENCIES
                .iter()
                .find(|(c, ..)| *c == code)
                .map_or(2, |&(.., digits)| digits);
            let formatted = price
                .amount
                .map(|amount| amount.format(digits))
                .unwrap_or_default();
            info!(
                id = %price.id,
                currency = code,
                amount = %formatted,
                min_quantity = ?price.min_quantity,
                max_quantity = ?price.max_quantity,
                "  price"
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(&lists)?);

    db.close().await;
    info!("Seed complete");
    Ok(())
}

/// Initializes the tracing subscriber for logging.
///
/// Uses `RUST_LOG` when set, otherwise `info,pricing=debug,sqlx=warn`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pricing=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
