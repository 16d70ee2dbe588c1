//! Seed the product table with fake products.
//!
//! Usage: `cargo run --bin catalog-populate`
//!
//! Reads the same `CATALOG_DB_*` variables as the server. The number of
//! products comes from `CATALOG_POPULATE_COUNT`.

use std::time::Duration;

use catalog_api::config::env_parse;
use catalog_api::constants::{DEFAULT_POPULATE_COUNT, POPULATE_CHUNK_SIZE, POPULATE_TIMEOUT_SECS};
use catalog_api::{ApiError, ApiResult, DbClient, DbConfig, PgProductStore};
use catalog_core::{new_product_id, Product};
use catalog_storage::ProductStore;
use rand::seq::IndexedRandom;
use rand::Rng;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Bruno", "Chiara", "Dmitri", "Elena", "Farid", "Greta", "Hugo", "Ines", "Jonas",
    "Kira", "Luca", "Maya", "Nils", "Olga", "Pavel", "Rosa", "Sven", "Tara", "Viktor",
];

const LAST_NAMES: &[&str] = &[
    "Andersen", "Baker", "Costa", "Dubois", "Eriksen", "Fischer", "Garcia", "Horvat", "Ivanova",
    "Jensen", "Kowalski", "Larsen", "Moreau", "Novak", "Olsen", "Petrov", "Rossi", "Silva",
];

const DESCRIPTORS: &[&str] = &[
    "Lead", "Senior", "Direct", "Corporate", "Dynamic", "Future", "Product", "National",
    "Regional", "District", "Central", "Global", "Customer", "Investor",
];

const LEVELS: &[&str] = &[
    "Solutions", "Program", "Brand", "Security", "Research", "Marketing", "Directives",
    "Implementation", "Integration", "Functionality", "Response", "Paradigm", "Tactics",
];

fn pick(rng: &mut impl Rng, words: &[&'static str]) -> &'static str {
    words.choose(rng).copied().unwrap_or_default()
}

fn fake_product(rng: &mut impl Rng) -> Product {
    Product::new(
        new_product_id(),
        format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES)),
        format!("{} {}", pick(rng, DESCRIPTORS), pick(rng, LEVELS)),
        rng.random_range(1..=i32::MAX),
    )
}

#[tokio::main]
async fn main() -> ApiResult<()> {
    dotenv::dotenv().ok();

    let count: usize = env_parse("CATALOG_POPULATE_COUNT", DEFAULT_POPULATE_COUNT)?;

    let db = DbClient::from_config(&DbConfig::from_env()?)?;
    let store = PgProductStore::new(db);
    store.ensure_schema().await?;

    let products: Vec<Product> = {
        let mut rng = rand::rng();
        (0..count).map(|_| fake_product(&mut rng)).collect()
    };

    let insert_all = async {
        for chunk in products.chunks(POPULATE_CHUNK_SIZE) {
            store.product_insert_many(chunk).await?;
        }
        Ok::<(), ApiError>(())
    };
    tokio::time::timeout(Duration::from_secs(POPULATE_TIMEOUT_SECS), insert_all)
        .await
        .map_err(|_| ApiError::timeout("populate"))??;

    println!("Created {} products", products.len());
    Ok(())
}
