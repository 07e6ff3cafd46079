pub mod health;
pub mod pricing;
pub mod quotes;
pub mod settings;

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::{pricing::PricingService, quotes::QuoteStore};

/// Shared state of the API handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub pricing: Arc<PricingService>,
    pub quotes: QuoteStore,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, pricing: Arc<PricingService>) -> Self {
        Self {
            quotes: QuoteStore::new(db_pool.clone()),
            db_pool,
            pricing,
        }
    }
}
