use arc_swap::ArcSwap;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::AppError;
use crate::pricing::models::{LeaseRateFactorsData, RateTableUpdate, TcoSettings};

const RATE_FACTORS_KEY: &str = "lease_rate_factors";
const TCO_SETTINGS_KEY: &str = "tco_settings";

/// Service for the singleton pricing records (rate factors, TCO settings)
pub struct PricingService {
    db_pool: SqlitePool,
    /// In-memory snapshots read on every quote evaluation
    rate_data: ArcSwap<LeaseRateFactorsData>,
    tco_settings: ArcSwap<TcoSettings>,
    /// Serializes read-modify-write of the rate record so no log entry is lost
    rate_write: Mutex<()>,
}

impl PricingService {
    /// Create a new pricing service
    pub fn new(db_pool: SqlitePool) -> Self {
        Self {
            db_pool,
            rate_data: ArcSwap::from_pointee(LeaseRateFactorsData::default()),
            tco_settings: ArcSwap::from_pointee(TcoSettings::default()),
            rate_write: Mutex::new(()),
        }
    }

    /// Load both records from the database into the cache.
    /// Absent records keep their defaults.
    pub async fn load_cache(&self) -> Result<(), AppError> {
        let rate_data: LeaseRateFactorsData =
            self.get_setting(RATE_FACTORS_KEY).await?.unwrap_or_default();
        let tco_settings: TcoSettings =
            self.get_setting(TCO_SETTINGS_KEY).await?.unwrap_or_default();

        info!(
            rate_keys = rate_data.rates.len(),
            updates = rate_data.update_log.len(),
            "Loaded pricing settings into cache"
        );

        self.rate_data.store(Arc::new(rate_data));
        self.tco_settings.store(Arc::new(tco_settings));
        Ok(())
    }

    /// Current rate factor snapshot
    pub fn rate_data(&self) -> Arc<LeaseRateFactorsData> {
        self.rate_data.load_full()
    }

    /// Current TCO settings snapshot
    pub fn tco_settings(&self) -> Arc<TcoSettings> {
        self.tco_settings.load_full()
    }

    /// Apply an admin edit to the rate table
    pub async fn update_rates(
        &self,
        update: RateTableUpdate,
        actor: &str,
    ) -> Result<Arc<LeaseRateFactorsData>, AppError> {
        let _guard = self.rate_write.lock().await;
        let mut data = (*self.rate_data()).clone();
        data.apply_update(update, actor, chrono::Utc::now());

        self.put_setting(RATE_FACTORS_KEY, &data).await?;
        let data = Arc::new(data);
        self.rate_data.store(data.clone());

        info!(
            actor,
            rate_keys = data.rates.len(),
            notify = data.notification_email.as_deref().unwrap_or("-"),
            "Lease rate factors updated"
        );
        Ok(data)
    }

    pub async fn update_tco_settings(&self, settings: TcoSettings) -> Result<(), AppError> {
        self.put_setting(TCO_SETTINGS_KEY, &settings).await?;
        self.tco_settings.store(Arc::new(settings));
        info!("TCO settings updated");
        Ok(())
    }

    async fn get_setting<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        let row = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT value FROM settings WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db_pool)
        .await?;

        match row {
            Some((value,)) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    async fn put_setting<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let json = serde_json::to_string(value)?;

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(json)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }
}
