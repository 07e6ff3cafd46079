use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::pricing::models::{Quote, QuoteStatus};

/// Quote list row (the body is only loaded for single-quote reads)
#[derive(Debug, Clone, Serialize)]
pub struct QuoteListEntry {
    pub id: Uuid,
    pub customer_name: String,
    pub status: QuoteStatus,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteFilter {
    pub status: Option<QuoteStatus>,
    pub created_by: Option<String>,
}

/// SQLite-backed quote repository
#[derive(Clone)]
pub struct QuoteStore {
    db_pool: SqlitePool,
}

impl QuoteStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    /// Persist a new quote; the store assigns the id, timestamps and, when absent, the author
    pub async fn create(&self, mut quote: Quote, created_by: &str) -> Result<Quote, AppError> {
        let now = Utc::now();
        quote.id = Uuid::new_v4();
        quote.created_at = now;
        quote.updated_at = now;
        if quote.created_by.is_none() {
            quote.created_by = Some(created_by.to_string());
        }
        if quote.options.is_empty() {
            return Err(AppError::BadRequest(
                "A quote needs at least one option".to_string(),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO quotes (id, customer_name, status, body, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(quote.id.to_string())
        .bind(&quote.customer_name)
        .bind(quote.status.as_str())
        .bind(serde_json::to_string(&quote)?)
        .bind(&quote.created_by)
        .bind(now.timestamp_millis())
        .bind(now.timestamp_millis())
        .execute(&self.db_pool)
        .await?;

        info!(quote_id = %quote.id, customer = %quote.customer_name, "Quote created");
        Ok(quote)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Quote>, AppError> {
        let row = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT body FROM quotes WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.db_pool)
        .await?;

        match row {
            Some((body,)) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    /// Replace a stored quote. Identity and creation metadata are kept.
    pub async fn update(&self, id: Uuid, mut quote: Quote) -> Result<Quote, AppError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quote {}", id)))?;
        if quote.options.is_empty() {
            return Err(AppError::BadRequest(
                "A quote needs at least one option".to_string(),
            ));
        }

        quote.id = existing.id;
        quote.created_at = existing.created_at;
        quote.created_by = existing.created_by;
        quote.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE quotes
            SET customer_name = ?, status = ?, body = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&quote.customer_name)
        .bind(quote.status.as_str())
        .bind(serde_json::to_string(&quote)?)
        .bind(quote.updated_at.timestamp_millis())
        .bind(id.to_string())
        .execute(&self.db_pool)
        .await?;

        Ok(quote)
    }

    /// Returns false when the quote did not exist
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM quotes WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.db_pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Matching quotes, most recently updated first
    pub async fn list(&self, filter: &QuoteFilter) -> Result<Vec<QuoteListEntry>, AppError> {
        #[derive(sqlx::FromRow)]
        struct QuoteRow {
            id: String,
            customer_name: String,
            status: String,
            created_by: Option<String>,
            created_at: i64,
            updated_at: i64,
        }

        let rows = sqlx::query_as::<_, QuoteRow>(
            r#"
            SELECT id, customer_name, status, created_by, created_at, updated_at
            FROM quotes
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR created_by = ?2)
            ORDER BY updated_at DESC, id ASC
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.created_by.as_deref())
        .fetch_all(&self.db_pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(QuoteListEntry {
                    id: Uuid::parse_str(&row.id)
                        .map_err(|e| AppError::InternalError(format!("Invalid quote id: {}", e)))?,
                    customer_name: row.customer_name,
                    status: row.status.parse().map_err(AppError::InternalError)?,
                    created_by: row.created_by,
                    created_at: millis_to_datetime(row.created_at),
                    updated_at: millis_to_datetime(row.updated_at),
                })
            })
            .collect()
    }
}

fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}
