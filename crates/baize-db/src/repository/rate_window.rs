//! # Rate Window Repository
//!
//! The pricing-rule catalog. The admin layer creates and edits windows;
//! the tariff resolver only ever reads them via [`list_active`], which
//! returns them already in evaluation order (priority descending, id
//! ascending).
//!
//! Concurrent admin edits are not coordinated with in-flight cost
//! calculations; the catalog is eventually-consistent data owned by the
//! CRUD layer.
//!
//! [`list_active`]: RateWindowRepository::list_active

use std::sync::Arc;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::clock::Clock;
use crate::error::{DbError, DbResult};
use baize_core::validation::validate_rate;
use baize_core::{DaySet, RateWindow};

/// Payload for creating a pricing rule, as the admin layer submits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRateWindow {
    pub table_type_id: String,
    pub price_per_hour: f64,
    pub days: DaySet,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub priority: i64,
    pub active: bool,
}

impl NewRateWindow {
    /// An all-day, any-day rule at the given rate; the common starting
    /// point which the admin then narrows with days/bounds/priority.
    pub fn all_day(table_type_id: impl Into<String>, price_per_hour: f64) -> Self {
        NewRateWindow {
            table_type_id: table_type_id.into(),
            price_per_hour,
            days: DaySet::ALL,
            start_time: None,
            end_time: None,
            priority: 0,
            active: true,
        }
    }
}

/// Repository for rate-window catalog operations.
#[derive(Debug, Clone)]
pub struct RateWindowRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl RateWindowRepository {
    /// Creates a new RateWindowRepository.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        RateWindowRepository { pool, clock }
    }

    /// Lists active windows for a table type in evaluation order:
    /// priority descending, id ascending (first-created wins a tie).
    ///
    /// This ordering is part of the resolver's collaborator contract.
    pub async fn list_active(&self, table_type_id: &str) -> DbResult<Vec<RateWindow>> {
        let windows = sqlx::query_as::<_, RateWindow>(
            r#"
            SELECT
                id, table_type_id, price_per_hour, days,
                start_time, end_time, priority, active,
                created_at, updated_at
            FROM rate_windows
            WHERE table_type_id = ?1 AND active = 1
            ORDER BY priority DESC, id ASC
            "#,
        )
        .bind(table_type_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(
            table_type_id = %table_type_id,
            count = windows.len(),
            "Loaded active rate windows"
        );
        Ok(windows)
    }

    /// Gets a rate window by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<RateWindow>> {
        let window = sqlx::query_as::<_, RateWindow>(
            r#"
            SELECT
                id, table_type_id, price_per_hour, days,
                start_time, end_time, priority, active,
                created_at, updated_at
            FROM rate_windows
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(window)
    }

    /// Inserts a new pricing rule and returns it with its assigned id.
    pub async fn insert(&self, new: NewRateWindow) -> DbResult<RateWindow> {
        validate_rate(new.price_per_hour)?;

        let now = self.clock.now();

        debug!(
            table_type_id = %new.table_type_id,
            price_per_hour = %new.price_per_hour,
            "Inserting rate window"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO rate_windows (
                table_type_id, price_per_hour, days,
                start_time, end_time, priority, active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&new.table_type_id)
        .bind(new.price_per_hour)
        .bind(new.days)
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(new.priority)
        .bind(new.active)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("RateWindow", id.to_string()))
    }

    /// Activates or deactivates a pricing rule.
    pub async fn set_active(&self, id: i64, active: bool) -> DbResult<()> {
        let now = self.clock.now();

        let result = sqlx::query(
            r#"
            UPDATE rate_windows
            SET active = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RateWindow", id.to_string()));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
