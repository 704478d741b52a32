//! # Inventory Repository - Stock Valuation Engine
//!
//! Weighted-average-cost (MAC) stock keeping with an append-only movement
//! ledger.
//!
//! ## The Read-Modify-Write-Append Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              One increase_stock / decrease_stock call                   │
//! │                                                                         │
//! │  validate(quantity > 0)            ← raised before any mutation        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  acquire per-item lock ──────────┐ ← serialization point, scoped to    │
//! │       │                          │   one item_id; unrelated items      │
//! │       ▼                          │   proceed concurrently              │
//! │  BEGIN                           │                                      │
//! │    read level (create at 0/0.0   │                                      │
//! │        if absent)                │                                      │
//! │    [decrease] insufficient? ─────┼──► ValidationError, tx dropped,     │
//! │    compute new qty/avg (core)    │    nothing written                  │
//! │    UPDATE stock_levels           │                                      │
//! │    INSERT stock_movements        │ ← ledger write failing rolls the    │
//! │  COMMIT                          │   level update back too             │
//! │       │                          │                                      │
//! │  release lock ◄──────────────────┘                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lock guarantees that for a given item the committed ledger order is
//! the true serialization order: summing `quantity_delta` up to any row
//! reproduces that row's `quantity_snapshot`.
//!
//! Negative quantities are a tolerated state (reconciliation paths outside
//! the guarded decrease can produce them); the engine must keep working on
//! top of one, and `decrease_stock` is the only path guarded against
//! driving stock negative.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::DbResult;
use baize_core::validation::validate_stock_quantity;
use baize_core::{MovementKind, MovementRef, StockLevel, StockMovement, ValidationError};

// =============================================================================
// Per-Item Lock Registry
// =============================================================================

/// One async mutex per item id, created on first touch and shared by every
/// repository cloned from the same [`crate::Database`].
///
/// The standard-library mutex only guards the registry map itself and is
/// held for a map lookup; the returned tokio mutex is what serializes the
/// whole read-modify-write-append sequence and may be held across awaits.
#[derive(Debug, Default)]
pub struct ItemLocks {
    locks: StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ItemLocks {
    fn for_item(&self, item_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().expect("item lock registry poisoned");
        locks
            .entry(item_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

// =============================================================================
// Inventory Repository
// =============================================================================

/// Repository for stock levels and the movement ledger.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    locks: Arc<ItemLocks>,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>, locks: Arc<ItemLocks>) -> Self {
        InventoryRepository { pool, clock, locks }
    }

    /// Receives `quantity` units at `unit_import_price` each and re-blends
    /// the weighted average cost.
    ///
    /// ## Contract
    /// - `quantity <= 0` → `ValidationError`, raised before any mutation.
    /// - Level row is created at `0 / 0.0` if absent.
    /// - When the resulting quantity is not positive the previous average
    ///   is kept unchanged (see [`baize_core::costing`]).
    /// - Ledger row: `delta = +quantity`, `unit_cost = unit_import_price`
    ///   (the batch price, not the new average), `snapshot = new quantity`.
    /// - Stamps `last_restock_at`.
    /// - All-or-nothing: level update and ledger append commit together.
    #[allow(clippy::too_many_arguments)]
    pub async fn increase_stock(
        &self,
        tenant_id: &str,
        item_id: &str,
        quantity: i64,
        unit_import_price: f64,
        reference: Option<&MovementRef>,
        kind: MovementKind,
        actor_id: Option<&str>,
        note: Option<&str>,
    ) -> DbResult<StockLevel> {
        validate_stock_quantity(quantity)?;

        let lock = self.locks.for_item(item_id);
        let _guard = lock.lock().await;

        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let mut level = get_or_create_level(&mut tx, tenant_id, item_id, now).await?;
        level.apply_increase(quantity, unit_import_price, now);

        sqlx::query(
            r#"
            UPDATE stock_levels
            SET quantity = ?2, average_cost = ?3, last_restock_at = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&level.id)
        .bind(level.quantity)
        .bind(level.average_cost)
        .bind(level.last_restock_at)
        .bind(level.updated_at)
        .execute(&mut *tx)
        .await?;

        append_movement(
            &mut tx,
            item_id,
            actor_id,
            kind,
            quantity,
            &level,
            unit_import_price,
            reference,
            note,
        )
        .await?;

        tx.commit().await?;

        debug!(
            item_id = %item_id,
            quantity = %quantity,
            new_quantity = %level.quantity,
            average_cost = %level.average_cost,
            "Stock increased"
        );

        Ok(level)
    }

    /// Consumes `quantity` units at the current average cost.
    ///
    /// ## Contract
    /// - `quantity <= 0` → `ValidationError`, raised before any mutation.
    /// - A missing level row is created at `0 / 0.0` first, purely so the
    ///   insufficient-stock error reports against a defined baseline; the
    ///   transaction is dropped on failure so nothing persists.
    /// - `current quantity < quantity` → `ValidationError::InsufficientStock`
    ///   with level and ledger untouched. This path never oversells: two
    ///   concurrent decreases serialize on the item lock and the second
    ///   sees the post-decrement quantity.
    /// - `average_cost` is never modified here.
    /// - Ledger row: `delta = -quantity`, `unit_cost` = average cost at
    ///   time of sale (the COGS basis), `snapshot = new quantity`.
    #[allow(clippy::too_many_arguments)]
    pub async fn decrease_stock(
        &self,
        tenant_id: &str,
        item_id: &str,
        quantity: i64,
        reference: Option<&MovementRef>,
        kind: MovementKind,
        actor_id: Option<&str>,
        note: Option<&str>,
    ) -> DbResult<StockLevel> {
        validate_stock_quantity(quantity)?;

        let lock = self.locks.for_item(item_id);
        let _guard = lock.lock().await;

        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let mut level = get_or_create_level(&mut tx, tenant_id, item_id, now).await?;

        if !level.can_fulfill(quantity) {
            // Dropping the transaction rolls back the lazily-created
            // baseline row along with everything else.
            return Err(ValidationError::InsufficientStock {
                item_id: item_id.to_string(),
                available: level.quantity,
                requested: quantity,
            }
            .into());
        }

        let cost_basis = level.average_cost;
        level.apply_decrease(quantity, now);

        sqlx::query(
            r#"
            UPDATE stock_levels
            SET quantity = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&level.id)
        .bind(level.quantity)
        .bind(level.updated_at)
        .execute(&mut *tx)
        .await?;

        append_movement(
            &mut tx,
            item_id,
            actor_id,
            kind,
            -quantity,
            &level,
            cost_basis,
            reference,
            note,
        )
        .await?;

        tx.commit().await?;

        debug!(
            item_id = %item_id,
            quantity = %quantity,
            new_quantity = %level.quantity,
            cost_basis = %cost_basis,
            "Stock decreased"
        );

        Ok(level)
    }

    /// Gets the current stock level for an item, if one exists yet.
    pub async fn get_level(&self, tenant_id: &str, item_id: &str) -> DbResult<Option<StockLevel>> {
        let level = sqlx::query_as::<_, StockLevel>(
            r#"
            SELECT
                id, tenant_id, item_id, quantity, average_cost,
                last_restock_at, created_at, updated_at
            FROM stock_levels
            WHERE tenant_id = ?1 AND item_id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(level)
    }

    /// Lists the movement ledger for an item in serialization order.
    pub async fn list_movements(&self, item_id: &str) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT
                id, item_id, actor_id, kind, quantity_delta,
                quantity_snapshot, unit_cost, reference_type, reference_id,
                note, created_at
            FROM stock_movements
            WHERE item_id = ?1
            ORDER BY id ASC
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Reads the level row for `(tenant_id, item_id)` inside the transaction,
/// inserting the zero baseline if the item has never been stocked.
async fn get_or_create_level(
    tx: &mut Transaction<'_, Sqlite>,
    tenant_id: &str,
    item_id: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> DbResult<StockLevel> {
    let existing = sqlx::query_as::<_, StockLevel>(
        r#"
        SELECT
            id, tenant_id, item_id, quantity, average_cost,
            last_restock_at, created_at, updated_at
        FROM stock_levels
        WHERE tenant_id = ?1 AND item_id = ?2
        "#,
    )
    .bind(tenant_id)
    .bind(item_id)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(level) = existing {
        return Ok(level);
    }

    let level = StockLevel {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        item_id: item_id.to_string(),
        quantity: 0,
        average_cost: 0.0,
        last_restock_at: None,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO stock_levels (
            id, tenant_id, item_id, quantity, average_cost,
            last_restock_at, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&level.id)
    .bind(&level.tenant_id)
    .bind(&level.item_id)
    .bind(level.quantity)
    .bind(level.average_cost)
    .bind(level.last_restock_at)
    .bind(level.created_at)
    .bind(level.updated_at)
    .execute(&mut **tx)
    .await?;

    debug!(item_id = %item_id, "Created zero stock level");
    Ok(level)
}

/// Appends one immutable ledger row reflecting a committed-to movement.
/// `level` must already hold the post-movement quantity.
#[allow(clippy::too_many_arguments)]
async fn append_movement(
    tx: &mut Transaction<'_, Sqlite>,
    item_id: &str,
    actor_id: Option<&str>,
    kind: MovementKind,
    quantity_delta: i64,
    level: &StockLevel,
    unit_cost: f64,
    reference: Option<&MovementRef>,
    note: Option<&str>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            item_id, actor_id, kind, quantity_delta, quantity_snapshot,
            unit_cost, reference_type, reference_id, note, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(item_id)
    .bind(actor_id)
    .bind(kind)
    .bind(quantity_delta)
    .bind(level.quantity)
    .bind(unit_cost)
    .bind(reference.map(|r| r.entity_type.as_str()))
    .bind(reference.map(|r| r.entity_id.as_str()))
    .bind(note)
    .bind(level.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
