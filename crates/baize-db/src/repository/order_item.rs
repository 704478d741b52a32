//! # Order Item Repository
//!
//! Service items ordered against an open session. This is the flow that
//! drives the stock valuation engine: adding a line consumes stock as a
//! `sale` movement and records the cost basis used; removing a line
//! returns the stock as a `return` movement at that same recorded basis.
//!
//! Insufficient stock surfaces the engine's `ValidationError` unchanged;
//! the caller decides messaging and whether to retry.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{DbError, DbResult};
use crate::repository::inventory::InventoryRepository;
use baize_core::validation::{validate_item_id, validate_order_quantity, validate_rate};
use baize_core::{CoreError, MovementKind, MovementRef, OrderItem, SessionStatus};

/// Repository for order-item operations.
#[derive(Debug, Clone)]
pub struct OrderItemRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    inventory: InventoryRepository,
}

impl OrderItemRepository {
    /// Creates a new OrderItemRepository.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>, inventory: InventoryRepository) -> Self {
        OrderItemRepository {
            pool,
            clock,
            inventory,
        }
    }

    /// Orders `quantity` of an item against an Active session.
    ///
    /// Stock is consumed through the engine (`sale` movement referencing
    /// the new order line) and the average cost at time of sale is frozen
    /// onto the line as its COGS basis.
    pub async fn add_item(
        &self,
        tenant_id: &str,
        session_id: &str,
        item_id: &str,
        quantity: i64,
        unit_sale_price: f64,
    ) -> DbResult<OrderItem> {
        validate_order_quantity(quantity)?;
        validate_rate(unit_sale_price)?;
        validate_item_id(item_id)?;

        let status = self.session_status(session_id).await?;
        if status != SessionStatus::Active {
            return Err(CoreError::InvalidSessionStatus {
                session_id: session_id.to_string(),
                current_status: status.as_str().to_string(),
            }
            .into());
        }

        let order_item_id = Uuid::new_v4().to_string();
        let reference = MovementRef::order_item(&order_item_id);

        let level = self
            .inventory
            .decrease_stock(
                tenant_id,
                item_id,
                quantity,
                Some(&reference),
                MovementKind::Sale,
                None,
                None,
            )
            .await?;

        let now = self.clock.now();
        let item = OrderItem {
            id: order_item_id,
            tenant_id: tenant_id.to_string(),
            session_id: session_id.to_string(),
            item_id: item_id.to_string(),
            quantity,
            unit_price: unit_sale_price,
            // decrease_stock never changes the average, so this is the
            // average in effect when the units left stock
            unit_cost_basis: level.average_cost,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, tenant_id, session_id, item_id, quantity,
                unit_price, unit_cost_basis, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.tenant_id)
        .bind(&item.session_id)
        .bind(&item.item_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.unit_cost_basis)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        info!(
            session_id = %session_id,
            item_id = %item_id,
            quantity = %quantity,
            line_total = %item.line_total(),
            "Order item added"
        );

        Ok(item)
    }

    /// Removes an order line from a still-open session and returns its
    /// units to stock at the line's recorded cost basis.
    pub async fn remove_item(&self, order_item_id: &str) -> DbResult<()> {
        let item = self
            .get_by_id(order_item_id)
            .await?
            .ok_or_else(|| DbError::not_found("OrderItem", order_item_id))?;

        let status = self.session_status(&item.session_id).await?;
        if status == SessionStatus::Closed {
            return Err(CoreError::InvalidSessionStatus {
                session_id: item.session_id.clone(),
                current_status: status.as_str().to_string(),
            }
            .into());
        }

        // Delete the line first so a repeated call cannot return the same
        // units twice; a failed restock after this point is reconciled
        // through a manual adjustment movement.
        sqlx::query("DELETE FROM order_items WHERE id = ?1")
            .bind(order_item_id)
            .execute(&self.pool)
            .await?;

        let reference = MovementRef::order_item(order_item_id);
        self.inventory
            .increase_stock(
                &item.tenant_id,
                &item.item_id,
                item.quantity,
                item.unit_cost_basis,
                Some(&reference),
                MovementKind::Return,
                None,
                None,
            )
            .await?;

        debug!(
            order_item_id = %order_item_id,
            item_id = %item.item_id,
            quantity = %item.quantity,
            "Order item removed, stock returned"
        );

        Ok(())
    }

    /// Gets an order item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<OrderItem>> {
        let item = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT
                id, tenant_id, session_id, item_id, quantity,
                unit_price, unit_cost_basis, created_at
            FROM order_items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists all order items for a session in order of creation.
    pub async fn list_for_session(&self, session_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT
                id, tenant_id, session_id, item_id, quantity,
                unit_price, unit_cost_basis, created_at
            FROM order_items
            WHERE session_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn session_status(&self, session_id: &str) -> DbResult<SessionStatus> {
        sqlx::query_scalar::<_, SessionStatus>(
            "SELECT status FROM table_sessions WHERE id = ?1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Session", session_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
