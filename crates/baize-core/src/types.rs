//! # Domain Types
//!
//! Core domain types used throughout Baize.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   RateWindow    │   │  TableSession   │   │   StockLevel    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  days (DaySet)  │   │  status         │   │  item_id        │       │
//! │  │  start/end time │   │  frozen rate    │   │  quantity       │       │
//! │  │  price_per_hour │   │  totals         │   │  average_cost   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     DaySet      │   │  StockMovement  │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bitmask 0-6    │   │  append-only    │   │  price/cost     │       │
//! │  │  0 = Sunday     │   │  ledger row     │   │  snapshots      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Conventions
//! - Sessions, stock levels and order items use UUID v4 string ids.
//! - Rate windows and stock movements use autoincrement integer ids because
//!   creation order is load-bearing there: lowest id wins a priority tie,
//!   and the movement ledger replays in id order.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

// =============================================================================
// Day Set
// =============================================================================

/// The set of weekdays a rate window applies to, as a bitmask over day
/// numbers 0-6 where 0 = Sunday (matching `Weekday::num_days_from_sunday`
/// and the admin panel's day picker).
///
/// `DaySet::ALL` (all seven bits) means the window applies on any day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct DaySet(u8);

impl DaySet {
    /// Every day of the week.
    pub const ALL: DaySet = DaySet(0b0111_1111);

    /// No days. A window with an empty day set never matches.
    pub const NONE: DaySet = DaySet(0);

    /// Builds a set from day numbers 0-6 (0 = Sunday). Numbers above 6
    /// are ignored.
    pub fn from_days(days: &[u8]) -> Self {
        let mut bits = 0u8;
        for &d in days {
            if d <= 6 {
                bits |= 1 << d;
            }
        }
        DaySet(bits)
    }

    /// Reconstructs a set from raw bits (as stored in the database).
    /// Bits above the seventh are masked off.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        DaySet(bits & Self::ALL.0)
    }

    /// Raw bitmask, for storage.
    #[inline]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Whether the set contains day number `day` (0 = Sunday .. 6 = Saturday).
    #[inline]
    pub const fn contains_day(&self, day: u8) -> bool {
        day <= 6 && self.0 & (1 << day) != 0
    }

    /// Whether the set contains the given weekday.
    #[inline]
    pub fn contains(&self, weekday: Weekday) -> bool {
        self.contains_day(weekday.num_days_from_sunday() as u8)
    }

    /// Whether the set covers every day.
    #[inline]
    pub const fn is_all(&self) -> bool {
        self.0 == Self::ALL.0
    }
}

impl Default for DaySet {
    fn default() -> Self {
        DaySet::ALL
    }
}

// =============================================================================
// Rate Window
// =============================================================================

/// One pricing rule for a table type.
///
/// ## Time Bounds
/// - `start_time`/`end_time` are a nullable pair; a window with no complete
///   pair applies to the whole day.
/// - `start_time > end_time` means the window spans midnight into the next
///   calendar day (an "overnight" window, e.g. 22:00-02:00).
/// - `start_time == end_time` is NOT overnight: it matches only that exact
///   minute boundary. This quirk is kept for compatibility with the rate
///   catalogs clubs already have; it is not an all-day shorthand.
///
/// Read-only to the tariff resolver; created and edited by the admin layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RateWindow {
    /// Autoincrement id; doubles as the creation-order tie-break.
    pub id: i64,

    /// Table type this rule prices (e.g. snooker vs pool vs carom tables).
    pub table_type_id: String,

    /// Hourly rate while this window is in effect.
    pub price_per_hour: f64,

    /// Weekdays the window applies to.
    pub days: DaySet,

    /// Start of the time-of-day range, if bounded.
    pub start_time: Option<NaiveTime>,

    /// End of the time-of-day range, if bounded.
    pub end_time: Option<NaiveTime>,

    /// Higher priority wins when windows overlap; ties go to the lowest id.
    pub priority: i64,

    /// Inactive windows are ignored by the resolver.
    pub active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RateWindow {
    /// The complete time bounds, or `None` when the window applies all day.
    ///
    /// A half-set pair (only one of start/end present) is treated as
    /// unbounded; the admin layer never writes such rows but the resolver
    /// must not misprice if one appears.
    #[inline]
    pub fn bounds(&self) -> Option<(NaiveTime, NaiveTime)> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Whether the window spans midnight (`start_time > end_time`).
    #[inline]
    pub fn is_overnight(&self) -> bool {
        matches!(self.bounds(), Some((start, end)) if start > end)
    }

    /// Whether the window has no time bounds.
    #[inline]
    pub fn is_all_day(&self) -> bool {
        self.bounds().is_none()
    }
}

// =============================================================================
// Session Status
// =============================================================================

/// The lifecycle state of a table session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Table is occupied, clock running.
    Active,
    /// Customer asked to settle; awaiting staff confirmation.
    PendingEnd,
    /// Settled. `ended_at` is set and pricing is frozen.
    Closed,
}

impl SessionStatus {
    /// Stable string form, matching the database CHECK constraint.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::PendingEnd => "pending_end",
            SessionStatus::Closed => "closed",
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Active
    }
}

// =============================================================================
// Table Session
// =============================================================================

/// One continuous occupancy of a billiards table, billed by elapsed time.
///
/// ## Invariants
/// - `ended_at` is `None` exactly while status is `Active` or `PendingEnd`.
/// - Once `Closed`, the session is immutable for pricing purposes:
///   `total_play_minutes` and `total_before_discount` are final.
/// - `frozen_rate_per_hour` is captured at open time and used as the
///   fallback rate for minutes no rate window covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TableSession {
    pub id: String,
    pub tenant_id: String,
    pub table_type_id: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub frozen_rate_per_hour: f64,
    pub total_play_minutes: i64,
    pub total_before_discount: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TableSession {
    /// Whether the session still accepts orders and accrues time.
    #[inline]
    pub fn is_open(&self) -> bool {
        !matches!(self.status, SessionStatus::Closed)
    }
}

// =============================================================================
// Stock Level
// =============================================================================

/// Current stock position for one sellable item.
///
/// ## Invariants
/// - Lazily created at `quantity = 0, average_cost = 0.0` on first touch.
/// - `average_cost` is only updated by stock increases; decreases consume
///   at the current average (standard MAC costing).
/// - `quantity` may go negative through reconciliation paths outside the
///   guarded decrease; that is a tolerated state, not an error state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLevel {
    pub id: String,
    pub tenant_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub average_cost: f64,
    pub last_restock_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// The cause of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Goods received from a supplier.
    Import,
    /// Sold against an order.
    Sale,
    /// Manual stocktake correction.
    Adjustment,
    /// Returned to stock (e.g. order line removed).
    Return,
}

impl MovementKind {
    /// Stable string form, matching the database CHECK constraint.
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Import => "import",
            MovementKind::Sale => "sale",
            MovementKind::Adjustment => "adjustment",
            MovementKind::Return => "return",
        }
    }
}

/// One append-only ledger entry: a single stock quantity change.
///
/// Immutable once written. For any item, summing `quantity_delta` over the
/// ledger up to and including a row equals that row's `quantity_snapshot`;
/// the row order (by `id`) is the true serialization order of the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: i64,
    pub item_id: String,
    /// Staff member who caused the movement, when known.
    pub actor_id: Option<String>,
    pub kind: MovementKind,
    /// Signed change: positive for increases, negative for decreases.
    pub quantity_delta: i64,
    /// Quantity on hand immediately after this movement.
    pub quantity_snapshot: i64,
    /// Cost attributed to this movement: the batch import price on
    /// increases, the average cost at time of sale on decreases (the
    /// cost-of-goods-sold basis).
    pub unit_cost: f64,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Movement Reference
// =============================================================================

/// Polymorphic pointer from a ledger row to the entity that caused it:
/// an order item, a purchase, an admin adjustment action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRef {
    pub entity_type: String,
    pub entity_id: String,
}

impl MovementRef {
    pub fn new(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        MovementRef {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
        }
    }

    /// Reference to an order item line.
    pub fn order_item(id: impl Into<String>) -> Self {
        MovementRef::new("order_item", id)
    }

    /// Reference to a supplier purchase.
    pub fn purchase(id: impl Into<String>) -> Self {
        MovementRef::new("purchase", id)
    }

    /// Reference to a manual stocktake adjustment.
    pub fn adjustment(id: impl Into<String>) -> Self {
        MovementRef::new("adjustment", id)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A service item ordered against an open session.
///
/// Uses the snapshot pattern: `unit_price` is the sale price and
/// `unit_cost_basis` the stock average cost, both frozen at order time, so
/// later catalog or cost changes never rewrite an existing order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub tenant_id: String,
    pub session_id: String,
    pub item_id: String,
    pub quantity: i64,
    /// Sale price per unit at order time (frozen).
    pub unit_price: f64,
    /// Stock average cost per unit at order time (frozen COGS basis).
    pub unit_cost_basis: f64,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Line total before discounts (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_day_set_from_days() {
        let weekend = DaySet::from_days(&[0, 6]);
        assert!(weekend.contains_day(0));
        assert!(weekend.contains_day(6));
        assert!(!weekend.contains_day(3));
        assert!(!weekend.is_all());
    }

    #[test]
    fn test_day_set_all_contains_everything() {
        for day in 0..7u8 {
            assert!(DaySet::ALL.contains_day(day));
        }
        assert!(DaySet::ALL.is_all());
        assert!(!DaySet::ALL.contains_day(7));
    }

    #[test]
    fn test_day_set_weekday_mapping() {
        // 0 = Sunday per num_days_from_sunday
        let sunday_only = DaySet::from_days(&[0]);
        assert!(sunday_only.contains(Weekday::Sun));
        assert!(!sunday_only.contains(Weekday::Mon));
    }

    #[test]
    fn test_day_set_from_bits_masks_high_bits() {
        let set = DaySet::from_bits(0xFF);
        assert_eq!(set.bits(), DaySet::ALL.bits());
    }

    fn window_with_bounds(start: Option<&str>, end: Option<&str>) -> RateWindow {
        RateWindow {
            id: 1,
            table_type_id: "pool".to_string(),
            price_per_hour: 60.0,
            days: DaySet::ALL,
            start_time: start.map(|s| NaiveTime::parse_from_str(s, "%H:%M").unwrap()),
            end_time: end.map(|s| NaiveTime::parse_from_str(s, "%H:%M").unwrap()),
            priority: 0,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_rate_window_overnight_detection() {
        assert!(window_with_bounds(Some("22:00"), Some("02:00")).is_overnight());
        assert!(!window_with_bounds(Some("09:00"), Some("17:00")).is_overnight());
        // start == end is NOT overnight
        assert!(!window_with_bounds(Some("10:00"), Some("10:00")).is_overnight());
        assert!(!window_with_bounds(None, None).is_overnight());
    }

    #[test]
    fn test_rate_window_half_set_pair_is_all_day() {
        assert!(window_with_bounds(Some("09:00"), None).is_all_day());
        assert!(window_with_bounds(None, Some("17:00")).is_all_day());
        assert!(window_with_bounds(None, None).is_all_day());
        assert!(!window_with_bounds(Some("09:00"), Some("17:00")).is_all_day());
    }

    #[test]
    fn test_session_status_as_str_matches_schema() {
        assert_eq!(SessionStatus::Active.as_str(), "active");
        assert_eq!(SessionStatus::PendingEnd.as_str(), "pending_end");
        assert_eq!(SessionStatus::Closed.as_str(), "closed");
    }

    #[test]
    fn test_movement_ref_constructors() {
        let r = MovementRef::order_item("oi-1");
        assert_eq!(r.entity_type, "order_item");
        assert_eq!(r.entity_id, "oi-1");
    }

    #[test]
    fn test_order_item_line_total() {
        let item = OrderItem {
            id: "oi-1".to_string(),
            tenant_id: crate::DEFAULT_TENANT_ID.to_string(),
            session_id: "s-1".to_string(),
            item_id: "cola-330".to_string(),
            quantity: 3,
            unit_price: 2.5,
            unit_cost_basis: 1.1,
            created_at: Utc::now(),
        };
        assert!((item.line_total() - 7.5).abs() < 1e-9);
    }
}
