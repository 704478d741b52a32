//! # Session Repository
//!
//! Table-session lifecycle: open, request end, close.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Session Lifecycle                                 │
//! │                                                                         │
//! │  1. OPEN                                                                │
//! │     └── open_session() → TableSession { status: Active }               │
//! │         Freezes the rate in effect right now; that frozen rate is the  │
//! │         fallback for any minute the catalog later fails to cover.      │
//! │                                                                         │
//! │  2. (OPTIONAL) REQUEST END                                              │
//! │     └── request_end() → { status: PendingEnd }                         │
//! │                                                                         │
//! │  3. CLOSE                                                               │
//! │     └── close_session() → { status: Closed, ended_at, totals }         │
//! │         Runs the tariff resolver over [started_at, now) and freezes    │
//! │         total_play_minutes and total_before_discount for good.         │
//! │                                                                         │
//! │  Closed sessions are immutable for pricing purposes.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{DbError, DbResult};
use crate::repository::rate_window::RateWindowRepository;
use baize_core::tariff::{billable_minutes, calculate_session_cost, resolve_rate_at};
use baize_core::{CoreError, SessionStatus, TableSession};

const SESSION_COLUMNS: &str = r#"
    id, tenant_id, table_type_id, status, started_at, ended_at,
    frozen_rate_per_hour, total_play_minutes, total_before_discount,
    created_at, updated_at
"#;

/// Repository for table-session operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    rate_windows: RateWindowRepository,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        let rate_windows = RateWindowRepository::new(pool.clone(), clock.clone());
        SessionRepository {
            pool,
            clock,
            rate_windows,
        }
    }

    /// Opens a session on a table of the given type.
    ///
    /// The rate in effect at the opening instant is frozen onto the
    /// session; minutes the catalog fails to cover at close time bill at
    /// that frozen rate. When nothing covers the opening instant either,
    /// the frozen rate is zero.
    pub async fn open_session(
        &self,
        tenant_id: &str,
        table_type_id: &str,
    ) -> DbResult<TableSession> {
        let now = self.clock.now();

        let windows = self.rate_windows.list_active(table_type_id).await?;
        let frozen_rate = resolve_rate_at(&windows, now).unwrap_or(0.0);

        let session = TableSession {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            table_type_id: table_type_id.to_string(),
            status: SessionStatus::Active,
            started_at: now,
            ended_at: None,
            frozen_rate_per_hour: frozen_rate,
            total_play_minutes: 0,
            total_before_discount: 0.0,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO table_sessions (
                id, tenant_id, table_type_id, status, started_at, ended_at,
                frozen_rate_per_hour, total_play_minutes, total_before_discount,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&session.id)
        .bind(&session.tenant_id)
        .bind(&session.table_type_id)
        .bind(session.status)
        .bind(session.started_at)
        .bind(session.ended_at)
        .bind(session.frozen_rate_per_hour)
        .bind(session.total_play_minutes)
        .bind(session.total_before_discount)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        info!(
            session_id = %session.id,
            table_type_id = %table_type_id,
            frozen_rate = %frozen_rate,
            "Session opened"
        );

        Ok(session)
    }

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<TableSession>> {
        let session = sqlx::query_as::<_, TableSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM table_sessions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Lists open sessions (Active or PendingEnd) for a tenant.
    pub async fn list_open(&self, tenant_id: &str) -> DbResult<Vec<TableSession>> {
        let sessions = sqlx::query_as::<_, TableSession>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM table_sessions
            WHERE tenant_id = ?1 AND status IN ('active', 'pending_end')
            ORDER BY started_at
            "#
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Marks an Active session as PendingEnd (customer asked to settle).
    pub async fn request_end(&self, session_id: &str) -> DbResult<TableSession> {
        let now = self.clock.now();

        let result = sqlx::query(
            r#"
            UPDATE table_sessions
            SET status = 'pending_end', updated_at = ?2
            WHERE id = ?1 AND status = 'active'
            "#,
        )
        .bind(session_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.status_conflict(session_id).await);
        }

        debug!(session_id = %session_id, "Session end requested");
        self.fetch_required(session_id).await
    }

    /// Closes a session: runs the tariff resolver over the full play
    /// interval, freezes the totals and stamps `ended_at`.
    ///
    /// Valid from Active or PendingEnd. Closing an already-closed session
    /// fails with `InvalidSessionStatus`; the totals of a closed session
    /// are never recomputed.
    pub async fn close_session(&self, session_id: &str) -> DbResult<TableSession> {
        let session = self
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| DbError::not_found("Session", session_id))?;

        if !session.is_open() {
            return Err(CoreError::InvalidSessionStatus {
                session_id: session_id.to_string(),
                current_status: session.status.as_str().to_string(),
            }
            .into());
        }

        let now = self.clock.now();
        let windows = self
            .rate_windows
            .list_active(&session.table_type_id)
            .await?;

        let minutes = billable_minutes(session.started_at, now);
        let total = calculate_session_cost(
            &windows,
            session.started_at,
            now,
            Some(session.frozen_rate_per_hour),
        );

        let result = sqlx::query(
            r#"
            UPDATE table_sessions
            SET status = 'closed', ended_at = ?2, total_play_minutes = ?3,
                total_before_discount = ?4, updated_at = ?2
            WHERE id = ?1 AND status IN ('active', 'pending_end')
            "#,
        )
        .bind(session_id)
        .bind(now)
        .bind(minutes)
        .bind(total)
        .execute(&self.pool)
        .await?;

        // Lost a race with another close: the totals written by the winner
        // stand and this call reports the conflict.
        if result.rows_affected() == 0 {
            return Err(self.status_conflict(session_id).await);
        }

        info!(
            session_id = %session_id,
            minutes = %minutes,
            total = %total,
            "Session closed"
        );

        self.fetch_required(session_id).await
    }

    /// Running cost of a session at this instant, for live display.
    ///
    /// Open sessions price `[started_at, now)` against the current catalog
    /// with the frozen rate as fallback; closed sessions return their
    /// frozen total.
    pub async fn current_cost(&self, session_id: &str) -> DbResult<f64> {
        let session = self
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| DbError::not_found("Session", session_id))?;

        if !session.is_open() {
            return Ok(session.total_before_discount);
        }

        let windows = self
            .rate_windows
            .list_active(&session.table_type_id)
            .await?;

        Ok(calculate_session_cost(
            &windows,
            session.started_at,
            self.clock.now(),
            Some(session.frozen_rate_per_hour),
        ))
    }

    /// Builds the error for a guarded status update that matched no rows:
    /// either the session does not exist or it is in the wrong state.
    async fn status_conflict(&self, session_id: &str) -> DbError {
        match self.get_by_id(session_id).await {
            Ok(Some(session)) => CoreError::InvalidSessionStatus {
                session_id: session_id.to_string(),
                current_status: session.status.as_str().to_string(),
            }
            .into(),
            Ok(None) => DbError::not_found("Session", session_id),
            Err(err) => err,
        }
    }

    async fn fetch_required(&self, session_id: &str) -> DbResult<TableSession> {
        self.get_by_id(session_id)
            .await?
            .ok_or_else(|| DbError::not_found("Session", session_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};

    use crate::clock::FixedClock;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use crate::repository::rate_window::NewRateWindow;
    use baize_core::{CoreError, DaySet, SessionStatus, DEFAULT_TENANT_ID};

    const FRIDAY_NOON: (i32, u32, u32, u32, u32) = (2024, 3, 8, 12, 0);

    fn at((y, mo, d, h, mi): (i32, u32, u32, u32, u32)) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    async fn db_at(start: DateTime<Utc>) -> (Database, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(start));
        let db = Database::with_clock(DbConfig::in_memory(), clock.clone())
            .await
            .unwrap();
        (db, clock)
    }

    #[tokio::test]
    async fn test_open_freezes_current_rate() {
        let (db, _clock) = db_at(at(FRIDAY_NOON)).await;
        db.rate_windows()
            .insert(NewRateWindow::all_day("pool", 60.0))
            .await
            .unwrap();

        let session = db
            .sessions()
            .open_session(DEFAULT_TENANT_ID, "pool")
            .await
            .unwrap();

        assert_eq!(session.status, SessionStatus::Active);
        assert!((session.frozen_rate_per_hour - 60.0).abs() < 1e-9);
        assert!(session.ended_at.is_none());
    }

    #[tokio::test]
    async fn test_open_without_catalog_freezes_zero() {
        let (db, _clock) = db_at(at(FRIDAY_NOON)).await;

        let session = db
            .sessions()
            .open_session(DEFAULT_TENANT_ID, "pool")
            .await
            .unwrap();

        assert_eq!(session.frozen_rate_per_hour, 0.0);
    }

    #[tokio::test]
    async fn test_close_computes_minutes_and_total() {
        let (db, clock) = db_at(at(FRIDAY_NOON)).await;
        db.rate_windows()
            .insert(NewRateWindow::all_day("pool", 60.0))
            .await
            .unwrap();

        let session = db
            .sessions()
            .open_session(DEFAULT_TENANT_ID, "pool")
            .await
            .unwrap();

        clock.advance(Duration::minutes(90));
        let closed = db.sessions().close_session(&session.id).await.unwrap();

        assert_eq!(closed.status, SessionStatus::Closed);
        assert_eq!(closed.total_play_minutes, 90);
        assert!((closed.total_before_discount - 90.0).abs() < 1e-9);
        assert_eq!(closed.ended_at, Some(at(FRIDAY_NOON) + Duration::minutes(90)));
    }

    #[tokio::test]
    async fn test_close_prices_overnight_session_across_midnight() {
        // Friday 22:00-02:00 evening tariff over a cheaper all-day base.
        let start = at((2024, 3, 8, 23, 30));
        let (db, clock) = db_at(start).await;
        let windows = db.rate_windows();

        windows
            .insert(NewRateWindow::all_day("pool", 60.0))
            .await
            .unwrap();
        windows
            .insert(NewRateWindow {
                table_type_id: "pool".to_string(),
                price_per_hour: 90.0,
                days: DaySet::from_days(&[5]),
                start_time: Some(time("22:00")),
                end_time: Some(time("02:00")),
                priority: 10,
                active: true,
            })
            .await
            .unwrap();

        let session = db
            .sessions()
            .open_session(DEFAULT_TENANT_ID, "pool")
            .await
            .unwrap();
        // The overnight window is in effect at open time.
        assert!((session.frozen_rate_per_hour - 90.0).abs() < 1e-9);

        clock.advance(Duration::minutes(120));
        let closed = db.sessions().close_session(&session.id).await.unwrap();

        // 30 Friday minutes + 90 Saturday carry minutes, all at 90/h.
        assert_eq!(closed.total_play_minutes, 120);
        assert!((closed.total_before_discount - 180.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_close_falls_back_to_frozen_rate_when_catalog_empties() {
        let (db, clock) = db_at(at(FRIDAY_NOON)).await;
        let window = db
            .rate_windows()
            .insert(NewRateWindow::all_day("pool", 60.0))
            .await
            .unwrap();

        let session = db
            .sessions()
            .open_session(DEFAULT_TENANT_ID, "pool")
            .await
            .unwrap();

        // Admin deactivates the only rule mid-session; the frozen rate
        // carries the billing.
        db.rate_windows().set_active(window.id, false).await.unwrap();

        clock.advance(Duration::minutes(60));
        let closed = db.sessions().close_session(&session.id).await.unwrap();

        assert!((closed.total_before_discount - 60.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_double_close_is_rejected_and_totals_stand() {
        let (db, clock) = db_at(at(FRIDAY_NOON)).await;
        db.rate_windows()
            .insert(NewRateWindow::all_day("pool", 60.0))
            .await
            .unwrap();

        let session = db
            .sessions()
            .open_session(DEFAULT_TENANT_ID, "pool")
            .await
            .unwrap();

        clock.advance(Duration::minutes(30));
        let closed = db.sessions().close_session(&session.id).await.unwrap();

        clock.advance(Duration::minutes(45));
        let err = db.sessions().close_session(&session.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidSessionStatus { .. })
        ));

        let after = db
            .sessions()
            .get_by_id(&session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.total_play_minutes, closed.total_play_minutes);
        assert_eq!(after.ended_at, closed.ended_at);
    }

    #[tokio::test]
    async fn test_request_end_transitions() {
        let (db, _clock) = db_at(at(FRIDAY_NOON)).await;

        let session = db
            .sessions()
            .open_session(DEFAULT_TENANT_ID, "pool")
            .await
            .unwrap();

        let pending = db.sessions().request_end(&session.id).await.unwrap();
        assert_eq!(pending.status, SessionStatus::PendingEnd);

        // Requesting again from PendingEnd is a status violation.
        let err = db.sessions().request_end(&session.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidSessionStatus { .. })
        ));

        // A pending session still closes normally.
        let closed = db.sessions().close_session(&session.id).await.unwrap();
        assert_eq!(closed.status, SessionStatus::Closed);

        let err = db.sessions().request_end("no-such-session").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_current_cost_live_and_after_close() {
        let (db, clock) = db_at(at(FRIDAY_NOON)).await;
        db.rate_windows()
            .insert(NewRateWindow::all_day("pool", 60.0))
            .await
            .unwrap();

        let session = db
            .sessions()
            .open_session(DEFAULT_TENANT_ID, "pool")
            .await
            .unwrap();

        clock.advance(Duration::minutes(30));
        let live = db.sessions().current_cost(&session.id).await.unwrap();
        assert!((live - 30.0).abs() < 1e-9);

        db.sessions().close_session(&session.id).await.unwrap();

        // After close the frozen total is returned, not a recomputation.
        clock.advance(Duration::minutes(45));
        let settled = db.sessions().current_cost(&session.id).await.unwrap();
        assert!((settled - 30.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_list_open_excludes_closed_sessions() {
        let (db, _clock) = db_at(at(FRIDAY_NOON)).await;
        let sessions = db.sessions();

        let first = sessions
            .open_session(DEFAULT_TENANT_ID, "pool")
            .await
            .unwrap();
        let second = sessions
            .open_session(DEFAULT_TENANT_ID, "snooker")
            .await
            .unwrap();
        sessions.request_end(&second.id).await.unwrap();

        let third = sessions
            .open_session(DEFAULT_TENANT_ID, "pool")
            .await
            .unwrap();
        sessions.close_session(&third.id).await.unwrap();

        let open = sessions.list_open(DEFAULT_TENANT_ID).await.unwrap();
        let ids: Vec<&str> = open.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(open.len(), 2);
        assert!(ids.contains(&first.id.as_str()));
        assert!(ids.contains(&second.id.as_str()));
    }
}
