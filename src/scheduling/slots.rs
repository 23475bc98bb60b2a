//! Interview slot persistence
//!
//! The slot table is the one shared resource that concurrent sessions can
//! contend on, so booking is a single atomic conditional update
//! (`available = true -> false`) rather than a read-then-write. A booking
//! succeeded iff a row actually flipped.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::AssistantResult;

/// A bookable interview slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub position: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub available: bool,
}

impl Slot {
    pub fn open(position: impl Into<String>, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            position: position.into(),
            date,
            time,
            available: true,
        }
    }

    /// Display form used in slot listings, e.g. `2026-09-01 09:30`
    pub fn display(&self) -> String {
        format!("{} {}", self.date.format("%Y-%m-%d"), self.time.format("%H:%M"))
    }
}

/// Access to the interview slot table
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Available slots for a position on `date` with `start <= time < end`,
    /// ordered by date then time, capped at `limit`.
    async fn find_slots(
        &self,
        position: &str,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        limit: usize,
    ) -> AssistantResult<Vec<Slot>>;

    /// Available slots for a position on `date` at any time of day,
    /// ordered by date then time, capped at `limit`. Unlike `find_slots`
    /// there is no time filter, so slots outside business hours count too.
    async fn find_day_slots(
        &self,
        position: &str,
        date: NaiveDate,
        limit: usize,
    ) -> AssistantResult<Vec<Slot>>;

    /// Atomically flip one slot from available to taken.
    ///
    /// Returns `true` iff the slot existed and was still available; a
    /// `false` means it was just taken or never existed. Must be a single
    /// compare-and-set, never a read followed by a write.
    async fn book_slot(
        &self,
        position: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> AssistantResult<bool>;
}

// ============================================================================
// Postgres-backed store
// ============================================================================

/// Slot store over the `"Schedule"` table
#[derive(Clone)]
pub struct PgSlotStore {
    pool: PgPool,
}

impl PgSlotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlotStore for PgSlotStore {
    async fn find_slots(
        &self,
        position: &str,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        limit: usize,
    ) -> AssistantResult<Vec<Slot>> {
        let rows = sqlx::query(
            r#"SELECT date, time FROM "Schedule"
               WHERE available = TRUE AND position = $1 AND date = $2
                 AND time >= $3 AND time < $4
               ORDER BY date, time
               LIMIT $5"#,
        )
        .bind(position)
        .bind(date)
        .bind(start)
        .bind(end)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Slot {
                position: position.to_string(),
                date: row.get("date"),
                time: row.get("time"),
                available: true,
            })
            .collect())
    }

    async fn find_day_slots(
        &self,
        position: &str,
        date: NaiveDate,
        limit: usize,
    ) -> AssistantResult<Vec<Slot>> {
        let rows = sqlx::query(
            r#"SELECT date, time FROM "Schedule"
               WHERE available = TRUE AND position = $1 AND date = $2
               ORDER BY date, time
               LIMIT $3"#,
        )
        .bind(position)
        .bind(date)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Slot {
                position: position.to_string(),
                date: row.get("date"),
                time: row.get("time"),
                available: true,
            })
            .collect())
    }

    async fn book_slot(
        &self,
        position: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> AssistantResult<bool> {
        // The availability check and the flip are one statement; two
        // concurrent bookings of the same slot cannot both see rows_affected > 0.
        let result = sqlx::query(
            r#"UPDATE "Schedule" SET available = FALSE
               WHERE position = $1 AND date = $2 AND time = $3 AND available = TRUE"#,
        )
        .bind(position)
        .bind(date)
        .bind(time)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Slot store over a locked vector, for tests and offline runs.
///
/// `book_slot` holds the lock across the availability test and the flip, so
/// it keeps the same compare-and-set guarantee as the SQL store.
#[derive(Debug, Clone, Default)]
pub struct InMemorySlotStore {
    slots: Arc<Mutex<Vec<Slot>>>,
}

impl InMemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, slots: Vec<Slot>) {
        self.slots.lock().await.extend(slots);
    }
}

#[async_trait]
impl SlotStore for InMemorySlotStore {
    async fn find_slots(
        &self,
        position: &str,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        limit: usize,
    ) -> AssistantResult<Vec<Slot>> {
        let slots = self.slots.lock().await;
        let mut found: Vec<Slot> = slots
            .iter()
            .filter(|s| {
                s.available
                    && s.position == position
                    && s.date == date
                    && s.time >= start
                    && s.time < end
            })
            .cloned()
            .collect();
        found.sort_by_key(|s| (s.date, s.time));
        found.truncate(limit);
        Ok(found)
    }

    async fn find_day_slots(
        &self,
        position: &str,
        date: NaiveDate,
        limit: usize,
    ) -> AssistantResult<Vec<Slot>> {
        let slots = self.slots.lock().await;
        let mut found: Vec<Slot> = slots
            .iter()
            .filter(|s| s.available && s.position == position && s.date == date)
            .cloned()
            .collect();
        found.sort_by_key(|s| (s.date, s.time));
        found.truncate(limit);
        Ok(found)
    }

    async fn book_slot(
        &self,
        position: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> AssistantResult<bool> {
        let mut slots = self.slots.lock().await;
        for slot in slots.iter_mut() {
            if slot.position == position && slot.date == date && slot.time == time {
                if slot.available {
                    slot.available = false;
                    return Ok(true);
                }
                return Ok(false);
            }
        }
        Ok(false)
    }
}
