pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{LabSchedule, NewScheduleRequest, Weekday};

pub use memory::MemoryScheduleStore;
pub use sqlite::SqliteScheduleStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// An overlapping record was present at write time. Raised by `insert`
    /// when a concurrent proposal won the race after the caller's pre-check.
    #[error("an overlapping schedule already exists")]
    Overlap,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt schedule record: {0}")]
    Corrupt(String),
}

/// Persistence contract for schedule records. Passed into the scheduling
/// service as a capability so tests can substitute the in-memory store.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// First record for `lab_name` whose inclusive date window overlaps
    /// `[start_date, end_date]` AND whose weekday set intersects `days`.
    /// Overlap on a single axis does not match.
    async fn find_overlapping(
        &self,
        lab_name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        days: &[Weekday],
    ) -> Result<Option<LabSchedule>, StoreError>;

    /// Persist a validated proposal. The overlap predicate is re-checked
    /// atomically with the write; a violation is `StoreError::Overlap` and
    /// nothing is written.
    async fn insert(&self, request: &NewScheduleRequest) -> Result<LabSchedule, StoreError>;

    /// The lab's schedule record. When several exist, the most recently
    /// created wins (`created_at` descending, record id as tie-break).
    async fn find_by_lab(&self, lab_name: &str) -> Result<Option<LabSchedule>, StoreError>;
}
