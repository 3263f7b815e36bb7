use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{LabSchedule, NewScheduleRequest, Weekday, windows_overlap};

use super::{ScheduleStore, StoreError};

/// In-memory store satisfying the same contract as the SQLite one, for
/// deterministic tests. Check and write happen under a single lock, so the
/// atomicity guarantee of `insert` holds here too.
#[derive(Default)]
pub struct MemoryScheduleStore {
    records: Mutex<Vec<LabSchedule>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted records; lets tests assert that a rejected
    /// proposal wrote nothing.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn conflicts_with(
    record: &LabSchedule,
    lab_name: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    days: &[Weekday],
) -> bool {
    record.lab_name == lab_name
        && windows_overlap(record.start_date, record.end_date, start_date, end_date)
        && record
            .weekly_schedule
            .iter()
            .any(|d| days.contains(&d.day))
}

fn most_recent<'a>(
    records: impl Iterator<Item = &'a LabSchedule>,
) -> Option<&'a LabSchedule> {
    records.max_by(|a, b| {
        (a.created_at.as_str(), a.id.as_str()).cmp(&(b.created_at.as_str(), b.id.as_str()))
    })
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn find_overlapping(
        &self,
        lab_name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        days: &[Weekday],
    ) -> Result<Option<LabSchedule>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(most_recent(
            records
                .iter()
                .filter(|r| conflicts_with(r, lab_name, start_date, end_date, days)),
        )
        .cloned())
    }

    async fn insert(&self, request: &NewScheduleRequest) -> Result<LabSchedule, StoreError> {
        let days = request.weekdays();
        let mut records = self.records.lock().unwrap();
        if records
            .iter()
            .any(|r| conflicts_with(r, &request.lab_name, request.start_date, request.end_date, &days))
        {
            return Err(StoreError::Overlap);
        }

        let schedule = LabSchedule {
            id: Uuid::new_v4().to_string(),
            lab_name: request.lab_name.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            weekly_schedule: request.weekly_schedule.clone(),
            created_at: Utc::now().to_rfc3339(),
        };
        records.push(schedule.clone());
        Ok(schedule)
    }

    async fn find_by_lab(&self, lab_name: &str) -> Result<Option<LabSchedule>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(most_recent(records.iter().filter(|r| r.lab_name == lab_name)).cloned())
    }
}
