use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::models::{DaySchedule, LabSchedule, NewScheduleRequest, Weekday, weekday_mask};

use super::{ScheduleStore, StoreError};

/// Production store. The weekday set is persisted as an integer bitmask so
/// the two-axis overlap predicate runs entirely in SQL; the weekly slot
/// document is a JSON column.
pub struct SqliteScheduleStore {
    pool: SqlitePool,
}

impl SqliteScheduleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ScheduleRow {
    id: String,
    lab_name: String,
    start_date: String,
    end_date: String,
    weekly_schedule: String,
    created_at: String,
}

impl ScheduleRow {
    fn into_schedule(self) -> Result<LabSchedule, StoreError> {
        let start_date: NaiveDate = self
            .start_date
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("start_date: {e}")))?;
        let end_date: NaiveDate = self
            .end_date
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("end_date: {e}")))?;
        let weekly_schedule: Vec<DaySchedule> = serde_json::from_str(&self.weekly_schedule)
            .map_err(|e| StoreError::Corrupt(format!("weekly_schedule: {e}")))?;
        Ok(LabSchedule {
            id: self.id,
            lab_name: self.lab_name,
            start_date,
            end_date,
            weekly_schedule,
            created_at: self.created_at,
        })
    }
}

const OVERLAP_PREDICATE: &str =
    "lab_name = ? AND start_date <= ? AND end_date >= ? AND (weekday_mask & ?) != 0";

#[async_trait]
impl ScheduleStore for SqliteScheduleStore {
    async fn find_overlapping(
        &self,
        lab_name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        days: &[Weekday],
    ) -> Result<Option<LabSchedule>, StoreError> {
        let sql = format!(
            "SELECT id, lab_name, start_date, end_date, weekly_schedule, created_at \
             FROM lab_schedules WHERE {OVERLAP_PREDICATE} \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, ScheduleRow>(&sql)
            .bind(lab_name)
            .bind(end_date.to_string())
            .bind(start_date.to_string())
            .bind(weekday_mask(days))
            .fetch_optional(&self.pool)
            .await?;

        row.map(ScheduleRow::into_schedule).transpose()
    }

    async fn insert(&self, request: &NewScheduleRequest) -> Result<LabSchedule, StoreError> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339();
        let mask = weekday_mask(&request.weekdays());
        let document = serde_json::to_string(&request.weekly_schedule)
            .map_err(|e| StoreError::Corrupt(format!("weekly_schedule: {e}")))?;

        // Re-check and write inside one transaction so two racing proposals
        // cannot both pass the service-level pre-check and commit.
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT COUNT(*) FROM lab_schedules WHERE {OVERLAP_PREDICATE}");
        let conflicting: i64 = sqlx::query_scalar(&sql)
            .bind(&request.lab_name)
            .bind(request.end_date.to_string())
            .bind(request.start_date.to_string())
            .bind(mask)
            .fetch_one(&mut *tx)
            .await?;
        if conflicting > 0 {
            return Err(StoreError::Overlap);
        }

        sqlx::query(
            "INSERT INTO lab_schedules \
                (id, lab_name, start_date, end_date, weekday_mask, weekly_schedule, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.lab_name)
        .bind(request.start_date.to_string())
        .bind(request.end_date.to_string())
        .bind(mask)
        .bind(&document)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(LabSchedule {
            id,
            lab_name: request.lab_name.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            weekly_schedule: request.weekly_schedule.clone(),
            created_at,
        })
    }

    async fn find_by_lab(&self, lab_name: &str) -> Result<Option<LabSchedule>, StoreError> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            "SELECT id, lab_name, start_date, end_date, weekly_schedule, created_at \
             FROM lab_schedules WHERE lab_name = ? \
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(lab_name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ScheduleRow::into_schedule).transpose()
    }
}
