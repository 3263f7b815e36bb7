use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::error::AppError;
use crate::models::{DaySchedule, LabSchedule, NewScheduleRequest, Weekday};
use crate::store::{ScheduleStore, StoreError};

const CONFLICT_MESSAGE: &str =
    "Schedule is already allotted for this lab during the specified period.";

/// Conflict checking and availability resolution over a schedule store.
pub struct ScheduleService {
    store: Arc<dyn ScheduleStore>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    /// Attach a weekly template to a lab for a date range.
    ///
    /// A proposal conflicts with an existing record only when the date
    /// windows overlap (inclusive bounds) AND the weekday sets intersect;
    /// either axis alone is fine. On conflict nothing is written.
    pub async fn propose_schedule(
        &self,
        request: NewScheduleRequest,
    ) -> Result<LabSchedule, AppError> {
        request.validate()?;

        let existing = self
            .store
            .find_overlapping(
                &request.lab_name,
                request.start_date,
                request.end_date,
                &request.weekdays(),
            )
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(CONFLICT_MESSAGE.to_string()));
        }

        // The store re-checks atomically with the write; a proposal that
        // raced past the lookup above still ends up as a conflict.
        let schedule = match self.store.insert(&request).await {
            Ok(schedule) => schedule,
            Err(StoreError::Overlap) => {
                return Err(AppError::Conflict(CONFLICT_MESSAGE.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "schedule {} created for lab {} ({} to {})",
            schedule.id, schedule.lab_name, schedule.start_date, schedule.end_date
        );
        Ok(schedule)
    }

    /// Resolve the slot layout of one weekday for a lab on a given date.
    /// Pure read path. The weekday label is matched case-insensitively.
    pub async fn resolve_day(
        &self,
        lab_name: &str,
        date: NaiveDate,
        day_label: &str,
    ) -> Result<DaySchedule, AppError> {
        let day: Weekday = day_label.parse()?;

        let schedule = self
            .store
            .find_by_lab(lab_name)
            .await?
            .ok_or_else(|| AppError::NotFound("Lab schedule not found.".to_string()))?;

        if !schedule.window_contains(date) {
            return Err(AppError::OutOfRange(
                "No schedule assigned for this date.".to_string(),
            ));
        }

        schedule
            .day_schedule(day)
            .cloned()
            .ok_or_else(|| {
                AppError::DayNotScheduled("Schedule not found for this day.".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DaySchedule, TimeSlot};
    use crate::store::MemoryScheduleStore;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn slot(start: &str, end: &str) -> TimeSlot {
        TimeSlot {
            start_time: start.to_string(),
            end_time: end.to_string(),
            booked_by: None,
            course_name: None,
            vacant: true,
        }
    }

    fn request(lab: &str, start: &str, end: &str, days: &[Weekday]) -> NewScheduleRequest {
        NewScheduleRequest {
            lab_name: lab.to_string(),
            start_date: date(start),
            end_date: date(end),
            weekly_schedule: days
                .iter()
                .map(|&day| DaySchedule {
                    day,
                    time_slots: vec![slot("09:00", "10:00")],
                })
                .collect(),
        }
    }

    fn service() -> (ScheduleService, Arc<MemoryScheduleStore>) {
        let store = Arc::new(MemoryScheduleStore::new());
        (ScheduleService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn first_schedule_for_a_lab_never_conflicts() {
        let (service, store) = service();
        let created = service
            .propose_schedule(request("CS-Lab-1", "2024-01-01", "2024-03-31", &[Weekday::Monday]))
            .await
            .unwrap();
        assert_eq!(created.lab_name, "CS-Lab-1");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn non_overlapping_windows_both_succeed() {
        let (service, store) = service();
        service
            .propose_schedule(request("CS-Lab-1", "2024-01-01", "2024-03-31", &[Weekday::Monday]))
            .await
            .unwrap();
        service
            .propose_schedule(request("CS-Lab-1", "2024-04-01", "2024-06-30", &[Weekday::Monday]))
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn overlapping_window_and_weekday_conflicts_without_write() {
        let (service, store) = service();
        service
            .propose_schedule(request("CS-Lab-1", "2024-01-01", "2024-03-31", &[Weekday::Monday]))
            .await
            .unwrap();

        let err = service
            .propose_schedule(request("CS-Lab-1", "2024-03-15", "2024-04-15", &[Weekday::Monday]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn overlapping_window_disjoint_weekdays_succeeds() {
        let (service, store) = service();
        service
            .propose_schedule(request("CS-Lab-1", "2024-01-01", "2024-03-31", &[Weekday::Monday]))
            .await
            .unwrap();
        service
            .propose_schedule(request("CS-Lab-1", "2024-03-15", "2024-04-15", &[Weekday::Tuesday]))
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn invalid_proposal_is_rejected_before_any_store_call() {
        let (service, store) = service();
        let err = service
            .propose_schedule(request("", "2024-01-01", "2024-03-31", &[Weekday::Monday]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn resolve_day_for_unknown_lab_is_not_found() {
        let (service, _) = service();
        let err = service
            .resolve_day("CS-Lab-1", date("2024-02-10"), "Monday")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn resolve_day_outside_window_is_out_of_range() {
        let (service, _) = service();
        service
            .propose_schedule(request("CS-Lab-1", "2024-01-01", "2024-03-31", &[Weekday::Monday]))
            .await
            .unwrap();

        for day in ["2023-12-31", "2024-04-01"] {
            let err = service
                .resolve_day("CS-Lab-1", date(day), "Monday")
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::OutOfRange(_)));
        }
    }

    #[tokio::test]
    async fn resolve_day_matches_case_insensitively() {
        let (service, _) = service();
        service
            .propose_schedule(request("CS-Lab-1", "2024-01-01", "2024-03-31", &[Weekday::Monday]))
            .await
            .unwrap();

        let resolved = service
            .resolve_day("CS-Lab-1", date("2024-02-10"), "monday")
            .await
            .unwrap();
        assert_eq!(resolved.day, Weekday::Monday);

        let err = service
            .resolve_day("CS-Lab-1", date("2024-02-10"), "Tuesday")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DayNotScheduled(_)));
    }

    #[tokio::test]
    async fn resolved_slots_keep_insertion_order() {
        let (service, _) = service();
        // Deliberately unsorted slot sequence.
        let slots = vec![slot("14:00", "15:00"), slot("09:00", "10:00"), slot("11:00", "12:00")];
        service
            .propose_schedule(NewScheduleRequest {
                lab_name: "CS-Lab-1".into(),
                start_date: date("2024-01-01"),
                end_date: date("2024-03-31"),
                weekly_schedule: vec![DaySchedule {
                    day: Weekday::Friday,
                    time_slots: slots.clone(),
                }],
            })
            .await
            .unwrap();

        let resolved = service
            .resolve_day("CS-Lab-1", date("2024-02-16"), "Friday")
            .await
            .unwrap();
        assert_eq!(resolved.time_slots, slots);
    }
}
