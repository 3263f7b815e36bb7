use std::sync::Arc;

use sqlx::SqlitePool;

use crate::mailer::Mailer;
use crate::store::ScheduleStore;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub schedules: Arc<dyn ScheduleStore>,
    pub mailer: Arc<dyn Mailer>,
}
