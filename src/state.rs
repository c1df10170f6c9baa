use homeroom_config::{AttendancePolicyConfig, CorsConfig, DatabaseConfig};
use homeroom_db::init_db_pool;
use sqlx::PgPool;

use crate::modules::attendance::store::PgAttendanceStore;
use crate::modules::students::PgStudentDirectory;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub cors_config: CorsConfig,
    pub attendance_policy: AttendancePolicyConfig,
}

impl AppState {
    pub fn attendance_store(&self) -> PgAttendanceStore {
        PgAttendanceStore::new(self.db.clone())
    }

    pub fn student_directory(&self) -> PgStudentDirectory {
        PgStudentDirectory::new(self.db.clone())
    }
}

pub async fn init_app_state() -> AppState {
    AppState {
        db: init_db_pool(&DatabaseConfig::from_env()).await,
        cors_config: CorsConfig::from_env(),
        attendance_policy: AttendancePolicyConfig::from_env(),
    }
}
