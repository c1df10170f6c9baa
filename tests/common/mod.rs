use homeroom::homeroom_config::{AttendancePolicyConfig, CorsConfig};
use homeroom::router::init_router;
use homeroom::state::AppState;
use sqlx::PgPool;
use uuid::Uuid;

pub fn setup_test_app(pool: PgPool) -> axum::Router {
    let state = AppState {
        db: pool,
        cors_config: CorsConfig::default(),
        attendance_policy: AttendancePolicyConfig::default(),
    };
    init_router(state)
}

/// Inserts a student and returns its id. `gender` is `"M"` or `"F"`.
pub async fn create_test_student(pool: &PgPool, gender: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO students (student_no, name, grade, class_no, number, gender)
        VALUES ($1, $2, 2, 3, 14, $3)
        RETURNING id
        "#,
    )
    .bind(generate_unique_student_no())
    .bind("Test Student")
    .bind(gender)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub fn generate_unique_student_no() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}
