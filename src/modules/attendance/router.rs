use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{get_attendance_summary, list_attendance, record_attendance};

pub fn init_attendance_router() -> Router<AppState> {
    Router::new()
        .route("/", post(record_attendance).get(list_attendance))
        .route("/summary", get(get_attendance_summary))
}
