use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use tracing::instrument;

use homeroom_core::AppError;

use crate::modules::attendance::model::{
    AttendanceQueryParams, AttendanceRecord, AttendanceSummary, CreateAttendanceDto,
    SummaryQueryParams,
};
use crate::modules::attendance::service::{LedgerError, LedgerService};
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = CreateAttendanceDto,
    responses(
        (status = 201, description = "Attendance event recorded", body = AttendanceRecord),
        (status = 400, description = "Rejected by attendance policy (invalid type or reason, gender, monthly or annual limit, duplicate type on date)"),
        (status = 404, description = "Student not found"),
        (status = 422, description = "Validation failed"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(skip(state))]
pub async fn record_attendance(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateAttendanceDto>,
) -> Result<(StatusCode, Json<AttendanceRecord>), AppError> {
    let record = LedgerService::record_event(
        &state.student_directory(),
        &state.attendance_store(),
        &state.attendance_policy,
        dto,
    )
    .await
    .map_err(LedgerError::into_app_error)?;

    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQueryParams),
    responses(
        (status = 200, description = "Attendance records ordered by date, then type", body = Vec<AttendanceRecord>),
        (status = 400, description = "Invalid query parameters"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(skip(state))]
pub async fn list_attendance(
    State(state): State<AppState>,
    Query(params): Query<AttendanceQueryParams>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    let records = LedgerService::list_records(
        &state.attendance_store(),
        params.student_id,
        params.start,
        params.end,
    )
    .await
    .map_err(LedgerError::into_app_error)?;

    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(SummaryQueryParams),
    responses(
        (status = 200, description = "Yearly attendance summary with policy warnings", body = AttendanceSummary),
        (status = 400, description = "Invalid query parameters"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(skip(state))]
pub async fn get_attendance_summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryQueryParams>,
) -> Result<Json<AttendanceSummary>, AppError> {
    let summary = LedgerService::summarize(
        &state.attendance_store(),
        &state.attendance_policy,
        params.student_id,
        params.year,
    )
    .await
    .map_err(LedgerError::into_app_error)?;

    Ok(Json(summary))
}
