use crate::metrics::track_student_created;
use crate::modules::students::model::{CreateStudentDto, Student, StudentQueryParams};
use crate::modules::students::service::StudentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use homeroom_core::AppError;
use serde_json::json;
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/api/students",
    request_body = CreateStudentDto,
    responses(
        (status = 201, description = "Student created successfully", body = Student),
        (status = 400, description = "Bad request"),
        (status = 409, description = "Student number already exists"),
        (status = 422, description = "Validation failed"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn create_student(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateStudentDto>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let student = StudentService::create_student(&state.db, dto).await?;
    track_student_created();
    Ok((StatusCode::CREATED, Json(student)))
}

#[utoipa::path(
    get,
    path = "/api/students",
    params(StudentQueryParams),
    responses(
        (status = 200, description = "List of students", body = Vec<Student>),
        (status = 500, description = "Internal server error")
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_students(
    State(state): State<AppState>,
    Query(params): Query<StudentQueryParams>,
) -> Result<Json<Vec<Student>>, AppError> {
    let students = StudentService::get_students(&state.db, &params).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(
        ("id" = i64, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student details", body = Student),
        (status = 404, description = "Student not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Student>, AppError> {
    let student = StudentService::get_student_by_id(&state.db, id).await?;
    Ok(Json(student))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    params(
        ("id" = i64, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student and their attendance records deleted"),
        (status = 404, description = "Student not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    StudentService::delete_student(&state.db, id).await?;
    Ok(Json(json!({"message": "Student deleted successfully"})))
}
