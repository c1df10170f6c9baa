use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::modules::attendance::model::{
    AttendanceReason, AttendanceRecord, AttendanceSummary, AttendanceType, CreateAttendanceDto,
};
use crate::modules::students::model::{CreateStudentDto, Gender, Student};

/// Body of every non-2xx response.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable failure tag, e.g. `monthly_limit_exceeded`.
    pub kind: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::students::controller::create_student,
        crate::modules::students::controller::get_students,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::delete_student,
        crate::modules::attendance::controller::record_attendance,
        crate::modules::attendance::controller::list_attendance,
        crate::modules::attendance::controller::get_attendance_summary,
    ),
    components(
        schemas(
            Student,
            Gender,
            CreateStudentDto,
            AttendanceType,
            AttendanceReason,
            AttendanceRecord,
            CreateAttendanceDto,
            AttendanceSummary,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Students", description = "Student directory"),
        (name = "Attendance", description = "Attendance ledger and yearly summaries")
    ),
    info(
        title = "Homeroom API",
        version = "0.1.0",
        description = "Attendance ledger for a school backend, enforcing leave policy at write time.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;
