//! Attendance domain models and DTOs.
//!
//! An attendance record is one observation of a student's attendance on a
//! calendar date. Records are unique per `(student_id, date, type)`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown attendance type '{0}'")]
pub struct ParseAttendanceTypeError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown attendance reason '{0}'")]
pub struct ParseAttendanceReasonError(pub String);

/// The nature of the attendance event.
///
/// Variants are declared in the lexical order of their storage strings so
/// that the derived `Ord` agrees with `ORDER BY type ASC`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceType {
    Absent,
    EarlyLeave,
    Late,
    PeriodAbsence,
    Present,
}

impl AttendanceType {
    pub const ALL: [AttendanceType; 5] = [
        AttendanceType::Absent,
        AttendanceType::EarlyLeave,
        AttendanceType::Late,
        AttendanceType::PeriodAbsence,
        AttendanceType::Present,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::EarlyLeave => "early_leave",
            Self::Late => "late",
            Self::PeriodAbsence => "period_absence",
            Self::Present => "present",
        }
    }
}

impl fmt::Display for AttendanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceType {
    type Err = ParseAttendanceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseAttendanceTypeError(s.to_string()))
    }
}

impl_pg_text!(AttendanceType);

/// The justification used for quota accounting.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceReason {
    #[default]
    Normal,
    ExternalDomestic,
    ExternalOverseas,
    Menstrual,
    Official,
}

impl AttendanceReason {
    pub const ALL: [AttendanceReason; 5] = [
        AttendanceReason::Normal,
        AttendanceReason::ExternalDomestic,
        AttendanceReason::ExternalOverseas,
        AttendanceReason::Menstrual,
        AttendanceReason::Official,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::ExternalDomestic => "EXTERNAL_DOMESTIC",
            Self::ExternalOverseas => "EXTERNAL_OVERSEAS",
            Self::Menstrual => "MENSTRUAL",
            Self::Official => "OFFICIAL",
        }
    }

    /// Whether this reason draws from an annual external-leave quota.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::ExternalDomestic | Self::ExternalOverseas)
    }
}

impl fmt::Display for AttendanceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceReason {
    type Err = ParseAttendanceReasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|reason| reason.as_str() == s)
            .ok_or_else(|| ParseAttendanceReasonError(s.to_string()))
    }
}

impl_pg_text!(AttendanceReason);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: AttendanceType,
    pub reason: AttendanceReason,
    pub periods: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A record that passed policy evaluation and is ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendanceRecord {
    pub student_id: i64,
    pub date: NaiveDate,
    pub kind: AttendanceType,
    pub reason: AttendanceReason,
    pub periods: i32,
    pub note: Option<String>,
}

fn default_reason() -> String {
    AttendanceReason::Normal.as_str().to_string()
}

/// Request body for recording an attendance event.
///
/// `type` and `reason` are taken as raw strings so that unknown values are
/// reported by the attendance policy rather than by the JSON decoder.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAttendanceDto {
    pub student_id: i64,
    pub date: NaiveDate,
    /// present / late / early_leave / absent / period_absence
    #[serde(rename = "type")]
    #[schema(example = "absent")]
    pub kind: String,
    /// NORMAL / EXTERNAL_DOMESTIC / EXTERNAL_OVERSEAS / MENSTRUAL / OFFICIAL
    #[serde(default = "default_reason")]
    #[schema(example = "NORMAL")]
    pub reason: String,
    /// Class periods affected, mainly for `period_absence`.
    #[serde(default)]
    #[validate(range(min = 0, message = "periods must not be negative"))]
    pub periods: i32,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct AttendanceQueryParams {
    pub student_id: i64,
    /// Inclusive lower bound
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct SummaryQueryParams {
    pub student_id: i64,
    pub year: i32,
}

/// Yearly attendance view for one student. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceSummary {
    pub student_id: i64,
    pub year: i32,
    #[schema(value_type = BTreeMap<String, i64>)]
    pub counts_by_type: BTreeMap<AttendanceType, i64>,
    pub external_domestic_days: i64,
    pub external_overseas_days: i64,
    /// Sorted, de-duplicated `YYYY-MM` tokens
    pub menstrual_months_used: Vec<String>,
    pub warnings: Vec<String>,
}
