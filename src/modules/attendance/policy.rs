//! Attendance policy evaluation.
//!
//! Everything in this module is pure: callers load the context from the
//! store and pass it in. Rules run in a fixed order and the first failing
//! rule decides the rejection:
//!
//! 1. `type` must be a known [`AttendanceType`]
//! 2. `reason` must be a known [`AttendanceReason`]
//! 3. the student must exist
//! 4. `MENSTRUAL` requires a female student and at most one such record per month
//! 5. `EXTERNAL_DOMESTIC` may use at most `domestic_cap` distinct days per year
//! 6. `EXTERNAL_OVERSEAS` may use at most `overseas_cap` distinct days per year
//! 7. at most one record per `(student, date, type)`
//!
//! `periods` is checked right after the categorical fields since it is a
//! shape error of the submission itself.

use chrono::{Datelike, NaiveDate};
use homeroom_config::AttendancePolicyConfig;
use std::collections::BTreeSet;

use crate::modules::attendance::model::{
    AttendanceReason, AttendanceRecord, AttendanceType, CreateAttendanceDto, Gender,
    NewAttendanceRecord, StudentIdentity,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error(
        "type must be one of absent, early_leave, late, period_absence, present (got '{0}')"
    )]
    InvalidType(String),

    #[error(
        "reason must be one of NORMAL, EXTERNAL_DOMESTIC, EXTERNAL_OVERSEAS, MENSTRUAL, OFFICIAL (got '{0}')"
    )]
    InvalidReason(String),

    #[error("periods must not be negative (got {0})")]
    NegativePeriods(i32),

    #[error("Student {0} not found")]
    StudentNotFound(i64),

    #[error("MENSTRUAL reason is only allowed for female students")]
    GenderIneligible,

    #[error("A MENSTRUAL record already exists for {month} (once per month)")]
    MonthlyLimitExceeded { month: String },

    #[error("{reason} leave would exceed the annual limit of {cap} days")]
    AnnualQuotaExceeded { reason: AttendanceReason, cap: i64 },

    #[error("An attendance record of type {kind} already exists on {date}")]
    DuplicateTypeOnDate { date: NaiveDate, kind: AttendanceType },
}

impl Rejection {
    /// Stable machine-readable tag for API responses and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidType(_) => "invalid_type",
            Self::InvalidReason(_) => "invalid_reason",
            Self::NegativePeriods(_) => "negative_periods",
            Self::StudentNotFound(_) => "student_not_found",
            Self::GenderIneligible => "gender_ineligible",
            Self::MonthlyLimitExceeded { .. } => "monthly_limit_exceeded",
            Self::AnnualQuotaExceeded { .. } => "annual_quota_exceeded",
            Self::DuplicateTypeOnDate { .. } => "duplicate_type_on_date",
        }
    }
}

/// A submission whose categorical fields have been parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEvent {
    pub student_id: i64,
    pub date: NaiveDate,
    pub kind: AttendanceType,
    pub reason: AttendanceReason,
    pub periods: i32,
    pub note: Option<String>,
}

impl CandidateEvent {
    /// Applies rules 1 and 2 plus the `periods` guard.
    pub fn parse(dto: CreateAttendanceDto) -> Result<Self, Rejection> {
        let kind = dto
            .kind
            .parse::<AttendanceType>()
            .map_err(|_| Rejection::InvalidType(dto.kind.clone()))?;
        let reason = dto
            .reason
            .parse::<AttendanceReason>()
            .map_err(|_| Rejection::InvalidReason(dto.reason.clone()))?;

        if dto.periods < 0 {
            return Err(Rejection::NegativePeriods(dto.periods));
        }

        Ok(Self {
            student_id: dto.student_id,
            date: dto.date,
            kind,
            reason,
            periods: dto.periods,
            note: dto.note,
        })
    }
}

/// Existing-record context for one candidate.
///
/// Only the parts relevant to the candidate's reason need to be populated;
/// the rest may stay at their defaults.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    pub student: Option<StudentIdentity>,
    /// The student's records in the candidate's calendar month.
    pub same_month: Vec<AttendanceRecord>,
    /// Distinct dates in the candidate's year already carrying the candidate's reason.
    pub reason_days_used: i64,
    /// Whether the candidate's date already carries the candidate's reason.
    pub reason_used_on_date: bool,
    /// The student's records on the candidate's date.
    pub same_day: Vec<AttendanceRecord>,
}

/// Applies rules 3 to 7 and returns the record to insert.
pub fn evaluate(
    candidate: CandidateEvent,
    context: &EvaluationContext,
    policy: &AttendancePolicyConfig,
) -> Result<NewAttendanceRecord, Rejection> {
    let student = context
        .student
        .filter(|student| student.id == candidate.student_id)
        .ok_or(Rejection::StudentNotFound(candidate.student_id))?;

    if candidate.reason == AttendanceReason::Menstrual {
        if student.gender != Gender::F {
            return Err(Rejection::GenderIneligible);
        }

        let month_taken = context.same_month.iter().any(|record| {
            record.student_id == candidate.student_id
                && record.reason == AttendanceReason::Menstrual
                && same_month(record.date, candidate.date)
        });
        if month_taken {
            return Err(Rejection::MonthlyLimitExceeded {
                month: month_token(candidate.date),
            });
        }
    }

    if let Some(cap) = annual_cap(policy, candidate.reason) {
        if !context.reason_used_on_date && context.reason_days_used >= cap {
            return Err(Rejection::AnnualQuotaExceeded {
                reason: candidate.reason,
                cap,
            });
        }
    }

    let duplicate = context.same_day.iter().any(|record| {
        record.student_id == candidate.student_id
            && record.date == candidate.date
            && record.kind == candidate.kind
    });
    if duplicate {
        return Err(Rejection::DuplicateTypeOnDate {
            date: candidate.date,
            kind: candidate.kind,
        });
    }

    Ok(NewAttendanceRecord {
        student_id: candidate.student_id,
        date: candidate.date,
        kind: candidate.kind,
        reason: candidate.reason,
        periods: candidate.periods,
        note: candidate.note,
    })
}

/// The annual distinct-day cap for a reason, if it has one.
pub fn annual_cap(policy: &AttendancePolicyConfig, reason: AttendanceReason) -> Option<i64> {
    match reason {
        AttendanceReason::ExternalDomestic => Some(policy.domestic_cap),
        AttendanceReason::ExternalOverseas => Some(policy.overseas_cap),
        _ => None,
    }
}

/// `YYYY-MM` token for a date.
pub fn month_token(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Distinct dates among `records` carrying `reason`.
pub fn distinct_dates<'a, I>(records: I, reason: AttendanceReason) -> BTreeSet<NaiveDate>
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    records
        .into_iter()
        .filter(|record| record.reason == reason)
        .map(|record| record.date)
        .collect()
}

/// First and last day of a calendar year, or `None` outside chrono's range.
pub fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

/// First and last day of the month containing `date`.
pub fn month_bounds(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let first = date.with_day(1)?;
    let next = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}
