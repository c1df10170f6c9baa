use axum::http::StatusCode;
use chrono::{Datelike, NaiveDate};
use homeroom_config::AttendancePolicyConfig;
use homeroom_core::AppError;
use tracing::{error, instrument, warn};

use crate::metrics::{track_attendance_recorded, track_attendance_rejected};
use crate::modules::attendance::model::{
    AttendanceReason, AttendanceRecord, AttendanceSummary, AttendanceType, CreateAttendanceDto,
    StudentIdentity,
};
use crate::modules::attendance::policy::{
    CandidateEvent, EvaluationContext, Rejection, evaluate, month_bounds,
};
use crate::modules::attendance::store::{AttendanceStore, StoreError};
use crate::modules::attendance::summary::build_summary;
use crate::modules::students::StudentDirectory;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// The store refused the insert because another request stored the same
    /// `(student, date, type)` after this one loaded its context.
    #[error("An attendance record of type {kind} already exists on {date}")]
    Conflict { date: NaiveDate, kind: AttendanceType },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { date, kind, .. } => Self::Conflict { date, kind },
            StoreError::Database(e) => Self::Database(e),
        }
    }
}

impl LedgerError {
    /// Stable machine-readable tag. A store conflict shares the evaluator's
    /// duplicate tag since callers cannot tell the two apart.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rejected(rejection) => rejection.kind(),
            Self::Conflict { .. } => "duplicate_type_on_date",
            Self::Database(_) => "internal",
        }
    }

    /// True when the event was refused by policy or by the uniqueness
    /// constraint, as opposed to an infrastructure failure.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Database(_))
    }

    pub fn into_app_error(self) -> AppError {
        let kind = self.kind();
        let status = match &self {
            Self::Rejected(Rejection::StudentNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Rejected(_) | Self::Conflict { .. } => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let error = AppError::new(status, self);
        if status.is_server_error() {
            error
        } else {
            error.with_kind(kind)
        }
    }
}

pub struct LedgerService;

impl LedgerService {
    /// Validates a submission against the attendance policy and stores it.
    ///
    /// No write happens unless every rule passes. Quota checks read before
    /// they write, so two concurrent submissions can both pass a cap that
    /// only one of them should have; duplicates are still caught by the
    /// store's unique constraint.
    #[instrument(
        skip(directory, store, policy, dto),
        fields(
            student_id = dto.student_id,
            date = %dto.date,
            kind = %dto.kind,
            reason = %dto.reason
        )
    )]
    pub async fn record_event<D, S>(
        directory: &D,
        store: &S,
        policy: &AttendancePolicyConfig,
        dto: CreateAttendanceDto,
    ) -> Result<AttendanceRecord, LedgerError>
    where
        D: StudentDirectory,
        S: AttendanceStore,
    {
        let result = Self::try_record_event(directory, store, policy, dto).await;

        match &result {
            Ok(record) => track_attendance_recorded(record.kind.as_str(), record.reason.as_str()),
            Err(err) if err.is_rejection() => {
                warn!(kind = err.kind(), error = %err, "Attendance event rejected");
                track_attendance_rejected(err.kind());
            }
            Err(err) => error!(error = %err, "Failed to record attendance event"),
        }

        result
    }

    async fn try_record_event<D, S>(
        directory: &D,
        store: &S,
        policy: &AttendancePolicyConfig,
        dto: CreateAttendanceDto,
    ) -> Result<AttendanceRecord, LedgerError>
    where
        D: StudentDirectory,
        S: AttendanceStore,
    {
        let candidate = CandidateEvent::parse(dto)?;

        let context = match directory.get_student(candidate.student_id).await? {
            Some(student) => Self::load_context(store, &candidate, student).await?,
            None => EvaluationContext::default(),
        };

        let accepted = evaluate(candidate, &context, policy)?;

        match store.insert(accepted).await {
            Ok(record) => Ok(record),
            Err(StoreError::Conflict {
                student_id,
                date,
                kind,
            }) => {
                warn!(student_id, %date, %kind, "Duplicate detected by store at insert");
                Err(LedgerError::Conflict { date, kind })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads only what the candidate's rules need.
    async fn load_context<S>(
        store: &S,
        candidate: &CandidateEvent,
        student: StudentIdentity,
    ) -> Result<EvaluationContext, StoreError>
    where
        S: AttendanceStore,
    {
        let mut context = EvaluationContext {
            student: Some(student),
            ..Default::default()
        };

        if candidate.reason == AttendanceReason::Menstrual
            && let Some((first, last)) = month_bounds(candidate.date)
        {
            context.same_month = store
                .query_range(candidate.student_id, Some(first), Some(last))
                .await?;
        }

        if candidate.reason.is_external() {
            context.reason_days_used = store
                .count_distinct_dates_by_reason(
                    candidate.student_id,
                    candidate.date.year(),
                    candidate.reason,
                )
                .await?;
            context.reason_used_on_date = store
                .exists_on_date(candidate.student_id, candidate.date, candidate.reason)
                .await?;
        }

        context.same_day = store
            .query_range(
                candidate.student_id,
                Some(candidate.date),
                Some(candidate.date),
            )
            .await?;

        Ok(context)
    }

    #[instrument(skip(store))]
    pub async fn list_records<S>(
        store: &S,
        student_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, LedgerError>
    where
        S: AttendanceStore,
    {
        Ok(store.query_range(student_id, start, end).await?)
    }

    #[instrument(skip(store, policy))]
    pub async fn summarize<S>(
        store: &S,
        policy: &AttendancePolicyConfig,
        student_id: i64,
        year: i32,
    ) -> Result<AttendanceSummary, LedgerError>
    where
        S: AttendanceStore,
    {
        let records = store.query_year(student_id, year).await?;
        let summary = build_summary(student_id, year, &records, policy);

        if !summary.warnings.is_empty() {
            warn!(
                student_id,
                year,
                warnings = ?summary.warnings,
                "Attendance summary has policy warnings"
            );
        }

        Ok(summary)
    }
}
