//! Durable storage for attendance records.
//!
//! [`AttendanceStore`] is the seam between the ledger and persistence.
//! [`PgAttendanceStore`] backs it with the `attendances` table, whose
//! `(student_id, date, type)` unique constraint is the final guard against
//! concurrent duplicate submissions.

use chrono::NaiveDate;
use sqlx::PgPool;
use std::future::Future;
use tracing::instrument;

use crate::modules::attendance::model::{
    AttendanceReason, AttendanceRecord, AttendanceType, NewAttendanceRecord,
};
use crate::modules::attendance::policy::year_bounds;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("attendance record of type {kind} already exists for student {student_id} on {date}")]
    Conflict {
        student_id: i64,
        date: NaiveDate,
        kind: AttendanceType,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub trait AttendanceStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when `(student_id, date, type)` is taken.
    fn insert(
        &self,
        record: NewAttendanceRecord,
    ) -> impl Future<Output = Result<AttendanceRecord, StoreError>> + Send;

    /// Records within the inclusive range, ordered by date then type.
    fn query_range(
        &self,
        student_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> impl Future<Output = Result<Vec<AttendanceRecord>, StoreError>> + Send;

    fn query_year(
        &self,
        student_id: i64,
        year: i32,
    ) -> impl Future<Output = Result<Vec<AttendanceRecord>, StoreError>> + Send;

    fn count_distinct_dates_by_reason(
        &self,
        student_id: i64,
        year: i32,
        reason: AttendanceReason,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;

    fn exists_on_date(
        &self,
        student_id: i64,
        date: NaiveDate,
        reason: AttendanceReason,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

const RECORD_COLUMNS: &str = "id, student_id, date, type, reason, periods, note, created_at";

#[derive(Clone, Debug)]
pub struct PgAttendanceStore {
    db: PgPool,
}

impl PgAttendanceStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

impl AttendanceStore for PgAttendanceStore {
    #[instrument(skip(self))]
    async fn insert(&self, record: NewAttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        let query = format!(
            r#"INSERT INTO attendances (student_id, date, type, reason, periods, note)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {RECORD_COLUMNS}"#
        );

        sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(record.student_id)
            .bind(record.date)
            .bind(record.kind)
            .bind(record.reason)
            .bind(record.periods)
            .bind(&record.note)
            .fetch_one(&self.db)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e
                    && db_err.is_unique_violation()
                {
                    return StoreError::Conflict {
                        student_id: record.student_id,
                        date: record.date,
                        kind: record.kind,
                    };
                }
                StoreError::from(e)
            })
    }

    #[instrument(skip(self))]
    async fn query_range(
        &self,
        student_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let query = format!(
            r#"SELECT {RECORD_COLUMNS}
               FROM attendances
               WHERE student_id = $1
                 AND ($2::date IS NULL OR date >= $2)
                 AND ($3::date IS NULL OR date <= $3)
               ORDER BY date ASC, type ASC"#
        );

        let records = sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(student_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.db)
            .await?;

        Ok(records)
    }

    #[instrument(skip(self))]
    async fn query_year(
        &self,
        student_id: i64,
        year: i32,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let Some((first, last)) = year_bounds(year) else {
            return Ok(Vec::new());
        };

        let query = format!(
            r#"SELECT {RECORD_COLUMNS}
               FROM attendances
               WHERE student_id = $1 AND date BETWEEN $2 AND $3"#
        );

        let records = sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(student_id)
            .bind(first)
            .bind(last)
            .fetch_all(&self.db)
            .await?;

        Ok(records)
    }

    #[instrument(skip(self))]
    async fn count_distinct_dates_by_reason(
        &self,
        student_id: i64,
        year: i32,
        reason: AttendanceReason,
    ) -> Result<i64, StoreError> {
        let Some((first, last)) = year_bounds(year) else {
            return Ok(0);
        };

        let count = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(DISTINCT date)
               FROM attendances
               WHERE student_id = $1 AND reason = $2 AND date BETWEEN $3 AND $4"#,
        )
        .bind(student_id)
        .bind(reason)
        .bind(first)
        .bind(last)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    #[instrument(skip(self))]
    async fn exists_on_date(
        &self,
        student_id: i64,
        date: NaiveDate,
        reason: AttendanceReason,
    ) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                   SELECT 1 FROM attendances
                   WHERE student_id = $1 AND date = $2 AND reason = $3
               )"#,
        )
        .bind(student_id)
        .bind(date)
        .bind(reason)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }
}
