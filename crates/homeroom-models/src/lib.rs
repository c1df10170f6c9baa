//! # Homeroom Models
//!
//! Domain models and DTOs for the Homeroom API.
//!
//! # Modules
//!
//! - [`attendance`]: Attendance records, categorical types, and yearly summaries
//! - [`students`]: Student records and the identity view used by attendance rules
//!
//! # Example
//!
//! ```ignore
//! use homeroom_models::attendance::{AttendanceReason, AttendanceType};
//!
//! let kind: AttendanceType = "early_leave".parse().unwrap();
//! assert_eq!(kind.as_str(), "early_leave");
//! assert_eq!(AttendanceReason::default(), AttendanceReason::Normal);
//! ```

/// Stores a string-backed enum in a Postgres text column.
///
/// The type must provide `as_str()` and `FromStr`.
macro_rules! impl_pg_text {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as sqlx::Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(
                value: <sqlx::Postgres as sqlx::Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
                Ok(s.parse::<$ty>()?)
            }
        }
    };
}

pub mod attendance;
pub mod students;

// Re-export commonly used types at crate root for convenience
pub use attendance::{
    AttendanceQueryParams, AttendanceReason, AttendanceRecord, AttendanceSummary,
    AttendanceType, CreateAttendanceDto, NewAttendanceRecord, SummaryQueryParams,
};

pub use students::{CreateStudentDto, Gender, Student, StudentIdentity, StudentQueryParams};
