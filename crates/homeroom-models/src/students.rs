//! Student domain models and DTOs.
//!
//! Attendance rules only need a student's identity and gender, exposed
//! through [`StudentIdentity`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown gender '{0}', expected 'M' or 'F'")]
pub struct ParseGenderError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M => "M",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ParseGenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Self::M),
            "F" => Ok(Self::F),
            other => Err(ParseGenderError(other.to_string())),
        }
    }
}

impl_pg_text!(Gender);

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: i64,
    pub student_no: String,
    pub name: String,
    pub grade: i32,
    pub class_no: i32,
    pub number: i32,
    pub gender: Gender,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The read-only view of a student consumed by attendance rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudentIdentity {
    pub id: i64,
    pub gender: Gender,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStudentDto {
    #[validate(length(min = 1, max = 20, message = "student_no must be 1-20 characters"))]
    pub student_no: String,
    #[validate(length(min = 1, max = 50, message = "name must be 1-50 characters"))]
    pub name: String,
    #[validate(range(min = 1, message = "grade must be positive"))]
    pub grade: i32,
    #[validate(range(min = 1, message = "class_no must be positive"))]
    pub class_no: i32,
    #[validate(range(min = 1, message = "number must be positive"))]
    pub number: i32,
    pub gender: Gender,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct StudentQueryParams {
    pub grade: Option<i32>,
    pub class_no: Option<i32>,
}
