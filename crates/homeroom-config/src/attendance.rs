//! Attendance policy configuration.
//!
//! Quota caps count distinct calendar days per student per calendar year.
//! The same values drive write-time enforcement and the overshoot warnings
//! in yearly summaries.
//!
//! # Environment Variables
//!
//! - `ATTENDANCE_DOMESTIC_CAP`: Annual cap for domestic external leave (default: 7)
//! - `ATTENDANCE_OVERSEAS_CAP`: Annual cap for overseas external leave (default: 30)

use crate::env_or;

pub const DEFAULT_DOMESTIC_CAP: i64 = 7;
pub const DEFAULT_OVERSEAS_CAP: i64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttendancePolicyConfig {
    /// Distinct days per year allowed for `EXTERNAL_DOMESTIC`.
    pub domestic_cap: i64,
    /// Distinct days per year allowed for `EXTERNAL_OVERSEAS`.
    pub overseas_cap: i64,
}

impl Default for AttendancePolicyConfig {
    fn default() -> Self {
        Self {
            domestic_cap: DEFAULT_DOMESTIC_CAP,
            overseas_cap: DEFAULT_OVERSEAS_CAP,
        }
    }
}

impl AttendancePolicyConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            domestic_cap: env_or("ATTENDANCE_DOMESTIC_CAP", DEFAULT_DOMESTIC_CAP).max(0),
            overseas_cap: env_or("ATTENDANCE_OVERSEAS_CAP", DEFAULT_OVERSEAS_CAP).max(0),
        }
    }
}
