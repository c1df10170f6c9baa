//! Attendance data models and DTOs.
//!
//! Re-exports the attendance models from the `homeroom-models` crate along
//! with the student identity view the attendance rules depend on.

pub use homeroom_models::attendance::*;
pub use homeroom_models::students::{Gender, StudentIdentity};
