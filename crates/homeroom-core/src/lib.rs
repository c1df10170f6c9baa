//! # Homeroom Core
//!
//! Core types shared by every Homeroom crate.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//!
//! # Example
//!
//! ```ignore
//! use homeroom_core::errors::AppError;
//!
//! let error = AppError::not_found(anyhow::anyhow!("Student not found"))
//!     .with_kind("student_not_found");
//! ```

pub mod errors;

// Re-export commonly used types at crate root
pub use errors::AppError;
