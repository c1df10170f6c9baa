//! Student data models and DTOs.
//!
//! Re-exports the student models from the `homeroom-models` crate.

pub use homeroom_models::students::*;
