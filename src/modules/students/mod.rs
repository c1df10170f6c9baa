pub mod controller;
pub mod directory;
pub mod model;
pub mod router;
pub mod service;

pub use directory::{PgStudentDirectory, StudentDirectory};
pub use model::*;
pub use router::init_students_router;
