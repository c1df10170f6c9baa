pub mod controller;
pub mod model;
pub mod policy;
pub mod router;
pub mod service;
pub mod store;
pub mod summary;

pub use model::*;
pub use router::init_attendance_router;
