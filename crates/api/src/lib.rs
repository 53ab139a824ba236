pub mod error;
pub mod routes;

pub use crate::routes::{build_router, ApiState};
