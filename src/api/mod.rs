pub mod extract;
pub mod routes;

pub use routes::{router, ApiState};
