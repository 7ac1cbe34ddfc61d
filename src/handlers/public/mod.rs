// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service discovery and health checks used by deployments and frontend developers.
pub mod health;
pub mod root;

pub use health::get as health_get;
pub use root::{root_get, routes_get};
