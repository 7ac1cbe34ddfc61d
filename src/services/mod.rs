pub mod dashboard_service;
pub mod entry_service;
pub mod profile_service;

pub use dashboard_service::{DashboardService, DashboardSummary};
pub use entry_service::EntryService;
pub use profile_service::{ProfileService, Registration};
