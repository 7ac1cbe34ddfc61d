// handlers/protected/mod.rs - Handlers behind the bearer auth middleware
//
// Every handler receives the resolved `Caller` from request extensions; owner
// checks happen in the services.
pub mod entries;
pub mod users;

pub use entries::{create as entry_create, delete as entry_delete, list as entry_list, update as entry_update};
pub use users::{dashboard_get, profile_get, profile_put, register_post};
