/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Kind of access a request needs on an owner's data.
/// Reads and writes are authorized differently by the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    Read,
    Write,
}
