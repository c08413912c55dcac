//! API handlers module

pub mod articles;
pub mod auth;
pub mod checklists;
pub mod comments;
pub mod evaluations;
pub mod events;
pub mod files;
pub mod health;
pub mod publications;
pub mod users;

use serde::Deserialize;

/// Offset/limit query parameters shared by listing endpoints
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    20
}

impl Pagination {
    /// Clamp the page size to something the database can serve comfortably
    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, 100)
    }
}
