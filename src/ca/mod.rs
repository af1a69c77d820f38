pub mod client;
pub mod config;
pub mod types;

pub use client::{CaClient, IssueError};
pub use config::CaConfig;
pub use types::IssuanceResult;
