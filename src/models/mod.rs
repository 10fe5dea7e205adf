//! Data models for the application.
//!
//! These models represent the entities stored in the SQLite database and the
//! JSON shapes exchanged with HTTP clients.
//!
//! Row models derive `FromRow` for SQLx queries; everything serializes with serde.

pub mod pull_request;
pub mod stats;
pub mod team;
pub mod user;

// Re-exports for convenient access
pub use pull_request::{
    NewPullRequest, PullRequest, PullRequestRow, PullRequestShort, PullRequestStatus,
};
pub use stats::{PrAssignmentStats, Stats, UserAssignmentStats};
pub use team::{Team, TeamMember};
pub use user::{
    BulkDeactivateError, BulkDeactivateResponse, ReassignOutcome, ReassignStatus, User,
    UserReviews,
};
