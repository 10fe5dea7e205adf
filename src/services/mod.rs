//! Business logic services.
//!
//! This module contains the reviewer-assignment engine and the services
//! built around it. Services only talk to storage through [`crate::db::Store`]
//! and are independent of the HTTP layer.

pub mod pull_requests;
pub mod reviewer_picker;
pub mod stats;
pub mod teams;
pub mod users;

pub use pull_requests::PullRequestService;
pub use reviewer_picker::{RandomPicker, ReviewerPicker};
pub use stats::StatsService;
pub use teams::TeamService;
pub use users::UserService;
