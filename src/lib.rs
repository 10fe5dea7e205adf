//! PR Reviewers - reviewer assignment and consistency engine.
//!
//! Assigns code reviewers to pull requests within a team, reassigns them on
//! request, and keeps assignments consistent when users are deactivated.
//! The engine lives in [`services`]; [`server`] exposes it over HTTP.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod server;
pub mod services;

pub use config::AppConfig;
pub use error::AppError;
