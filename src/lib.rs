//! Burndown charts from GitLab issues.
//!
//! The pipeline is linear: [`client::Client`] pages through the project's
//! issues (or [`cache`] reads an earlier dump), [`models::issue`] validates
//! each record, [`burndown`] aggregates them into a daily count series or a
//! milestone weight curve, and [`render`] draws the result as HTML and PNG.

pub mod burndown;
pub mod cache;
pub mod client;
pub mod error;
pub mod models;
pub mod render;

pub use error::{BurndownError, Result};
