pub mod config;
pub mod issue;
pub mod weight;

pub use config::{Config, ConfigOverrides, ProjectRef, ResolvedConfig};
pub use issue::{Issue, IssueState, Milestone, RawIssue, RawMilestone};
