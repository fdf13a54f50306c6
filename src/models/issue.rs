use crate::error::{BurndownError, Result};
use crate::models::weight::derive_weight;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use core::fmt;
use serde::{Deserialize, Serialize};

/// Issue as listed by the GitLab issues API.
///
/// Everything except `iid` is optional here; [`Issue::try_from`] decides
/// what is required. Unknown fields are ignored since the API returns many.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RawIssue {
    pub iid: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub milestone: Option<RawMilestone>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RawMilestone {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    /// `active` or `closed`
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Opened,
    Closed,
}

/// Milestone reference carried by an issue. Dates stay optional until a
/// weighted burndown actually needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    pub id: u64,
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub closed: bool,
}

impl Milestone {
    /// Open and already begun on `today`, as GitLab's `milestone_id=Started`.
    pub fn is_started(&self, today: NaiveDate) -> bool {
        !self.closed && self.start_date.is_some_and(|start| start <= today)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub id: u64,
    pub title: String,
    pub state: IssueState,
    pub created_at: DateTime<FixedOffset>,
    pub closed_at: Option<DateTime<FixedOffset>>,
    pub labels: Vec<String>,
    pub milestone: Option<Milestone>,
    pub weight: Option<u32>,
}

impl Issue {
    /// Calendar day of creation, in the timestamp's own offset.
    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    pub fn closed_on(&self) -> Option<NaiveDate> {
        self.closed_at.map(|at| at.date_naive())
    }

    pub fn is_closed(&self) -> bool {
        self.state == IssueState::Closed
    }
}

impl TryFrom<RawIssue> for Issue {
    type Error = BurndownError;

    fn try_from(raw: RawIssue) -> Result<Self> {
        let id = raw.iid;

        let created_at = match raw.created_at.as_deref() {
            Some(value) => parse_timestamp(id, "created_at", value)?,
            None => return Err(BurndownError::malformed(id, "created_at", "missing")),
        };
        let closed_at = raw
            .closed_at
            .as_deref()
            .map(|value| parse_timestamp(id, "closed_at", value))
            .transpose()?;

        let state = match raw.state.as_deref() {
            Some("opened") => IssueState::Opened,
            Some("closed") => IssueState::Closed,
            Some(other) => {
                return Err(BurndownError::malformed(
                    id,
                    "state",
                    format!("unknown state {other:?}"),
                ))
            }
            None if closed_at.is_some() => IssueState::Closed,
            None => IssueState::Opened,
        };

        if let Some(closed) = closed_at {
            if closed < created_at {
                log::warn!(
                    "issue #{id} was closed ({closed}) before it was created ({created_at})"
                );
            }
        }

        let milestone = raw
            .milestone
            .map(|m| -> Result<Milestone> {
                Ok(Milestone {
                    id: m.id,
                    start_date: m
                        .start_date
                        .as_deref()
                        .map(|d| parse_date(id, "milestone.start_date", d))
                        .transpose()?,
                    due_date: m
                        .due_date
                        .as_deref()
                        .map(|d| parse_date(id, "milestone.due_date", d))
                        .transpose()?,
                    closed: m.state.as_deref() == Some("closed"),
                    title: m.title,
                })
            })
            .transpose()?;

        let weight = derive_weight(&raw.labels, &raw.title);
        log::debug!("issue #{id}: state {state:?}, weight {weight:?}");

        Ok(Self {
            id,
            title: raw.title,
            state,
            created_at,
            closed_at,
            labels: raw.labels,
            milestone,
            weight,
        })
    }
}

/// Validates a batch of raw records, failing on the first malformed one.
pub fn parse_issues(raw: Vec<RawIssue>) -> Result<Vec<Issue>> {
    raw.into_iter().map(Issue::try_from).collect()
}

fn parse_timestamp(id: u64, field: &'static str, value: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at);
    }
    // Offset-less timestamps are taken as UTC.
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|err| BurndownError::malformed(id, field, format!("{value:?}: {err}")))
}

fn parse_date(id: u64, field: &'static str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| BurndownError::malformed(id, field, format!("{value:?}: {err}")))
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(Issue {}: {})", self.id, self.title)
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if let (Some(start), Some(due)) = (self.start_date, self.due_date) {
            write!(f, " ({start} .. {due})")?;
        }
        Ok(())
    }
}
