//! Weight-based milestone burndown.

use crate::error::{BurndownError, Result};
use crate::models::{Issue, IssueState, Milestone};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightedPoint {
    pub date: NaiveDate,
    pub remaining_weight: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedBurndown {
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub total_weight: u64,
    pub open_weight: u64,
    /// Starts at `(start_date, total_weight)`, then one step per closed issue.
    pub points: Vec<WeightedPoint>,
}

fn weight_of(issue: &Issue) -> u64 {
    match issue.weight {
        Some(weight) => u64::from(weight),
        None => {
            log::debug!("{issue} has no weight, counting it as 0");
            0
        }
    }
}

/// Builds the remaining-weight step curve of one milestone.
///
/// Milestone dates are read from the first issue. Closures on the same day
/// keep their input order.
pub fn aggregate(issues: &[Issue]) -> Result<WeightedBurndown> {
    let first = issues.first().ok_or(BurndownError::EmptyInput)?;
    let milestone = first
        .milestone
        .as_ref()
        .ok_or_else(|| BurndownError::malformed(first.id, "milestone", "missing"))?;
    let start_date = milestone
        .start_date
        .ok_or_else(|| BurndownError::malformed(first.id, "milestone.start_date", "missing"))?;
    let due_date = milestone
        .due_date
        .ok_or_else(|| BurndownError::malformed(first.id, "milestone.due_date", "missing"))?;

    let total_weight: u64 = issues.iter().map(weight_of).sum();
    let open_weight: u64 = issues
        .iter()
        .filter(|issue| issue.state == IssueState::Opened)
        .map(weight_of)
        .sum();

    let mut closures = issues
        .iter()
        .filter(|issue| issue.is_closed())
        .map(|issue| {
            issue
                .closed_on()
                .map(|day| (day, weight_of(issue)))
                .ok_or_else(|| {
                    BurndownError::malformed(
                        issue.id,
                        "closed_at",
                        "closed issue without a closing time",
                    )
                })
        })
        .collect::<Result<Vec<_>>>()?;
    // Vec::sort_by_key is stable.
    closures.sort_by_key(|&(day, _)| day);

    let mut remaining = total_weight;
    let mut points = Vec::with_capacity(closures.len() + 1);
    points.push(WeightedPoint {
        date: start_date,
        remaining_weight: total_weight,
    });
    for (date, weight) in closures {
        remaining -= weight;
        points.push(WeightedPoint {
            date,
            remaining_weight: remaining,
        });
    }

    log::debug!(
        "weighted burndown: {start_date} .. {due_date}, total {total_weight}, \
         open {open_weight}, {} steps",
        points.len()
    );
    Ok(WeightedBurndown {
        start_date,
        due_date,
        total_weight,
        open_weight,
        points,
    })
}

/// Splits issues by milestone, in order of first appearance. Issues without
/// a milestone are dropped.
pub fn group_by_milestone(issues: Vec<Issue>) -> Vec<(Milestone, Vec<Issue>)> {
    let mut groups: Vec<(Milestone, Vec<Issue>)> = Vec::new();
    for issue in issues {
        let Some(milestone) = issue.milestone.clone() else {
            log::debug!("{issue} has no milestone, skipping");
            continue;
        };
        match groups.iter_mut().find(|(m, _)| m.id == milestone.id) {
            Some((_, members)) => members.push(issue),
            None => groups.push((milestone, vec![issue])),
        }
    }
    groups
}

/// Milestones a weighted burndown may chart, with their issues.
///
/// A milestone asked for by title is always a candidate. Otherwise only
/// milestones that are open and have started by `today` are kept, so a cache
/// of all project issues yields the same choice as a `milestone_id=Started`
/// listing would.
pub fn candidate_milestones(
    issues: Vec<Issue>,
    title: Option<&str>,
    today: NaiveDate,
) -> Vec<(Milestone, Vec<Issue>)> {
    let mut groups = group_by_milestone(issues);
    if title.is_none() {
        groups.retain(|(milestone, _)| {
            let started = milestone.is_started(today);
            if !started {
                log::debug!("milestone {milestone} has not started or is closed, skipping");
            }
            started
        });
    }
    groups
}

/// Picks the milestone named `title`, or the one with the most issues.
pub fn pick_milestone(
    mut groups: Vec<(Milestone, Vec<Issue>)>,
    title: Option<&str>,
) -> Result<(Milestone, Vec<Issue>)> {
    if groups.is_empty() {
        return Err(BurndownError::EmptyInput);
    }
    let index = match title {
        Some(title) => groups
            .iter()
            .position(|(m, _)| m.title == title)
            .ok_or_else(|| {
                BurndownError::Configuration(format!(
                    "no milestone named {title:?} among fetched issues"
                ))
            })?,
        // Strict comparison keeps the first of equally sized groups.
        None => groups.iter().enumerate().fold(0, |best, (i, (_, members))| {
            if members.len() > groups[best].1.len() {
                i
            } else {
                best
            }
        }),
    };
    Ok(groups.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawIssue, RawMilestone};

    fn milestone(id: u64, title: &str) -> RawMilestone {
        RawMilestone {
            id,
            title: title.into(),
            start_date: Some("2024-01-01".into()),
            due_date: Some("2024-01-31".into()),
            state: Some("active".into()),
        }
    }

    fn issue(id: u64, labels: &[&str], closed: Option<&str>) -> Issue {
        Issue::try_from(RawIssue {
            iid: id,
            title: format!("task {id}"),
            state: Some(if closed.is_some() { "closed" } else { "opened" }.into()),
            created_at: Some("2024-01-01T09:00:00Z".into()),
            closed_at: closed.map(|d| format!("{d}T15:00:00Z")),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            milestone: Some(milestone(1, "Sprint 1")),
        })
        .unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn open_milestone_has_only_the_start_point() {
        let issues = [issue(1, &["3"], None), issue(2, &["5"], None)];
        let burndown = aggregate(&issues).unwrap();
        assert_eq!(burndown.start_date, day("2024-01-01"));
        assert_eq!(burndown.due_date, day("2024-01-31"));
        assert_eq!(burndown.total_weight, 8);
        assert_eq!(burndown.open_weight, 8);
        assert_eq!(
            burndown.points,
            vec![WeightedPoint {
                date: day("2024-01-01"),
                remaining_weight: 8
            }]
        );
    }

    #[test]
    fn closures_step_down_in_date_order() {
        let issues = [
            issue(1, &["8"], Some("2024-01-10")),
            issue(2, &["3"], Some("2024-01-04")),
            issue(3, &["5"], None),
            issue(4, &["2"], Some("2024-01-10")),
        ];
        let burndown = aggregate(&issues).unwrap();
        assert_eq!(burndown.total_weight, 18);
        assert_eq!(burndown.open_weight, 5);
        let steps: Vec<_> = burndown
            .points
            .iter()
            .map(|p| (p.date, p.remaining_weight))
            .collect();
        assert_eq!(
            steps,
            vec![
                (day("2024-01-01"), 18),
                (day("2024-01-04"), 15),
                (day("2024-01-10"), 7),
                (day("2024-01-10"), 5),
            ]
        );
        for pair in burndown.points.windows(2) {
            assert!(pair[0].remaining_weight >= pair[1].remaining_weight);
        }
    }

    #[test]
    fn same_day_closures_keep_input_order() {
        let issues = [
            issue(1, &["2"], Some("2024-01-05")),
            issue(2, &["13"], Some("2024-01-05")),
        ];
        let remaining: Vec<_> = aggregate(&issues)
            .unwrap()
            .points
            .iter()
            .map(|p| p.remaining_weight)
            .collect();
        assert_eq!(remaining, vec![15, 13, 0]);
    }

    #[test]
    fn unweighted_issues_count_as_zero() {
        let issues = [issue(1, &["bug"], Some("2024-01-02")), issue(2, &["5"], None)];
        let burndown = aggregate(&issues).unwrap();
        assert_eq!(burndown.total_weight, 5);
        assert_eq!(burndown.points.last().unwrap().remaining_weight, 5);
    }

    #[test]
    fn empty_milestone_fails() {
        assert!(matches!(aggregate(&[]), Err(BurndownError::EmptyInput)));
    }

    #[test]
    fn missing_milestone_dates_are_malformed() {
        let mut first = issue(1, &["3"], None);
        first.milestone.as_mut().unwrap().due_date = None;
        let err = aggregate(&[first]).unwrap_err();
        assert!(matches!(
            err,
            BurndownError::MalformedRecord { id: 1, field: "milestone.due_date", .. }
        ));
    }

    #[test]
    fn closed_without_timestamp_is_malformed() {
        let mut closed = issue(2, &["3"], Some("2024-01-02"));
        closed.closed_at = None;
        let err = aggregate(&[issue(1, &["1"], None), closed]).unwrap_err();
        assert!(matches!(
            err,
            BurndownError::MalformedRecord { id: 2, field: "closed_at", .. }
        ));
    }

    #[test]
    fn start_point_precedes_early_closures() {
        let issues = [issue(1, &["3"], Some("2023-12-28"))];
        let burndown = aggregate(&issues).unwrap();
        assert_eq!(burndown.points[0].date, day("2024-01-01"));
        assert_eq!(burndown.points[0].remaining_weight, 3);
        assert_eq!(burndown.points[1].remaining_weight, 0);
    }

    fn in_milestone(mut issue: Issue, id: u64, title: &str) -> Issue {
        issue.milestone = Some(Milestone {
            id,
            title: title.into(),
            start_date: Some(day("2024-01-01")),
            due_date: Some(day("2024-01-31")),
            closed: false,
        });
        issue
    }

    #[test]
    fn grouping_keeps_first_seen_order_and_drops_unassigned() {
        let mut loose = issue(9, &[], None);
        loose.milestone = None;
        let issues = vec![
            in_milestone(issue(1, &[], None), 20, "B"),
            in_milestone(issue(2, &[], None), 10, "A"),
            in_milestone(issue(3, &[], None), 20, "B"),
            loose,
        ];
        let groups = group_by_milestone(issues);
        let summary: Vec<_> = groups
            .iter()
            .map(|(m, members)| (m.title.as_str(), members.len()))
            .collect();
        assert_eq!(summary, vec![("B", 2), ("A", 1)]);
    }

    #[test]
    fn picking_by_title_or_size() {
        let groups = || {
            group_by_milestone(vec![
                in_milestone(issue(1, &[], None), 10, "A"),
                in_milestone(issue(2, &[], None), 20, "B"),
                in_milestone(issue(3, &[], None), 20, "B"),
                in_milestone(issue(4, &[], None), 30, "C"),
                in_milestone(issue(5, &[], None), 30, "C"),
            ])
        };
        assert_eq!(pick_milestone(groups(), Some("A")).unwrap().0.title, "A");
        assert_eq!(pick_milestone(groups(), None).unwrap().0.title, "B");
        assert!(matches!(
            pick_milestone(groups(), Some("Z")),
            Err(BurndownError::Configuration(_))
        ));
        assert!(matches!(pick_milestone(Vec::new(), None), Err(BurndownError::EmptyInput)));
    }

    #[test]
    fn only_started_milestones_are_candidates_without_a_title() {
        let mut finished = in_milestone(issue(1, &["8"], None), 10, "Old");
        finished.milestone.as_mut().unwrap().closed = true;
        let mut upcoming = in_milestone(issue(2, &["3"], None), 30, "Next");
        upcoming.milestone.as_mut().unwrap().start_date = Some(day("2024-02-01"));
        let issues = vec![
            finished,
            in_milestone(issue(3, &["5"], None), 20, "Now"),
            upcoming,
        ];
        let today = day("2024-01-15");

        let titles = |groups: Vec<(Milestone, Vec<Issue>)>| {
            groups.into_iter().map(|(m, _)| m.title).collect::<Vec<_>>()
        };
        assert_eq!(titles(candidate_milestones(issues.clone(), None, today)), vec!["Now"]);
        assert_eq!(
            titles(candidate_milestones(issues, Some("Old"), today)),
            vec!["Old", "Now", "Next"]
        );
    }
}
