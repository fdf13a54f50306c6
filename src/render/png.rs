//! Static raster chart drawn with plotters.

use crate::burndown::{Burndown, DailyBurndown, WeightedBurndown};
use crate::error::{BurndownError, Result};
use chrono::{Duration, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

pub const DEFAULT_SIZE: (u32, u32) = (1024, 640);

fn render_err<E: std::fmt::Display>(err: E) -> BurndownError {
    BurndownError::Render(err.to_string())
}

pub fn write_png(burndown: &Burndown, title: &str, path: &Path, size: (u32, u32)) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    match burndown {
        Burndown::Daily(daily) => draw_daily(&root, daily, title)?,
        Burndown::Weighted(weighted) => draw_weighted(&root, weighted, title)?,
    }
    root.present().map_err(render_err)?;
    log::info!("wrote chart image {}", path.display());
    Ok(())
}

/// Widens a one-day range so the date axis is not degenerate.
fn date_range(first: NaiveDate, last: NaiveDate) -> (NaiveDate, NaiveDate) {
    let (lo, hi) = (first.min(last), first.max(last));
    if lo == hi {
        (lo, hi + Duration::days(1))
    } else {
        (lo, hi)
    }
}

/// Y bounds covering every series, with the zero line always visible.
fn count_bounds(daily: &DailyBurndown) -> (i64, i64) {
    let values = daily
        .buckets()
        .iter()
        .flat_map(|b| [b.created_count as i64, b.closed_count as i64, b.remaining_count]);
    let (lo, hi) = values.fold((0, 0), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (lo, hi + 1)
}

fn draw_daily<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    daily: &DailyBurndown,
    title: &str,
) -> Result<()> {
    let (start, end) = date_range(daily.first_date(), daily.last_date());
    let (y_lo, y_hi) = count_bounds(daily);

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(48)
        .build_cartesian_2d(start..end, y_lo..y_hi)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_labels(10)
        .x_label_formatter(&|d: &NaiveDate| d.format("%d/%m").to_string())
        .x_desc("Date")
        .y_desc("Issues")
        .draw()
        .map_err(render_err)?;

    let series: [(&str, RGBColor, Vec<(NaiveDate, i64)>); 3] = [
        (
            "Remaining",
            RED,
            daily.buckets().iter().map(|b| (b.date, b.remaining_count)).collect(),
        ),
        (
            "Total created",
            BLUE,
            daily.buckets().iter().map(|b| (b.date, b.created_count as i64)).collect(),
        ),
        (
            "Total closed",
            GREEN,
            daily.buckets().iter().map(|b| (b.date, b.closed_count as i64)).collect(),
        ),
    ];
    for (name, color, points) in series {
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
            .map_err(render_err)?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart
            .draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))
            .map_err(render_err)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;
    Ok(())
}

fn draw_weighted<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    weighted: &WeightedBurndown,
    title: &str,
) -> Result<()> {
    let (start, end) = date_range(weighted.start_date, weighted.due_date);
    let total = weighted.total_weight as i64;

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(48)
        .build_cartesian_2d(start..end, 0..total.max(1))
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_labels(10)
        .x_label_formatter(&|d: &NaiveDate| d.format("%d/%m").to_string())
        .x_desc("Date")
        .y_desc("Weight")
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(LineSeries::new(
            [(weighted.start_date, total), (weighted.due_date, 0)],
            BLUE.stroke_width(2),
        ))
        .map_err(render_err)?
        .label("Ideal")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    let actual: Vec<(NaiveDate, i64)> = weighted
        .points
        .iter()
        .map(|p| (p.date, p.remaining_weight as i64))
        .collect();
    chart
        .draw_series(LineSeries::new(actual.iter().copied(), RED.stroke_width(2)))
        .map_err(render_err)?
        .label(format!("Remaining (open {})", weighted.open_weight))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
    chart
        .draw_series(actual.iter().map(|&p| Circle::new(p, 4, RED.filled())))
        .map_err(render_err)?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burndown::{daily, WeightedPoint};
    use crate::models::{Issue, RawIssue};

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn single_day_range_is_widened() {
        assert_eq!(
            date_range(day("2024-01-01"), day("2024-01-01")),
            (day("2024-01-01"), day("2024-01-02"))
        );
        assert_eq!(
            date_range(day("2024-01-31"), day("2024-01-01")),
            (day("2024-01-01"), day("2024-01-31"))
        );
    }

    #[test]
    fn bounds_include_negative_remaining() {
        let issue = Issue::try_from(RawIssue {
            iid: 1,
            title: String::new(),
            state: Some("closed".into()),
            created_at: Some("2024-01-05T00:00:00Z".into()),
            closed_at: Some("2024-01-02T00:00:00Z".into()),
            labels: vec![],
            milestone: None,
        })
        .unwrap();
        let burndown = daily::aggregate(&[issue]).unwrap();
        assert_eq!(count_bounds(&burndown), (-1, 2));
    }

    fn assert_png_written(burndown: &Burndown, name: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        write_png(burndown, "Burndown", &path, (320, 200)).unwrap();
        let written = std::fs::metadata(&path).unwrap();
        assert!(written.is_file());
        assert!(written.len() > 0);
    }

    #[test]
    fn daily_chart_is_written() {
        let raw = |iid: u64, created: &str, closed: Option<&str>| RawIssue {
            iid,
            title: format!("issue {iid}"),
            state: Some(if closed.is_some() { "closed" } else { "opened" }.into()),
            created_at: Some(created.into()),
            closed_at: closed.map(str::to_string),
            labels: vec![],
            milestone: None,
        };
        let issues = [
            Issue::try_from(raw(1, "2024-01-01T10:00:00Z", Some("2024-01-03T10:00:00Z"))).unwrap(),
            Issue::try_from(raw(2, "2024-01-02T10:00:00Z", None)).unwrap(),
        ];
        let burndown: Burndown = daily::aggregate(&issues).unwrap().into();
        assert_png_written(&burndown, "daily.png");
    }

    #[test]
    fn weighted_chart_is_written() {
        let burndown: Burndown = WeightedBurndown {
            start_date: day("2024-01-01"),
            due_date: day("2024-01-14"),
            total_weight: 13,
            open_weight: 5,
            points: vec![
                WeightedPoint {
                    date: day("2024-01-01"),
                    remaining_weight: 13,
                },
                WeightedPoint {
                    date: day("2024-01-08"),
                    remaining_weight: 5,
                },
            ],
        }
        .into();
        assert_png_written(&burndown, "weighted.png");
    }

    #[test]
    fn one_day_weightless_milestone_is_written() {
        let burndown: Burndown = WeightedBurndown {
            start_date: day("2024-01-01"),
            due_date: day("2024-01-01"),
            total_weight: 0,
            open_weight: 0,
            points: vec![WeightedPoint {
                date: day("2024-01-01"),
                remaining_weight: 0,
            }],
        }
        .into();
        assert_png_written(&burndown, "flat.png");
    }
}
