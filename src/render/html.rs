//! Interactive chart as a standalone HTML page driven by plotly.js.

use crate::burndown::{Burndown, DailyBurndown, WeightedBurndown};
use core::fmt::{self, Write};
use serde_json::{json, Value};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

pub fn generate<W: Write>(burndown: &Burndown, title: &str, writer: &mut W) -> fmt::Result {
    let (traces, layout) = match burndown {
        Burndown::Daily(daily) => daily_figure(daily),
        Burndown::Weighted(weighted) => weighted_figure(weighted),
    };
    HtmlGenerator { writer, title }.generate(&traces, &layout)
}

struct HtmlGenerator<'a, W: Write> {
    writer: &'a mut W,
    title: &'a str,
}

impl<W: Write> HtmlGenerator<'_, W> {
    fn generate(&mut self, traces: &Value, layout: &Value) -> fmt::Result {
        writeln!(self.writer, "<!DOCTYPE html>")?;
        writeln!(self.writer, "<html lang=\"en\">")?;
        writeln!(self.writer, "<head>")?;
        writeln!(self.writer, "<meta charset=\"UTF-8\">")?;
        writeln!(
            self.writer,
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">"
        )?;
        writeln!(self.writer, "<title>{}</title>", html_escape(self.title))?;
        writeln!(self.writer, "<script src=\"{PLOTLY_CDN}\"></script>")?;
        writeln!(self.writer, "<style>")?;
        writeln!(self.writer, "body {{ margin: 0; font-family: sans-serif; }}")?;
        writeln!(self.writer, "#burndown {{ width: 100vw; height: 100vh; }}")?;
        writeln!(self.writer, "</style>")?;
        writeln!(self.writer, "</head>")?;
        writeln!(self.writer, "<body>")?;
        writeln!(self.writer, "<div id=\"burndown\"></div>")?;
        writeln!(self.writer, "<script>")?;
        writeln!(self.writer, "const traces = {};", script_json(traces))?;
        writeln!(self.writer, "const layout = {};", script_json(layout))?;
        writeln!(
            self.writer,
            "Plotly.newPlot('burndown', traces, layout, {{ responsive: true }});"
        )?;
        writeln!(self.writer, "</script>")?;
        writeln!(self.writer, "</body>")?;
        writeln!(self.writer, "</html>")?;
        Ok(())
    }
}

fn daily_figure(daily: &DailyBurndown) -> (Value, Value) {
    let dates: Vec<String> = daily
        .dates()
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();
    let trace = |name: &str, values: Value| {
        json!({
            "type": "scatter",
            "mode": "markers+lines",
            "line": { "shape": "spline" },
            "name": name,
            "x": dates,
            "y": values,
        })
    };
    let traces = json!([
        trace("Remaining", json!(daily.remaining())),
        trace("Total created", json!(daily.created())),
        trace("Total closed", json!(daily.closed())),
    ]);
    let layout = json!({
        "xaxis": { "title": { "text": "Date" } },
        "yaxis": { "title": { "text": "Issues" } },
        "hovermode": "x",
    });
    (traces, layout)
}

fn weighted_figure(weighted: &WeightedBurndown) -> (Value, Value) {
    let day = |d: chrono::NaiveDate| d.format("%Y-%m-%d").to_string();
    let traces = json!([
        {
            "type": "scatter",
            "mode": "lines",
            "name": "Ideal",
            "line": { "dash": "dash" },
            "x": [day(weighted.start_date), day(weighted.due_date)],
            "y": [weighted.total_weight, 0],
        },
        {
            "type": "scatter",
            "mode": "markers+lines",
            "name": "Remaining",
            "line": { "shape": "hv" },
            "x": weighted.points.iter().map(|p| day(p.date)).collect::<Vec<_>>(),
            "y": weighted.points.iter().map(|p| p.remaining_weight).collect::<Vec<_>>(),
        },
    ]);
    let layout = json!({
        "xaxis": {
            "title": { "text": "Date" },
            "tickformat": "%d/%m",
            "range": [day(weighted.start_date), day(weighted.due_date)],
        },
        "yaxis": {
            "title": { "text": "Weight" },
            "range": [0, weighted.total_weight],
        },
        "hovermode": "x",
        "annotations": [{
            "xref": "paper",
            "yref": "paper",
            "x": 1,
            "y": 1,
            "showarrow": false,
            "text": format!("open weight: {} / {}", weighted.open_weight, weighted.total_weight),
        }],
    });
    (traces, layout)
}

/// Serializes for inline `<script>` use; `</` would end the script element.
fn script_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
