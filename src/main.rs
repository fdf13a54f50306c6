use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Select};
use gitlab_burndown::burndown::{daily, weighted, Burndown};
use gitlab_burndown::client::{Client, IssueFilter};
use gitlab_burndown::models::issue::parse_issues;
use gitlab_burndown::models::{Config, ConfigOverrides, Issue, Milestone, RawIssue};
use gitlab_burndown::{cache, render};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Cumulative created/closed/remaining issue counts per day
    Count,
    /// Remaining weight of one milestone, stepped at each closure
    Weight,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Generate a burndown chart for a GitLab project",
    long_about = None
)]
struct Args {
    /// Path to the config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GitLab host. Overrides config value
    #[arg(long)]
    host: Option<String>,

    /// Numeric project id. Overrides config value
    #[arg(long)]
    project_id: Option<u64>,

    /// Project path such as `group/project`. Overrides config value
    #[arg(long)]
    project_path: Option<String>,

    /// GitLab access token
    #[arg(short, long)]
    token: Option<String>,

    /// Fetch GitLab data even if the JSON cache exists
    #[arg(short, long)]
    fetch: bool,

    /// Path to the file with cached issues data
    #[arg(long, default_value = "issues.json")]
    json: PathBuf,

    /// Path to the interactive chart
    #[arg(long, default_value = "index.html")]
    html: PathBuf,

    /// Skip writing the interactive chart
    #[arg(long)]
    no_html: bool,

    /// Also write a static PNG chart to this path
    #[arg(long)]
    png: Option<PathBuf>,

    /// Burndown flavour
    #[arg(short, long, value_enum, default_value_t = Mode::Count)]
    mode: Mode,

    /// Milestone title to chart in weight mode
    #[arg(long)]
    milestone: Option<String>,

    /// Open the interactive chart in a browser
    #[arg(long)]
    open: bool,

    /// Write the merged configuration, including a resolved project id, back to
    /// the config file
    #[arg(long)]
    save_config: bool,

    /// Print the config file path
    #[clap(long, action)]
    config_path: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    if let Err(err) = run(args).await {
        eprintln!("{}: {:#}", "Error".red().bold(), err);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    if args.config_path {
        println!("{}", Config::file_path(args.config.as_deref())?.display());
        return Ok(());
    }

    let overrides = ConfigOverrides {
        host: args.host.clone(),
        project_id: args.project_id,
        project_path: args.project_path.clone(),
        access_token: args.token.clone(),
    };
    let overridden = !overrides.is_empty();
    let mut cfg = Config::load(args.config.as_deref())?;
    cfg.apply(overrides);

    // The cache always holds every project issue, whatever the mode.
    let raw = if args.fetch || !args.json.exists() {
        let client = connect(&args, cfg).await?;
        let raw = fetch(&client).await?;
        cache::write_issues(&args.json, &raw)?;
        raw
    } else {
        if args.save_config {
            let _ = connect(&args, cfg).await?;
        } else if overridden {
            log::warn!(
                "connection options are only used when fetching, reading {} as is \
                 (pass --fetch to refresh it)",
                args.json.display()
            );
        }
        cache::read_issues(&args.json)
            .with_context(|| format!("rerun with --fetch to rebuild {}", args.json.display()))?
    };
    let issues = parse_issues(raw)?;

    let (burndown, title): (Burndown, String) = match args.mode {
        Mode::Count => (daily::aggregate(&issues)?.into(), "Issue burndown".into()),
        Mode::Weight => {
            let today = Local::now().date_naive();
            let (milestone, members) =
                choose_milestone(issues, args.milestone.as_deref(), today)?;
            log::info!("charting milestone {milestone} with {} issues", members.len());
            (
                weighted::aggregate(&members)?.into(),
                format!("Burndown: {}", milestone.title),
            )
        }
    };

    if let Some(png) = &args.png {
        render::write_png(&burndown, &title, png, render::png::DEFAULT_SIZE)?;
    }

    if !args.no_html {
        render::write_html(&burndown, &title, &args.html)?;
        if args.open {
            let page = args
                .html
                .canonicalize()
                .with_context(|| format!("cannot locate {}", args.html.display()))?;
            webbrowser::open(&page.to_string_lossy())
                .with_context(|| format!("cannot open {} in a browser", page.display()))?;
        }
    }

    Ok(())
}

/// Builds the API client from the merged config. With `--save-config` the
/// project id is pinned and the config written back first.
async fn connect(args: &Args, mut cfg: Config) -> Result<Client> {
    let mut client = Client::new(&cfg.resolve()?)?;

    if args.save_config {
        let config_file = args.config.as_deref();
        client.pin_project_id(&mut cfg).await?;
        cfg.store(config_file)?;
        log::info!("saved configuration to {}", Config::file_path(config_file)?.display());
    }

    Ok(client)
}

async fn fetch(client: &Client) -> Result<Vec<RawIssue>> {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")?
            .tick_strings(&[
                "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "-",
            ]),
    );
    pb.set_message("Fetching issues...");

    let fetched = client
        .fetch_issues(&IssueFilter::all(), |page, total| {
            pb.set_message(format!("Fetching issues... page {page}, {total} so far"))
        })
        .await;

    match fetched {
        Ok(raw) => {
            pb.finish_with_message(format!("Fetched {} issues", raw.len()));
            Ok(raw)
        }
        Err(err) => {
            pb.abandon_with_message("Fetching issues failed");
            Err(err.into())
        }
    }
}

/// Picks the milestone to chart: by title, by prompt when several started
/// milestones are present and a terminal is attached, otherwise the largest.
fn choose_milestone(
    issues: Vec<Issue>,
    title: Option<&str>,
    today: NaiveDate,
) -> Result<(Milestone, Vec<Issue>)> {
    let mut groups = weighted::candidate_milestones(issues, title, today);

    if title.is_none() && groups.len() > 1 && std::io::stdout().is_terminal() {
        let items: Vec<String> = groups
            .iter()
            .map(|(milestone, members)| format!("{milestone} - {} issues", members.len()))
            .collect();
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Select a milestone:")
            .default(0)
            .items(&items)
            .interact()?;
        return Ok(groups.swap_remove(selection));
    }

    let picked = weighted::pick_milestone(groups, title)?;
    if title.is_none() {
        log::info!("using milestone {}", picked.0);
    }
    Ok(picked)
}
