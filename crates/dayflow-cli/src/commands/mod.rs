//! Subcommands and the state file they share.
//!
//! Every command loads the planner state from a JSON snapshot, runs one
//! operation and writes the snapshot back if it changed anything.

pub mod backfill;
pub mod block;
pub mod chain;
pub mod config;
pub mod day;
pub mod gap;
pub mod pillar;
pub mod suggest;

use std::error::Error;
use std::path::PathBuf;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Args;
use dayflow_core::storage::{data_dir, parse_hhmm};
use dayflow_core::{Config, DayPlanner, PlannerSnapshot};

pub type CliResult<T = ()> = Result<T, Box<dyn Error>>;

#[derive(Args)]
pub struct GlobalOpts {
    /// Planner state file (default: <data dir>/planner.json)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Day to operate on (YYYY-MM-DD); becomes the current day
    #[arg(long, global = true)]
    pub date: Option<NaiveDate>,

    /// Override the current instant (RFC 3339)
    #[arg(long, global = true)]
    pub now: Option<DateTime<Utc>>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

/// A loaded planner plus where to write it back.
pub struct Session {
    pub planner: DayPlanner,
    pub now: DateTime<Utc>,
    pub json: bool,
    path: PathBuf,
}

impl Session {
    pub fn open(opts: &GlobalOpts) -> CliResult<Self> {
        let config = Config::load_or_default();
        let path = match &opts.state {
            Some(path) => path.clone(),
            None => data_dir()?.join("planner.json"),
        };
        let now = opts.now.unwrap_or_else(Utc::now);
        let local_today =
            (now + Duration::minutes(i64::from(config.day.utc_offset_minutes))).date_naive();

        let snapshot = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<PlannerSnapshot>(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no state file, starting empty");
                PlannerSnapshot::empty(local_today)
            }
            Err(e) => return Err(e.into()),
        };

        let mut planner = DayPlanner::from_snapshot(config, snapshot);
        if let Some(date) = opts.date {
            planner.switch_day(date);
        }

        Ok(Self {
            planner,
            now,
            json: opts.json,
            path,
        })
    }

    pub fn save(&self) -> CliResult {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.planner.snapshot())?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// `HH:MM` on the current day.
    pub fn at(&self, hhmm: &str) -> CliResult<DateTime<Utc>> {
        let time = parse_hhmm(hhmm).ok_or_else(|| format!("invalid time '{hhmm}', expected HH:MM"))?;
        Ok(self.planner.today().local_datetime(time))
    }

    /// Local `HH:MM` of an instant on the current day.
    pub fn clock(&self, instant: DateTime<Utc>) -> String {
        self.planner
            .today()
            .local_time_of(instant)
            .format("%H:%M")
            .to_string()
    }
}

/// Duration for a minutes argument, refusing counts chrono cannot hold.
pub fn minutes(count: i64) -> Result<Duration, String> {
    Duration::try_minutes(count).ok_or_else(|| format!("{count} minutes is out of range"))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
