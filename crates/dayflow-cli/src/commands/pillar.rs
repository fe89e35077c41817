use chrono::Timelike;
use clap::Subcommand;
use dayflow_core::storage::parse_hhmm;
use dayflow_core::suggestion::parse_cadence;
use dayflow_core::{Cadence, Pillar, TimeWindow};

use super::{print_json, CliResult, GlobalOpts, Session};

#[derive(Subcommand)]
pub enum PillarAction {
    /// Add a pillar to the library
    Add {
        /// Pillar name
        name: String,
        /// Cadence, e.g. "daily", "3 times a week", "monthly", "as needed"
        #[arg(long, value_parser = parse_cadence_arg, default_value = "weekly")]
        cadence: Cadence,
        /// Minimum duration in minutes
        #[arg(long, default_value_t = 30)]
        min: i64,
        /// Maximum duration in minutes
        #[arg(long, default_value_t = 60)]
        max: i64,
        /// Preferred window HH:MM-HH:MM (repeatable, in priority order)
        #[arg(long = "prefer", value_parser = parse_window)]
        preferred: Vec<TimeWindow>,
        /// Quiet hours HH:MM-HH:MM (repeatable)
        #[arg(long = "quiet", value_parser = parse_window)]
        quiet: Vec<TimeWindow>,
    },
    /// List library pillars
    List,
    /// Pillars that are due now, most overdue first
    Due,
    /// Best free slot for a pillar on the current day
    Slot {
        /// Pillar ID
        id: String,
    },
    /// Place a tentative block for a pillar on the current day
    Schedule {
        /// Pillar ID
        id: String,
    },
}

fn parse_cadence_arg(value: &str) -> Result<Cadence, String> {
    parse_cadence(value).ok_or_else(|| format!("unrecognised cadence '{value}'"))
}

fn parse_window(value: &str) -> Result<TimeWindow, String> {
    let (start, end) = value
        .split_once('-')
        .ok_or_else(|| format!("invalid window '{value}', expected HH:MM-HH:MM"))?;
    let start = parse_hhmm(start.trim()).ok_or_else(|| format!("invalid start in '{value}'"))?;
    let end = parse_hhmm(end.trim()).ok_or_else(|| format!("invalid end in '{value}'"))?;
    TimeWindow::new(start.hour(), start.minute(), end.hour(), end.minute()).map_err(|e| e.to_string())
}

pub fn run(global: &GlobalOpts, action: PillarAction) -> CliResult {
    let mut session = Session::open(global)?;

    match action {
        PillarAction::Add {
            name,
            cadence,
            min,
            max,
            preferred,
            quiet,
        } => {
            let mut pillar = Pillar::new(name, cadence, min, max)?;
            pillar.preferred_windows = preferred;
            pillar.quiet_hours = quiet;
            let id = session.planner.add_pillar(pillar)?;
            session.save()?;
            println!("Pillar added: {id}");
        }
        PillarAction::List => {
            let pillars = &session.planner.library().pillars;
            if session.json {
                return print_json(pillars);
            }
            if pillars.is_empty() {
                println!("No pillars");
            }
            for pillar in pillars {
                println!(
                    "  {} ({}, {}-{} min)  {}",
                    pillar.name,
                    pillar.cadence.label(),
                    pillar.min_duration_minutes,
                    pillar.max_duration_minutes,
                    pillar.id
                );
            }
        }
        PillarAction::Due => {
            let due = session.planner.due_pillars(session.now);
            if session.json {
                return print_json(&due);
            }
            if due.is_empty() {
                println!("Nothing due");
            }
            for pillar in &due {
                match pillar.elapsed_days {
                    Some(days) => println!("  {} ({days:.1} days since last)", pillar.name),
                    None => println!("  {} (never done)", pillar.name),
                }
            }
        }
        PillarAction::Slot { id } => match session.planner.pillar_slot(&id, session.now)? {
            Some(slot) if session.json => print_json(&slot)?,
            Some(slot) => println!(
                "{}-{}",
                session.clock(slot.start_time),
                session.clock(slot.end_time())
            ),
            None => println!("No free slot"),
        },
        PillarAction::Schedule { id } => match session.planner.schedule_pillar(&id, session.now)? {
            Some(block) => {
                session.save()?;
                println!(
                    "Scheduled {} at {}: {}",
                    block.title,
                    session.clock(block.start_time),
                    block.id
                );
            }
            None => println!("No free slot"),
        },
    }
    Ok(())
}
