use chrono::NaiveDate;
use clap::Subcommand;

use super::{print_json, CliResult, GlobalOpts, Session};

#[derive(Subcommand)]
pub enum DayAction {
    /// Make a date the current day
    Switch {
        /// Date (YYYY-MM-DD)
        date: NaiveDate,
    },
    /// Show the current day and the days with history
    Show,
}

pub fn run(global: &GlobalOpts, action: DayAction) -> CliResult {
    let mut session = Session::open(global)?;

    match action {
        DayAction::Switch { date } => {
            session.planner.switch_day(date);
            session.save()?;
            println!("Current day: {date}");
        }
        DayAction::Show => {
            let snapshot = session.planner.snapshot();
            if session.json {
                return print_json(&snapshot);
            }
            println!("Current day: {}", snapshot.current);
            for day in &snapshot.days {
                let marker = if day.date() == snapshot.current { "*" } else { " " };
                println!("  {marker} {}  {} blocks", day.date(), day.len());
            }
            println!("Pending suggestions: {}", snapshot.pending.len());
        }
    }
    Ok(())
}
