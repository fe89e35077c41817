use clap::Subcommand;

use super::{print_json, CliResult, GlobalOpts, Session};

#[derive(Subcommand)]
pub enum GapAction {
    /// Free intervals between the configured day bounds
    List,
    /// Free time directly before a block
    Before {
        /// Block ID
        id: String,
    },
    /// Free time directly after a block
    After {
        /// Block ID
        id: String,
    },
}

pub fn run(global: &GlobalOpts, action: GapAction) -> CliResult {
    let session = Session::open(global)?;

    match action {
        GapAction::List => {
            let gaps = session.planner.free_intervals();
            if session.json {
                return print_json(&gaps);
            }
            if gaps.is_empty() {
                println!("No free time");
            }
            for gap in &gaps {
                println!(
                    "  {}-{}  {} min",
                    session.clock(gap.start_time),
                    session.clock(gap.end_time),
                    gap.duration_minutes()
                );
            }
        }
        GapAction::Before { id } => {
            let gap = session.planner.gap_before(&id)?;
            println!("{} min", gap.num_minutes());
        }
        GapAction::After { id } => {
            let gap = session.planner.gap_after(&id)?;
            println!("{} min", gap.num_minutes());
        }
    }
    Ok(())
}
