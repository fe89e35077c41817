use clap::Subcommand;
use dayflow_core::{GlassState, TimelineCommand};

use super::{print_json, CliResult, GlobalOpts, Session};

#[derive(Subcommand)]
pub enum BlockAction {
    /// Add a block to the current day
    Add {
        /// Block title
        title: String,
        /// Start time (HH:MM)
        #[arg(long)]
        start: String,
        /// Duration in minutes
        #[arg(long)]
        minutes: i64,
        /// Glyph shown next to the title
        #[arg(long)]
        glyph: Option<String>,
        /// Link to a pillar
        #[arg(long)]
        pillar: Option<String>,
        /// Link to a goal
        #[arg(long)]
        goal: Option<String>,
        /// Mark as tentative
        #[arg(long)]
        mist: bool,
    },
    /// Move a block to a new start time
    Move {
        /// Block ID
        id: String,
        /// New start time (HH:MM)
        #[arg(long)]
        start: String,
    },
    /// Change a block's duration
    Resize {
        /// Block ID
        id: String,
        /// New duration in minutes
        #[arg(long)]
        minutes: i64,
    },
    /// Remove a block
    Remove {
        /// Block ID
        id: String,
    },
    /// List the current day's blocks
    List,
}

pub fn run(global: &GlobalOpts, action: BlockAction) -> CliResult {
    let mut session = Session::open(global)?;

    match action {
        BlockAction::Add {
            title,
            start,
            minutes,
            glyph,
            pillar,
            goal,
            mist,
        } => {
            let start = session.at(&start)?;
            let mut block = session
                .planner
                .today()
                .new_block(title, start, super::minutes(minutes)?)?;
            if let Some(glyph) = glyph {
                block = block.with_glyph(glyph);
            }
            if let Some(pillar) = pillar {
                block = block.with_pillar(pillar);
            }
            if let Some(goal) = goal {
                block = block.with_goal(goal);
            }
            if mist {
                block = block.with_state(GlassState::Mist);
            }
            session.planner.execute(TimelineCommand::Add(block.clone()))?;
            session.save()?;
            if session.json {
                print_json(&block)?;
            } else {
                println!("Block added: {}", block.id);
            }
        }
        BlockAction::Move { id, start } => {
            let start_time = session.at(&start)?;
            session.planner.execute(TimelineCommand::Move { id: id.clone(), start_time })?;
            session.save()?;
            println!("Block moved: {id}");
        }
        BlockAction::Resize { id, minutes } => {
            session.planner.execute(TimelineCommand::Resize {
                id: id.clone(),
                duration: super::minutes(minutes)?,
            })?;
            session.save()?;
            println!("Block resized: {id}");
        }
        BlockAction::Remove { id } => {
            session.planner.execute(TimelineCommand::Remove { id: id.clone() })?;
            session.save()?;
            println!("Block removed: {id}");
        }
        BlockAction::List => {
            let today = session.planner.today();
            if session.json {
                return print_json(&today.blocks());
            }
            if today.is_empty() {
                println!("No blocks on {}", today.date());
                return Ok(());
            }
            println!("{}", today.date());
            for block in today.iter() {
                println!(
                    "  {}-{}  {:<8} {} {} ({})",
                    session.clock(block.start_time),
                    session.clock(block.end_time()),
                    block.state.as_str(),
                    block.glyph,
                    block.title,
                    block.id
                );
            }
        }
    }
    Ok(())
}
