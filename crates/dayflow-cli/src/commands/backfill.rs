use chrono::NaiveDate;
use clap::Args;

use super::{print_json, CliResult, GlobalOpts, Session};

#[derive(Args)]
pub struct BackfillArgs {
    /// Day to reconstruct (defaults to the current day)
    pub day: Option<NaiveDate>,

    /// Add the reconstructed blocks to the day instead of only showing them
    #[arg(long)]
    pub commit: bool,
}

pub fn run(global: &GlobalOpts, args: BackfillArgs) -> CliResult {
    let mut session = Session::open(global)?;
    let date = args.day.unwrap_or_else(|| session.planner.current_date());

    let blocks = if args.commit {
        let blocks = session.planner.commit_backfill(date)?;
        session.save()?;
        blocks
    } else {
        session.planner.preview_backfill(date)
    };

    if session.json {
        return print_json(&blocks);
    }
    if blocks.is_empty() {
        println!("Nothing to reconstruct for {date}");
        return Ok(());
    }
    for block in &blocks {
        println!(
            "  {}-{}  {} {}  {}",
            session.clock(block.start_time),
            session.clock(block.end_time()),
            block.glyph,
            block.title,
            block.notes.as_deref().unwrap_or_default()
        );
    }
    if !args.commit {
        println!("(preview, use --commit to keep)");
    }
    Ok(())
}
