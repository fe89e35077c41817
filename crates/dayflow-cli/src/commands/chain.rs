use clap::Subcommand;
use dayflow_core::{Adjacency, Chain, ChainStep, ChainTemplate, Energy, FlowPattern, TimeBlock};

use super::{print_json, CliResult, GlobalOpts, Session};

#[derive(Subcommand)]
pub enum ChainAction {
    /// Add a built-in chain to the library
    AddTemplate {
        /// morning-routine, deep-work or evening-wind-down
        #[arg(value_parser = parse_template)]
        template: ChainTemplate,
    },
    /// Add a custom chain to the library
    Add {
        /// Chain name
        name: String,
        /// Step as TITLE:MINUTES (repeatable, in order)
        #[arg(long = "step", required = true)]
        steps: Vec<String>,
    },
    /// List library chains
    List,
    /// Place a chain on the current day starting at a time
    Place {
        /// Chain ID
        id: String,
        /// Start time (HH:MM)
        #[arg(long)]
        start: String,
    },
    /// Place a chain right before or after an existing block
    Insert {
        /// Chain ID
        id: String,
        /// Block to end just before
        #[arg(long, conflicts_with = "after", required_unless_present = "after")]
        before: Option<String>,
        /// Block to start just after
        #[arg(long)]
        after: Option<String>,
    },
}

fn parse_template(value: &str) -> Result<ChainTemplate, String> {
    let wanted = value.to_lowercase().replace(['_', ' '], "-");
    ChainTemplate::all()
        .into_iter()
        .find(|template| template.display_name().to_lowercase().replace(' ', "-") == wanted)
        .ok_or_else(|| format!("unknown template '{value}'"))
}

fn parse_step(value: &str) -> Result<ChainStep, String> {
    let (title, minutes) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("invalid step '{value}', expected TITLE:MINUTES"))?;
    let minutes: i64 = minutes
        .trim()
        .parse()
        .map_err(|_| format!("invalid minutes in step '{value}'"))?;
    ChainStep::new(title.trim(), super::minutes(minutes)?, Energy::default(), "")
        .map_err(|e| e.to_string())
}

fn print_blocks(session: &Session, blocks: &[TimeBlock]) -> CliResult {
    if session.json {
        return print_json(&blocks);
    }
    for block in blocks {
        println!(
            "  {}-{}  {}",
            session.clock(block.start_time),
            session.clock(block.end_time()),
            block.title
        );
    }
    Ok(())
}

pub fn run(global: &GlobalOpts, action: ChainAction) -> CliResult {
    let mut session = Session::open(global)?;

    match action {
        ChainAction::AddTemplate { template } => {
            let id = session.planner.add_chain(template.expand());
            session.save()?;
            println!("Chain added: {id}");
        }
        ChainAction::Add { name, steps } => {
            let mut chain = Chain::new(name, FlowPattern::default());
            for step in &steps {
                chain.push_step(parse_step(step)?);
            }
            let id = session.planner.add_chain(chain);
            session.save()?;
            println!("Chain added: {id}");
        }
        ChainAction::List => {
            let threshold = session.planner.config().chain.routine_threshold;
            let chains = &session.planner.library().chains;
            if session.json {
                return print_json(chains);
            }
            if chains.is_empty() {
                println!("No chains");
            }
            for chain in chains {
                let routine = if chain.is_routine_at(threshold) { " [routine]" } else { "" };
                println!(
                    "  {} ({} steps, {} min){}  {}",
                    chain.name,
                    chain.steps.len(),
                    chain.total_duration().num_minutes(),
                    routine,
                    chain.id
                );
            }
        }
        ChainAction::Place { id, start } => {
            let start = session.at(&start)?;
            let blocks = session.planner.place_chain(&id, start)?;
            session.save()?;
            print_blocks(&session, &blocks)?;
        }
        ChainAction::Insert { id, before, after } => {
            let adjacency = match (before, after) {
                (Some(target), _) => Adjacency::Before(target),
                (None, Some(target)) => Adjacency::After(target),
                (None, None) => return Err("one of --before or --after is required".into()),
            };
            let blocks = session.planner.insert_chain(&id, &adjacency)?;
            session.save()?;
            print_blocks(&session, &blocks)?;
        }
    }
    Ok(())
}
