use std::io::Read;
use std::path::Path;

use clap::Subcommand;
use dayflow_core::{AiResponse, Decision, ResolveRequest};
use serde::de::DeserializeOwned;

use super::{print_json, CliResult, GlobalOpts, Session};

#[derive(Subcommand)]
pub enum SuggestAction {
    /// Route a resolve request (JSON file, or - for stdin)
    Resolve {
        /// Path to the request JSON
        file: String,
    },
    /// Route a raw AI response (JSON file, or - for stdin)
    Respond {
        /// Path to the response JSON
        file: String,
        /// The user's original message
        #[arg(long)]
        text: String,
    },
    /// List suggestions waiting for approval
    Pending,
    /// Apply a staged suggestion to the current day
    Accept {
        /// Staged suggestion ID
        id: String,
    },
    /// Discard a staged suggestion
    Reject {
        /// Staged suggestion ID
        id: String,
    },
}

fn read_json<T: DeserializeOwned>(file: &str) -> CliResult<T> {
    let content = if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(Path::new(file))?
    };
    Ok(serde_json::from_str(&content)?)
}

fn report(session: &Session, decision: &Decision) -> CliResult {
    if session.json {
        return print_json(decision);
    }
    match decision {
        Decision::ApplyDirectly { mutation } => {
            println!("Applied");
            for block in mutation.blocks() {
                println!(
                    "  {}-{}  {}",
                    session.clock(block.start_time),
                    session.clock(block.end_time()),
                    block.title
                );
            }
        }
        Decision::StageForApproval { staged } => {
            println!("Staged for approval: {} (score {:.2})", staged.id, staged.score);
        }
        Decision::AskClarification { prompt } => {
            println!("{}", prompt.message);
        }
    }
    Ok(())
}

pub fn run(global: &GlobalOpts, action: SuggestAction) -> CliResult {
    let mut session = Session::open(global)?;

    match action {
        SuggestAction::Resolve { file } => {
            let request: ResolveRequest = read_json(&file)?;
            let decision = session.planner.resolve(request, session.now);
            session.save()?;
            report(&session, &decision)?;
        }
        SuggestAction::Respond { file, text } => {
            let response: AiResponse = read_json(&file)?;
            response.validate()?;
            match session.planner.handle_response(&response, &text, session.now) {
                Some(decision) => {
                    session.save()?;
                    report(&session, &decision)?;
                }
                None => println!("{}", response.text),
            }
        }
        SuggestAction::Pending => {
            let pending = session.planner.pending();
            if session.json {
                return print_json(&pending);
            }
            if pending.is_empty() {
                println!("Nothing pending");
            }
            for staged in pending {
                println!(
                    "  {} {} {} (score {:.2})  {}",
                    staged.date,
                    staged.request.action.as_str(),
                    staged
                        .request
                        .suggestions
                        .first()
                        .map(|s| s.title.as_str())
                        .or(staged.request.title.as_deref())
                        .unwrap_or("untitled"),
                    staged.score,
                    staged.id
                );
            }
        }
        SuggestAction::Accept { id } => {
            let mutation = session.planner.accept(&id, session.now)?;
            session.save()?;
            if session.json {
                return print_json(&mutation);
            }
            println!("Accepted: {id} ({} blocks)", mutation.blocks().len());
        }
        SuggestAction::Reject { id } => {
            session.planner.reject(&id)?;
            session.save()?;
            println!("Rejected: {id}");
        }
    }
    Ok(())
}
