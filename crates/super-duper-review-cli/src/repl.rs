use crate::render;
use colored::*;
use std::io::{self, Write};
use super_duper_review::decision::ReviewAction;
use super_duper_review::strategy::AutoSelectStrategy;
use super_duper_review::ReviewService;
use tracing::error;

#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand {
    Load(i64),
    Decide {
        action: ReviewAction,
        file_id: i64,
        group_id: Option<i64>,
    },
    Auto(AutoSelectStrategy),
    MarkDir(String),
    Undo,
    Redo,
    History,
    Status(Option<i64>),
    Progress,
    Queue,
    Help,
    Quit,
}

const HELP: &str = "\
  load <group>                   show a group's copies side by side
  keep|delete|skip <file> [group] decide one file (group defaults to the loaded one)
  auto <newest|shortest|suggested> auto-select across the session
  mark-dir <path>                mark every duplicate under a directory for deletion
  undo | redo                    step through the history
  history                        list undoable actions
  status [group]                 review status of a group
  progress                       session progress
  queue                          files marked for deletion
  help | quit";

/// Parse one shell line. Blank lines parse to `None`.
pub fn parse_line(line: &str) -> Result<Option<ReplCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match verb.to_lowercase().as_str() {
        "load" | "l" => ReplCommand::Load(id_arg(&args, 0, "group")?),
        "keep" | "delete" | "skip" | "k" | "d" | "s" => {
            let action = match verb.to_lowercase().as_str() {
                "k" => ReviewAction::Keep,
                "d" => ReviewAction::Delete,
                "s" => ReviewAction::Skip,
                other => other.parse().map_err(|e| format!("{}", e))?,
            };
            let file_id = id_arg(&args, 0, "file")?;
            let group_id = match args.get(1) {
                Some(_) => Some(id_arg(&args, 1, "group")?),
                None => None,
            };
            ReplCommand::Decide {
                action,
                file_id,
                group_id,
            }
        }
        "auto" => {
            let name = args.first().ok_or("usage: auto <newest|shortest|suggested>")?;
            ReplCommand::Auto(name.parse().map_err(|e| format!("{}", e))?)
        }
        "mark-dir" => {
            if args.is_empty() {
                return Err("usage: mark-dir <path>".to_string());
            }
            ReplCommand::MarkDir(args.join(" "))
        }
        "undo" | "u" => ReplCommand::Undo,
        "redo" | "r" => ReplCommand::Redo,
        "history" => ReplCommand::History,
        "status" => ReplCommand::Status(match args.first() {
            Some(_) => Some(id_arg(&args, 0, "group")?),
            None => None,
        }),
        "progress" => ReplCommand::Progress,
        "queue" => ReplCommand::Queue,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(Some(command))
}

fn id_arg(args: &[&str], index: usize, name: &str) -> Result<i64, String> {
    let raw = args
        .get(index)
        .ok_or_else(|| format!("missing {} id", name))?;
    raw.parse()
        .map_err(|_| format!("'{}' is not a valid {} id", raw, name))
}

async fn read_line() -> io::Result<Option<String>> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        let read = io::stdin().read_line(&mut line)?;
        Ok::<_, io::Error>((read > 0).then_some(line))
    })
    .await
    .map_err(io::Error::other)?
}

pub async fn run(service: &ReviewService, session_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    println!("Reviewing session {}. Type 'help' for commands.", session_id);
    loop {
        print!("{} ", "review>".cyan().bold());
        io::stdout().flush()?;

        let Some(line) = read_line().await? else {
            break;
        };
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message.red());
                continue;
            }
        };
        if command == ReplCommand::Quit {
            break;
        }
        if let Err(err) = execute(service, session_id, command).await {
            error!("{}", err);
        }
    }
    Ok(())
}

async fn execute(
    service: &ReviewService,
    session_id: i64,
    command: ReplCommand,
) -> Result<(), super_duper_review::Error> {
    match command {
        ReplCommand::Load(group_id) => {
            let view = service.load_group(group_id).await?;
            render::print_view(&view);
        }
        ReplCommand::Decide {
            action,
            file_id,
            group_id,
        } => {
            let group_id = match group_id {
                Some(id) => id,
                None => match service.loaded_states().await {
                    Some((id, _)) => id,
                    None => {
                        println!("{}", "No group loaded; use 'load <group>' or pass a group id".red());
                        return Ok(());
                    }
                },
            };
            service
                .set_decision(file_id, group_id, action, Some(session_id))
                .await?;
            println!("{}", render::status_line(group_id, service.group_status(group_id).await?));
        }
        ReplCommand::Auto(strategy) => {
            let changed = service.auto_select(strategy, session_id).await?;
            println!("Auto-select '{}' changed {} files", strategy, changed);
        }
        ReplCommand::MarkDir(path) => {
            let marked = service.mark_directory(&path, session_id).await?;
            println!("Marked {} files under {}", marked, path);
        }
        ReplCommand::Undo => {
            let described = service.history_state().await.undo_description;
            if service.undo().await? {
                println!("Undid: {}", described.unwrap_or_default());
            } else {
                println!("{}", "Nothing to undo".dimmed());
            }
        }
        ReplCommand::Redo => {
            let described = service.history_state().await.redo_description;
            if service.redo().await? {
                println!("Redid: {}", described.unwrap_or_default());
            } else {
                println!("{}", "Nothing to redo".dimmed());
            }
        }
        ReplCommand::History => {
            let state = service.history_state().await;
            let descriptions = service.undo_descriptions().await;
            render::print_history(&state, &descriptions);
        }
        ReplCommand::Status(group_id) => {
            let group_id = match group_id {
                Some(id) => Some(id),
                None => service.loaded_states().await.map(|(id, _)| id),
            };
            match group_id {
                Some(id) => println!("{}", render::status_line(id, service.group_status(id).await?)),
                None => println!("{}", "No group loaded".dimmed()),
            }
        }
        ReplCommand::Progress => {
            let progress = service.session_progress(session_id).await?;
            render::print_progress(session_id, &progress);
        }
        ReplCommand::Queue => {
            render::print_queue(&service.deletion_queue().await?);
        }
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::Quit => {}
    }
    Ok(())
}
