use colored::*;
use super_duper_review::decision::{ReviewAction, ReviewStatus};
use super_duper_review::service::ComparisonView;
use super_duper_review::storage::models::{DeletionQueueEntry, ReviewProgress};
use super_duper_review::undo::HistoryState;

pub fn status_line(group_id: i64, status: ReviewStatus) -> String {
    let style = status.style();
    format!(
        "Group {}: {} {}",
        group_id,
        style.glyph.color(style.color),
        style.label.color(style.color)
    )
}

pub fn print_view(view: &ComparisonView) {
    println!("{}", status_line(view.group_id, view.status));
    for card in &view.cards {
        let style = ReviewAction::style_of(card.state);
        let label = if card.heuristic_label.is_empty() {
            String::new()
        } else {
            format!("  [{}]", card.heuristic_label).cyan().to_string()
        };
        println!(
            "  {} {:>6}  {:<7} {}  {}{}",
            style.glyph.color(style.color),
            card.copy.file_id,
            style.label.color(style.color),
            card.copy.canonical_path,
            human_bytes(card.copy.file_size).dimmed(),
            label
        );
    }
    match &view.suggestion_message {
        Some(message) => println!("{}", message.green()),
        None => println!("{}", "No suggestion for this group".dimmed()),
    }
}

pub fn print_progress(session_id: i64, progress: &ReviewProgress) {
    let line = format!(
        "Session {}: {}/{} files reviewed ({:.1}%)",
        session_id,
        progress.reviewed,
        progress.total,
        progress.fraction() * 100.0
    );
    if progress.is_complete() {
        println!("{}", line.green());
    } else {
        println!("{}", line);
    }
}

pub fn print_queue(entries: &[DeletionQueueEntry]) {
    if entries.is_empty() {
        println!("{}", "Deletion queue is empty".dimmed());
        return;
    }
    let total: i64 = entries.iter().map(|e| e.file_size).sum();
    for entry in entries {
        let retained = match &entry.retained_copy_path {
            Some(path) => format!("kept at {}", path).dimmed(),
            None => "no other copy kept".red().bold(),
        };
        println!(
            "  {} {}  {}",
            "✗".red(),
            entry.canonical_path,
            retained
        );
    }
    println!(
        "{} files, {} reclaimable",
        entries.len().to_string().red(),
        human_bytes(total).red()
    );
}

pub fn print_history(state: &HistoryState, descriptions: &[String]) {
    if descriptions.is_empty() {
        println!("{}", "Nothing to undo".dimmed());
    }
    for (i, description) in descriptions.iter().enumerate() {
        let marker = if i == 0 { "→" } else { " " };
        println!("  {} {}", marker.cyan(), description);
    }
    if let Some(redo) = &state.redo_description {
        println!("  {} {}", "redo:".dimmed(), redo);
    }
}

pub fn human_bytes(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes.max(0) as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes.max(0), UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
