//! Terminal adapters: table renderer and stdin confirmation prompt

use antrean_core::domain::{QueueList, Status};
use antrean_core::port::{ConfirmationPrompt, ViewRenderer};
use async_trait::async_trait;
use colored::{ColoredString, Colorize};
use std::io::{BufRead, Write};
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::warn;

pub const EMPTY_QUEUE: &str = "Belum ada antrean.";

/// ANSI: clear screen, cursor home
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Renders the queue as a table on stdout
pub struct TerminalRenderer {
    clear_screen: bool,
}

impl TerminalRenderer {
    /// One-shot output (`list`)
    pub fn plain() -> Self {
        Self { clear_screen: false }
    }

    /// Redraw in place (`display`)
    pub fn live() -> Self {
        Self { clear_screen: true }
    }
}

impl ViewRenderer for TerminalRenderer {
    fn render(&self, list: &QueueList, is_admin: bool) {
        let mut stdout = std::io::stdout().lock();
        let prefix = if self.clear_screen { CLEAR_SCREEN } else { "" };
        if let Err(e) = writeln!(stdout, "{}{}", prefix, format_queue(list, is_admin)) {
            warn!(error = %e, "Render failed");
        }
    }
}

fn paint(status: Status) -> ColoredString {
    match status.style_tag() {
        "status-onprogress" => status.label().blue().bold(),
        "status-finishing" => status.label().green().bold(),
        _ => status.label().yellow(),
    }
}

/// Admin actions for the entry at `number` (1-based): the other statuses,
/// then announce and delete
fn actions(number: usize, current: Status) -> String {
    let statuses: Vec<&str> = Status::ALL
        .iter()
        .filter(|s| **s != current)
        .map(|s| s.label())
        .collect();
    format!(
        "set-status {n} [{}] | announce {n} | delete {n}",
        statuses.join(" / "),
        n = number
    )
}

pub fn format_queue(list: &QueueList, is_admin: bool) -> String {
    if list.is_empty() {
        return EMPTY_QUEUE.to_string();
    }

    let mut builder = Builder::default();
    let mut header: Vec<String> = ["No", "Customer", "Motor", "Nopol", "Status"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    if is_admin {
        header.push("Aksi".to_string());
    }
    builder.push_record(header);

    for (index, entry) in list.iter().enumerate() {
        let number = index + 1;
        let mut row = vec![
            number.to_string(),
            entry.customer.clone(),
            entry.motor.clone(),
            entry.nopol.clone(),
            paint(entry.status).to_string(),
        ];
        if is_admin {
            row.push(actions(number, entry.status));
        }
        builder.push_record(row);
    }

    builder.build().with(Style::rounded()).to_string()
}

/// Asks on stdin; anything but `y`/`ya`/`yes` declines
pub struct StdinPrompt;

#[async_trait]
impl ConfirmationPrompt for StdinPrompt {
    async fn confirm(&self, message: &str) -> bool {
        let message = message.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            eprint!("{} [y/N] ", message);
            let _ = std::io::stderr().flush();
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_yes(&line),
            Ok(Err(e)) => {
                warn!(error = %e, "Could not read confirmation");
                false
            }
            Err(e) => {
                warn!(error = %e, "Confirmation task failed");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "ya" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use antrean_core::domain::{EntryId, NewEntry};

    fn list() -> QueueList {
        let mut ana = NewEntry::new("Ana", "Yamaha", "AB 123")
            .unwrap()
            .into_entry(EntryId::new("e-1"));
        ana.status = Status::OnProgress;
        let budi = NewEntry::new("Budi", "Honda", "B 77")
            .unwrap()
            .into_entry(EntryId::new("e-2"));
        QueueList::from(vec![ana, budi])
    }

    #[test]
    fn test_empty_queue_text() {
        assert_eq!(format_queue(&QueueList::new(), true), EMPTY_QUEUE);
        assert_eq!(format_queue(&QueueList::new(), false), EMPTY_QUEUE);
    }

    #[test]
    fn test_display_view_has_no_actions() {
        let out = format_queue(&list(), false);
        assert!(out.contains("Ana"));
        assert!(out.contains("B 77"));
        assert!(out.contains("On Progress"));
        assert!(!out.contains("Aksi"));
        assert!(!out.contains("delete 1"));
    }

    #[test]
    fn test_admin_view_lists_actions_by_position() {
        let out = format_queue(&list(), true);
        assert!(out.contains("Aksi"));
        assert!(out.contains("set-status 1 [Queue / Finishing]"));
        assert!(out.contains("set-status 2 [On Progress / Finishing]"));
        assert!(out.contains("announce 2 | delete 2"));
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" Ya "));
        assert!(is_yes("YES"));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("tidak"));
    }
}
