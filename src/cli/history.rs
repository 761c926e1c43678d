//! Non-interactive access to the saved conversation.

use std::io::{self, Write};

use crate::core::history::HistoryStore;
use crate::core::message::Message;

fn speaker(message: &Message) -> &'static str {
    if message.is_user {
        "You"
    } else {
        "Assistant"
    }
}

pub fn write_history<W: Write>(log: &[Message], out: &mut W) -> io::Result<()> {
    if log.is_empty() {
        return writeln!(out, "No saved messages.");
    }

    for message in log {
        let mut lines = message.content.lines();
        let first = lines.next().unwrap_or_default();
        writeln!(out, "[{}] {}: {}", message.time_label(), speaker(message), first)?;
        for line in lines {
            writeln!(out, "    {line}")?;
        }
    }
    Ok(())
}

pub fn print_history(history: &HistoryStore) -> io::Result<()> {
    let stdout = io::stdout();
    write_history(&history.load(), &mut stdout.lock())
}

pub fn clear_history(history: &HistoryStore) {
    let count = history.load().len();
    history.clear();
    println!("✅ Cleared {count} saved message(s)");
}
