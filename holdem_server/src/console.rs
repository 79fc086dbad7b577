//! Line-oriented console in front of one table.
//!
//! Reads `<player> <command>` lines from stdin and forwards them through the
//! table handle. Notifications and table events are printed as they arrive.

use anyhow::Error;
use holdem::{
    notify::Notification,
    table::{TableEvent, TableHandle, TableResponse, TableSnapshot},
};
use log::{debug, warn};
use std::{fmt::Write, io::BufRead, thread};
use tokio::sync::{
    mpsc::{self, Receiver, UnboundedReceiver},
    watch,
};

use crate::commands::{Command, USAGE, parse_command};

pub struct Console {
    handle: TableHandle,
    facts: UnboundedReceiver<Notification>,
    events: Receiver<TableEvent>,
    shutdown: watch::Receiver<bool>,
}

impl Console {
    pub fn new(
        handle: TableHandle,
        facts: UnboundedReceiver<Notification>,
        events: Receiver<TableEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            handle,
            facts,
            events,
            shutdown,
        }
    }

    /// Serve stdin until `quit`, end of input or a termination signal, then
    /// close the table and wait for it to pay everybody out.
    pub async fn run(mut self) -> Result<(), Error> {
        let mut lines = spawn_stdin_reader();
        print!("{USAGE}");

        loop {
            tokio::select! {
                line = lines.recv() => match line {
                    Some(line) => {
                        if !self.dispatch(&line).await {
                            break;
                        }
                    }
                    None => {
                        debug!("stdin closed");
                        break;
                    }
                },
                Some(notification) = self.facts.recv() => {
                    println!("[{}] {}", notification.username, notification.fact);
                }
                Some(event) = self.events.recv() => println!("* {event}"),
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        let response = self.handle.close().await;
        if let Some(msg) = response.error_message() {
            warn!("closing table: {msg}");
        }
        // The table drops its subscribers once everything is paid out.
        while let Some(event) = self.events.recv().await {
            println!("* {event}");
        }
        while let Ok(notification) = self.facts.try_recv() {
            println!("[{}] {}", notification.username, notification.fact);
        }
        Ok(())
    }

    /// Handle one line. Returns `false` when the console should stop.
    async fn dispatch(&mut self, line: &str) -> bool {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                println!("! {e}");
                return true;
            }
        };

        let response = match command {
            Command::Help => {
                print!("{USAGE}");
                return true;
            }
            Command::Quit => return false,
            Command::State => {
                match self.handle.state().await {
                    Some(snapshot) => print!("{}", render_snapshot(&snapshot)),
                    None => println!("! table is closed"),
                }
                return true;
            }
            Command::Join { username, buy_in } => self.handle.join(username, buy_in).await,
            Command::Leave { username } => self.handle.leave(username).await,
            Command::Act { username, action } => self.handle.act(username, action).await,
        };
        report(&response);
        true
    }
}

/// Read stdin on its own thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (sender, receiver) = mpsc::channel(16);
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if sender.blocking_send(line).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!("reading stdin: {e}");
                    return;
                }
            }
        }
    });
    receiver
}

fn report(response: &TableResponse) {
    match response {
        TableResponse::SuccessWithMessage(msg) => println!("ok: {msg}"),
        TableResponse::Success => println!("ok"),
        other => {
            if let Some(msg) = other.error_message() {
                println!("! {msg}");
            }
        }
    }
}

/// Human-readable table state.
pub fn render_snapshot(snapshot: &TableSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} | {} | hand #{} | blinds {} | pot {}",
        snapshot.table_name, snapshot.phase, snapshot.hand_number, snapshot.blinds, snapshot.pot
    );
    if !snapshot.board.is_empty() {
        let board: Vec<String> = snapshot.board.iter().map(ToString::to_string).collect();
        let _ = writeln!(out, "board: {}", board.join(" "));
    }
    for player in &snapshot.players {
        let mut flags = String::new();
        if player.is_dealer {
            flags.push_str(" (D)");
        }
        if player.folded {
            flags.push_str(" folded");
        }
        if player.all_in {
            flags.push_str(" all-in");
        }
        if snapshot.next_to_act.as_ref() == Some(&player.username) {
            flags.push_str(" <- to act");
        }
        let _ = writeln!(
            out,
            "  seat {} {:<16} {:>8} bet {}{flags}",
            player.seat, player.username, player.stack, player.bet
        );
    }
    if !snapshot.waitlist.is_empty() {
        let waiting: Vec<&str> = snapshot.waitlist.iter().map(|u| u.as_str()).collect();
        let _ = writeln!(out, "waiting: {}", waiting.join(", "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdem::table::{Table, TableConfig};

    fn table() -> Table {
        let mut table = Table::new(TableConfig {
            name: "console".to_string(),
            ..TableConfig::default()
        });
        table.join("alice".into(), 500).unwrap();
        table.join("bob".into(), 500).unwrap();
        table
    }

    #[test]
    fn test_render_idle_table() {
        let out = render_snapshot(&table().snapshot());
        assert!(out.starts_with("console | "));
        assert!(out.contains("blinds 10/20"));
        assert!(out.contains("alice"));
        assert!(!out.contains("board:"));
        assert!(!out.contains("<- to act"));
    }

    #[test]
    fn test_render_running_hand() {
        let mut table = table();
        table.start_hand().unwrap();
        table.join("carol".into(), 500).unwrap();

        let out = render_snapshot(&table.snapshot());
        assert!(out.contains("hand #1"));
        assert!(out.contains("(D)"));
        assert!(out.contains("<- to act"));
        assert!(out.contains("waiting: carol"));
    }
}
