//! Interactive line-oriented front end.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::engine::TurnEngine;
use crate::message::Role;

pub struct Console {
    engine: Arc<TurnEngine>,
    thread_id: String,
}

enum Command {
    Quit,
    Clear,
    History,
    NewThread,
    Switch(String),
    Say(String),
}

fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "" | "quit" | "exit" | "q" => Command::Quit,
        "clear" => Command::Clear,
        "history" => Command::History,
        "newthread" => Command::NewThread,
        lower if lower.starts_with("thread ") => {
            Command::Switch(trimmed[7..].trim().to_string())
        }
        _ => Command::Say(trimmed.to_string()),
    }
}

fn short_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

fn truncate_line(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}...")
}

impl Console {
    pub fn new(engine: Arc<TurnEngine>) -> Self {
        Self { engine, thread_id: short_id() }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        println!("switchboard chat (thread: {})", self.thread_id);
        println!("commands: quit/exit/q, clear, history, newthread, thread <id>");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("\nuser ({})> ", self.thread_id);
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else { break };
            match parse_command(&line) {
                Command::Quit => {
                    println!("bye");
                    break;
                }
                Command::Clear => {
                    self.engine.store().reset(&self.thread_id).await;
                    println!("conversation cleared");
                }
                Command::History => self.show_history().await,
                Command::NewThread => {
                    self.thread_id = short_id();
                    println!("started thread {}", self.thread_id);
                }
                Command::Switch(id) => {
                    self.thread_id = id;
                    println!("switched to thread {}", self.thread_id);
                }
                Command::Say(text) => self.send(text).await,
            }
        }
        Ok(())
    }

    /// Fragments are printed as the turn produces them rather than after it
    /// completes.
    async fn send(&self, text: String) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let engine = self.engine.clone();
        let thread_id = self.thread_id.clone();
        let turn =
            tokio::spawn(async move { engine.run_turn(&thread_id, &text, &tx).await });
        let mut printed = false;
        while let Some(fragment) = rx.recv().await {
            println!("assistant> {fragment}");
            printed = true;
        }
        match turn.await {
            Ok(Ok(())) => {
                if !printed {
                    println!("(no response)");
                }
            }
            Ok(Err(err)) => println!("error: {err} (you can retry)"),
            Err(err) => println!("error: {err}"),
        }
    }

    async fn show_history(&self) {
        let history = self.engine.store().history(&self.thread_id).await;
        if history.is_empty() {
            println!("no conversation yet");
            return;
        }
        for msg in history {
            let who = match msg.role {
                Role::User => "you",
                Role::Assistant => "agent",
                Role::Tool => "tool",
            };
            println!("  [{who}] {}", truncate_line(&msg.content, 100));
        }
    }
}
