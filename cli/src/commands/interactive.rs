//! Interactive mode command
//!
//! Reads one line at a time from stdin. Plain text replaces the query box
//! text; lines starting with `:` drive selection and actions.

use super::build_launcher;
use crate::config::CliConfigLoader;
use crate::output::ResultFormatter;
use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use wox_core::{ActiveList, Launcher, Modifiers, ResultItem, SelectionState};

const PROMPT: &str = "wox> ";

const HELP: &str = "\
Type text to query. Commands:
  :open [n]      run the default action of the selected (or n-th) item
  :down / :up    move the selection
  :pgdown / :pgup  move the selection by a page
  :menu [n]      show the context menu of a result
  :pin [n]       toggle top-most for a result in this query
  :history [text]  show query history
  :esc           leave the context menu or history, or hide
  :save          save records now
  :quit          exit";

/// Start interactive mode
pub async fn interactive_command(
    config_loader: CliConfigLoader,
    formatter: ResultFormatter,
    timeout_ms: u64,
) -> Result<()> {
    let config = config_loader.load().await?;
    let launcher = build_launcher(config).await?;
    let mut session = Session::new(launcher, formatter, Duration::from_millis(timeout_ms));

    println!("{}", "Wox interactive mode, :help for commands".bold());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", PROMPT);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if !session.handle_line(line.trim_end()).await? {
            break;
        }
    }

    session.launcher.shutdown().await?;
    Ok(())
}

struct Session {
    launcher: Launcher,
    selection: SelectionState,
    formatter: ResultFormatter,
    round_timeout: Duration,
    query_text: String,
    context_menu: Vec<ResultItem>,
    history: Vec<ResultItem>,
}

impl Session {
    fn new(launcher: Launcher, formatter: ResultFormatter, round_timeout: Duration) -> Self {
        let page_size = launcher.config().max_results_to_show;
        Self {
            launcher,
            selection: SelectionState::new(page_size),
            formatter,
            round_timeout,
            query_text: String::new(),
            context_menu: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Handle one input line; returns false when the session should end
    async fn handle_line(&mut self, line: &str) -> Result<bool> {
        let Some(command) = line.strip_prefix(':') else {
            self.run_query(line.to_string()).await?;
            self.render();
            return Ok(true);
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (command, None),
        };

        match name {
            "quit" | "q" => return Ok(false),
            "help" => println!("{}", HELP),
            "down" => {
                self.selection.next();
                self.render();
            }
            "up" => {
                self.selection.previous();
                self.render();
            }
            "pgdown" => {
                self.selection.next_page();
                self.render();
            }
            "pgup" => {
                self.selection.previous_page();
                self.render();
            }
            "open" => self.open(arg).await?,
            "menu" => self.show_context_menu(arg),
            "pin" => self.toggle_pin(arg).await?,
            "history" => {
                self.history = self.launcher.history_results(arg.unwrap_or(""));
                self.selection
                    .activate(ActiveList::History, self.history.len());
                self.render();
            }
            "esc" => {
                if self.selection.escape() {
                    self.render();
                } else {
                    self.run_query(String::new()).await?;
                    println!("{}", "Hidden".dimmed());
                }
            }
            "save" => {
                self.launcher.save().await?;
                println!("Saved");
            }
            other => println!("Unknown command :{}, try :help", other),
        }
        Ok(true)
    }

    /// Replace the query text and wait for the round to settle
    async fn run_query(&mut self, text: String) -> Result<()> {
        self.query_text = text;
        if let Some(round) = self.launcher.query(&self.query_text).await? {
            match tokio::time::timeout(self.round_timeout, round.finished()).await {
                Ok(finished) => debug!("Round {} settled: {}", round.query().id(), finished),
                Err(_) => warn!(
                    "Round {} still running, showing partial results",
                    round.query().id()
                ),
            }
        }
        self.selection
            .activate(ActiveList::Results, self.launcher.snapshot().len());
        Ok(())
    }

    /// Item at 1-based `arg` in the active list, or the selected one
    fn pick(&self, arg: Option<&str>) -> Option<ResultItem> {
        let list = self.selection.active();
        let index = match arg.and_then(|a| a.parse::<usize>().ok()) {
            Some(n) if n > 0 => n - 1,
            _ => self.selection.selected_index()?,
        };
        match list {
            ActiveList::Results => self.launcher.snapshot().get(index).cloned(),
            ActiveList::ContextMenu => self.context_menu.get(index).cloned(),
            ActiveList::History => self.history.get(index).cloned(),
        }
    }

    async fn open(&mut self, arg: Option<&str>) -> Result<()> {
        let active = self.selection.active();
        let Some(item) = self.pick(arg) else {
            println!("Nothing selected");
            return Ok(());
        };

        if active == ActiveList::History {
            self.run_query(item.title.clone()).await?;
            self.render();
            return Ok(());
        }

        let outcome = self.launcher.open_result(&item, Modifiers::none());
        if active == ActiveList::ContextMenu {
            // Menu actions may change pins; rerun so the order reflects them
            let text = self.query_text.clone();
            self.run_query(text).await?;
            self.render();
        } else if outcome.hide_window {
            println!("{}", "Hidden".dimmed());
        }
        Ok(())
    }

    fn show_context_menu(&mut self, arg: Option<&str>) {
        if self.selection.active() != ActiveList::Results {
            self.selection.escape();
        }
        let Some(item) = self.pick(arg) else {
            println!("Nothing selected");
            return;
        };
        self.context_menu = self.launcher.context_menu(&item);
        self.selection
            .activate(ActiveList::ContextMenu, self.context_menu.len());
        self.render();
    }

    async fn toggle_pin(&mut self, arg: Option<&str>) -> Result<()> {
        let Some(item) = self.pick(arg) else {
            println!("Nothing selected");
            return Ok(());
        };
        let pinned = self.launcher.toggle_top_most(&item);
        println!(
            "{} {}",
            if pinned { "Pinned" } else { "Unpinned" },
            item.title
        );

        let text = self.query_text.clone();
        self.run_query(text).await?;
        self.render();
        Ok(())
    }

    /// Print the page of the active list that holds the selection
    fn render(&mut self) {
        let snapshot = self.launcher.snapshot();
        let items: Vec<&ResultItem> = match self.selection.active() {
            ActiveList::Results => {
                self.selection.on_snapshot(&snapshot);
                snapshot.results().collect()
            }
            ActiveList::ContextMenu => self.context_menu.iter().collect(),
            ActiveList::History => self.history.iter().collect(),
        };

        let page_size = self.launcher.config().max_results_to_show;
        let selected = self.selection.selected_index();
        let page_start = selected.map(|i| i / page_size * page_size).unwrap_or(0);

        let lines: Vec<String> = items
            .iter()
            .enumerate()
            .skip(page_start)
            .take(page_size)
            .map(|(index, item)| self.formatter.format_row(index, item, selected == Some(index)))
            .collect();

        if lines.is_empty() {
            println!("{}", self.formatter.format_list(std::iter::empty(), None));
        } else {
            println!("{}", lines.join("\n"));
        }
    }
}
