// src/app/mod.rs

//! Line-oriented console front end.
//!
//! The foreground loop reads one command per line, runs it through the
//! [`Session`], and in between drains [`EngineEvent`]s posted by the change
//! watcher. It is the only place that writes to stdout.

pub mod commands;
pub mod view;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{ActionOutcome, EngineEvent, Session};
use crate::workspace::SolutionStore;

pub use commands::{ConsoleCommand, UnknownCommand};

pub struct Console {
    session: Session,
    events: mpsc::UnboundedReceiver<EngineEvent>,
    solutions: SolutionStore,
}

impl Console {
    pub fn new(
        session: Session,
        events: mpsc::UnboundedReceiver<EngineEvent>,
        solutions: SolutionStore,
    ) -> Self {
        Self {
            session,
            events,
            solutions,
        }
    }

    /// Run until `q`, end of input or Ctrl-C. The watcher is stopped on the
    /// way out.
    pub async fn run(mut self, welcome: Option<String>) -> Result<()> {
        if let Some(message) = welcome {
            println!("{message}\n");
        }
        self.draw();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("reading console input")? else {
                        debug!("console input closed");
                        break;
                    };
                    match line.parse::<ConsoleCommand>() {
                        Ok(ConsoleCommand::Quit) => break,
                        Ok(cmd) => self.dispatch(cmd).await,
                        Err(err) => println!("{err}"),
                    }
                }
                Some(event) = self.events.recv() => self.on_event(event),
                res = tokio::signal::ctrl_c() => {
                    if let Err(err) = res {
                        warn!(error = %err, "failed to listen for Ctrl-C");
                    }
                    break;
                }
            }
        }

        self.session.shutdown().await;
        println!("\n{}", view::EXIT_MESSAGE);
        Ok(())
    }

    async fn dispatch(&mut self, cmd: ConsoleCommand) {
        debug!(?cmd, "console command");
        let outcome = match cmd {
            ConsoleCommand::Refresh => {
                self.draw();
                return;
            }
            ConsoleCommand::Help => {
                println!("{}", view::MENU);
                return;
            }
            ConsoleCommand::ToggleHint => {
                self.session.toggle_hint();
                self.draw();
                return;
            }
            ConsoleCommand::List => {
                let ctx = self.session.context();
                let current = ctx.current_name();
                println!("{}", view::render_list(&ctx.snapshot(), current.as_deref()));
                return;
            }
            ConsoleCommand::CheckAll => {
                let report = |name: Option<&str>, completed: usize, total: usize| {
                    if let Some(name) = name {
                        println!("{}", view::check_progress_line(name, completed, total));
                    }
                };
                match self.session.check_all(Some(&report)).await {
                    Ok(_) => {
                        self.draw();
                        return;
                    }
                    Err(err) => Err(err),
                }
            }
            ConsoleCommand::Next => self.session.advance().await,
            ConsoleCommand::Rerun => self.session.rerun_current().await,
            ConsoleCommand::Reset => self.session.reset_current().await,
            ConsoleCommand::Select(target) => self.session.jump_to(&target).await,
            ConsoleCommand::Quit => return,
        };

        match outcome {
            Ok(outcome) => self.report(&outcome),
            Err(err) => {
                warn!(error = %err, "console command failed");
                println!("error: {err}");
            }
        }
    }

    fn report(&self, outcome: &ActionOutcome) {
        match view::render_outcome(outcome) {
            Some(line) => println!("{line}"),
            None => self.draw(),
        }
    }

    fn on_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::RefreshRequested { name } => {
                if self.session.context().current_name().as_deref() == Some(name.as_str()) {
                    self.draw();
                }
            }
            EngineEvent::Finished => println!("\n{}", view::FINISHED_MESSAGE),
        }
    }

    fn draw(&self) {
        let ctx = self.session.context();
        let Some(record) = ctx.current() else {
            println!("No current exercise selected.");
            return;
        };
        let solution = if record.status.is_done() {
            self.solutions.solution_for(&record.path)
        } else {
            None
        };
        println!(
            "\n{}",
            view::render_exercise(
                &record,
                self.session.hint_visible(),
                solution.as_deref(),
                ctx.registry().progress(),
            )
        );
    }
}
