//! REPL (Read-Eval-Print Loop) over one in-process memory.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};

use super::Context;
use super::session::{Flow, Session, help_text, parse_command};
use crate::setup;

/// Arguments for the repl command.
#[derive(Args, Debug)]
pub struct ReplArgs {}

/// Run the repl command.
pub async fn run(_args: ReplArgs, ctx: &Context) -> Result<()> {
    let memory = setup::build_memory(&ctx.config)?;
    let mut repl = Repl::new(Session::new(memory, ctx.json_output))?;
    repl.run().await
}

/// REPL state.
pub struct Repl {
    session: Session,
    editor: Editor<(), DefaultHistory>,
}

impl Repl {
    /// Create a new REPL instance.
    pub fn new(session: Session) -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(true)
            .build();

        let editor = Editor::with_config(config)?;

        Ok(Self { session, editor })
    }

    /// Run the REPL loop.
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        loop {
            let prompt = format!("{} ", style("amem>").cyan().bold());

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }

                    let command = match parse_command(line) {
                        Ok(command) => command,
                        Err(e) => {
                            self.print_error(&e.to_string());
                            continue;
                        }
                    };
                    match self.session.execute(command).await {
                        Ok(Flow::Continue(output)) => {
                            if !output.is_empty() {
                                println!("{}", output);
                            }
                        }
                        Ok(Flow::Quit) => break,
                        Err(e) => self.print_error(&e.to_string()),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    println!();
                    self.print_dim("(Interrupted - type quit to exit)");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(e) => {
                    self.print_error(&format!("Input error: {}", e));
                    break;
                }
            }
        }

        self.print_dim("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        let dim = Style::new().dim();
        println!();
        println!("{}", style("amem").bold().cyan());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!("{}", help_text());
        println!("{}", dim.apply_to("Ctrl+D to exit."));
        println!();
    }

    fn print_dim(&self, msg: &str) {
        let dim = Style::new().dim();
        println!("{}", dim.apply_to(msg));
    }

    fn print_error(&self, msg: &str) {
        let red = Style::new().red();
        println!("{} {}", red.apply_to("Error:"), msg);
    }
}
