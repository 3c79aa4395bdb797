//! Run command - execute a script of session commands.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::debug;

use super::Context;
use super::session::{Flow, Session, parse_command};
use crate::setup;

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Script file: one session command per line, `#` starts a comment
    pub script: PathBuf,
}

/// Run the run command.
///
/// Stops at the first line that fails to parse or execute.
pub async fn run(args: RunArgs, ctx: &Context) -> Result<()> {
    let script = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;

    let memory = setup::build_memory(&ctx.config)?;
    let session = Session::new(memory, ctx.json_output);

    for (index, raw) in script.lines().enumerate() {
        let number = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        debug!(line = number, command = line, "Executing");

        let command = parse_command(line).with_context(|| format!("line {}", number))?;
        match session
            .execute(command)
            .await
            .with_context(|| format!("line {}", number))?
        {
            Flow::Continue(output) => {
                if !output.is_empty() {
                    println!("{}", output);
                }
            }
            Flow::Quit => break,
        }
    }

    Ok(())
}
