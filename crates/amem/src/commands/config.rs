//! Config command - show the effective configuration.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::Context;
use crate::effective_config;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print only the configuration, without the source list
    #[arg(long)]
    pub quiet: bool,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    let config = effective_config(&ctx.config);

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if !args.quiet {
        let dim = Style::new().dim();
        if ctx.sources.is_empty() {
            println!("{}", dim.apply_to("# No config files loaded (using defaults)"));
        } else {
            for source in &ctx.sources {
                println!("{}", dim.apply_to(format!("# Loaded: {}", source.display())));
            }
        }
        println!();
    }

    print!("{}", config.to_toml()?);
    Ok(())
}
