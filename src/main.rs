mod actions;
mod cli;
mod lint;
mod resolve;
mod types;

use anyhow::Result;
use clap::Parser;
use lazy_static::lazy_static;
use types::config::{Config, Opts};

// Initialize writer
lazy_static! {
    static ref WRITER: cli::Writer = cli::Writer::new();
}

/// Exit codes:
/// 1 => program screwed up, or manifests failed the check
/// 2 => user cancelled operation
fn main() {
    match try_main() {
        Ok(true) => std::process::exit(2),
        Ok(false) => (),
        Err(err) => {
            error!("{}", err.to_string());
            err.chain().skip(1).for_each(|cause| {
                due_to!("{}", cause);
            });
            std::process::exit(1);
        }
    }
}

/// bool in return type indicated whether user cancelled operation
fn try_main() -> Result<bool> {
    let opts: Opts = Opts::parse();
    cli::set_verbose(opts.verbose);
    if opts.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let config = Config::load(opts.config.as_deref())?;
    debug!(
        "Loaded config with {} include expectation(s)",
        config.expect.len()
    );

    actions::fullfill_command(&config, &opts)
}
