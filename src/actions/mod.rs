mod check;
mod edit;
mod hash;
mod list;

use crate::types::config::{Config, Opts, SubCmd};

use anyhow::Result;

/// bool in return type indicated whether user cancelled operation
pub fn fullfill_command(config: &Config, opts: &Opts) -> Result<bool> {
    match &opts.subcmd {
        SubCmd::Check(args) => {
            check::check(config, args)?;
            Ok(false)
        }
        SubCmd::List(args) => {
            list::list(args)?;
            Ok(false)
        }
        SubCmd::Add(args) => {
            edit::add(args)?;
            Ok(false)
        }
        SubCmd::Remove(args) => edit::remove(args, opts.yes),
        SubCmd::Hash(args) => {
            hash::hash(args)?;
            Ok(false)
        }
    }
}
