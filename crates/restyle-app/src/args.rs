//! Command-line arguments.

use std::path::PathBuf;

use anyhow::{Result, bail};

pub const USAGE: &str = "usage: restyle <snapshot.json> [--config resolver.toml] [--pretty]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub snapshot: PathBuf,
    pub config: Option<PathBuf>,
    pub pretty: bool,
}

impl Args {
    /// Parse the arguments after the program name.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut snapshot = None;
        let mut config = None;
        let mut pretty = false;
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => match args.next() {
                    Some(path) => config = Some(PathBuf::from(path)),
                    None => bail!("--config needs a path\n{USAGE}"),
                },
                "--pretty" => pretty = true,
                flag if flag.starts_with('-') => bail!("unknown option `{flag}`\n{USAGE}"),
                _ if snapshot.is_some() => bail!("more than one snapshot given\n{USAGE}"),
                path => snapshot = Some(PathBuf::from(path)),
            }
        }
        let Some(snapshot) = snapshot else {
            bail!("{USAGE}");
        };
        Ok(Self {
            snapshot,
            config,
            pretty,
        })
    }
}
