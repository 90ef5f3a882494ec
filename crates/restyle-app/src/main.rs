//! `restyle` entry point.
//!
//! Reads a JSON page snapshot (DOM plus parsed stylesheets), resolves the
//! computed font, colour and background colour of every element and prints
//! them as JSON on stdout.

mod args;
mod snapshot;

use anyhow::Result;
use restyle_css::budget;
use restyle_css::{PropertyResolver, StyleRecorder};
use restyle_types::ResolverConfig;
use serde::Serialize;

use args::Args;
use snapshot::Snapshot;

/// What gets printed.
#[derive(Serialize)]
struct Report<'a> {
    complete: bool,
    elements: usize,
    #[serde(flatten)]
    styles: &'a StyleRecorder,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse(std::env::args().skip(1))?;
    let config = match &args.config {
        Some(path) => ResolverConfig::from_path(path)?,
        None => ResolverConfig::default(),
    };

    let (doc, sources) = Snapshot::from_path(&args.snapshot)?.into_sources();
    log::info!(
        "Resolving {} ({} nodes, {} author sheets, media {})",
        args.snapshot.display(),
        doc.nodes.len(),
        sources.author.len(),
        config.media,
    );

    let resolver = PropertyResolver::new(&sources, &config).with_default_processors();
    let mut styles = StyleRecorder::new();
    let budget = budget::from_limit(config.time_budget());
    let outcome = resolver.resolve(&doc, &mut [&mut styles], &*budget);

    let report = Report {
        complete: outcome.is_complete(),
        elements: outcome.elements(),
        styles: &styles,
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}
