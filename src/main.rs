use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{OwoColorize, Stream};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    cli::Cli,
    identifier::parse_all,
    pipeline::Inputs,
    source::scopus::ScopusClient,
};

mod bibtex;
mod citekey;
mod cli;
mod dedup;
mod fetcher;
mod identifier;
mod normalize;
mod pipeline;
mod record;
mod resolver;
mod source;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("scopus_bib={}", args.log_level()))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client =
        ScopusClient::new(&args.client_config()).context("failed to initialise the Scopus client")?;

    let inputs = Inputs {
        author_ids: parse_all(&args.author_ids),
        orcids: parse_all(&args.orcids),
    };

    let today = chrono::Local::now().date_naive();
    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    let outcome = pipeline::run(&client, &inputs, today, &progress);
    progress.finish_and_clear();
    let outcome = outcome?;

    let contents = bibtex::render(&outcome.records, today);
    bibtex::write(&args.output, &contents)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    tracing::info!(
        path = %args.output.display(),
        authors = outcome.authors.len(),
        entries = outcome.records.len(),
        "wrote bibliography"
    );

    eprintln!(
        "{} {}  {} {}",
        "✓".if_supports_color(Stream::Stderr, |t| t.green()),
        outcome.records.len(),
        "✗".if_supports_color(Stream::Stderr, |t| t.red()),
        outcome.failures.len(),
    );
    Ok(())
}
