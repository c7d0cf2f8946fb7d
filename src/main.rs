use clap::Parser;

mod cli;
mod config;
mod context;
mod error;
mod pattern;
mod probe;
mod rename;
mod runtime;
mod stats;
mod tagger;
mod walk;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run(cli::Args::parse())
}
