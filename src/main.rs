use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pattern_xml::{load_document_from_path, render, RenderOptions, FILE_EXTENSION};

fn cli() -> Command {
    Command::new("pattern-xml")
        .about("Render an evaluated pattern tree as XML")
        .arg(
            Arg::new("input")
                .help("Pattern document (JSON) produced by the evaluator")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Write the document here instead of stdout")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("meta")
                .long("meta")
                .help("Include offsets, sizes, endianness, colors and comments")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Render options file (JSON)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .help("Maximum nesting depth before rendering fails")
                .value_parser(value_parser!(usize)),
        )
}

fn main() -> Result<()> {
    // stdout may carry the document, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let matches = cli().get_matches();

    let mut options = match matches.get_one::<PathBuf>("config") {
        Some(path) => RenderOptions::from_path(path)?,
        None => RenderOptions::default(),
    };
    if matches.get_flag("meta") {
        options = options.with_meta_information(true);
    }
    if let Some(max_depth) = matches.get_one::<usize>("max-depth") {
        options = options.with_max_depth(*max_depth);
    }

    let input = matches
        .get_one::<PathBuf>("input")
        .context("missing input path")?;
    let document = load_document_from_path(input)?;

    let output = render(&document, options)
        .with_context(|| format!("Failed to render {}", input.display()))?;

    match matches.get_one::<PathBuf>("output") {
        Some(path) => {
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                info!(path = %path.display(), "output does not use the .{} extension", FILE_EXTENSION);
            }
            fs::write(path, &output)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => io::stdout()
            .write_all(&output)
            .context("Failed to write to stdout")?,
    }

    Ok(())
}
