/// Linex command-line runner

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use linex_eval::{BlockScan, RunOptions, END_OF_EXECUTION};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "linex")]
#[command(about = "Linex interpreter - runs a Linex program and prints its output lines")]
#[command(version)]
struct Args {
    /// Linex source file, or `-` to read from stdin
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Value handed to the next `input` command (repeatable, in order)
    #[arg(short = 'i', long = "input", value_name = "VALUE")]
    values: Vec<String>,

    /// Directory that `save` and `load` resolve file names against
    #[arg(short = 'C', long, value_name = "DIR")]
    working_dir: Option<PathBuf>,

    /// Timeout for `http get` requests, in seconds
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    timeout: u64,

    /// Close blocks at the first matching `end` line, ignoring nesting
    #[arg(long)]
    flat_blocks: bool,

    /// Maximum depth of nested `call`s
    #[arg(long, value_name = "N", default_value_t = linex_eval::DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,
}

impl Args {
    fn run_options(&self) -> RunOptions {
        let mut options = RunOptions::new()
            .http_timeout(Duration::from_secs(self.timeout))
            .max_call_depth(self.max_call_depth)
            .block_scan(if self.flat_blocks {
                BlockScan::Flat
            } else {
                BlockScan::Nested
            });

        if let Some(dir) = &self.working_dir {
            options = options.working_dir(dir);
        }
        options
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("failed to read program from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Run the program, returning whether it finished successfully.
fn run(args: &Args) -> anyhow::Result<bool> {
    let source = read_source(&args.file)?;
    let values: Vec<&str> = args.values.iter().map(String::as_str).collect();

    tracing::debug!(file = %args.file.display(), inputs = values.len(), "running program");
    let output = linex_eval::run_with_options(&source, &values, &args.run_options());
    for line in &output {
        println!("{}", line);
    }

    Ok(output.last().map(String::as_str) == Some(END_OF_EXECUTION))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("linex: {:#}", e);
            process::exit(2);
        }
    }
}
