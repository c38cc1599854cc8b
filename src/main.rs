use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::error;

use duality::prompt::ConsolePrompt;
use duality::propagate::LogProgressCallback;
use duality::{synchronize, SideInfo, SyncInfo};

/// Reconciles two directory trees so both end up with the same content.
#[derive(Debug, Parser)]
#[command(name = "duality", version, about)]
struct Args {
    /// Root of the first tree (the local side)
    root_a: PathBuf,
    /// Root of the second tree (the remote side)
    root_b: PathBuf,
    /// Nickname identifying the first tree in the second tree's log
    nickname_a: String,
    /// Nickname identifying the second tree in the first tree's log
    nickname_b: String,
    /// Log every copy, move, delete and skip
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SyncInfo::new(
        SideInfo::new(args.root_a, args.nickname_a),
        SideInfo::new(args.root_b, args.nickname_b),
    )
    .verbose(args.verbose);

    let mut prompt = ConsolePrompt::stdio();
    let progress = LogProgressCallback::new(config.verbose);

    match synchronize(&config, &mut prompt, &progress) {
        Ok(report) => {
            let statistics = &report.statistics;
            println!(
                "Done: {} copied, {} trashed, {} conflicts ({} resolved), {} excluded, {} unchanged",
                statistics.copied,
                statistics.trashed,
                report.conflicts.len(),
                report.resolutions.len(),
                statistics.skipped,
                statistics.unchanged
            );
            if !report.is_clean() {
                eprintln!("{} paths failed:", report.failures.len());
                for failure in &report.failures {
                    eprintln!("  {}", failure);
                }
                process::exit(2);
            }
        }
        Err(e) => {
            error!("Aborting: {}", e);
            process::exit(1);
        }
    }
}
