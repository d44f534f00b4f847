// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use std::time::{Duration, Instant};

use nodecp::{
    cli::Cli,
    config::Config,
    copy::{copy_path, move_path, Direction, TransferSummary},
    utils::{format_bytes, init_logging},
};

/// Format a Duration into a human-readable string
fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs_f64();

    if total_seconds < 1.0 {
        format!("{:.1} ms", total_seconds * 1000.0)
    } else if total_seconds < 60.0 {
        format!("{total_seconds:.2} s")
    } else {
        let minutes = duration.as_secs() / 60;
        let seconds = duration.as_secs() % 60;
        format!("{minutes}m {seconds}s")
    }
}

fn print_summary(summary: &TransferSummary, moved: bool, elapsed: Duration) {
    let verb = if moved { "Moved" } else { "Copied" };
    println!(
        "{} {} {} file(s), {} dir(s), {} {}",
        "✔".green(),
        verb.green().bold(),
        summary.files.to_string().yellow(),
        summary.directories.to_string().yellow(),
        format_bytes(summary.bytes).yellow(),
        format!("in {}", format_duration(elapsed)).dimmed()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config::load_with_priority(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;

    let params = config.connection_params(&cli.ip_addr, &cli.connection_overrides())?;
    let request = cli.copy_request();

    let (from, to) = match request.direction {
        Direction::Push => ("local", params.endpoint()),
        Direction::Pull => ("remote", "local".to_string()),
    };
    let action = if cli.move_source { "Moving" } else { "Copying" };
    println!(
        "{} {} {} {} {}",
        "▶".cyan(),
        action.cyan().bold(),
        format!("{from}:{}", request.source),
        "→".dimmed(),
        format!("{to}:{}", request.target).green()
    );

    let started = Instant::now();
    let result = if cli.move_source {
        move_path(&request, &params).await
    } else {
        copy_path(&request, &params).await
    };
    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            let verb = if cli.move_source { "move" } else { "copy" };
            eprintln!(
                "{} Failed to {} '{}' to '{}' ({}): {}",
                "✘".red(),
                verb,
                request.source,
                request.target,
                request.direction,
                e
            );
            if let Some(hint) = e.hint() {
                eprintln!("  {} {}", "hint:".yellow(), hint);
            }
            std::process::exit(e.exit_code());
        }
    };

    print_summary(&summary, cli.move_source, started.elapsed());

    Ok(())
}
