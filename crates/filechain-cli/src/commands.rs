use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;

use filechain_ledger::{
    BlockSnapshot, Difficulty, FileRecord, Ledger, Payload, ValidationReport,
};
use filechain_server::{FileChainServer, ServerConfig};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Verify(args) => cmd_verify(args, cli.format),
        Command::Demo(args) => cmd_demo(args, cli.format),
    }
}

/// File settings first, then flags and environment on top.
fn serve_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(difficulty) = args.difficulty {
        config.difficulty = Difficulty::try_from(difficulty)?;
    }
    if let Some(policy) = args.policy {
        config.deletion_policy = policy.into();
    }
    if let Some(workers) = args.workers {
        config.mining_workers = workers;
    }
    Ok(config)
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = serve_config(&args)?;
    println!(
        "{} filechain server on {} (difficulty {}, {} deletes)",
        "▶".green().bold(),
        config.bind_addr.to_string().bold(),
        config.difficulty.to_string().cyan(),
        config.deletion_policy.to_string().yellow(),
    );
    let server = FileChainServer::new(config);
    tokio::runtime::Runtime::new()?.block_on(server.serve())?;
    Ok(())
}

fn load_chain(path: &Path) -> anyhow::Result<Vec<BlockSnapshot>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn cmd_verify(args: VerifyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let difficulty = Difficulty::try_from(args.difficulty)?;
    let ledger = Ledger::from_snapshots(difficulty, load_chain(&args.file)?)?;
    let report = ledger.validate();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }
    if !report.is_valid {
        anyhow::bail!("{} of {} blocks failed validation", report.invalid_blocks, report.total_blocks);
    }
    Ok(())
}

/// Ledger holding the sample uploads the demo attacks.
fn demo_ledger(difficulty: Difficulty) -> Ledger {
    let mut ledger = Ledger::new(difficulty);
    for (name, address, size, uploader) in [
        ("research_paper.pdf", "QmResearchPaper123", 2_048_000, "professor_smith"),
        ("project_data.xlsx", "QmProjectData456", 1_024_000, "student_john"),
        ("important_document.pdf", "QmValidHash1", 1_048_576, "demo_user"),
    ] {
        ledger.append(FileRecord::new(name, size, address).with_uploader(uploader));
    }
    ledger
}

/// Tamper with an exported copy of the chain. Returns `false` when the chain
/// is too short for the attack.
pub fn apply_scenario(scenario: Scenario, blocks: &mut [BlockSnapshot]) -> bool {
    let len = blocks.len();
    match scenario {
        Scenario::TamperBlock if len > 1 => {
            let target = &mut blocks[len - 1];
            if let Payload::File(record) = &mut target.payload {
                record.name = "malicious_software.exe".into();
                record.extension = "exe".into();
                record.size_bytes = 999_999_999;
                record.uploader = "unknown_hacker".into();
            }
            target.digest = "0000TAMPERED_HASH_DEMO".into();
            true
        }
        Scenario::CorruptChain if len > 2 => {
            blocks[2].previous_digest = "BROKEN_CHAIN_LINK_123".into();
            true
        }
        Scenario::InvalidPow if len > 1 => {
            blocks[len - 1].digest = "000INVALID_POW_HASH".into();
            true
        }
        _ => false,
    }
}

/// Outcome of a demo run: one report per attack, plus the live chain's.
struct DemoRun {
    clean: Vec<BlockSnapshot>,
    attacks: Vec<(Scenario, ValidationReport)>,
    live: ValidationReport,
}

/// Attack exported copies of the demo chain, then validate the live one.
fn run_demo(difficulty: Difficulty, scenarios: &[Scenario]) -> anyhow::Result<DemoRun> {
    let ledger = demo_ledger(difficulty);
    let clean = ledger.export();

    let mut attacks = Vec::new();
    for &scenario in scenarios {
        let mut copy = clean.clone();
        if !apply_scenario(scenario, &mut copy) {
            tracing::warn!(scenario = scenario.name(), "chain too short; skipped");
            continue;
        }
        attacks.push((scenario, Ledger::from_snapshots(difficulty, copy)?.validate()));
    }

    Ok(DemoRun {
        clean,
        attacks,
        live: ledger.validate(),
    })
}

fn cmd_demo(args: DemoArgs, format: OutputFormat) -> anyhow::Result<()> {
    let difficulty = Difficulty::try_from(args.difficulty)?;
    let run = run_demo(difficulty, &args.scenario.expand())?;

    if let Some(path) = &args.export {
        std::fs::write(path, serde_json::to_string_pretty(&run.clean)?)
            .with_context(|| format!("writing {}", path.display()))?;
        if matches!(format, OutputFormat::Text) {
            println!("{} Exported {} blocks to {}", "✓".green(), run.clean.len(), path.display());
        }
    }

    match format {
        OutputFormat::Json => {
            let scenarios: Vec<_> = run
                .attacks
                .iter()
                .map(|(scenario, report)| json!({ "scenario": scenario.name(), "report": report }))
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "scenarios": scenarios, "live": run.live }))?
            );
        }
        OutputFormat::Text => {
            for (scenario, report) in &run.attacks {
                println!("\n{} {}", "Scenario:".bold(), scenario.name().yellow().bold());
                print_report(report);
            }
            println!("\n{}", "Live ledger (untouched):".bold());
            print_report(&run.live);
        }
    }
    Ok(())
}

fn print_report(report: &ValidationReport) {
    if report.is_valid {
        println!("{} Chain is valid", "✓".green().bold());
    } else {
        println!("{} Chain is INVALID", "✗".red().bold());
    }
    println!(
        "  Blocks: {} total, {} valid, {} invalid",
        report.total_blocks.to_string().bold(),
        report.valid_blocks.to_string().green(),
        report.invalid_blocks.to_string().red(),
    );
    for block in report.blocks.iter().filter(|b| !b.is_valid()) {
        println!("  Block #{}:", block.block_index.to_string().yellow());
        for issue in &block.issues {
            println!("    {} {}", "-".red(), issue.message);
        }
    }
}
