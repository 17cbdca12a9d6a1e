// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use debsolve::cli::Cli;
use debsolve::{
    ConsolePrompter, DependencySolver, DescriptorList, DpkgIndex, NonInteractive, PomParser,
    Prompter, RuleStores, ToolPolicy, scan_repository,
};
use tracing::{info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.solver_config();
    info!(
        "Solving dependencies of {} ({} build)",
        config.package_name, config.mode
    );

    let policy = match &cli.policy {
        Some(path) => ToolPolicy::load(path)
            .with_context(|| format!("Failed to load tool policy {}", path.display()))?,
        None => ToolPolicy::builtin(),
    };
    let rules = RuleStores::open(&config.output_dir).with_context(|| {
        format!("Failed to read the rule files in {}", config.output_dir.display())
    })?;
    let list_path = config.descriptor_list_path();
    let list = DescriptorList::load(&list_path)
        .with_context(|| format!("Failed to read {}", list_path.display()))?;

    let parser = PomParser::new();
    let mut repository = scan_repository(&config.repository_root, &parser).with_context(|| {
        format!(
            "Failed to scan the Maven repository {}",
            config.repository_root.display()
        )
    })?;
    if repository.is_empty() {
        warn!(
            "No POM found in {}, every dependency will be unresolved",
            config.repository_root.display()
        );
    }
    let mut index = DpkgIndex::new(config.offline);
    let mut prompter: Box<dyn Prompter> = if cli.non_interactive {
        Box::new(NonInteractive)
    } else {
        Box::new(ConsolePrompter::new())
    };

    let mut solver = DependencySolver::new(
        config,
        &parser,
        &mut repository,
        &mut index,
        prompter.as_mut(),
    )
    .with_policy(policy)
    .with_rules(rules)
    .with_descriptor_list(list);

    let report = solver.solve().context("Dependency resolution failed")?;
    solver.save(&report).context("Failed to write the results")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for bucket in debsolve::Bucket::ALL {
            let entries: Vec<String> = report.bucket(bucket).iter().map(|e| e.to_string()).collect();
            println!("{:<9} {}", format!("{}:", bucket), entries.join(", "));
        }
    }

    if report.has_issues() {
        eprintln!("{} issue(s) found", report.issues.len());
        std::process::exit(1);
    }
    Ok(())
}
