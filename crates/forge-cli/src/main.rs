//! CLI binary for Forge: design a C++ project with a model, lay it out on disk,
//! generate its files and build it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forge_build::{BuildReport, Builder, DiagnosticEntry, TestSuiteReport, parse_compiler_output};
use forge_core::config::ForgeConfig;
use forge_core::{FileNode, ModuleGraph, ProjectDescription};
use forge_model::{GenerationContext, HttpModelClient};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "forge", about = "Model-driven C++ project generator and builder", version)]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a project description JSON file and store it under .forge/
    Import {
        /// Path to the description file
        file: PathBuf,
    },

    /// Show graph statistics and the implementation order
    Plan {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a file together with everything it depends on, dependencies first
    Subtree {
        /// File name as declared in the description
        name: String,

        #[arg(long)]
        json: bool,
    },

    /// Create module directories and empty placeholder files
    Materialize,

    /// Ask the model for a project structure and store it
    Design {
        /// File with the task statement
        #[arg(long)]
        task: PathBuf,

        /// Prompt template (defaults to the bundled design prompt)
        #[arg(long)]
        prompt: Option<PathBuf>,
    },

    /// Ask the model for the code of every file, in implementation order
    Generate {
        /// Prompt template (defaults to the bundled implementation prompt)
        #[arg(long)]
        prompt: Option<PathBuf>,
    },

    /// Compile the project and run its tests
    Build {
        /// Toolchain: auto, gcc, clang, msvc (overrides config)
        #[arg(short, long)]
        toolchain: Option<String>,

        /// Skip the test suite
        #[arg(long)]
        no_tests: bool,

        #[arg(long)]
        json: bool,
    },

    /// Compile and run only the test suite under tests/
    Tests {
        #[arg(short, long)]
        toolchain: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Parse compiler output from a file, or stdin when omitted or "-"
    Parse {
        file: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;

    match cli.command {
        Commands::Import { file } => cmd_import(&project_root, &file),
        Commands::Plan { json } => cmd_plan(&project_root, json),
        Commands::Subtree { name, json } => cmd_subtree(&project_root, &name, json),
        Commands::Materialize => cmd_materialize(&project_root),
        Commands::Design { task, prompt } => cmd_design(&project_root, &task, prompt.as_deref()),
        Commands::Generate { prompt } => cmd_generate(&project_root, prompt.as_deref()),
        Commands::Build {
            toolchain,
            no_tests,
            json,
        } => cmd_build(&project_root, toolchain, no_tests, json),
        Commands::Tests { toolchain, json } => cmd_tests(&project_root, toolchain, json),
        Commands::Parse { file, json } => cmd_parse(file.as_deref(), json),
    }
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Load the stored description and build its graph with the configured options.
fn load_graph(project_root: &Path, config: &ForgeConfig) -> Result<(ProjectDescription, ModuleGraph)> {
    if !forge_core::storage::exists(project_root) {
        anyhow::bail!("No project description found. Run `forge design` or `forge import` first.");
    }
    let description = forge_core::storage::load(project_root)?;
    let graph = ModuleGraph::build_with(&description, &config.graph)
        .context("stored project description is inconsistent")?;
    tracing::debug!(
        "loaded {} files in {} modules from .forge/project.json",
        graph.len(),
        graph.module_names().len()
    );
    Ok((description, graph))
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn node_json(node: &FileNode) -> serde_json::Value {
    serde_json::json!({
        "name": node.name,
        "module": node.module,
        "kind": node.kind,
        "depth": node.depth,
    })
}

fn cmd_import(project_root: &Path, file: &Path) -> Result<()> {
    let config = ForgeConfig::load(project_root)?;
    let description = forge_core::storage::load_from(file)?;
    let graph = ModuleGraph::build_with(&description, &config.graph)?;
    if let Some(cycle) = graph.find_cycle() {
        eprintln!("Warning: dependency cycle: {}", cycle.join(" -> "));
    }

    forge_core::storage::save(project_root, &description)?;
    let _ = forge_core::storage::ensure_gitignore(project_root);

    let stats = graph.stats();
    eprintln!(
        "Imported {} modules, {} files ({} artifacts).",
        stats.modules, stats.files, stats.total_files
    );
    eprintln!("  Saved to: .forge/project.json");
    Ok(())
}

fn cmd_plan(project_root: &Path, json: bool) -> Result<()> {
    let config = ForgeConfig::load(project_root)?;
    let (_, graph) = load_graph(project_root, &config)?;
    let stats = graph.stats();

    if let Some(cycle) = graph.find_cycle() {
        if json {
            let out = serde_json::json!({ "stats": stats, "cycle": cycle });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        anyhow::bail!("dependency cycle: {}", cycle.join(" -> "));
    }

    let order = graph.implementation_order()?;
    if json {
        let out = serde_json::json!({
            "stats": stats,
            "order": order,
            "roots": graph.roots().iter().map(|n| n.name.as_str()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Modules: {}", graph.module_names().join(", "));
    println!(
        "Files: {} ({} artifacts), external dependencies: {}, depth: {}",
        stats.files, stats.total_files, stats.external_dependencies, stats.depth
    );
    println!("\nImplementation order:");
    for (i, name) in order.iter().enumerate() {
        if let Some(node) = graph.node(name) {
            println!(
                "{:>4}. {}/{} [{}] depth {}",
                i + 1,
                node.module_name(),
                node.name,
                node.kind.as_str(),
                node.depth
            );
        }
    }
    Ok(())
}

fn cmd_subtree(project_root: &Path, name: &str, json: bool) -> Result<()> {
    let config = ForgeConfig::load(project_root)?;
    let (_, graph) = load_graph(project_root, &config)?;
    let subtree = graph.subtree(name)?;

    if json {
        let nodes: Vec<_> = subtree.iter().copied().map(node_json).collect();
        println!("{}", serde_json::to_string_pretty(&nodes)?);
        return Ok(());
    }

    for node in &subtree {
        let marker = if node.name == name { "*" } else { " " };
        println!(
            "{marker} {}/{} [{}]",
            node.module_name(),
            node.name,
            node.kind.as_str()
        );
    }
    Ok(())
}

fn cmd_materialize(project_root: &Path) -> Result<()> {
    let config = ForgeConfig::load(project_root)?;
    let (_, graph) = load_graph(project_root, &config)?;

    let report = forge_core::materialize::materialize(&graph, project_root, &config.layout)?;
    eprintln!("Materialized {} modules:", report.directories.len());
    eprintln!("  Created: {}", report.created.len());
    eprintln!("  Already present: {}", report.existing.len());
    for path in &report.created {
        let rel = path.strip_prefix(project_root).unwrap_or(path);
        println!("  + {}", rel.display());
    }
    Ok(())
}

fn cmd_design(project_root: &Path, task_file: &Path, prompt: Option<&Path>) -> Result<()> {
    let config = ForgeConfig::load(project_root)?;
    let task = read_text(task_file)?;
    let template = match prompt {
        Some(path) => read_text(path)?,
        None => forge_model::DESIGN_TEMPLATE.to_string(),
    };

    let client = HttpModelClient::from_config(&config.model);
    let mut ctx = GenerationContext::new(project_root, &config).with_task(task.clone());
    eprintln!("Designing with model {}...", ctx.model);

    let pb = spinner("Waiting for the model...");
    let result = forge_model::design_project(&client, &mut ctx, &template);
    pb.finish_and_clear();
    let stats = result?;

    let description = ctx
        .description
        .as_ref()
        .context("design stage finished without a description")?;
    forge_core::storage::save(project_root, description)?;
    forge_core::storage::save_task(project_root, &task)?;
    let _ = forge_core::storage::ensure_gitignore(project_root);

    eprintln!("\nDesign accepted!");
    eprintln!("  Modules: {}", stats.modules);
    eprintln!("  Files: {} ({} artifacts)", stats.files, stats.total_files);
    eprintln!("  External dependencies: {}", stats.external_dependencies);
    eprintln!("  Depth: {}", stats.depth);
    eprintln!("  Saved to: .forge/project.json");
    Ok(())
}

fn cmd_generate(project_root: &Path, prompt: Option<&Path>) -> Result<()> {
    let config = ForgeConfig::load(project_root)?;
    let (description, _) = load_graph(project_root, &config)?;
    let template = match prompt {
        Some(path) => read_text(path)?,
        None => forge_model::IMPLEMENT_TEMPLATE.to_string(),
    };

    let mut ctx = GenerationContext::new(project_root, &config);
    ctx.task = forge_core::storage::load_task(project_root)?;
    ctx.set_description(description)?;
    let client = HttpModelClient::from_config(&config.model);

    let total = ctx.graph.as_ref().map_or(0, ModuleGraph::len);
    let pb = spinner(&format!("Generating {total} files with {}...", ctx.model));
    let result = forge_model::generate_files(&client, &mut ctx, &template);
    pb.finish_and_clear();
    let report = result?;

    for file in &report.files {
        let written: Vec<String> = file.written.iter().map(|p| p.display().to_string()).collect();
        println!("  {} -> {}", file.name, written.join(", "));
    }
    eprintln!(
        "\nGenerated {} files ({} artifacts written).",
        report.files.len(),
        report.written_count()
    );
    Ok(())
}

fn build_config(config: &ForgeConfig, toolchain: Option<String>) -> forge_core::config::BuildConfig {
    let mut build = config.build.clone();
    if let Some(toolchain) = toolchain {
        build.toolchain = toolchain;
    }
    build
}

fn cmd_build(project_root: &Path, toolchain: Option<String>, no_tests: bool, json: bool) -> Result<()> {
    let config = ForgeConfig::load(project_root)?;
    let mut build = build_config(&config, toolchain);
    if no_tests {
        build.run_tests = false;
    }

    let pb = spinner("Compiling...");
    let report = Builder::new(build).compile_project(project_root);
    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_build_report(&report);
    }

    if !report.success {
        anyhow::bail!("build failed");
    }
    if let Some(tests) = &report.tests
        && !tests.all_passed()
    {
        anyhow::bail!("{} of {} test sources failed", tests.failed.len(), tests.total);
    }
    Ok(())
}

fn cmd_tests(project_root: &Path, toolchain: Option<String>, json: bool) -> Result<()> {
    let config = ForgeConfig::load(project_root)?;
    let builder = Builder::new(build_config(&config, toolchain));
    let toolchain = builder.resolve_toolchain()?;

    let pb = spinner(&format!("Running tests with {toolchain}..."));
    let suite = builder.run_tests(project_root, toolchain);
    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&suite)?);
    } else {
        print_test_suite(&suite);
    }

    if !suite.all_passed() {
        anyhow::bail!("{} of {} test sources failed", suite.failed.len(), suite.total);
    }
    Ok(())
}

fn cmd_parse(file: Option<&Path>, json: bool) -> Result<()> {
    let input = match file {
        Some(path) if path != Path::new("-") => read_text(path)?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let parsed = parse_compiler_output(&input);
    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        print_diagnostics(&parsed.errors, &parsed.warnings);
        eprintln!(
            "{} error(s), {} warning(s)",
            parsed.errors.len(),
            parsed.warnings.len()
        );
    }
    Ok(())
}

fn print_diagnostics(errors: &[DiagnosticEntry], warnings: &[DiagnosticEntry]) {
    for entry in errors.iter().chain(warnings) {
        println!("{entry}");
        for line in entry.context.lines() {
            println!("    {line}");
        }
    }
}

fn print_build_report(report: &BuildReport) {
    if let Some(command) = &report.command {
        eprintln!("$ {command}");
    }
    print_diagnostics(&report.errors, &report.warnings);

    if let Some(message) = &report.process_error {
        eprintln!("Build could not run: {message}");
    } else if report.success {
        eprintln!(
            "\nBuild succeeded ({} warning(s)).",
            report.warnings.len()
        );
        if let Some(exe) = &report.executable {
            eprintln!("  Executable: {}", exe.display());
        }
    } else {
        eprintln!(
            "\nBuild failed: {} error(s), {} warning(s).",
            report.errors.len(),
            report.warnings.len()
        );
        if report.errors.is_empty() && !report.output.trim().is_empty() {
            eprintln!("{}", report.output.trim_end());
        }
    }

    if let Some(tests) = &report.tests {
        print_test_suite(tests);
    }
}

fn print_test_suite(suite: &TestSuiteReport) {
    if suite.total == 0 {
        eprintln!("No test sources found under tests/.");
        return;
    }

    eprintln!("\nTests:");
    for source in &suite.sources {
        let verdict = if source.success { "PASS" } else { "FAIL" };
        let cases = source
            .gtest
            .as_ref()
            .map(|g| format!(" ({}/{} cases)", g.passed, g.total))
            .unwrap_or_default();
        println!("  {verdict} {}{cases}", source.source.display());

        if let Some(message) = &source.process_error {
            println!("       {message}");
        }
        for entry in &source.errors {
            println!("       {entry}");
        }
        if let Some(gtest) = &source.gtest {
            for failed in &gtest.failed {
                println!("       failed: {}", failed.name);
            }
        }
    }

    let (passed_cases, total_cases) = suite.case_counts();
    eprintln!(
        "  Sources: {}/{} passed, cases: {}/{} passed",
        suite.passed, suite.total, passed_cases, total_cases
    );
}
