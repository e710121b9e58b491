//! Build/test driver: collect sources, run the compiler, parse what it printed.
//!
//! Process failures never surface as `Err`. A compiler that cannot be started,
//! a non-zero exit, a test binary that crashes: each is recorded in the
//! report so batch callers can keep going.

use forge_core::config::BuildConfig;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use crate::diagnostics::{DiagnosticEntry, parse_compiler_output};
use crate::error::BuildError;
use crate::gtest::{GtestSummary, parse_gtest_output};
use crate::sources::{SourceSet, find_source_files, find_test_sources};
use crate::toolchain::{Toolchain, ToolchainChoice, find_on_path};

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !out.is_empty() && !self.stderr.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&self.stderr);
        out
    }
}

/// Seam over process execution.
pub trait CommandRunner {
    /// Run `program` to completion in `cwd`. `Err` only when it could not be started.
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<ProcessOutput>;

    /// Whether `program` can be launched. Used by `auto` toolchain selection.
    fn is_available(&self, program: &str) -> bool {
        find_on_path(program).is_some()
    }
}

/// Runs real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<ProcessOutput> {
        let start = Instant::now();
        let output = Command::new(program).args(args).current_dir(cwd).output()?;
        tracing::debug!(
            program,
            exit_code = ?output.status.code(),
            duration_ms = start.elapsed().as_millis() as u64,
            "process finished"
        );
        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Outcome of compiling a whole project.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub success: bool,
    /// Raw compiler output (stdout + stderr).
    pub output: String,
    pub errors: Vec<DiagnosticEntry>,
    pub warnings: Vec<DiagnosticEntry>,
    /// Set on success.
    pub executable: Option<PathBuf>,
    pub toolchain: Option<Toolchain>,
    pub command: Option<String>,
    pub exit_code: Option<i32>,
    /// Why the compiler never ran or could not be started.
    pub process_error: Option<String>,
    /// Present when tests were requested and the build succeeded.
    pub tests: Option<TestSuiteReport>,
}

impl BuildReport {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            process_error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Outcome of compiling and running one test source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TestSourceReport {
    pub source: PathBuf,
    pub success: bool,
    pub command: Option<String>,
    /// Compiler output when the test failed to build, else the test binary's output.
    pub output: String,
    pub errors: Vec<DiagnosticEntry>,
    pub warnings: Vec<DiagnosticEntry>,
    pub executable: Option<PathBuf>,
    pub exit_code: Option<i32>,
    pub gtest: Option<GtestSummary>,
    pub process_error: Option<String>,
}

/// Outcome of all test sources. `total` counts sources, not test cases.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TestSuiteReport {
    pub total: usize,
    pub passed: usize,
    /// Sources that failed to build, crashed or had failing cases.
    pub failed: Vec<PathBuf>,
    pub sources: Vec<TestSourceReport>,
}

impl TestSuiteReport {
    pub fn all_passed(&self) -> bool {
        self.failed.is_empty()
    }

    /// Test cases across all sources as `(passed, total)`.
    pub fn case_counts(&self) -> (usize, usize) {
        self.sources
            .iter()
            .filter_map(|s| s.gtest.as_ref())
            .fold((0, 0), |(p, t), g| (p + g.passed, t + g.total))
    }
}

/// Compiles a project tree and optionally its googletest suite.
pub struct Builder<R: CommandRunner = SystemRunner> {
    config: BuildConfig,
    runner: R,
}

impl Builder<SystemRunner> {
    pub fn new(config: BuildConfig) -> Self {
        Self::with_runner(config, SystemRunner)
    }
}

impl<R: CommandRunner> Builder<R> {
    pub fn with_runner(config: BuildConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Turn the configured choice into a concrete toolchain.
    pub fn resolve_toolchain(&self) -> Result<Toolchain, BuildError> {
        let choice: ToolchainChoice = self
            .config
            .toolchain
            .parse()
            .map_err(BuildError::Toolchain)?;
        Ok(choice.resolve(|program| self.runner.is_available(program)))
    }

    fn build_dir(&self, root: &Path) -> Result<PathBuf, BuildError> {
        let dir = root.join(&self.config.build_dir);
        fs::create_dir_all(&dir).map_err(|source| BuildError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    fn collect_sources(&self, root: &Path) -> Result<SourceSet, BuildError> {
        find_source_files(root, &self.config.exclude_dirs, &self.config.exclude_globs)
    }

    /// Compile every source under `root` into `<build_dir>/<output_name>`.
    ///
    /// Runs the test suite afterwards when `run_tests` is set and the build
    /// succeeded.
    pub fn compile_project(&self, root: &Path) -> BuildReport {
        let prepared = self.build_dir(root).and_then(|build_dir| {
            let sources = self.collect_sources(root)?;
            if sources.is_empty() {
                return Err(BuildError::NoSources(root.to_path_buf()));
            }
            let toolchain = self.resolve_toolchain()?;
            Ok((build_dir, sources, toolchain))
        });
        let (build_dir, sources, toolchain) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::warn!(error = %e, "build not started");
                return BuildReport::failed(e.to_string());
            }
        };

        let output_path = build_dir.join(&self.config.output_name);
        let command = toolchain.compile_command(
            &sources.sources,
            &sources.include_dirs,
            &output_path,
            &self.config,
        );
        tracing::info!(
            toolchain = %toolchain,
            sources = sources.sources.len(),
            "compiling project"
        );

        let mut report = BuildReport {
            toolchain: Some(toolchain),
            command: Some(command.to_string()),
            ..BuildReport::default()
        };

        let process = match self.runner.run(&command.program, &command.args, root) {
            Ok(process) => process,
            Err(e) => {
                report.process_error = Some(format!("failed to start {}: {e}", command.program));
                return report;
            }
        };

        report.output = process.combined();
        (report.errors, report.warnings) = parse_compiler_output(&report.output).into_parts();
        report.exit_code = process.exit_code;
        report.success = process.success();

        if report.success {
            report.executable = Some(toolchain.executable_path(&output_path));
            if self.config.run_tests {
                report.tests = Some(self.run_tests(root, toolchain));
            }
        }
        tracing::info!(
            success = report.success,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "build finished"
        );
        report
    }

    /// Compile and run each file under `<root>/tests` as its own gtest binary.
    pub fn run_tests(&self, root: &Path, toolchain: Toolchain) -> TestSuiteReport {
        let test_sources = find_test_sources(root);
        let mut suite = TestSuiteReport {
            total: test_sources.len(),
            ..TestSuiteReport::default()
        };
        if test_sources.is_empty() {
            return suite;
        }

        // Tests include project headers; an unreadable tree just means no extra -I.
        let include_dirs = self
            .collect_sources(root)
            .map(|set| set.include_dirs)
            .unwrap_or_default();
        let out_dir = match self.build_dir(root) {
            Ok(dir) => dir.join("tests"),
            Err(e) => {
                suite.failed = test_sources.clone();
                suite.sources = test_sources
                    .into_iter()
                    .map(|source| TestSourceReport {
                        source,
                        process_error: Some(e.to_string()),
                        ..TestSourceReport::default()
                    })
                    .collect();
                return suite;
            }
        };

        for source in test_sources {
            let report = self.run_test_source(root, toolchain, &source, &include_dirs, &out_dir);
            if report.success {
                suite.passed += 1;
            } else {
                suite.failed.push(source);
            }
            suite.sources.push(report);
        }
        tracing::info!(
            passed = suite.passed,
            total = suite.total,
            "test sources finished"
        );
        suite
    }

    fn run_test_source(
        &self,
        root: &Path,
        toolchain: Toolchain,
        source: &Path,
        include_dirs: &[PathBuf],
        out_dir: &Path,
    ) -> TestSourceReport {
        let mut report = TestSourceReport {
            source: source.to_path_buf(),
            ..TestSourceReport::default()
        };
        if let Err(e) = fs::create_dir_all(out_dir) {
            report.process_error = Some(format!("failed to create {}: {e}", out_dir.display()));
            return report;
        }

        let stem = source
            .file_stem()
            .map_or_else(|| "test".into(), |s| s.to_string_lossy());
        let output_path = out_dir.join(&*stem);
        let command = toolchain.test_command(
            &[source.to_path_buf()],
            include_dirs,
            &output_path,
            &self.config,
        );
        report.command = Some(command.to_string());

        let compiled = match self.runner.run(&command.program, &command.args, root) {
            Ok(compiled) => compiled,
            Err(e) => {
                report.process_error = Some(format!("failed to start {}: {e}", command.program));
                return report;
            }
        };
        if !compiled.success() {
            report.output = compiled.combined();
            report.exit_code = compiled.exit_code;
            (report.errors, report.warnings) = parse_compiler_output(&report.output).into_parts();
            tracing::warn!(source = %source.display(), "test source failed to compile");
            return report;
        }

        let executable = toolchain.executable_path(&output_path);
        let program = executable.display().to_string();
        report.executable = Some(executable);

        let ran = match self.runner.run(&program, &[], root) {
            Ok(ran) => ran,
            Err(e) => {
                report.process_error = Some(format!("failed to start {program}: {e}"));
                return report;
            }
        };
        report.output = ran.combined();
        report.exit_code = ran.exit_code;
        let summary = parse_gtest_output(&report.output);
        report.success = ran.success() && summary.failed.is_empty();
        report.gtest = Some(summary);
        report
    }
}
