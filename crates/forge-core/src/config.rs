//! Configuration for graph construction, file layout, builds and model access.
//!
//! Load order: `.forge/config.toml` → environment variables → defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::graph::GraphOptions;

/// Top-level Forge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    pub graph: GraphOptions,
    pub layout: LayoutConfig,
    pub build: BuildConfig,
    pub model: ModelConfig,
}

/// File extensions used when a graph node becomes files on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Interface half of a paired node.
    pub header_extension: String,
    /// Implementation half of a paired node.
    pub source_extension: String,
    /// Single artifact of a template node.
    pub template_extension: String,
}

/// Compiler and test-runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// `auto`, `gcc`, `clang` or `msvc`.
    pub toolchain: String,
    /// Name of the produced executable inside `build_dir`.
    pub output_name: String,
    /// Output directory, relative to the project root.
    pub build_dir: PathBuf,
    /// Directory names skipped when collecting sources.
    pub exclude_dirs: Vec<String>,
    /// Glob patterns, relative to the project root, skipped when collecting sources.
    pub exclude_globs: Vec<String>,
    /// Compile and run `tests/` after a successful build.
    pub run_tests: bool,
    pub cpp_standard: String,
    pub c_standard: String,
    /// googletest headers, for test builds.
    pub gtest_include: Option<PathBuf>,
    /// googletest libraries, for test builds.
    pub gtest_lib: Option<PathBuf>,
    /// Additional include directories passed to every compile.
    pub extra_include_dirs: Vec<PathBuf>,
}

/// How requests are shaped for the model endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStyle {
    /// `{"model": .., "request": {"messages": [..]}}` posted to the endpoint as-is.
    #[default]
    Wrapped,
    /// OpenAI chat completions (`{base}/v1/chat/completions`).
    OpenAi,
}

/// Model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub endpoint: String,
    pub api_style: ApiStyle,
    /// Model name, or `auto` to take the first entry of `models`.
    pub model: String,
    pub models: Vec<String>,
    pub timeout_secs: u64,
    /// Directory where answer transcripts are written, if set.
    pub answer_log: Option<PathBuf>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            header_extension: "hpp".to_string(),
            source_extension: "cpp".to_string(),
            template_extension: "tpp".to_string(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            toolchain: "auto".to_string(),
            output_name: "out".to_string(),
            build_dir: PathBuf::from("bin"),
            exclude_dirs: ["build", "bin", "test", "tests"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            exclude_globs: Vec::new(),
            run_tests: true,
            cpp_standard: "c++23".to_string(),
            c_standard: "c11".to_string(),
            gtest_include: None,
            gtest_lib: None,
            extra_include_dirs: Vec::new(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://api.onlysq.ru/ai/v2".to_string(),
            api_style: ApiStyle::default(),
            model: "auto".to_string(),
            models: vec!["gpt-4o-mini".to_string()],
            timeout_secs: 1000,
            answer_log: None,
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl ForgeConfig {
    /// Load config from `.forge/config.toml` in the project root, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".forge").join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        env_override("FORGE_TOOLCHAIN", &mut config.build.toolchain);
        env_override("FORGE_OUTPUT_NAME", &mut config.build.output_name);
        env_override("FORGE_RUN_TESTS", &mut config.build.run_tests);
        env_override("FORGE_MODEL", &mut config.model.model);
        env_override("FORGE_MODEL_ENDPOINT", &mut config.model.endpoint);
        env_override("FORGE_MODEL_TIMEOUT_SECS", &mut config.model.timeout_secs);
        env_override("FORGE_UNRESOLVED", &mut config.graph.unresolved);

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        for (key, ext) in [
            ("header_extension", &layout.header_extension),
            ("source_extension", &layout.source_extension),
            ("template_extension", &layout.template_extension),
        ] {
            if ext.trim().is_empty() {
                anyhow::bail!("layout.{key} must not be empty");
            }
            if ext.contains(['.', '/', '\\']) {
                anyhow::bail!("layout.{key} must be a bare extension, got '{ext}'");
            }
        }
        if layout.header_extension == layout.source_extension {
            anyhow::bail!(
                "layout.header_extension and layout.source_extension are both '{}'",
                layout.header_extension
            );
        }
        if self.graph.external_marker.is_empty() {
            anyhow::bail!("graph.external_marker must not be empty");
        }
        Ok(())
    }
}
