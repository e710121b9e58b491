//! Explicit state threaded through the generation stages.

use forge_core::config::{ForgeConfig, LayoutConfig, ModelConfig};
use forge_core::{FileNode, GraphError, GraphOptions, ModuleGraph, ProjectDescription};
use std::path::{Path, PathBuf};

use crate::trace::CallTrace;

/// Resolve the configured model name. `auto` (or an empty name) picks the
/// first candidate; with no candidates the name is kept as-is.
pub fn select_model(config: &ModelConfig) -> String {
    let requested = config.model.trim();
    if (requested.is_empty() || requested.eq_ignore_ascii_case("auto"))
        && let Some(first) = config.models.first()
    {
        return first.clone();
    }
    requested.to_string()
}

/// Everything a stage needs to know about the project being generated.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub model: String,
    pub project_root: PathBuf,
    /// Task statement, usually read from the `--task` file.
    pub task: Option<String>,
    /// Clarifying questions and answers, if the task came with any.
    pub answers: Option<String>,
    pub description: Option<ProjectDescription>,
    pub graph: Option<ModuleGraph>,
    /// Name of the file currently being generated.
    pub current_file: Option<String>,
    pub layout: LayoutConfig,
    pub graph_options: GraphOptions,
    /// Directory for answer transcripts.
    pub answer_log: Option<PathBuf>,
    pub trace: CallTrace,
}

impl GenerationContext {
    pub fn new(project_root: &Path, config: &ForgeConfig) -> Self {
        Self {
            model: select_model(&config.model),
            project_root: project_root.to_path_buf(),
            task: None,
            answers: None,
            description: None,
            graph: None,
            current_file: None,
            layout: config.layout.clone(),
            graph_options: config.graph.clone(),
            answer_log: config
                .model
                .answer_log
                .as_ref()
                .map(|dir| project_root.join(dir)),
            trace: CallTrace::new(),
        }
    }

    #[must_use]
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Install a description and the graph built from it.
    pub fn set_description(&mut self, description: ProjectDescription) -> Result<&ModuleGraph, GraphError> {
        let graph = ModuleGraph::build_with(&description, &self.graph_options)?;
        self.description = Some(description);
        Ok(self.graph.insert(graph))
    }

    /// Graph node of [`Self::current_file`], if both are set.
    pub fn current_node(&self) -> Option<&FileNode> {
        let name = self.current_file.as_deref()?;
        self.graph.as_ref()?.node(name)
    }

    /// Run `f` inside a traced call named `name`.
    pub fn traced<T>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        self.trace.enter(&self.model, name);
        let out = f(self);
        self.trace.exit(&self.model, name);
        out
    }

    pub fn log(&self, message: &str) {
        self.trace.info(&self.model, message);
    }

    pub fn warn(&self, message: &str) {
        self.trace.warn(&self.model, message);
    }
}
