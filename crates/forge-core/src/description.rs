//! The declarative project description returned by the model.
//!
//! Shape: `{"project": {"modules": [{"name", "files": [{"name", "is_template", "deps"}]}]}}`.
//! Names are unique across the whole project and dependencies refer to them
//! by bare name; a name starting with the external marker (`<vector>`) is an
//! opaque dependency outside the project.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// A whole project as described by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDescription {
    pub project: Project,
}

/// The `project` object: modules plus free-form rules the prompts may reuse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub modules: Vec<ModuleDescriptor>,

    /// Naming rules, style guide and similar; carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_rules: Option<serde_json::Value>,
}

/// A named group of files. Maps to one directory on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub files: Vec<FileDescriptor>,
}

/// One logical source artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,

    /// `true`: a single standalone artifact. `false`: a header + implementation pair.
    pub is_template: bool,

    /// Names of the files (or external markers) this file depends on, in declared order.
    #[serde(default)]
    pub deps: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FileDescriptor {
    /// Convenience constructor, mostly for tests and programmatic descriptions.
    #[must_use]
    pub fn new(name: impl Into<String>, is_template: bool, deps: &[&str]) -> Self {
        Self {
            name: name.into(),
            is_template,
            deps: deps.iter().map(|d| (*d).to_string()).collect(),
            description: None,
        }
    }
}

impl ModuleDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, files: Vec<FileDescriptor>) -> Self {
        Self {
            name: name.into(),
            description: None,
            files,
        }
    }
}

impl ProjectDescription {
    /// Build a description from modules, without global rules.
    #[must_use]
    pub fn from_modules(modules: Vec<ModuleDescriptor>) -> Self {
        Self {
            project: Project {
                modules,
                global_rules: None,
            },
        }
    }

    /// Parse the strict JSON form. Missing required keys are a construction error.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a model answer, which usually wraps the JSON in a fenced code block
    /// and sometimes surrounds it with prose.
    pub fn from_model_response(text: &str) -> Result<Self, GraphError> {
        Self::from_json(extract_json(text))
    }

    /// Serialize to pretty JSON (the form stored under `.forge/`).
    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.project.modules
    }

    /// Total number of file descriptors across all modules.
    pub fn file_count(&self) -> usize {
        self.project.modules.iter().map(|m| m.files.len()).sum()
    }
}

/// Pull the JSON payload out of a model answer.
///
/// Prefers the body of the first fenced block; otherwise the span from the first
/// `{` to the last `}`; otherwise the trimmed text as-is.
fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }
    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        // Skip the info string ("json") up to the end of the fence line.
        let body = after_fence
            .split_once('\n')
            .map_or(after_fence, |(_, body)| body);
        let body = body.find("```").map_or(body, |end| &body[..end]);
        return body.trim();
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(open), Some(close)) if open < close => &trimmed[open..=close],
        _ => trimmed,
    }
}
