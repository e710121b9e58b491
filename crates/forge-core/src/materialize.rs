//! Create the empty file layout a module graph describes.
//!
//! Layout: `<root>/<module>/<name>.<ext>`. Template nodes get one artifact,
//! paired nodes a header and a source. Only shapes are written, never content,
//! and existing files are left untouched, so the operation is idempotent.

use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::config::LayoutConfig;
use crate::error::GraphError;
use crate::graph::{FileKind, FileNode, ModuleGraph};

/// Errors while materializing a graph.
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("failed to create {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a materialize run touched. Paths are absolute (joined onto the root).
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaterializeReport {
    pub directories: Vec<PathBuf>,
    /// Placeholders created by this run.
    pub created: Vec<PathBuf>,
    /// Placeholders that were already present and left as they were.
    pub existing: Vec<PathBuf>,
}

impl MaterializeReport {
    /// Artifacts accounted for, created or pre-existing.
    #[must_use]
    pub fn artifact_count(&self) -> usize {
        self.created.len() + self.existing.len()
    }
}

/// Relative paths of the artifacts a node materializes to, header first.
#[must_use]
pub fn artifact_paths(node: &FileNode, layout: &LayoutConfig) -> Vec<PathBuf> {
    let dir = Path::new(node.module_name());
    // The name is kept whole: `socket.v1` must not lose its `.v1` to the extension.
    let artifact = |ext: &str| dir.join(format!("{}.{ext}", node.name));
    match node.kind {
        FileKind::Template => vec![artifact(&layout.template_extension)],
        FileKind::Paired => vec![
            artifact(&layout.header_extension),
            artifact(&layout.source_extension),
        ],
        FileKind::External => Vec::new(),
    }
}

/// Create module directories and empty placeholders in implementation order.
///
/// A cyclic graph is refused before anything is written.
pub fn materialize(
    graph: &ModuleGraph,
    root: &Path,
    layout: &LayoutConfig,
) -> Result<MaterializeReport, MaterializeError> {
    let ordered = graph.ordered_nodes()?;
    let mut report = MaterializeReport::default();

    create_dir(root)?;
    for module in graph.module_names() {
        let dir = root.join(module);
        create_dir(&dir)?;
        report.directories.push(dir);
    }

    for node in ordered {
        for relative in artifact_paths(node, layout) {
            let path = root.join(relative);
            if touch(&path)? {
                report.created.push(path);
            } else {
                report.existing.push(path);
            }
        }
    }

    tracing::info!(
        created = report.created.len(),
        existing = report.existing.len(),
        root = %root.display(),
        "materialized project layout"
    );
    Ok(report)
}

fn create_dir(path: &Path) -> Result<(), MaterializeError> {
    fs::create_dir_all(path).map_err(|source| MaterializeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Create an empty file unless one exists. Returns true if it was created.
fn touch(path: &Path) -> Result<bool, MaterializeError> {
    if path.is_file() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| MaterializeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(true)
}
