//! Read/write the accepted project description under `.forge/`.

use crate::description::ProjectDescription;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const FORGE_DIR: &str = ".forge";
const PROJECT_FILE: &str = "project.json";
const TASK_FILE: &str = "task.md";

/// Get the path to the Forge directory for a given project root.
pub fn forge_dir(project_root: &Path) -> PathBuf {
    project_root.join(FORGE_DIR)
}

/// Get the path to the stored project description.
pub fn project_file(project_root: &Path) -> PathBuf {
    forge_dir(project_root).join(PROJECT_FILE)
}

/// Check if a project description has been stored for the given root.
pub fn exists(project_root: &Path) -> bool {
    project_file(project_root).exists()
}

/// Load the stored project description.
pub fn load(project_root: &Path) -> Result<ProjectDescription> {
    load_from(&project_file(project_root))
}

/// Load a project description from an arbitrary JSON file.
pub fn load_from(path: &Path) -> Result<ProjectDescription> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read project description from {}", path.display()))?;
    ProjectDescription::from_json(&json)
        .with_context(|| format!("invalid project description in {}", path.display()))
}

/// Save a project description, creating the `.forge` directory if needed.
pub fn save(project_root: &Path, description: &ProjectDescription) -> Result<()> {
    let dir = forge_dir(project_root);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create Forge directory {}", dir.display()))?;

    let path = project_file(project_root);
    let json = description.to_json()?;
    fs::write(&path, json)
        .with_context(|| format!("failed to write project description to {}", path.display()))?;

    Ok(())
}

/// Keep the task statement next to the description it produced.
pub fn save_task(project_root: &Path, task: &str) -> Result<()> {
    let dir = forge_dir(project_root);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create Forge directory {}", dir.display()))?;
    let path = dir.join(TASK_FILE);
    fs::write(&path, task).with_context(|| format!("failed to write task to {}", path.display()))
}

/// The stored task statement, if any.
pub fn load_task(project_root: &Path) -> Result<Option<String>> {
    let path = forge_dir(project_root).join(TASK_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let task = fs::read_to_string(&path)
        .with_context(|| format!("failed to read task from {}", path.display()))?;
    Ok(Some(task))
}

/// Ensure `.forge` is in .gitignore. Returns true if it was already there.
pub fn ensure_gitignore(project_root: &Path) -> Result<bool> {
    let gitignore = project_root.join(".gitignore");

    if gitignore.exists() {
        let content = fs::read_to_string(&gitignore)?;
        if content
            .lines()
            .any(|line| line.trim() == ".forge" || line.trim() == ".forge/")
        {
            return Ok(true);
        }
        let mut new_content = content;
        if !new_content.ends_with('\n') {
            new_content.push('\n');
        }
        new_content.push_str("\n# Forge state\n.forge/\n");
        fs::write(&gitignore, new_content)?;
    } else {
        fs::write(&gitignore, "# Forge state\n.forge/\n")?;
    }

    Ok(false)
}
