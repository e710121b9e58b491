//! Prompt templates and placeholder rendering.
//!
//! Templates are plain text with `{placeholder}` markers. Only the markers a
//! template actually contains are resolved, so a template that never mentions
//! `{dependencies}` renders without a current file.

use forge_core::GraphError;
use forge_core::materialize::artifact_paths;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::GenerationContext;

/// Bundled template for the design stage.
pub const DESIGN_TEMPLATE: &str = include_str!("prompts/design.md");

/// Bundled template for per-file generation.
pub const IMPLEMENT_TEMPLATE: &str = include_str!("prompts/implement.md");

/// Markers understood by [`render`].
pub const PLACEHOLDERS: [&str; 6] = [
    "{task}",
    "{QnA}",
    "{project_structure}",
    "{target_file}",
    "{realization_instruction}",
    "{dependencies}",
];

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("template uses {placeholder} but no {input} is set")]
    MissingInput {
        placeholder: &'static str,
        input: &'static str,
    },
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn missing(placeholder: &'static str, input: &'static str) -> PromptError {
    PromptError::MissingInput { placeholder, input }
}

/// Fill every placeholder `template` mentions from `ctx`.
///
/// Markers are located in the template only, so a filled-in value that itself
/// contains `{task}` or `{QnA}` is copied through literally.
pub fn render(template: &str, ctx: &GenerationContext) -> Result<String, PromptError> {
    let mut values = Vec::new();
    for placeholder in PLACEHOLDERS {
        if template.contains(placeholder) {
            values.push((placeholder, resolve(placeholder, ctx)?));
        }
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some((at, placeholder, value)) = values
        .iter()
        .filter_map(|(placeholder, value)| rest.find(placeholder).map(|at| (at, *placeholder, value)))
        .min_by_key(|(at, _, _)| *at)
    {
        out.push_str(&rest[..at]);
        out.push_str(value);
        rest = &rest[at + placeholder.len()..];
    }
    out.push_str(rest);
    Ok(out)
}

fn resolve(placeholder: &'static str, ctx: &GenerationContext) -> Result<String, PromptError> {
    match placeholder {
        "{task}" => ctx
            .task
            .clone()
            .ok_or_else(|| missing(placeholder, "task")),
        "{QnA}" => ctx
            .answers
            .clone()
            .ok_or_else(|| missing(placeholder, "question/answer list")),
        "{project_structure}" => {
            let description = ctx
                .description
                .as_ref()
                .ok_or_else(|| missing(placeholder, "project description"))?;
            Ok(description.to_json()?)
        }
        "{target_file}" => target_file(placeholder, ctx),
        "{realization_instruction}" => realization_instruction(placeholder, ctx),
        "{dependencies}" => dependencies(placeholder, ctx),
        _ => Ok(String::new()),
    }
}

fn current_name<'a>(placeholder: &'static str, ctx: &'a GenerationContext) -> Result<&'a str, PromptError> {
    ctx.current_file
        .as_deref()
        .ok_or_else(|| missing(placeholder, "current file"))
}

fn target_file(placeholder: &'static str, ctx: &GenerationContext) -> Result<String, PromptError> {
    let name = current_name(placeholder, ctx)?;
    let Some(graph) = ctx.graph.as_ref() else {
        return Ok(name.to_string());
    };
    let node = graph
        .node(name)
        .ok_or_else(|| GraphError::NotFound(name.to_string()))?;
    let paths: Vec<String> = artifact_paths(node, &ctx.layout)
        .iter()
        .map(|p| slash_path(p))
        .collect();
    Ok(format!("{name} ({})", paths.join(", ")))
}

/// `<root>/<module>/<name>.md`, written by hand or by an earlier stage.
fn realization_instruction(placeholder: &'static str, ctx: &GenerationContext) -> Result<String, PromptError> {
    let name = current_name(placeholder, ctx)?;
    let graph = ctx
        .graph
        .as_ref()
        .ok_or_else(|| missing(placeholder, "module graph"))?;
    let node = graph
        .node(name)
        .ok_or_else(|| GraphError::NotFound(name.to_string()))?;
    let path = ctx
        .project_root
        .join(node.module_name())
        .join(format!("{name}.md"));
    read(&path)
}

/// Header of every internal file the current one transitively depends on,
/// dependencies first.
fn dependencies(placeholder: &'static str, ctx: &GenerationContext) -> Result<String, PromptError> {
    let name = current_name(placeholder, ctx)?;
    let graph = ctx
        .graph
        .as_ref()
        .ok_or_else(|| missing(placeholder, "module graph"))?;

    let subtree = graph.subtree(name)?;
    let mut out = String::new();
    for node in subtree.iter().filter(|n| n.name != name) {
        let Some(header) = artifact_paths(node, &ctx.layout).into_iter().next() else {
            continue;
        };
        let code = read(&ctx.project_root.join(&header))?;
        if out.is_empty() {
            out.push_str("## Dependencies\n");
        }
        let _ = write!(
            out,
            "### {}\n```cpp\n{}\n```\n",
            slash_path(&header),
            code.trim()
        );
    }
    Ok(out)
}

fn read(path: &Path) -> Result<String, PromptError> {
    fs::read_to_string(path).map_err(|source| PromptError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
