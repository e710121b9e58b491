//! Design and generation stages.
//!
//! `design_project` turns a task into a validated module graph; `generate_files`
//! walks that graph in implementation order and fills each file's artifacts
//! with the code the model returns. Both run one request at a time and stop at
//! the first failure.

use forge_core::materialize::{MaterializeError, artifact_paths, materialize};
use forge_core::{GraphError, GraphStats, ModuleGraph, ProjectDescription};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::answers::write_answer;
use crate::client::{ChatMessage, ModelClient, ModelError, ModelReply};
use crate::context::GenerationContext;
use crate::prompt::{self, PromptError};

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
    #[error("no project design loaded; run the design stage first")]
    NoDesign,
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One generated file.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedFile {
    pub name: String,
    /// Artifacts written, relative to the project root.
    pub written: Vec<PathBuf>,
    /// Code blocks found in the answer.
    pub blocks: usize,
    pub model: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub files: Vec<GeneratedFile>,
}

impl GenerationReport {
    pub fn written_count(&self) -> usize {
        self.files.iter().map(|f| f.written.len()).sum()
    }
}

/// Bodies of the fenced code blocks in `text`, in order. An unterminated
/// block runs to the end of the text.
pub fn extract_code_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<Vec<&str>> = None;
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            match current.take() {
                Some(lines) => blocks.push(lines.join("\n")),
                None => current = Some(Vec::new()),
            }
        } else if let Some(lines) = current.as_mut() {
            lines.push(line);
        }
    }
    if let Some(lines) = current {
        blocks.push(lines.join("\n"));
    }
    blocks
}

/// Send a single user message and keep a transcript if an answer log is set.
pub fn ask<C: ModelClient + ?Sized>(
    client: &C,
    ctx: &mut GenerationContext,
    prompt: String,
) -> Result<ModelReply, StageError> {
    ctx.traced("ask", |ctx| {
        ctx.log(&format!("sending prompt ({} chars)", prompt.len()));
        let reply = client.complete(&ctx.model, &[ChatMessage::user(prompt)])?;
        ctx.log(&format!(
            "answer from {} ({} chars)",
            reply.model,
            reply.text.len()
        ));

        if let Some(dir) = &ctx.answer_log {
            match write_answer(dir, &reply) {
                Ok(path) => tracing::debug!("answer saved to {}", path.display()),
                Err(e) => ctx.warn(&format!("could not save answer: {e}")),
            }
        }
        Ok(reply)
    })
}

/// Ask for the project structure, parse and validate it, and store the
/// description and graph in `ctx`. Cyclic designs are rejected.
pub fn design_project<C: ModelClient + ?Sized>(
    client: &C,
    ctx: &mut GenerationContext,
    template: &str,
) -> Result<GraphStats, StageError> {
    ctx.traced("design_project", |ctx| {
        let prompt = prompt::render(template, ctx)?;
        let reply = ask(client, ctx, prompt)?;

        let description = ProjectDescription::from_model_response(&reply.text)?;
        let graph = ModuleGraph::build_with(&description, &ctx.graph_options)?;
        if let Some(members) = graph.find_cycle() {
            return Err(GraphError::Cycle { members }.into());
        }

        let stats = graph.stats();
        ctx.log(&format!(
            "design accepted: {} modules, {} files, depth {}",
            stats.modules, stats.files, stats.depth
        ));
        ctx.description = Some(description);
        ctx.graph = Some(graph);
        Ok(stats)
    })
}

/// Generate every file of the loaded design, dependencies first.
pub fn generate_files<C: ModelClient + ?Sized>(
    client: &C,
    ctx: &mut GenerationContext,
    template: &str,
) -> Result<GenerationReport, StageError> {
    ctx.traced("generate_files", |ctx| {
        let graph = ctx.graph.as_ref().ok_or(StageError::NoDesign)?;
        materialize(graph, &ctx.project_root, &ctx.layout)?;
        let order: Vec<String> = graph
            .implementation_order()?
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut report = GenerationReport::default();
        for name in order {
            let file = ctx.traced("generate_file", |ctx| {
                generate_file(client, ctx, template, &name)
            })?;
            report.files.push(file);
        }
        ctx.current_file = None;
        Ok(report)
    })
}

fn generate_file<C: ModelClient + ?Sized>(
    client: &C,
    ctx: &mut GenerationContext,
    template: &str,
    name: &str,
) -> Result<GeneratedFile, StageError> {
    ctx.current_file = Some(name.to_string());
    let prompt = prompt::render(template, ctx)?;
    let reply = ask(client, ctx, prompt)?;

    let mut blocks = extract_code_blocks(&reply.text);
    if blocks.is_empty() {
        ctx.warn(&format!("no code block in the answer for {name}; using it verbatim"));
        blocks.push(reply.text.clone());
    }

    let node = ctx
        .current_node()
        .ok_or_else(|| GraphError::NotFound(name.to_string()))?;
    let paths = artifact_paths(node, &ctx.layout);
    if blocks.len() < paths.len() {
        ctx.warn(&format!(
            "{name}: expected {} code blocks, got {}",
            paths.len(),
            blocks.len()
        ));
    }

    let mut written = Vec::new();
    for (relative, code) in paths.into_iter().zip(&blocks) {
        let path = ctx.project_root.join(&relative);
        let mut content = code.trim().to_string();
        content.push('\n');
        fs::write(&path, content).map_err(|source| StageError::Io { path, source })?;
        written.push(relative);
    }

    Ok(GeneratedFile {
        name: name.to_string(),
        written,
        blocks: blocks.len(),
        model: reply.model,
    })
}
