//! Nested call tracing for the generation stages.
//!
//! Each traced call logs an enter line and an exit line, indented by the
//! current nesting depth:
//!
//! ```text
//! gpt-4o-mini       | Entering "design_project"
//! gpt-4o-mini       ---| Entering "ask"
//! gpt-4o-mini       ---| Exit from "ask"
//! gpt-4o-mini       | Exit from "design_project"
//! ```

/// Depth counter plus the line formatting shared by every stage log.
#[derive(Debug, Clone, Default)]
pub struct CallTrace {
    depth: usize,
}

impl CallTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// `---+` repeated per level, without the trailing `+`.
    pub fn prefix(&self) -> String {
        let mut prefix = "---+".repeat(self.depth);
        prefix.pop();
        prefix
    }

    /// Render a log line for `model` at the current depth.
    pub fn line(&self, model: &str, message: &str) -> String {
        format!("{model:<17} {}| {message}", self.prefix())
    }

    pub fn enter(&mut self, model: &str, name: &str) {
        tracing::debug!("{}", self.line(model, &format!("Entering \"{name}\"")));
        self.depth += 1;
    }

    pub fn exit(&mut self, model: &str, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        tracing::debug!("{}", self.line(model, &format!("Exit from \"{name}\"")));
    }

    pub fn info(&self, model: &str, message: &str) {
        tracing::info!("{}", self.line(model, message));
    }

    pub fn warn(&self, model: &str, message: &str) {
        tracing::warn!("{}", self.line(model, message));
    }
}
