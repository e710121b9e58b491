//! Model-driven stages for Forge: ask a chat model for a project design, then
//! for the code of every file in dependency order.
//!
//! All state lives in an explicit [`GenerationContext`]; the endpoint sits
//! behind the [`ModelClient`] trait so stages can run against a fake.

pub mod answers;
pub mod client;
pub mod context;
pub mod prompt;
pub mod stages;
pub mod trace;

pub use client::{ChatMessage, HttpModelClient, ModelClient, ModelError, ModelReply};
pub use context::{GenerationContext, select_model};
pub use prompt::{DESIGN_TEMPLATE, IMPLEMENT_TEMPLATE, PromptError};
pub use stages::{GeneratedFile, GenerationReport, StageError, design_project, generate_files};
pub use trace::CallTrace;
