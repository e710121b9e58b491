//! Core types for Forge: the project description a model produces, the
//! module dependency graph built from it, and the placeholder materializer.
//!
//! The graph ([`graph::ModuleGraph`]) is immutable once built. Every ordering
//! query is deterministic, and structural problems (cycles, unknown names) are
//! surfaced as [`error::GraphError`] instead of a partial answer.

pub mod config;
pub mod description;
pub mod error;
pub mod graph;
pub mod materialize;
pub mod storage;

pub use description::{FileDescriptor, ModuleDescriptor, ProjectDescription};
pub use error::GraphError;
pub use graph::{FileKind, FileNode, GraphOptions, GraphStats, ModuleGraph, NodeId, UnresolvedPolicy};
