//! Errors raised while building or querying a [`crate::graph::ModuleGraph`].

/// Structural errors of the module graph.
///
/// Construction variants describe a description that cannot become a graph at
/// all; `Cycle`/`SubgraphCycle` describe a graph that has no valid order;
/// `NotFound` is a query by an unknown name.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("malformed project description: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("file '{name}' is declared in module '{first}' and again in module '{second}'")]
    DuplicateFile {
        name: String,
        first: String,
        second: String,
    },

    #[error("file name '{0}' starts with the reserved external-dependency marker")]
    ReservedName(String),

    #[error("{kind} name '{name}' cannot be used as a path component")]
    InvalidName { kind: &'static str, name: String },

    #[error("files '{first}' and '{second}' in module '{module}' would share artifact paths")]
    ArtifactCollision {
        module: String,
        first: String,
        second: String,
    },

    #[error("'{file}' depends on '{dependency}', which is neither a project file nor external")]
    UnresolvedDependency { file: String, dependency: String },

    #[error("dependency cycle: {}", members.join(" -> "))]
    Cycle { members: Vec<String> },

    #[error("dependency cycle in the subtree of '{root}': {}", members.join(", "))]
    SubgraphCycle { root: String, members: Vec<String> },

    #[error("no file named '{0}' in the project graph")]
    NotFound(String),
}

impl GraphError {
    /// True for errors caused by an inconsistent or malformed description.
    #[must_use]
    pub const fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::Malformed(_)
                | Self::DuplicateFile { .. }
                | Self::ReservedName(_)
                | Self::InvalidName { .. }
                | Self::ArtifactCollision { .. }
                | Self::UnresolvedDependency { .. }
        )
    }

    /// True for errors reporting a dependency cycle.
    #[must_use]
    pub const fn is_cycle(&self) -> bool {
        matches!(self, Self::Cycle { .. } | Self::SubgraphCycle { .. })
    }
}
