use std::path::PathBuf;

/// Problems that stop a build before the compiler is invoked.
///
/// The driver folds these into its reports; they never escape
/// [`crate::Builder::compile_project`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("no source files found under {}", .0.display())]
    NoSources(PathBuf),

    #[error("{0}")]
    Toolchain(String),

    #[error("failed to prepare {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
