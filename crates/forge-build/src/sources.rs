//! Source and test discovery under a project root.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::BuildError;
use crate::toolchain::is_cpp_sources;

pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cpp", "cc", "cxx", "c++", "s", "asm"];
/// Files whose directories become include directories. `tpp` holds template bodies.
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hpp", "hh", "hxx", "inc", "tpp"];
pub const TEST_EXTENSIONS: &[&str] = &["c", "cpp", "cc", "cxx"];

/// Translation units to compile plus the directories headers live in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
    pub sources: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
}

impl SourceSet {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn is_cpp(&self) -> bool {
        is_cpp_sources(&self.sources)
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.contains(&e.to_ascii_lowercase().as_str()))
}

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, BuildError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| BuildError::InvalidGlob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map(Some)
        .map_err(|source| BuildError::InvalidGlob {
            pattern: patterns.join(", "),
            source,
        })
}

/// Collect compilable sources below `root`, skipping directories named in
/// `exclude_dirs`, paths matching `exclude_globs`, hidden and git-ignored files.
///
/// Results are sorted, so command lines are stable between runs.
pub fn find_source_files(
    root: &Path,
    exclude_dirs: &[String],
    exclude_globs: &[String],
) -> Result<SourceSet, BuildError> {
    let globs = build_globset(exclude_globs)?;
    let excluded: BTreeSet<String> = exclude_dirs.iter().cloned().collect();

    let walker = ignore::WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .add_custom_ignore_filename(".forgeignore")
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !(is_dir
                && entry.depth() > 0
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| excluded.contains(name)))
        })
        .build();

    let mut sources = Vec::new();
    let mut include_dirs = BTreeSet::new();

    for entry in walker.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        if let Some(ref set) = globs
            && set.is_match(relative)
        {
            continue;
        }
        if has_extension(path, SOURCE_EXTENSIONS) {
            sources.push(path.to_path_buf());
        } else if has_extension(path, HEADER_EXTENSIONS)
            && let Some(parent) = path.parent()
        {
            include_dirs.insert(parent.to_path_buf());
        }
    }

    sources.sort();
    tracing::debug!(
        sources = sources.len(),
        include_dirs = include_dirs.len(),
        root = %root.display(),
        "collected sources"
    );
    Ok(SourceSet {
        sources,
        include_dirs: include_dirs.into_iter().collect(),
    })
}

/// C/C++ files under `<root>/tests`, sorted. Empty if the directory is missing.
pub fn find_test_sources(root: &Path) -> Vec<PathBuf> {
    let test_dir = root.join("tests");
    if !test_dir.is_dir() {
        return Vec::new();
    }
    let mut tests: Vec<PathBuf> = ignore::WalkBuilder::new(&test_dir)
        .hidden(true)
        .git_ignore(true)
        .build()
        .flatten()
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && has_extension(path, TEST_EXTENSIONS))
        .collect();
    tests.sort();
    tests
}
