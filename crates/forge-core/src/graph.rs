//! Module dependency graph over the files of a project description.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]; the
//! `dependencies`/`dependents` sets are non-owning relations over that arena.
//! External dependencies (names carrying the external marker, e.g. `<vector>`)
//! become synthetic leaf nodes: they can be depended on, but never record
//! dependents and never take part in ordering or cycle checks.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::description::ProjectDescription;
use crate::error::GraphError;

/// Stable index of a node in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(usize);

/// Physical shape of a node. The derived order is the `file_type` part of the
/// `(file_type, name)` tie-break key used by every ordering query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Header + implementation pair (`is_template: false`).
    Paired,
    /// Single standalone artifact (`is_template: true`).
    Template,
    /// Opaque dependency outside the project.
    External,
}

impl FileKind {
    /// Number of physical files this kind materializes to.
    #[must_use]
    pub const fn artifact_count(self) -> usize {
        match self {
            Self::Paired => 2,
            Self::Template => 1,
            Self::External => 0,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paired => "paired",
            Self::Template => "template",
            Self::External => "external",
        }
    }
}

/// What to do with a dependency name that matches no file and is not external.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPolicy {
    /// Fail construction with [`GraphError::UnresolvedDependency`].
    #[default]
    Reject,
    /// Drop the edge and log a warning.
    Drop,
}

impl FromStr for UnresolvedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" | "strict" => Ok(Self::Reject),
            "drop" | "lenient" => Ok(Self::Drop),
            other => Err(format!("unknown unresolved-dependency policy: '{other}'")),
        }
    }
}

/// Construction options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    pub unresolved: UnresolvedPolicy,
    /// Prefix that marks a dependency name as external.
    pub external_marker: String,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            unresolved: UnresolvedPolicy::default(),
            external_marker: "<".to_string(),
        }
    }
}

/// One logical source artifact in the graph.
#[derive(Debug, Clone)]
pub struct FileNode {
    pub id: NodeId,
    pub name: String,
    /// Owning module; `None` for external nodes.
    pub module: Option<String>,
    pub kind: FileKind,
    /// Everything this node depends on, external nodes included.
    pub dependencies: BTreeSet<NodeId>,
    /// Internal nodes that depend on this one. Always empty for external nodes.
    pub dependents: BTreeSet<NodeId>,
    /// 0 without internal dependencies, else 1 + the deepest internal dependency.
    pub depth: usize,
}

impl FileNode {
    #[must_use]
    pub const fn is_template(&self) -> bool {
        matches!(self.kind, FileKind::Template)
    }

    #[must_use]
    pub const fn is_external(&self) -> bool {
        matches!(self.kind, FileKind::External)
    }

    /// Module name, or the empty string for external nodes.
    #[must_use]
    pub fn module_name(&self) -> &str {
        self.module.as_deref().unwrap_or("")
    }
}

/// Summary figures for display and JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub modules: usize,
    pub files: usize,
    pub total_files: usize,
    pub external_dependencies: usize,
    pub roots: usize,
    pub depth: usize,
    pub has_cycle: bool,
}

/// Immutable dependency graph built once from a [`ProjectDescription`].
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    nodes: Vec<FileNode>,
    index: BTreeMap<String, NodeId>,
    modules: Vec<String>,
}

/// Module and file names become single path components under the project root.
fn check_path_component(kind: &'static str, name: &str) -> Result<(), GraphError> {
    let invalid = name.trim().is_empty()
        || name.starts_with('.')
        || name.chars().any(|c| matches!(c, '/' | '\\' | ':') || c.is_control());
    if invalid {
        return Err(GraphError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

impl ModuleGraph {
    /// Build with default options (unknown dependency names are rejected).
    pub fn build(description: &ProjectDescription) -> Result<Self, GraphError> {
        Self::build_with(description, &GraphOptions::default())
    }

    pub fn build_with(
        description: &ProjectDescription,
        options: &GraphOptions,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::default();
        let marker = options.external_marker.as_str();

        // Pass 1: one node per declared file.
        let mut declared = Vec::with_capacity(description.file_count());
        let mut stems: BTreeMap<(String, String), &str> = BTreeMap::new();
        for module in description.modules() {
            check_path_component("module", &module.name)?;
            graph.modules.push(module.name.clone());
            for file in &module.files {
                if !marker.is_empty() && file.name.starts_with(marker) {
                    return Err(GraphError::ReservedName(file.name.clone()));
                }
                check_path_component("file", &file.name)?;
                if let Some(&existing) = graph.index.get(&file.name) {
                    return Err(GraphError::DuplicateFile {
                        name: file.name.clone(),
                        first: graph.nodes[existing.0].module_name().to_string(),
                        second: module.name.clone(),
                    });
                }
                // Case-insensitive file systems fold `Lexer` and `lexer` together.
                let stem = (module.name.to_lowercase(), file.name.to_lowercase());
                if let Some(first) = stems.insert(stem, &file.name) {
                    return Err(GraphError::ArtifactCollision {
                        module: module.name.clone(),
                        first: first.to_string(),
                        second: file.name.clone(),
                    });
                }
                let kind = if file.is_template {
                    FileKind::Template
                } else {
                    FileKind::Paired
                };
                let id = graph.push_node(file.name.clone(), Some(module.name.clone()), kind);
                declared.push((id, file));
            }
        }

        // Pass 2: resolve dependency names into edges.
        for (id, file) in declared {
            for dep in &file.deps {
                let target = if !marker.is_empty() && dep.starts_with(marker) {
                    graph.external_node(dep)
                } else if let Some(&target) = graph.index.get(dep) {
                    target
                } else {
                    match options.unresolved {
                        UnresolvedPolicy::Reject => {
                            return Err(GraphError::UnresolvedDependency {
                                file: file.name.clone(),
                                dependency: dep.clone(),
                            });
                        }
                        UnresolvedPolicy::Drop => {
                            tracing::warn!(
                                file = %file.name,
                                dependency = %dep,
                                "dropping unresolved dependency"
                            );
                            continue;
                        }
                    }
                };
                graph.nodes[id.0].dependencies.insert(target);
                if !graph.nodes[target.0].is_external() {
                    graph.nodes[target.0].dependents.insert(id);
                }
            }
        }

        graph.compute_depths();
        tracing::debug!(
            files = graph.len(),
            externals = graph.externals().count(),
            "module graph built"
        );
        Ok(graph)
    }

    fn push_node(&mut self, name: String, module: Option<String>, kind: FileKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.index.insert(name.clone(), id);
        self.nodes.push(FileNode {
            id,
            name,
            module,
            kind,
            dependencies: BTreeSet::new(),
            dependents: BTreeSet::new(),
            depth: 0,
        });
        id
    }

    /// Shared synthetic node for an external name, created on first reference.
    fn external_node(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        self.push_node(name.to_string(), None, FileKind::External)
    }

    fn compute_depths(&mut self) {
        let order = self.kahn_order();
        let mut depths = vec![0usize; self.nodes.len()];
        for &id in &order {
            depths[id.0] = self
                .internal_deps(id)
                .map(|dep| depths[dep.0] + 1)
                .max()
                .unwrap_or(0);
        }
        for (node, depth) in self.nodes.iter_mut().zip(depths) {
            node.depth = depth;
        }
    }

    fn internal_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|n| !n.is_external())
            .map(|n| n.id)
    }

    fn internal_deps(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .dependencies
            .iter()
            .copied()
            .filter(|dep| !self.nodes[dep.0].is_external())
    }

    fn sort_key(&self, id: NodeId) -> (FileKind, &str, NodeId) {
        let node = &self.nodes[id.0];
        (node.kind, node.name.as_str(), id)
    }

    /// Internal dependencies of `id` in `(file_type, name)` order.
    fn sorted_internal_deps(&self, id: NodeId) -> Vec<NodeId> {
        let mut deps: Vec<NodeId> = self.internal_deps(id).collect();
        deps.sort_by(|a, b| self.sort_key(*a).cmp(&self.sort_key(*b)));
        deps
    }

    /// Kahn's algorithm over internal nodes. Nodes on or behind a cycle are
    /// never released and are therefore missing from the result.
    fn kahn_order(&self) -> Vec<NodeId> {
        let mut indegree: Vec<usize> = self
            .nodes
            .iter()
            .map(|n| self.internal_deps(n.id).count())
            .collect();
        let mut ready: BTreeSet<(FileKind, &str, NodeId)> = self
            .internal_ids()
            .filter(|id| indegree[id.0] == 0)
            .map(|id| self.sort_key(id))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some((_, _, id)) = ready.pop_first() {
            order.push(id);
            for &dependent in &self.nodes[id.0].dependents {
                let d = &mut indegree[dependent.0];
                if *d > 0 {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert(self.sort_key(dependent));
                    }
                }
            }
        }
        order
    }

    /// True iff the internal nodes contain a dependency cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        self.kahn_order().len() < self.len()
    }

    /// Find one cycle by depth-first search with an explicit recursion stack.
    ///
    /// Returns the member names along the cycle, first member repeated at the
    /// end (`["A", "B", "A"]`). Starts from the roots in name order, then from
    /// every remaining node, so cycles no root reaches are still found.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut stack = Vec::new();

        let mut starts: Vec<NodeId> = self.roots().iter().map(|n| n.id).collect();
        let mut rest: Vec<NodeId> = self.internal_ids().collect();
        rest.sort_by(|a, b| self.nodes[a.0].name.cmp(&self.nodes[b.0].name));
        starts.extend(rest);

        for start in starts {
            if marks[start.0] != Mark::Unvisited {
                continue;
            }
            if let Some(cycle) = self.dfs_cycle(start, &mut marks, &mut stack) {
                return Some(
                    cycle
                        .into_iter()
                        .map(|id| self.nodes[id.0].name.clone())
                        .collect(),
                );
            }
        }
        None
    }

    fn dfs_cycle(
        &self,
        id: NodeId,
        marks: &mut [Mark],
        stack: &mut Vec<NodeId>,
    ) -> Option<Vec<NodeId>> {
        marks[id.0] = Mark::OnStack;
        stack.push(id);
        for dep in self.sorted_internal_deps(id) {
            match marks[dep.0] {
                Mark::OnStack => {
                    let start = stack.iter().position(|&s| s == dep)?;
                    let mut cycle = stack[start..].to_vec();
                    cycle.push(dep);
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    if let Some(cycle) = self.dfs_cycle(dep, marks, stack) {
                        return Some(cycle);
                    }
                }
                Mark::Done => {}
            }
        }
        stack.pop();
        marks[id.0] = Mark::Done;
        None
    }

    /// Nodes in implementation order: every node after all of its internal
    /// dependencies.
    ///
    /// Canonical order: roots are taken by name, and each node's dependencies
    /// are visited in `(file_type, name)` order before the node itself is emitted.
    /// A cyclic graph has no such order and yields [`GraphError::Cycle`].
    pub fn ordered_nodes(&self) -> Result<Vec<&FileNode>, GraphError> {
        if self.has_cycle() {
            return Err(GraphError::Cycle {
                members: self.find_cycle().unwrap_or_default(),
            });
        }
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.len());
        for root in self.roots() {
            self.post_order(root.id, &mut visited, &mut order);
        }
        debug_assert_eq!(order.len(), self.len());
        Ok(order.into_iter().map(|id| &self.nodes[id.0]).collect())
    }

    fn post_order(&self, id: NodeId, visited: &mut [bool], order: &mut Vec<NodeId>) {
        if visited[id.0] {
            return;
        }
        visited[id.0] = true;
        for dep in self.sorted_internal_deps(id) {
            self.post_order(dep, visited, order);
        }
        order.push(id);
    }

    /// Names in implementation order. See [`Self::ordered_nodes`].
    pub fn implementation_order(&self) -> Result<Vec<&str>, GraphError> {
        Ok(self
            .ordered_nodes()?
            .into_iter()
            .map(|n| n.name.as_str())
            .collect())
    }

    /// `name` plus its transitive internal dependencies, dependencies first.
    ///
    /// In-degrees are counted inside the closure only, so edges from nodes
    /// outside it never hold a member back.
    pub fn subtree(&self, name: &str) -> Result<Vec<&FileNode>, GraphError> {
        let root = self
            .index
            .get(name)
            .copied()
            .filter(|id| !self.nodes[id.0].is_external())
            .ok_or_else(|| GraphError::NotFound(name.to_string()))?;

        let mut members = BTreeSet::new();
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            if members.insert(id) {
                pending.extend(self.internal_deps(id));
            }
        }

        let mut indegree: BTreeMap<NodeId, usize> = members
            .iter()
            .map(|&id| {
                let inside = self
                    .internal_deps(id)
                    .filter(|dep| members.contains(dep))
                    .count();
                (id, inside)
            })
            .collect();
        let mut ready: BTreeSet<(FileKind, &str, NodeId)> = indegree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(&id, _)| self.sort_key(id))
            .collect();

        let mut order = Vec::with_capacity(members.len());
        while let Some((_, _, id)) = ready.pop_first() {
            order.push(id);
            for dependent in self.nodes[id.0]
                .dependents
                .iter()
                .filter(|d| members.contains(d))
            {
                if let Some(d) = indegree.get_mut(dependent)
                    && *d > 0
                {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert(self.sort_key(*dependent));
                    }
                }
            }
        }

        if order.len() < members.len() {
            let scheduled: BTreeSet<NodeId> = order.iter().copied().collect();
            let mut stuck: Vec<String> = members
                .difference(&scheduled)
                .map(|id| self.nodes[id.0].name.clone())
                .collect();
            stuck.sort();
            return Err(GraphError::SubgraphCycle {
                root: name.to_string(),
                members: stuck,
            });
        }
        Ok(order.into_iter().map(|id| &self.nodes[id.0]).collect())
    }

    /// Entry points: internal nodes nothing else depends on, by name.
    #[must_use]
    pub fn roots(&self) -> Vec<&FileNode> {
        let mut roots: Vec<&FileNode> = self
            .nodes
            .iter()
            .filter(|n| !n.is_external() && n.dependents.is_empty())
            .collect();
        roots.sort_by(|a, b| a.name.cmp(&b.name));
        roots
    }

    /// Physical artifact count: 2 per paired node, 1 per template node.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.nodes.iter().map(|n| n.kind.artifact_count()).sum()
    }

    /// Module names in description order.
    #[must_use]
    pub fn module_names(&self) -> &[String] {
        &self.modules
    }

    /// Maximum node depth; 0 for an empty graph.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.nodes().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Internal node by name. External names are not returned here.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&FileNode> {
        self.index
            .get(name)
            .map(|id| &self.nodes[id.0])
            .filter(|n| !n.is_external())
    }

    /// Node by arena id, external nodes included.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&FileNode> {
        self.nodes.get(id.0)
    }

    /// Internal nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &FileNode> {
        self.nodes.iter().filter(|n| !n.is_external())
    }

    /// Synthetic external nodes in first-reference order.
    pub fn externals(&self) -> impl Iterator<Item = &FileNode> {
        self.nodes.iter().filter(|n| n.is_external())
    }

    /// Internal nodes of one module, in declaration order.
    pub fn files_in_module<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a FileNode> {
        self.nodes().filter(move |n| n.module_name() == module)
    }

    /// Number of edges that point at an external node.
    #[must_use]
    pub fn external_dependency_count(&self) -> usize {
        self.nodes()
            .map(|n| {
                n.dependencies
                    .iter()
                    .filter(|d| self.nodes[d.0].is_external())
                    .count()
            })
            .sum()
    }

    /// Direct dependencies of `name` (external ones included), `(file_type, name)` order.
    pub fn dependencies_of(&self, name: &str) -> Result<Vec<&FileNode>, GraphError> {
        let node = self
            .node(name)
            .ok_or_else(|| GraphError::NotFound(name.to_string()))?;
        let mut deps: Vec<&FileNode> = node.dependencies.iter().map(|d| &self.nodes[d.0]).collect();
        deps.sort_by(|a, b| (a.kind, &a.name).cmp(&(b.kind, &b.name)));
        Ok(deps)
    }

    /// Direct dependents of `name`, by name.
    pub fn dependents_of(&self, name: &str) -> Result<Vec<&FileNode>, GraphError> {
        let node = self
            .node(name)
            .ok_or_else(|| GraphError::NotFound(name.to_string()))?;
        let mut dependents: Vec<&FileNode> =
            node.dependents.iter().map(|d| &self.nodes[d.0]).collect();
        dependents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(dependents)
    }

    /// Number of internal nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            modules: self.modules.len(),
            files: self.len(),
            total_files: self.total_files(),
            external_dependencies: self.external_dependency_count(),
            roots: self.roots().len(),
            depth: self.depth(),
            has_cycle: self.has_cycle(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{FileDescriptor, ModuleDescriptor};

    fn single_module(files: Vec<FileDescriptor>) -> ProjectDescription {
        ProjectDescription::from_modules(vec![ModuleDescriptor::new("core", files)])
    }

    #[test]
    fn test_dependents_are_inverse_of_dependencies() {
        let desc = single_module(vec![
            FileDescriptor::new("A", false, &["B", "C", "<vector>"]),
            FileDescriptor::new("B", false, &["C"]),
            FileDescriptor::new("C", true, &[]),
        ]);
        let graph = ModuleGraph::build(&desc).unwrap();

        for node in graph.nodes() {
            for dep in &node.dependencies {
                let target = graph.get(*dep).unwrap();
                if !target.is_external() {
                    assert!(target.dependents.contains(&node.id));
                }
            }
            for dependent in &node.dependents {
                assert!(graph.get(*dependent).unwrap().dependencies.contains(&node.id));
            }
        }
        let vector = graph.externals().next().unwrap();
        assert!(vector.dependents.is_empty());
    }

    #[test]
    fn test_depth_computation() {
        let desc = single_module(vec![
            FileDescriptor::new("A", false, &["B", "D"]),
            FileDescriptor::new("B", false, &["C"]),
            FileDescriptor::new("C", false, &["<cmath>"]),
            FileDescriptor::new("D", false, &[]),
        ]);
        let graph = ModuleGraph::build(&desc).unwrap();
        assert_eq!(graph.node("C").unwrap().depth, 0);
        assert_eq!(graph.node("D").unwrap().depth, 0);
        assert_eq!(graph.node("B").unwrap().depth, 1);
        assert_eq!(graph.node("A").unwrap().depth, 2);
        assert_eq!(graph.depth(), 2);
    }

    #[test]
    fn test_external_nodes_are_shared() {
        let desc = single_module(vec![
            FileDescriptor::new("A", false, &["<vector>"]),
            FileDescriptor::new("B", false, &["<vector>", "<string>"]),
        ]);
        let graph = ModuleGraph::build(&desc).unwrap();
        assert_eq!(graph.externals().count(), 2);
        assert_eq!(graph.external_dependency_count(), 3);
        assert!(graph.node("<vector>").is_none());
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let desc = single_module(vec![FileDescriptor::new("A", false, &["A"])]);
        let graph = ModuleGraph::build(&desc).unwrap();
        assert!(graph.has_cycle());
        assert_eq!(graph.find_cycle().unwrap(), vec!["A", "A"]);
    }

    #[test]
    fn test_custom_external_marker() {
        let desc = single_module(vec![FileDescriptor::new("A", false, &["std::vector"])]);
        let options = GraphOptions {
            external_marker: "std::".to_string(),
            ..GraphOptions::default()
        };
        let graph = ModuleGraph::build_with(&desc, &options).unwrap();
        assert_eq!(graph.externals().count(), 1);
        assert_eq!(graph.implementation_order().unwrap(), vec!["A"]);
    }

    #[test]
    fn test_unresolved_policy_from_str() {
        assert_eq!("reject".parse::<UnresolvedPolicy>().unwrap(), UnresolvedPolicy::Reject);
        assert_eq!("Drop".parse::<UnresolvedPolicy>().unwrap(), UnresolvedPolicy::Drop);
        assert!("maybe".parse::<UnresolvedPolicy>().is_err());
    }

    #[test]
    fn test_path_like_names_rejected() {
        for module in ["../escaped", "/abs", "a/b", "..", ".hidden", "c:\\x", ""] {
            let desc = ProjectDescription::from_modules(vec![ModuleDescriptor::new(
                module,
                vec![FileDescriptor::new("A", true, &[])],
            )]);
            let err = ModuleGraph::build(&desc).unwrap_err();
            assert!(
                matches!(err, GraphError::InvalidName { kind: "module", .. }),
                "{module}: {err:?}"
            );
            assert!(err.is_construction());
        }
        for file in ["../A", "sub/A", ".A"] {
            let desc = single_module(vec![FileDescriptor::new(file, false, &[])]);
            assert!(matches!(
                ModuleGraph::build(&desc),
                Err(GraphError::InvalidName { kind: "file", .. })
            ));
        }
    }

    #[test]
    fn test_dotted_names_are_accepted() {
        let desc = single_module(vec![
            FileDescriptor::new("socket.v1", false, &[]),
            FileDescriptor::new("socket.v2", false, &["socket.v1"]),
        ]);
        let graph = ModuleGraph::build(&desc).unwrap();
        assert_eq!(
            graph.implementation_order().unwrap(),
            vec!["socket.v1", "socket.v2"]
        );
    }

    #[test]
    fn test_case_folded_names_collide() {
        let desc = single_module(vec![
            FileDescriptor::new("Lexer", false, &[]),
            FileDescriptor::new("lexer", true, &[]),
        ]);
        match ModuleGraph::build(&desc).unwrap_err() {
            GraphError::ArtifactCollision {
                module,
                first,
                second,
            } => {
                assert_eq!(module, "core");
                assert_eq!(first, "Lexer");
                assert_eq!(second, "lexer");
            }
            other => panic!("expected ArtifactCollision, got {other:?}"),
        }
    }

    #[test]
    fn test_file_kind_orders_paired_before_template() {
        assert!(FileKind::Paired < FileKind::Template);
        assert!(FileKind::Template < FileKind::External);
    }
}
