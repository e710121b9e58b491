use forge_core::graph::*;
use forge_core::{FileDescriptor, GraphError, ModuleDescriptor, ProjectDescription};
use std::collections::HashMap;

fn file(name: &str, is_template: bool, deps: &[&str]) -> FileDescriptor {
    FileDescriptor::new(name, is_template, deps)
}

fn one_module(files: Vec<FileDescriptor>) -> ProjectDescription {
    ProjectDescription::from_modules(vec![ModuleDescriptor::new("core", files)])
}

/// Shape of the sample project the generation pipeline ships with.
fn sample_project() -> ProjectDescription {
    ProjectDescription::from_modules(vec![
        ModuleDescriptor::new(
            "app",
            vec![
                file("A", false, &["B", "C", "<iostream>"]),
                file("B", false, &["C"]),
            ],
        ),
        ModuleDescriptor::new(
            "util",
            vec![file("C", true, &["D", "<vector>"]), file("D", false, &[])],
        ),
    ])
}

fn assert_topological(graph: &ModuleGraph, order: &[&str]) {
    let position: HashMap<&str, usize> = order.iter().enumerate().map(|(i, n)| (*n, i)).collect();
    assert_eq!(position.len(), order.len(), "duplicate names in {order:?}");
    assert_eq!(order.len(), graph.len(), "order is not a permutation");
    for node in graph.nodes() {
        for dep in &node.dependencies {
            let dep = graph.get(*dep).unwrap();
            if dep.is_external() {
                assert!(!position.contains_key(dep.name.as_str()));
                continue;
            }
            assert!(
                position[dep.name.as_str()] < position[node.name.as_str()],
                "{} must precede {} in {order:?}",
                dep.name,
                node.name
            );
        }
    }
}

#[test]
fn test_sample_project_order() {
    let graph = ModuleGraph::build(&sample_project()).unwrap();
    let order = graph.implementation_order().unwrap();
    assert_eq!(order, vec!["D", "C", "B", "A"]);
    assert_topological(&graph, &order);
    assert_eq!(graph.module_names(), &["app".to_string(), "util".to_string()]);
    assert_eq!(graph.roots().len(), 1);
    assert_eq!(graph.roots()[0].name, "A");
    assert_eq!(graph.depth(), 3);
    // A, B, D paired; C template
    assert_eq!(graph.total_files(), 7);
}

#[test]
fn test_orders_are_topological() {
    let descriptions = vec![
        one_module(vec![
            file("A", false, &["B"]),
            file("B", false, &["C"]),
            file("C", false, &[]),
        ]),
        one_module(vec![
            file("Top", false, &["Left", "Right"]),
            file("Left", true, &["Bottom"]),
            file("Right", false, &["Bottom", "<map>"]),
            file("Bottom", false, &[]),
        ]),
        one_module(vec![
            file("X", false, &[]),
            file("Y", true, &[]),
            file("Z", false, &["<cstdio>"]),
        ]),
        sample_project(),
    ];

    for desc in &descriptions {
        let graph = ModuleGraph::build(desc).unwrap();
        assert!(!graph.has_cycle());
        let order = graph.implementation_order().unwrap();
        assert_topological(&graph, &order);
    }
}

#[test]
fn test_order_is_deterministic() {
    let desc = one_module(vec![
        file("Top", false, &["Left", "Right", "Mid"]),
        file("Left", true, &["Bottom"]),
        file("Right", false, &["Bottom"]),
        file("Mid", false, &[]),
        file("Bottom", false, &[]),
    ]);
    let first = ModuleGraph::build(&desc).unwrap();
    let second = ModuleGraph::build(&desc).unwrap();
    assert_eq!(
        first.implementation_order().unwrap(),
        first.implementation_order().unwrap()
    );
    assert_eq!(
        first.implementation_order().unwrap(),
        second.implementation_order().unwrap()
    );
}

#[test]
fn test_dependencies_visited_by_kind_then_name() {
    // Paired nodes sort before template nodes, then by name.
    let desc = one_module(vec![
        file("A", false, &["D", "C", "B"]),
        file("B", false, &[]),
        file("C", true, &[]),
        file("D", false, &[]),
    ]);
    let graph = ModuleGraph::build(&desc).unwrap();
    assert_eq!(graph.implementation_order().unwrap(), vec!["B", "D", "C", "A"]);
}

#[test]
fn test_roots_taken_by_name() {
    let desc = one_module(vec![
        file("Zeta", false, &["Shared"]),
        file("Alpha", false, &["Shared"]),
        file("Shared", true, &[]),
        file("Mid", false, &[]),
    ]);
    let graph = ModuleGraph::build(&desc).unwrap();
    let roots: Vec<&str> = graph.roots().iter().map(|n| n.name.as_str()).collect();
    assert_eq!(roots, vec!["Alpha", "Mid", "Zeta"]);
    assert_eq!(
        graph.implementation_order().unwrap(),
        vec!["Shared", "Alpha", "Mid", "Zeta"]
    );
}

#[test]
fn test_two_node_cycle_detected() {
    let desc = one_module(vec![file("A", false, &["B"]), file("B", false, &["A"])]);
    let graph = ModuleGraph::build(&desc).unwrap();
    assert!(graph.has_cycle());
    assert_eq!(graph.find_cycle().unwrap(), vec!["A", "B", "A"]);
}

#[test]
fn test_chain_has_no_cycle() {
    let desc = one_module(vec![
        file("A", false, &["B"]),
        file("B", false, &["C"]),
        file("C", false, &[]),
    ]);
    let graph = ModuleGraph::build(&desc).unwrap();
    assert!(!graph.has_cycle());
    assert!(graph.find_cycle().is_none());
}

#[test]
fn test_cycle_checks_agree() {
    let cases = vec![
        (one_module(vec![file("A", false, &["A"])]), true),
        // Cycle below a root.
        (
            one_module(vec![
                file("Root", false, &["A"]),
                file("A", false, &["B"]),
                file("B", false, &["C"]),
                file("C", false, &["A"]),
            ]),
            true,
        ),
        // Cycle that no root reaches.
        (
            one_module(vec![
                file("Solo", false, &[]),
                file("P", false, &["Q"]),
                file("Q", true, &["P"]),
            ]),
            true,
        ),
        // Externals never close a cycle.
        (
            one_module(vec![
                file("A", false, &["<vector>", "B"]),
                file("B", false, &["<vector>"]),
            ]),
            false,
        ),
        (sample_project(), false),
    ];

    for (desc, expected) in cases {
        let graph = ModuleGraph::build(&desc).unwrap();
        assert_eq!(graph.has_cycle(), expected);
        assert_eq!(graph.find_cycle().is_some(), expected);
    }
}

#[test]
fn test_order_on_cyclic_graph_fails_explicitly() {
    let desc = one_module(vec![
        file("Root", false, &["A"]),
        file("A", false, &["B"]),
        file("B", false, &["A"]),
    ]);
    let graph = ModuleGraph::build(&desc).unwrap();
    let err = graph.implementation_order().unwrap_err();
    assert!(err.is_cycle());
    match err {
        GraphError::Cycle { members } => assert_eq!(members, vec!["A", "B", "A"]),
        other => panic!("expected Cycle, got {other:?}"),
    }
}

#[test]
fn test_subtree_excludes_unrelated_nodes() {
    let desc = one_module(vec![
        file("A", false, &["B"]),
        file("B", false, &["C"]),
        file("C", false, &[]),
        file("D", false, &[]),
    ]);
    let graph = ModuleGraph::build(&desc).unwrap();
    let names: Vec<&str> = graph
        .subtree("A")
        .unwrap()
        .iter()
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(names, vec!["C", "B", "A"]);
}

#[test]
fn test_subtree_ignores_dependents_outside_closure() {
    let desc = one_module(vec![
        file("A", false, &["B"]),
        file("B", false, &["C", "<string>"]),
        file("C", true, &[]),
        file("Other", false, &["B", "C"]),
    ]);
    let graph = ModuleGraph::build(&desc).unwrap();
    let names: Vec<&str> = graph
        .subtree("B")
        .unwrap()
        .iter()
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(names, vec!["C", "B"]);
}

#[test]
fn test_subtree_of_acyclic_part_of_cyclic_graph() {
    let desc = one_module(vec![
        file("A", false, &["B"]),
        file("B", false, &["A"]),
        file("Leaf", false, &[]),
    ]);
    let graph = ModuleGraph::build(&desc).unwrap();
    assert_eq!(graph.subtree("Leaf").unwrap().len(), 1);

    match graph.subtree("A").unwrap_err() {
        GraphError::SubgraphCycle { root, members } => {
            assert_eq!(root, "A");
            assert_eq!(members, vec!["A", "B"]);
        }
        other => panic!("expected SubgraphCycle, got {other:?}"),
    }
}

#[test]
fn test_subtree_unknown_or_external_name() {
    let desc = one_module(vec![file("A", false, &["<vector>"])]);
    let graph = ModuleGraph::build(&desc).unwrap();
    assert!(matches!(graph.subtree("Nope"), Err(GraphError::NotFound(_))));
    assert!(matches!(graph.subtree("<vector>"), Err(GraphError::NotFound(_))));
}

#[test]
fn test_total_files_counts_pairs_twice() {
    let desc = one_module(vec![file("T", true, &[]), file("P", false, &["T"])]);
    let graph = ModuleGraph::build(&desc).unwrap();
    assert_eq!(graph.total_files(), 3);
}

#[test]
fn test_empty_description() {
    let graph = ModuleGraph::build(&ProjectDescription::default()).unwrap();
    assert!(graph.is_empty());
    assert_eq!(graph.total_files(), 0);
    assert!(!graph.has_cycle());
    assert!(graph.implementation_order().unwrap().is_empty());
    assert_eq!(graph.depth(), 0);
    assert!(graph.roots().is_empty());
}

#[test]
fn test_module_without_files_is_listed() {
    let desc = ProjectDescription::from_modules(vec![
        ModuleDescriptor::new("empty", Vec::new()),
        ModuleDescriptor::new("core", vec![file("A", true, &[])]),
    ]);
    let graph = ModuleGraph::build(&desc).unwrap();
    assert_eq!(graph.module_names(), &["empty".to_string(), "core".to_string()]);
    assert_eq!(graph.files_in_module("empty").count(), 0);
    assert_eq!(graph.files_in_module("core").count(), 1);
}

#[test]
fn test_duplicate_names_across_modules_rejected() {
    let desc = ProjectDescription::from_modules(vec![
        ModuleDescriptor::new("first", vec![file("Shared", false, &[])]),
        ModuleDescriptor::new("second", vec![file("Shared", true, &[])]),
    ]);
    let err = ModuleGraph::build(&desc).unwrap_err();
    assert!(err.is_construction());
    match err {
        GraphError::DuplicateFile {
            name,
            first,
            second,
        } => {
            assert_eq!(name, "Shared");
            assert_eq!(first, "first");
            assert_eq!(second, "second");
        }
        other => panic!("expected DuplicateFile, got {other:?}"),
    }
}

#[test]
fn test_declared_name_with_marker_rejected() {
    let desc = one_module(vec![file("<vector>", false, &[])]);
    assert!(matches!(
        ModuleGraph::build(&desc),
        Err(GraphError::ReservedName(name)) if name == "<vector>"
    ));
}

#[test]
fn test_unresolved_dependency_rejected_by_default() {
    let desc = one_module(vec![file("A", false, &["Ghost"])]);
    let err = ModuleGraph::build(&desc).unwrap_err();
    assert!(err.is_construction());
    assert!(err.to_string().contains("Ghost"));
}

#[test]
fn test_unresolved_dependency_dropped_when_lenient() {
    let desc = one_module(vec![
        file("A", false, &["Ghost", "B"]),
        file("B", false, &[]),
    ]);
    let options = GraphOptions {
        unresolved: UnresolvedPolicy::Drop,
        ..GraphOptions::default()
    };
    let graph = ModuleGraph::build_with(&desc, &options).unwrap();
    let deps: Vec<&str> = graph
        .dependencies_of("A")
        .unwrap()
        .iter()
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(deps, vec!["B"]);
    assert_eq!(graph.implementation_order().unwrap(), vec!["B", "A"]);
}

#[test]
fn test_malformed_json_is_construction_error() {
    let err = ProjectDescription::from_json(r#"{"project": {}}"#).unwrap_err();
    assert!(err.is_construction());
}

#[test]
fn test_dependents_of_and_stats() {
    let graph = ModuleGraph::build(&sample_project()).unwrap();
    let dependents: Vec<&str> = graph
        .dependents_of("C")
        .unwrap()
        .iter()
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(dependents, vec!["A", "B"]);

    let stats = graph.stats();
    assert_eq!(stats.modules, 2);
    assert_eq!(stats.files, 4);
    assert_eq!(stats.total_files, 7);
    assert_eq!(stats.external_dependencies, 2);
    assert_eq!(stats.roots, 1);
    assert!(!stats.has_cycle);
}
