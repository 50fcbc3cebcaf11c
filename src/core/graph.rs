//! Dependency graph between test cases.
//!
//! The graph is derived from the declared `dependencies` of each test case.
//! It is validated once against the complete configuration (missing
//! references, cycles) and then used to produce a deterministic execution
//! order for the active, possibly tag-filtered, set.

use std::collections::{BTreeSet, HashMap, HashSet};

use thiserror::Error;

use super::testcase::TestCase;
use super::types::CaseName;

/// Errors detected in the dependency graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// A dependency references a test case that doesn't exist.
    #[error("test case '{case}' depends on non-existent test case '{dependency}'")]
    MissingDependency {
        case: CaseName,
        dependency: CaseName,
    },

    /// A cycle was detected; the name is a case on the cycle.
    #[error("circular dependency detected involving test case '{0}'")]
    CircularDependency(CaseName),

    /// Two test cases share a name.
    #[error("duplicate test case name: {0}")]
    DuplicateCase(CaseName),

    /// Kahn's algorithm could not order every node.
    #[error("failed to sort test cases: ordered {sorted} of {total}")]
    SortFailure { sorted: usize, total: usize },
}

/// Directed graph `case -> cases it depends on`.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Declaration order of the nodes.
    order: Vec<CaseName>,

    /// Edges: case -> list of cases it depends on, as declared.
    dependencies: HashMap<CaseName, Vec<CaseName>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph of a set of test cases.
    pub fn from_cases<'a>(
        cases: impl IntoIterator<Item = &'a TestCase>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for case in cases {
            graph.add_case(case.name().clone(), case.dependencies().to_vec())?;
        }
        Ok(graph)
    }

    /// Add a node with its declared dependencies.
    pub fn add_case(
        &mut self,
        name: impl Into<CaseName>,
        dependencies: Vec<CaseName>,
    ) -> Result<(), GraphError> {
        let name = name.into();
        if self.dependencies.contains_key(&name) {
            return Err(GraphError::DuplicateCase(name));
        }
        self.order.push(name.clone());
        self.dependencies.insert(name, dependencies);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    /// Node names in declaration order.
    pub fn names(&self) -> &[CaseName] {
        &self.order
    }

    /// Declared dependencies of a case; empty for unknown names.
    pub fn get_dependencies(&self, name: &str) -> &[CaseName] {
        self.dependencies
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The subgraph induced by `keep`.
    ///
    /// Edges are kept as declared, even when they point outside `keep`; the
    /// selection step is responsible for closing the set over dependencies.
    pub fn restrict(&self, keep: &HashSet<CaseName>) -> Self {
        let order: Vec<CaseName> = self
            .order
            .iter()
            .filter(|name| keep.contains(*name))
            .cloned()
            .collect();
        let dependencies = order
            .iter()
            .map(|name| (name.clone(), self.get_dependencies(name.as_str()).to_vec()))
            .collect();
        Self {
            order,
            dependencies,
        }
    }

    /// Check references and acyclicity.
    pub fn validate(&self) -> Result<(), GraphError> {
        for name in &self.order {
            for dep in self.get_dependencies(name.as_str()) {
                if !self.dependencies.contains_key(dep) {
                    return Err(GraphError::MissingDependency {
                        case: name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        self.check_cycles()
    }

    /// Depth-first search with an explicit stack of `(node, next edge)`.
    fn check_cycles(&self) -> Result<(), GraphError> {
        let mut visited: HashSet<&CaseName> = HashSet::new();
        let mut on_stack: HashSet<&CaseName> = HashSet::new();

        for root in &self.order {
            if !visited.insert(root) {
                continue;
            }
            on_stack.insert(root);
            let mut stack: Vec<(&CaseName, usize)> = vec![(root, 0)];

            while let Some(top) = stack.last_mut() {
                let node = top.0;
                let next = self.get_dependencies(node.as_str()).get(top.1);
                top.1 += 1;

                match next {
                    Some(dep) => {
                        if on_stack.contains(dep) {
                            return Err(GraphError::CircularDependency(dep.clone()));
                        }
                        if visited.insert(dep) {
                            on_stack.insert(dep);
                            stack.push((dep, 0));
                        }
                    }
                    None => {
                        on_stack.remove(node);
                        stack.pop();
                    }
                }
            }
        }

        Ok(())
    }

    /// Order the nodes so that every case comes after its dependencies.
    ///
    /// Kahn's algorithm where the in-degree of a node is the number of
    /// dependencies it declares. Among ready nodes the smallest name is
    /// taken first, which makes the order reproducible.
    pub fn topological_sort(&self) -> Result<Vec<CaseName>, GraphError> {
        let mut in_degree: HashMap<&CaseName, usize> = HashMap::new();
        let mut reverse_deps: HashMap<&CaseName, Vec<&CaseName>> = HashMap::new();

        for name in &self.order {
            let deps = self.get_dependencies(name.as_str());
            in_degree.insert(name, deps.len());
            for dep in deps {
                reverse_deps.entry(dep).or_default().push(name);
            }
        }

        let mut ready: BTreeSet<&CaseName> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| *name)
            .collect();

        let mut result = Vec::with_capacity(self.order.len());

        while let Some(name) = ready.pop_first() {
            result.push(name.clone());

            if let Some(downstream) = reverse_deps.get(name) {
                for next in downstream {
                    if let Some(degree) = in_degree.get_mut(next) {
                        *degree -= 1;
                        if *degree == 0 {
                            ready.insert(*next);
                        }
                    }
                }
            }
        }

        if result.len() != self.order.len() {
            return Err(GraphError::SortFailure {
                sorted: result.len(),
                total: self.order.len(),
            });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<CaseName> {
        list.iter().map(|s| CaseName::new(*s)).collect()
    }

    fn graph(edges: &[(&str, &[&str])]) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        for (name, deps) in edges {
            g.add_case(*name, names(deps)).unwrap();
        }
        g
    }

    fn position(order: &[CaseName], name: &str) -> usize {
        order.iter().position(|n| n.as_str() == name).unwrap()
    }

    #[test]
    fn test_linear_chain_order() {
        let g = graph(&[("C", &["B"]), ("B", &["A"]), ("A", &[])]);
        g.validate().unwrap();

        let order = g.topological_sort().unwrap();
        assert_eq!(order, names(&["A", "B", "C"]));
    }

    #[test]
    fn test_every_case_after_its_dependencies() {
        let g = graph(&[
            ("deploy", &["package", "lint"]),
            ("package", &["build"]),
            ("build", &["fetch"]),
            ("lint", &["fetch"]),
            ("fetch", &[]),
            ("docs", &[]),
        ]);
        g.validate().unwrap();

        let order = g.topological_sort().unwrap();
        assert_eq!(order.len(), 6);
        for name in g.names() {
            for dep in g.get_dependencies(name.as_str()) {
                assert!(
                    position(&order, dep.as_str()) < position(&order, name.as_str()),
                    "{} must run before {}",
                    dep,
                    name
                );
            }
        }
    }

    #[test]
    fn test_ready_ties_break_by_name() {
        let g = graph(&[("zeta", &[]), ("alpha", &[]), ("mid", &[])]);
        let order = g.topological_sort().unwrap();
        assert_eq!(order, names(&["alpha", "mid", "zeta"]));
    }

    #[test]
    fn test_tie_break_applies_to_newly_ready_nodes() {
        // Diamond: b and c become ready together after a, d stays last.
        let g = graph(&[
            ("d", &["c", "b"]),
            ("c", &["a"]),
            ("b", &["a"]),
            ("a", &[]),
            ("aa", &["a"]),
        ]);
        let order = g.topological_sort().unwrap();
        assert_eq!(order, names(&["a", "aa", "b", "c", "d"]));
    }

    #[test]
    fn test_repeated_sorts_are_identical() {
        let g = graph(&[("x", &[]), ("y", &["x"]), ("b", &[]), ("a", &[])]);
        let first = g.topological_sort().unwrap();
        for _ in 0..10 {
            assert_eq!(g.topological_sort().unwrap(), first);
        }
    }

    #[test]
    fn test_detect_two_node_cycle() {
        let g = graph(&[("A", &["B"]), ("B", &["A"])]);
        let err = g.validate().unwrap_err();
        match err {
            GraphError::CircularDependency(name) => {
                assert!(name.as_str() == "A" || name.as_str() == "B");
            }
            other => panic!("Expected CircularDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_detect_self_dependency() {
        let g = graph(&[("A", &["A"])]);
        assert_eq!(
            g.validate(),
            Err(GraphError::CircularDependency(CaseName::new("A")))
        );
    }

    #[test]
    fn test_cycle_reported_on_cycle_not_on_entry_path() {
        // entry -> x -> y -> x: the entry node is not part of the cycle.
        let g = graph(&[("entry", &["x"]), ("x", &["y"]), ("y", &["x"])]);
        match g.validate() {
            Err(GraphError::CircularDependency(name)) => assert_ne!(name.as_str(), "entry"),
            other => panic!("Expected CircularDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let g = graph(&[
            ("top", &["left", "right"]),
            ("left", &["base"]),
            ("right", &["base"]),
            ("base", &[]),
        ]);
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_detect_missing_dependency() {
        let g = graph(&[("A", &[]), ("B", &["A", "ghost"])]);
        assert_eq!(
            g.validate(),
            Err(GraphError::MissingDependency {
                case: CaseName::new("B"),
                dependency: CaseName::new("ghost"),
            })
        );
    }

    #[test]
    fn test_missing_dependency_checked_before_cycles() {
        let g = graph(&[("A", &["B"]), ("B", &["A", "ghost"])]);
        assert!(matches!(
            g.validate(),
            Err(GraphError::MissingDependency { .. })
        ));
    }

    #[test]
    fn test_duplicate_case_rejected() {
        let mut g = DependencyGraph::new();
        g.add_case("A", vec![]).unwrap();
        assert_eq!(
            g.add_case("A", vec![]),
            Err(GraphError::DuplicateCase(CaseName::new("A")))
        );
    }

    #[test]
    fn test_sort_fails_when_dependency_outside_active_set() {
        let full = graph(&[("A", &[]), ("B", &["A"])]);
        let keep: HashSet<CaseName> = names(&["B"]).into_iter().collect();
        let partial = full.restrict(&keep);

        assert_eq!(
            partial.topological_sort(),
            Err(GraphError::SortFailure { sorted: 0, total: 1 })
        );
    }

    #[test]
    fn test_restrict_keeps_declaration_order() {
        let full = graph(&[("c", &[]), ("a", &[]), ("b", &["a"])]);
        let keep: HashSet<CaseName> = names(&["b", "c", "a"]).into_iter().collect();
        let sub = full.restrict(&keep);
        assert_eq!(sub.names(), names(&["c", "a", "b"]).as_slice());

        let keep: HashSet<CaseName> = names(&["a", "b"]).into_iter().collect();
        let sub = full.restrict(&keep);
        assert_eq!(sub.len(), 2);
        assert!(!sub.contains("c"));
        assert_eq!(sub.topological_sort().unwrap(), names(&["a", "b"]));
    }

    #[test]
    fn test_from_cases() {
        let cases = vec![
            TestCase::new("build", "/tmp", vec![vec!["true".into()]]),
            TestCase::new("test", "/tmp", vec![vec!["true".into()]]).with_dependencies(["build"]),
        ];
        let g = DependencyGraph::from_cases(&cases).unwrap();
        assert_eq!(g.len(), 2);
        assert_eq!(g.get_dependencies("test"), names(&["build"]).as_slice());
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let mut g = DependencyGraph::new();
        g.add_case("n0", vec![]).unwrap();
        for i in 1..50_000 {
            g.add_case(format!("n{}", i), vec![CaseName::new(format!("n{}", i - 1))])
                .unwrap();
        }
        assert!(g.validate().is_ok());
        assert_eq!(g.topological_sort().unwrap().len(), 50_000);
    }

    #[test]
    fn test_empty_graph() {
        let g = DependencyGraph::new();
        assert!(g.is_empty());
        assert!(g.validate().is_ok());
        assert!(g.topological_sort().unwrap().is_empty());
    }
}
