//! Execution plan: validated, tag-selected and ordered test cases.

use crate::core::graph::{DependencyGraph, GraphError};
use crate::core::selection::{Selection, TagSelector};
use crate::core::testcase::TestCase;
use crate::core::types::CaseName;

/// The cases to run, in the order to run them.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    graph: DependencyGraph,
    selection: Selection,
    order: Vec<CaseName>,
}

impl ExecutionPlan {
    /// Validate the full set of cases, apply the tag filter and sort the
    /// selected subset.
    ///
    /// Missing dependencies and cycles are reported even when the offending
    /// cases would have been filtered out.
    pub fn build(cases: &[TestCase], selector: &TagSelector) -> Result<Self, GraphError> {
        let graph = DependencyGraph::from_cases(cases)?;
        graph.validate()?;

        let selection = selector.select(cases);
        let order = graph.restrict(&selection.to_set()).topological_sort()?;

        Ok(Self {
            graph,
            selection,
            order,
        })
    }

    /// Case names in execution order.
    pub fn order(&self) -> &[CaseName] {
        &self.order
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Graph of every declared case, selected or not.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
