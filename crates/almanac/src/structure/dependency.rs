//! Declared dependencies between scheduled tasks.
//!
//! Edges point from a prerequisite to the task that depends on it. Ids that
//! name tasks outside the [`TaskSet`] are ignored: dependency graphs are not
//! validated here, and a missing prerequisite has no position to measure.

use std::collections::HashMap;

use log::debug;
use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
};

use almanac_core::identifier::Id;

use super::TaskSet;

/// Directed graph of dependencies among the tasks of one layout run.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<Id, ()>,
    nodes: HashMap<Id, NodeIndex>,
}

impl DependencyGraph {
    /// Builds the graph from every task's declared dependencies.
    pub fn from_tasks(tasks: &TaskSet<'_>) -> Self {
        let mut graph = DiGraph::new();
        let nodes: HashMap<Id, NodeIndex> = tasks
            .iter()
            .map(|scheduled| (scheduled.id(), graph.add_node(scheduled.id())))
            .collect();

        let mut dangling = 0usize;
        for scheduled in tasks.iter() {
            let Some(&dependent) = nodes.get(&scheduled.id()) else {
                continue;
            };
            for prerequisite in scheduled.task().dependencies() {
                match nodes.get(prerequisite) {
                    Some(&source) if source != dependent => {
                        graph.update_edge(source, dependent, ());
                    }
                    Some(_) => {}
                    None => dangling += 1,
                }
            }
        }

        if dangling > 0 {
            debug!(dangling; "Ignoring dependencies on tasks that are not scheduled");
        }

        Self { graph, nodes }
    }

    /// Returns true if either task is declared a dependency of the other.
    pub fn linked(&self, a: Id, b: Id) -> bool {
        match (self.nodes.get(&a), self.nodes.get(&b)) {
            (Some(&a), Some(&b)) => {
                self.graph.find_edge(a, b).is_some() || self.graph.find_edge(b, a).is_some()
            }
            _ => false,
        }
    }

    /// Prerequisites and dependents of `id`, sorted and deduplicated.
    pub fn neighbors(&self, id: Id) -> Vec<Id> {
        let Some(&node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let mut neighbors: Vec<Id> = [Direction::Incoming, Direction::Outgoing]
            .into_iter()
            .flat_map(|direction| self.graph.neighbors_directed(node, direction))
            .map(|neighbor| self.graph[neighbor])
            .collect();
        neighbors.sort();
        neighbors.dedup();
        neighbors
    }

    /// Every `(prerequisite, dependent)` pair, sorted.
    pub fn edges(&self) -> Vec<(Id, Id)> {
        let mut edges: Vec<(Id, Id)> = self
            .graph
            .raw_edges()
            .iter()
            .map(|edge| (self.graph[edge.source()], self.graph[edge.target()]))
            .collect();
        edges.sort();
        edges
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use almanac_core::{span::DaySpan, task::Task};

    use super::*;

    fn task(id: &str, deps: &[&str]) -> Task {
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        Task::new(Id::new(id), id, Id::new("general"), day, day)
            .with_dependencies(deps.iter().map(|dep| Id::new(dep)))
    }

    fn window() -> DaySpan {
        DaySpan::single(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
    }

    #[test]
    fn test_edges_point_from_prerequisite() {
        let tasks = vec![
            task("build", &["design"]),
            task("design", &[]),
            task("ship", &["build", "design"]),
        ];
        let (set, _) = TaskSet::build(&tasks, window());
        let graph = DependencyGraph::from_tasks(&set);

        assert_eq!(graph.edge_count(), 3);
        assert_eq!(
            graph.edges(),
            vec![
                (Id::new("build"), Id::new("ship")),
                (Id::new("design"), Id::new("build")),
                (Id::new("design"), Id::new("ship")),
            ]
        );
        assert!(graph.linked(Id::new("ship"), Id::new("design")));
        assert!(graph.linked(Id::new("design"), Id::new("ship")));
    }

    #[test]
    fn test_neighbors_cover_both_directions() {
        let tasks = vec![
            task("build", &["design"]),
            task("design", &[]),
            task("ship", &["build"]),
        ];
        let (set, _) = TaskSet::build(&tasks, window());
        let graph = DependencyGraph::from_tasks(&set);

        assert_eq!(
            graph.neighbors(Id::new("build")),
            vec![Id::new("design"), Id::new("ship")]
        );
        assert!(!graph.linked(Id::new("design"), Id::new("ship")));
    }

    #[test]
    fn test_dangling_and_self_dependencies_are_ignored() {
        let tasks = vec![task("solo", &["ghost", "solo"])];
        let (set, _) = TaskSet::build(&tasks, window());
        let graph = DependencyGraph::from_tasks(&set);

        assert_eq!(graph.edge_count(), 0);
        assert!(graph.neighbors(Id::new("solo")).is_empty());
        assert!(graph.neighbors(Id::new("ghost")).is_empty());
    }
}
