//! Dependency graph induced by library references
//!
//! Nodes are the artifacts of one run, edges point from an artifact to each
//! library it links against. The graph is derived on demand and never
//! stored.

use std::collections::HashMap;

use crate::artifact::{Artifact, ArtifactRegistry};
use crate::error::{Error, Result};
use crate::types::DeploymentSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Library dependencies between the artifacts of one run
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    names: Vec<String>,
    /// `deps[i]` holds the node indices node `i` links against
    deps: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Build the graph over `artifacts`, in the order given.
    ///
    /// Every referenced library must itself be one of the artifacts, and no
    /// artifact may appear twice.
    pub fn build(artifacts: &[Artifact]) -> Result<Self> {
        let mut index = HashMap::with_capacity(artifacts.len());
        for (i, artifact) in artifacts.iter().enumerate() {
            if index.insert(artifact.name(), i).is_some() {
                return Err(Error::DuplicateDeployment(artifact.name().to_string()));
            }
        }

        let deps = artifacts
            .iter()
            .map(|artifact| {
                artifact
                    .dependencies()
                    .into_iter()
                    .map(|library| {
                        index
                            .get(library)
                            .copied()
                            .ok_or_else(|| Error::unresolved(artifact.name(), library))
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            names: artifacts.iter().map(|a| a.name().to_string()).collect(),
            deps,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// A dependency cycle, if one exists, as a path that starts and ends on
    /// the same artifact.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut marks = vec![Mark::Unvisited; self.len()];
        let mut path = Vec::new();
        (0..self.len()).find_map(|node| self.visit(node, &mut marks, &mut path))
    }

    fn visit(&self, node: usize, marks: &mut [Mark], path: &mut Vec<usize>) -> Option<Vec<String>> {
        match marks[node] {
            Mark::Done => return None,
            Mark::InProgress => {
                let start = path.iter().position(|&n| n == node).unwrap_or(0);
                let mut cycle: Vec<String> =
                    path[start..].iter().map(|&n| self.names[n].clone()).collect();
                cycle.push(self.names[node].clone());
                return Some(cycle);
            }
            Mark::Unvisited => {}
        }

        marks[node] = Mark::InProgress;
        path.push(node);
        for &dep in &self.deps[node] {
            if let Some(cycle) = self.visit(dep, marks, path) {
                return Some(cycle);
            }
        }
        path.pop();
        marks[node] = Mark::Done;
        None
    }

    pub fn ensure_acyclic(&self) -> Result<()> {
        match self.find_cycle() {
            Some(cycle) => Err(Error::DependencyCycle(cycle)),
            None => Ok(()),
        }
    }

    /// Check that every library precedes the artifacts linking against it
    pub fn validate_order(&self) -> Result<()> {
        for (node, deps) in self.deps.iter().enumerate() {
            if let Some(&late) = deps.iter().find(|&&dep| dep >= node) {
                return Err(Error::unresolved(&self.names[node], &self.names[late]));
            }
        }
        Ok(())
    }

    /// Node indices in an order where libraries come first.
    ///
    /// Among artifacts that are ready at the same time the earliest in the
    /// input wins, so an input that is already valid comes back unchanged.
    pub fn topological_order(&self) -> Result<Vec<usize>> {
        self.ensure_acyclic()?;

        let mut placed = vec![false; self.len()];
        let mut order = Vec::with_capacity(self.len());
        while order.len() < self.len() {
            let next = (0..self.len())
                .find(|&node| !placed[node] && self.deps[node].iter().all(|&dep| placed[dep]))
                .ok_or_else(|| Error::DependencyCycle(self.names.clone()))?;
            placed[next] = true;
            order.push(next);
        }
        Ok(order)
    }

    pub fn name(&self, node: usize) -> &str {
        &self.names[node]
    }
}

/// Load the artifact behind every spec, failing on the first missing one
pub fn load_all<R: ArtifactRegistry + ?Sized>(
    registry: &R,
    specs: &[DeploymentSpec],
) -> Result<Vec<Artifact>> {
    specs.iter().map(|spec| registry.load(&spec.name)).collect()
}

/// Reorder `specs` so every library comes before the artifacts linking it.
///
/// Specs already in a valid order come back unchanged.
pub fn plan<R: ArtifactRegistry + ?Sized>(
    registry: &R,
    specs: &[DeploymentSpec],
) -> Result<Vec<DeploymentSpec>> {
    let artifacts = load_all(registry, specs)?;
    let graph = DependencyGraph::build(&artifacts)?;
    let order = graph.topological_order()?;
    Ok(order.into_iter().map(|i| specs[i].clone()).collect())
}
