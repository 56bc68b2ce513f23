use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::{PackageError, PackageResult};

/// Explicit includes and the dependency edges between them.
///
/// Node order is the tie-break basis for the topological sort, so callers pass nodes sorted.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
  nodes: Vec<PathBuf>,
  edges: BTreeMap<PathBuf, Vec<PathBuf>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
  Visiting,
  Done,
}

impl DependencyGraph {
  /// Build a graph over `nodes`, keeping only edges whose endpoints are both nodes.
  pub fn new(nodes: &[PathBuf], dependencies: &BTreeMap<PathBuf, Vec<PathBuf>>) -> Self {
    let members: BTreeSet<&PathBuf> = nodes.iter().collect();
    let edges = dependencies
      .iter()
      .filter(|(key, _)| members.contains(key))
      .map(|(key, values)| {
        let kept = values
          .iter()
          .filter(|value| members.contains(value))
          .cloned()
          .collect();
        (key.clone(), kept)
      })
      .collect();

    Self {
      nodes: nodes.to_vec(),
      edges,
    }
  }

  /// Order nodes so that every dependency precedes its dependents.
  ///
  /// Depth-first with post-order emission: nodes are visited in insertion order and each
  /// node's dependencies in declared order, which makes the result fully determined by the
  /// input. A cycle aborts with [`PackageError::CyclicDependency`].
  pub fn topological_order(&self) -> PackageResult<Vec<PathBuf>> {
    let mut marks: BTreeMap<&Path, Mark> = BTreeMap::new();
    let mut stack: Vec<&Path> = Vec::new();
    let mut order = Vec::with_capacity(self.nodes.len());

    for node in &self.nodes {
      self.visit(node, &mut marks, &mut stack, &mut order)?;
    }

    Ok(order)
  }

  fn visit<'a>(
    &'a self,
    node: &'a Path,
    marks: &mut BTreeMap<&'a Path, Mark>,
    stack: &mut Vec<&'a Path>,
    order: &mut Vec<PathBuf>,
  ) -> PackageResult<()> {
    match marks.get(node) {
      Some(Mark::Done) => return Ok(()),
      Some(Mark::Visiting) => {
        let start = stack.iter().position(|entry| *entry == node).unwrap_or(0);
        let mut cycle: Vec<PathBuf> = stack[start..].iter().map(|p| p.to_path_buf()).collect();
        cycle.push(node.to_path_buf());
        return Err(PackageError::CyclicDependency { cycle });
      }
      None => {}
    }

    marks.insert(node, Mark::Visiting);
    stack.push(node);

    if let Some(children) = self.edges.get(node) {
      for child in children {
        self.visit(child, marks, stack, order)?;
      }
    }

    stack.pop();
    marks.insert(node, Mark::Done);
    order.push(node.to_path_buf());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn paths(values: &[&str]) -> Vec<PathBuf> {
    values.iter().map(PathBuf::from).collect()
  }

  fn deps(edges: &[(&str, &str)]) -> BTreeMap<PathBuf, Vec<PathBuf>> {
    let mut dependencies: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for (key, value) in edges {
      dependencies
        .entry(PathBuf::from(key))
        .or_default()
        .push(PathBuf::from(value));
    }
    dependencies
  }

  fn position(order: &[PathBuf], name: &str) -> usize {
    order.iter().position(|p| p == Path::new(name)).unwrap()
  }

  #[test]
  fn dependency_precedes_dependent() {
    let graph = DependencyGraph::new(&paths(&["a.js", "b.js"]), &deps(&[("a.js", "b.js")]));
    assert_eq!(graph.topological_order().unwrap(), paths(&["b.js", "a.js"]));
  }

  #[test]
  fn transitive_dependencies_are_respected() {
    let graph = DependencyGraph::new(
      &paths(&["a.js", "b.js", "c.js", "d.js"]),
      &deps(&[("a.js", "c.js"), ("c.js", "d.js"), ("b.js", "a.js")]),
    );
    let order = graph.topological_order().unwrap();

    assert!(position(&order, "d.js") < position(&order, "c.js"));
    assert!(position(&order, "c.js") < position(&order, "a.js"));
    assert!(position(&order, "a.js") < position(&order, "b.js"));
  }

  #[test]
  fn unconstrained_nodes_keep_insertion_order() {
    let graph = DependencyGraph::new(
      &paths(&["a.js", "b.js", "c.js"]),
      &deps(&[("c.js", "a.js")]),
    );
    assert_eq!(
      graph.topological_order().unwrap(),
      paths(&["a.js", "b.js", "c.js"])
    );
  }

  #[test]
  fn edges_to_non_members_are_ignored() {
    let graph = DependencyGraph::new(
      &paths(&["a.js"]),
      &deps(&[("a.js", "excluded.js"), ("other.js", "a.js")]),
    );
    assert_eq!(graph.topological_order().unwrap(), paths(&["a.js"]));
  }

  #[test]
  fn reports_the_cycle() {
    let graph = DependencyGraph::new(
      &paths(&["a.js", "b.js", "c.js"]),
      &deps(&[("a.js", "b.js"), ("b.js", "c.js"), ("c.js", "a.js")]),
    );

    match graph.topological_order() {
      Err(PackageError::CyclicDependency { cycle }) => {
        assert_eq!(cycle, paths(&["a.js", "b.js", "c.js", "a.js"]));
      }
      other => panic!("expected a cycle, got {other:?}"),
    }
  }

  #[test]
  fn self_dependency_is_a_cycle() {
    let graph = DependencyGraph::new(&paths(&["a.js"]), &deps(&[("a.js", "a.js")]));
    assert!(matches!(
      graph.topological_order(),
      Err(PackageError::CyclicDependency { .. })
    ));
  }
}
