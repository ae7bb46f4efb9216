use std::collections::HashMap;

use serde::Serialize;

/// One process contending for resources.
///
/// Conflicts are soft-deleted: resolving a conflict clears its flag and
/// decrements `current_conflicts`, and `reset_conflicts` restores every
/// flag and the count so the same record survives repeated budget runs.
#[derive(Debug, Clone)]
pub struct Process {
  pid: u32,
  /// Conflicting neighbor pid -> whether that conflict is still active.
  conflicts: HashMap<u32, bool>,
  current_conflicts: u32,
  original_conflicts: u32,
  active: bool,
  allocated_resource: Option<u32>,
}

impl Process {
  fn new(pid: u32) -> Self {
    Process {
      pid,
      conflicts: HashMap::new(),
      current_conflicts: 0,
      original_conflicts: 0,
      active: true,
      allocated_resource: None,
    }
  }

  pub fn pid(&self) -> u32 {
    self.pid
  }

  pub fn current_conflicts(&self) -> u32 {
    self.current_conflicts
  }

  pub fn original_conflicts(&self) -> u32 {
    self.original_conflicts
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn allocated_resource(&self) -> Option<u32> {
    self.allocated_resource
  }

  pub fn has_conflict(&self, other: u32) -> bool {
    self.conflicts.contains_key(&other)
  }

  fn add_conflict(&mut self, other: u32) {
    self.conflicts.insert(other, true);
    self.current_conflicts += 1;
    self.original_conflicts += 1;
  }

  /// Clears the conflict against `other` if it is still active. Resolving
  /// an unknown or already-resolved conflict is a no-op.
  fn resolve_conflict(&mut self, other: u32) {
    if let Some(flag) = self.conflicts.get_mut(&other) {
      if *flag {
        *flag = false;
        self.current_conflicts -= 1;
      }
    }
  }

  fn reset_conflicts(&mut self) {
    self.current_conflicts = self.original_conflicts;
    for flag in self.conflicts.values_mut() {
      *flag = true;
    }
  }

  fn active_conflicts(&self) -> impl Iterator<Item = u32> + '_ {
    self
      .conflicts
      .iter()
      .filter(|(_, &live)| live)
      .map(|(&other, _)| other)
  }
}

/// Summary numbers for one interference graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
  pub total_nodes: usize,
  pub total_edges: usize,
  pub max_conflicts: u32,
  pub min_conflicts: u32,
  pub avg_conflicts: f64,
  pub isolated_nodes: usize,
}

/// The interference graph: an arena of processes in input order, with a
/// pid lookup on the side.
///
/// The node set is fixed after construction. Budget runs only flip the
/// per-node active/conflict/allocation state, and `reset` restores all of
/// it, so the same graph is reused for every resource budget.
#[derive(Debug)]
pub struct InterferenceGraph {
  nodes: Vec<Process>,
  index: HashMap<u32, usize>,
}

impl InterferenceGraph {
  pub fn new() -> Self {
    InterferenceGraph {
      nodes: Vec::new(),
      index: HashMap::new(),
    }
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn contains(&self, pid: u32) -> bool {
    self.index.contains_key(&pid)
  }

  pub fn process(&self, idx: usize) -> &Process {
    &self.nodes[idx]
  }

  pub fn lookup(&self, pid: u32) -> Option<&Process> {
    self.index.get(&pid).map(|&i| &self.nodes[i])
  }

  pub fn iter(&self) -> impl Iterator<Item = &Process> {
    self.nodes.iter()
  }

  /// Appends a process to the arena. The caller is responsible for not
  /// adding the same pid twice; see the builder in parse.rs.
  pub fn add_process(&mut self, pid: u32) {
    if !self.contains(pid) {
      self.index.insert(pid, self.nodes.len());
      self.nodes.push(Process::new(pid));
    }
  }

  /// Marks `neighbor` as an active conflict of `owner`, bumping both its
  /// current and original counts. Symmetry is the builder's concern: each
  /// endpoint of an edge records the conflict from its own line.
  pub fn add_conflict(&mut self, owner: u32, neighbor: u32) {
    if let Some(&i) = self.index.get(&owner) {
      self.nodes[i].add_conflict(neighbor);
    }
  }

  /// Resolves a single conflict on `owner`. No-op when the owner or the
  /// conflict is unknown, or the conflict is already resolved.
  pub fn resolve_conflict(&mut self, owner: u32, neighbor: u32) {
    if let Some(&i) = self.index.get(&owner) {
      self.nodes[i].resolve_conflict(neighbor);
    }
  }

  /// Resolves the conflict against `pid` on every still-active process,
  /// removing the eliminated node's influence from its neighbors' degrees.
  pub fn resolve_all_against(&mut self, pid: u32) {
    for p in &mut self.nodes {
      if p.active {
        p.resolve_conflict(pid);
      }
    }
  }

  pub fn deactivate(&mut self, idx: usize) {
    self.nodes[idx].active = false;
  }

  /// True iff no process that `proc` still actively conflicts with holds
  /// `resource`. Evaluated against the live arena, so assignments made
  /// earlier in a select phase constrain later ones. A conflict pid with
  /// no process in the arena never constrains anything.
  pub fn can_allocate(&self, proc: &Process, resource: u32) -> bool {
    for other in proc.active_conflicts() {
      if let Some(&i) = self.index.get(&other) {
        if self.nodes[i].allocated_resource == Some(resource) {
          return false;
        }
      }
    }
    true
  }

  /// Records an assignment in the arena so later `can_allocate` calls in
  /// the same select phase see it.
  pub fn assign(&mut self, pid: u32, resource: u32) {
    if let Some(&i) = self.index.get(&pid) {
      self.nodes[i].allocated_resource = Some(resource);
    }
  }

  /// Returns the graph to its pristine state between budget runs: every
  /// process reactivated, allocations cleared, conflict flags and counts
  /// restored.
  pub fn reset(&mut self) {
    for p in &mut self.nodes {
      p.active = true;
      p.allocated_resource = None;
      p.reset_conflicts();
    }
  }

  pub fn stats(&self) -> GraphStats {
    let total_nodes = self.nodes.len();
    let degree_sum: u32 = self.nodes.iter().map(|p| p.original_conflicts).sum();
    GraphStats {
      total_nodes,
      total_edges: degree_sum as usize / 2,
      max_conflicts: self
        .nodes
        .iter()
        .map(|p| p.original_conflicts)
        .max()
        .unwrap_or(0),
      min_conflicts: self
        .nodes
        .iter()
        .map(|p| p.original_conflicts)
        .min()
        .unwrap_or(0),
      avg_conflicts: if total_nodes == 0 {
        0.0
      } else {
        f64::from(degree_sum) / total_nodes as f64
      },
      isolated_nodes: self
        .nodes
        .iter()
        .filter(|p| p.original_conflicts == 0)
        .count(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // 1 - 2 - 3 path
  fn path_graph() -> InterferenceGraph {
    let mut g = InterferenceGraph::new();
    for pid in 1..=3 {
      g.add_process(pid);
    }
    g.add_conflict(1, 2);
    g.add_conflict(2, 1);
    g.add_conflict(2, 3);
    g.add_conflict(3, 2);
    g
  }

  #[test]
  fn test_conflict_counts() {
    let g = path_graph();
    assert_eq!(g.lookup(1).unwrap().current_conflicts(), 1);
    assert_eq!(g.lookup(2).unwrap().current_conflicts(), 2);
    assert_eq!(g.lookup(3).unwrap().current_conflicts(), 1);
  }

  #[test]
  fn test_resolve_is_idempotent() {
    let mut g = path_graph();
    g.resolve_conflict(1, 2);
    assert_eq!(g.lookup(1).unwrap().current_conflicts(), 0);
    g.resolve_conflict(1, 2);
    assert_eq!(g.lookup(1).unwrap().current_conflicts(), 0);
    assert_eq!(g.lookup(1).unwrap().original_conflicts(), 1);
    // resolving a conflict that was never declared changes nothing
    g.resolve_conflict(1, 3);
    assert_eq!(g.lookup(1).unwrap().current_conflicts(), 0);
  }

  #[test]
  fn test_resolve_skips_inactive() {
    let mut g = path_graph();
    g.deactivate(0);
    g.resolve_all_against(2);
    // node 1 was inactive, so its conflict against 2 is untouched
    assert_eq!(g.lookup(1).unwrap().current_conflicts(), 1);
    assert_eq!(g.lookup(3).unwrap().current_conflicts(), 0);
  }

  #[test]
  fn test_reset_restores_counts_and_flags() {
    let mut g = path_graph();
    g.resolve_all_against(2);
    g.deactivate(1);
    g.assign(3, 0);
    g.reset();
    for p in g.iter() {
      assert!(p.is_active());
      assert_eq!(p.allocated_resource(), None);
      assert_eq!(p.current_conflicts(), p.original_conflicts());
    }
    // flags are active again: resolving decrements once more
    g.resolve_all_against(2);
    assert_eq!(g.lookup(1).unwrap().current_conflicts(), 0);
  }

  #[test]
  fn test_can_allocate_sees_live_assignments() {
    let mut g = path_graph();
    let two = g.lookup(2).unwrap().clone();
    assert!(g.can_allocate(&two, 0));
    g.assign(1, 0);
    assert!(!g.can_allocate(&two, 0));
    assert!(g.can_allocate(&two, 1));
  }

  #[test]
  fn test_can_allocate_ignores_resolved_conflicts() {
    let mut g = path_graph();
    g.assign(1, 0);
    g.resolve_all_against(1);
    let two = g.lookup(2).unwrap().clone();
    // the conflict with 1 is resolved in this snapshot, so its resource
    // no longer constrains node 2
    assert!(g.can_allocate(&two, 0));
  }

  #[test]
  fn test_can_allocate_unknown_neighbor() {
    let mut g = InterferenceGraph::new();
    g.add_process(1);
    g.add_conflict(1, 99);
    let one = g.lookup(1).unwrap().clone();
    assert!(g.can_allocate(&one, 0));
  }

  #[test]
  fn test_stats() {
    let mut g = path_graph();
    g.add_process(4);
    let stats = g.stats();
    assert_eq!(stats.total_nodes, 4);
    assert_eq!(stats.total_edges, 2);
    assert_eq!(stats.max_conflicts, 2);
    assert_eq!(stats.min_conflicts, 0);
    assert_eq!(stats.isolated_nodes, 1);
    assert!((stats.avg_conflicts - 1.0).abs() < 1e-9);
  }
}
