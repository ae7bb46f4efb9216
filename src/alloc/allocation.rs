use crate::alloc::interference::{InterferenceGraph, Process};

/// One stack entry produced by simplify: the eliminated process as it
/// looked at removal time. Its still-active conflict flags point exactly
/// at the neighbors that get popped (and therefore colored) before it,
/// which is the property select relies on.
#[derive(Debug, Clone)]
pub struct Elimination {
  pub process: Process,
  pub high_contention: bool,
}

/// The elimination order: last node removed is first node colored.
#[derive(Debug, Default)]
pub struct ElimOrder(Vec<Elimination>);

impl ElimOrder {
  pub fn new() -> Self {
    ElimOrder(Vec::new())
  }

  pub fn push(&mut self, elim: Elimination) {
    self.0.push(elim);
  }

  pub fn pop(&mut self) -> Option<Elimination> {
    self.0.pop()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Entries in removal order (front to back), for tracing.
  pub fn iter(&self) -> impl Iterator<Item = &Elimination> {
    self.0.iter()
  }
}

/// The elimination trace, in removal order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eliminated {
  pub pid: u32,
  pub high_contention: bool,
}

/// Per-process outcome of the select phase, in coloring order. `resource`
/// is `None` for the node that spilled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectStep {
  pub pid: u32,
  pub resource: Option<u32>,
}

/// Overall outcome of one budget attempt. Spilling is an ordinary result,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetOutcome {
  Allocated,
  Spilled,
}

/// One simplify/select attempt against a resource budget. Construction
/// via `run` drives both phases and keeps the traces for reporting, the
/// way the graph itself keeps the final assignments.
pub struct Allocator {
  pub eliminated: Vec<Eliminated>,
  pub steps: Vec<SelectStep>,
  pub outcome: BudgetOutcome,
}

impl Allocator {
  /// Runs simplify then select for `budget` resources. The graph is left
  /// fully deactivated with whatever assignments select reached; the
  /// caller resets it before the next budget.
  pub fn run(budget: u32, graph: &mut InterferenceGraph) -> Self {
    let order = Self::simplify(budget, graph);
    let eliminated = order
      .iter()
      .map(|e| Eliminated {
        pid: e.process.pid(),
        high_contention: e.high_contention,
      })
      .collect();
    let (steps, outcome) = Self::select(budget, order, graph);
    Allocator {
      eliminated,
      steps,
      outcome,
    }
  }

  /// Simplify phase: repeatedly removes the active node with the fewest
  /// remaining conflicts below `max_degree`, or, when every active node
  /// is saturated, the one with the most conflicts (the high-contention
  /// path). Each removal resolves the node out of its neighbors' counts
  /// and deactivates it, so the loop performs exactly one elimination per
  /// node.
  pub fn simplify(max_degree: u32, graph: &mut InterferenceGraph) -> ElimOrder {
    let mut order = ElimOrder::new();
    for _ in 0..graph.len() {
      let picked = find_lowest_conflict(max_degree, graph)
        .map(|i| (i, false))
        .or_else(|| find_highest_conflict(graph).map(|i| (i, true)));
      let (idx, high_contention) = match picked {
        Some(p) => p,
        None => break,
      };

      let process = graph.process(idx).clone();
      let pid = process.pid();
      log::debug!(
        "eliminating process {} with {} conflicts (budget {})",
        pid,
        process.current_conflicts(),
        max_degree
      );
      order.push(Elimination {
        process,
        high_contention,
      });
      graph.resolve_all_against(pid);
      graph.deactivate(idx);
    }
    order
  }

  /// Select phase: pops the elimination stack and gives every process the
  /// lowest resource id no actively-conflicting neighbor already holds,
  /// recording each assignment in the graph immediately. The first
  /// process with no admissible resource aborts the phase as a spill;
  /// assignments made up to that point stay in the graph.
  pub fn select(
    resource_count: u32,
    mut order: ElimOrder,
    graph: &mut InterferenceGraph,
  ) -> (Vec<SelectStep>, BudgetOutcome) {
    let mut steps = Vec::new();
    while let Some(elim) = order.pop() {
      let proc = elim.process;
      let pid = proc.pid();
      match (0..resource_count).find(|&r| graph.can_allocate(&proc, r)) {
        Some(resource) => {
          graph.assign(pid, resource);
          steps.push(SelectStep {
            pid,
            resource: Some(resource),
          });
        }
        None => {
          steps.push(SelectStep {
            pid,
            resource: None,
          });
          return (steps, BudgetOutcome::Spilled);
        }
      }
    }
    (steps, BudgetOutcome::Allocated)
  }
}

/// Index of the active node with the smallest conflict count strictly
/// under `max_degree`; ties keep the earliest arena position.
fn find_lowest_conflict(max_degree: u32, graph: &InterferenceGraph) -> Option<usize> {
  let mut best: Option<(usize, u32)> = None;
  for (i, p) in graph.iter().enumerate() {
    if !p.is_active() || p.current_conflicts() >= max_degree {
      continue;
    }
    if best.map_or(true, |(_, count)| p.current_conflicts() < count) {
      best = Some((i, p.current_conflicts()));
    }
  }
  best.map(|(i, _)| i)
}

/// Index of the active node with the largest conflict count; ties keep
/// the earliest arena position.
fn find_highest_conflict(graph: &InterferenceGraph) -> Option<usize> {
  let mut best: Option<(usize, u32)> = None;
  for (i, p) in graph.iter().enumerate() {
    if !p.is_active() {
      continue;
    }
    if best.map_or(true, |(_, count)| p.current_conflicts() > count) {
      best = Some((i, p.current_conflicts()));
    }
  }
  best.map(|(i, _)| i)
}
