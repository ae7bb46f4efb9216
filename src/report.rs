//! Report emission for allocation runs.

use std::cmp::min;
use std::io::{self, Write};

use anyhow::Result;

use crate::alloc::{Allocator, BudgetOutcome, InterferenceGraph};
use crate::parse::parser::{self, GraphInput};
use crate::SIM_OPTIONS;

const RULE: &str = "--------------------------------------------------";

/// Runs the full budget sweep for `input`, writing the progress trace and
/// summary to `out`. Budgets run from the input's maximum down to the
/// configured floor; the graph is reset between budgets and left reset
/// afterwards. Returns the per-budget outcomes, largest budget first.
pub fn write_report(
  out: &mut impl Write,
  input: &GraphInput,
  graph: &mut InterferenceGraph,
) -> io::Result<Vec<(u32, BudgetOutcome)>> {
  let floor = SIM_OPTIONS.lock().unwrap().min_resources;
  let k = input.max_resources;

  writeln!(
    out,
    "Resource Allocation Simulation for Graph {} with Max Resources = {}",
    input.name, k
  )?;
  writeln!(out, "{}", RULE)?;
  writeln!(out)?;

  let mut results = Vec::new();
  for r in (floor..=k).rev() {
    writeln!(out, "Attempting Allocation with {} Resources", r)?;
    let run = Allocator::run(r, graph);
    for e in &run.eliminated {
      if e.high_contention {
        writeln!(
          out,
          "Waiting to Allocate: Process {} (High contention)",
          e.pid
        )?;
      } else {
        writeln!(out, "Waiting to Allocate: Process {}", e.pid)?;
      }
    }
    for step in &run.steps {
      match step.resource {
        Some(resource) => {
          writeln!(out, "Process {} Assigned Resource {}", step.pid, resource)?
        }
        None => writeln!(out, "Process {} FAILED to Acquire Resource (SPILL)", step.pid)?,
      }
    }
    results.push((r, run.outcome));
    graph.reset();
    writeln!(out, "{}", RULE)?;
  }

  for &(r, outcome) in &results {
    let verdict = match outcome {
      BudgetOutcome::Allocated => "Successful Allocation",
      BudgetOutcome::Spilled => "SPILL (Conflict could not be resolved)",
    };
    writeln!(
      out,
      "Graph {} -> Resources = {}: {}",
      input.name, r, verdict
    )?;
  }

  Ok(results)
}

/// The whole simulation as a string, for the wasm entry point and tests.
pub fn return_report(input: &str) -> Result<String> {
  let parsed = parser::parse(input)?;
  let mut graph = parser::build_graph(&parsed)?;
  let mut buf = vec![];
  write_report(&mut buf, &parsed, &mut graph)?;
  Ok(String::from_utf8(buf).unwrap())
}

/// Searches ascending budgets for the smallest one that allocates fully,
/// starting at the configured floor. Attempts are capped at
/// `min(10, node count)`, so a dense graph can come back empty-handed.
/// The graph is left reset.
pub fn find_minimum_budget(graph: &mut InterferenceGraph) -> Option<u32> {
  let floor = SIM_OPTIONS.lock().unwrap().min_resources;
  let cap = min(10, graph.len() as u32);
  for r in floor..=cap {
    let run = Allocator::run(r, graph);
    graph.reset();
    if run.outcome == BudgetOutcome::Allocated {
      return Some(r);
    }
    log::debug!("budget {} spilled during minimum search", r);
  }
  None
}

/// Writes the statistics block shown by `--dump-graph`.
pub fn write_stats(out: &mut impl Write, graph: &InterferenceGraph) -> io::Result<()> {
  let stats = graph.stats();
  writeln!(out, "Graph Statistics")?;
  writeln!(out, "Total Nodes: {}", stats.total_nodes)?;
  writeln!(out, "Total Edges: {}", stats.total_edges)?;
  writeln!(out, "Max Conflicts: {}", stats.max_conflicts)?;
  writeln!(out, "Min Conflicts: {}", stats.min_conflicts)?;
  writeln!(out, "Avg Conflicts: {:.2}", stats.avg_conflicts)?;
  writeln!(out, "Isolated Nodes: {}", stats.isolated_nodes)?;
  writeln!(out, "{}", RULE)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  const PATH: &str = "Graph Name: path\n\
                      Max Resources: 2\n\
                      1 --> 2\n\
                      2 --> 1 3\n\
                      3 --> 2\n";

  const TRIANGLE: &str = "Graph Name: tri\n\
                          Max Resources: 3\n\
                          1 --> 2 3\n\
                          2 --> 1 3\n\
                          3 --> 1 2\n";

  #[test]
  fn test_path_report() {
    let report = return_report(PATH).unwrap();
    assert_eq!(
      report,
      "Resource Allocation Simulation for Graph path with Max Resources = 2\n\
       --------------------------------------------------\n\
       \n\
       Attempting Allocation with 2 Resources\n\
       Waiting to Allocate: Process 1\n\
       Waiting to Allocate: Process 2\n\
       Waiting to Allocate: Process 3\n\
       Process 3 Assigned Resource 0\n\
       Process 2 Assigned Resource 1\n\
       Process 1 Assigned Resource 0\n\
       --------------------------------------------------\n\
       Graph path -> Resources = 2: Successful Allocation\n"
    );
  }

  #[test]
  fn test_triangle_summary() {
    let report = return_report(TRIANGLE).unwrap();
    assert!(report.contains("Waiting to Allocate: Process 1 (High contention)"));
    assert!(report.contains("Process 1 FAILED to Acquire Resource (SPILL)"));
    assert!(report.contains("Graph tri -> Resources = 3: Successful Allocation"));
    assert!(report
      .contains("Graph tri -> Resources = 2: SPILL (Conflict could not be resolved)"));
  }

  #[test]
  fn test_budget_order_is_descending() {
    let parsed = parser::parse(TRIANGLE).unwrap();
    let mut graph = parser::build_graph_with(&parsed, false).unwrap();
    let mut buf = vec![];
    let results = write_report(&mut buf, &parsed, &mut graph).unwrap();
    assert_eq!(
      results,
      vec![(3, BudgetOutcome::Allocated), (2, BudgetOutcome::Spilled)]
    );
  }

  #[test]
  fn test_find_minimum_budget_triangle() {
    let parsed = parser::parse(TRIANGLE).unwrap();
    let mut graph = parser::build_graph_with(&parsed, false).unwrap();
    assert_eq!(find_minimum_budget(&mut graph), Some(3));
    // the search leaves the graph reset
    assert!(graph.iter().all(|p| p.is_active()));
  }

  #[test]
  fn test_find_minimum_budget_gives_up() {
    // K11 needs 11 resources, past the 10-attempt cap
    let mut input = String::from("Graph Name: k11\nMax Resources: 2\n");
    for pid in 1..=11u32 {
      let neighbors: Vec<String> = (1..=11)
        .filter(|&n| n != pid)
        .map(|n| n.to_string())
        .collect();
      input.push_str(&format!("{} --> {}\n", pid, neighbors.join(" ")));
    }
    let parsed = parser::parse(&input).unwrap();
    let mut graph = parser::build_graph_with(&parsed, false).unwrap();
    assert_eq!(find_minimum_budget(&mut graph), None);
  }

  #[test]
  fn test_stats_block() {
    let parsed = parser::parse(PATH).unwrap();
    let graph = parser::build_graph_with(&parsed, false).unwrap();
    let mut buf = vec![];
    write_stats(&mut buf, &graph).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("Total Nodes: 3"));
    assert!(text.contains("Total Edges: 2"));
    assert!(text.contains("Avg Conflicts: 1.33"));
  }
}
