//! Parser for interference listings.

// The input is line-oriented: a graph-name header, a resource-count
// header, then one node line per process. Header lines are split on
// their first colon; node lines go through the logos lexer in lex.rs.

pub mod parser {
  use anyhow::{anyhow, Result};
  use logos::Logos;

  use crate::alloc::InterferenceGraph;
  use crate::lex::Token;
  use crate::SIM_OPTIONS;

  /// A parsed input: graph label, resource budget, and the adjacency
  /// listing in declaration order.
  #[derive(Debug, Clone, PartialEq)]
  pub struct GraphInput {
    pub name: String,
    pub max_resources: u32,
    pub listing: Vec<(u32, Vec<u32>)>,
  }

  pub fn parse(input: &str) -> Result<GraphInput> {
    let mut lines = input.lines().enumerate();

    let name = header_value(lines.next(), "graph name")?.to_string();
    let count = header_value(lines.next(), "resource count")?;
    let max_resources = count
      .parse::<u32>()
      .map_err(|e| anyhow!("line 2: bad resource count {:?}: {}", count, e))?;

    log::debug!("graph {:?} with max resources {}", name, max_resources);

    let mut listing = Vec::new();
    for (i, line) in lines {
      if line.trim().is_empty() {
        continue;
      }
      listing.push(parse_node_line(line, i + 1)?);
    }

    Ok(GraphInput {
      name,
      max_resources,
      listing,
    })
  }

  /// Builds the interference graph for a parsed listing. Every declared
  /// conflict is applied to its owner; with `auto_symmetrize` on, reverse
  /// edges missing from the listing are added as well.
  pub fn build_graph(input: &GraphInput) -> Result<InterferenceGraph> {
    let auto_symmetrize = SIM_OPTIONS.lock().unwrap().auto_symmetrize;
    build_graph_with(input, auto_symmetrize)
  }

  pub fn build_graph_with(
    input: &GraphInput,
    auto_symmetrize: bool,
  ) -> Result<InterferenceGraph> {
    let mut graph = InterferenceGraph::new();
    for &(pid, _) in &input.listing {
      if graph.contains(pid) {
        return Err(anyhow!("duplicate node line for process {}", pid));
      }
      graph.add_process(pid);
    }

    for (pid, neighbors) in &input.listing {
      for &n in neighbors {
        graph.add_conflict(*pid, n);
      }
      log::debug!("process {} conflicts with {:?}", pid, neighbors);
    }

    if auto_symmetrize {
      for (pid, neighbors) in &input.listing {
        for &n in neighbors {
          let missing = graph
            .lookup(n)
            .map_or(false, |p| !p.has_conflict(*pid));
          if missing {
            log::debug!("symmetrizing conflict {} -> {}", n, pid);
            graph.add_conflict(n, *pid);
          }
        }
      }
    }

    Ok(graph)
  }

  fn header_value<'a>(
    line: Option<(usize, &'a str)>,
    what: &str,
  ) -> Result<&'a str> {
    let (i, line) =
      line.ok_or_else(|| anyhow!("missing {} header line", what))?;
    log::debug!("raw header line: {:?}", line);
    match line.split_once(':') {
      Some((_, value)) => Ok(value.trim()),
      None => Err(anyhow!(
        "line {}: expected a {} header with a `:`, got {:?}",
        i + 1,
        what,
        line
      )),
    }
  }

  fn parse_node_line(line: &str, lineno: usize) -> Result<(u32, Vec<u32>)> {
    let mut lex = Token::lexer(line);

    let pid = match lex.next() {
      Some(Token::Num(n)) => n,
      Some(tok) => {
        return Err(anyhow!(
          "line {}: expected a process id, found `{}`",
          lineno,
          tok.as_ref()
        ))
      }
      None => return Err(anyhow!("line {}: expected a process id", lineno)),
    };

    match lex.next() {
      Some(Token::Arrow) => {}
      Some(tok) => {
        return Err(anyhow!(
          "line {}: expected `-->` after process {}, found `{}`",
          lineno,
          pid,
          tok.as_ref()
        ))
      }
      None => {
        return Err(anyhow!(
          "line {}: expected `-->` after process {}",
          lineno,
          pid
        ))
      }
    }

    let mut neighbors = Vec::new();
    for tok in lex {
      match tok.as_num() {
        Some(&n) => neighbors.push(n),
        None => {
          return Err(anyhow!(
            "line {}: bad neighbor token `{}` for process {}",
            lineno,
            tok.as_ref(),
            pid
          ))
        }
      }
    }

    Ok((pid, neighbors))
  }

}
