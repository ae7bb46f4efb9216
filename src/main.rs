//! Resource allocation simulator: colors an interference graph of
//! processes with the classic simplify/select heuristic, reporting
//! success or spill for every resource budget from the input maximum
//! down to the configured floor.

mod alloc;
mod args;
mod lex;
mod parse;
mod report;

use anyhow::Result;
use lazy_static::lazy_static;
use wasm_bindgen::prelude::*;

use std::io::{Read, Write};
use std::sync::Arc;
use std::sync::Mutex;
use std::time;

use crate::parse::parser;

lazy_static! {
  static ref SIM_OPTIONS: Arc<Mutex<args::SimConfig>> =
    Arc::new(Mutex::new(args::SimConfig::from_config()));
}

fn read_input(file: Option<&str>) -> Result<String> {
  match file {
    Some(path) => Ok(std::fs::read_to_string(path)?),
    None => {
      let mut buf = String::new();
      std::io::stdin().read_to_string(&mut buf)?;
      Ok(buf)
    }
  }
}

fn main() {
  let cfg = args::parse_args();

  env_logger::builder()
    .target(env_logger::Target::Stdout)
    .format_timestamp(None)
    .init();

  // Helper macro to time evaluating an expression (like a function call.)
  macro_rules! time {
    ( $x:expr ) => {{
      let t1 = time::SystemTime::now();
      let result = $x;
      (result, t1.elapsed().unwrap())
    }};
  }

  let (raw, read_time) = time!(read_input(cfg.file.as_deref()));
  let raw = match raw {
    Err(e) => {
      eprintln!("{}", e);
      std::process::exit(1); // No input, nothing to simulate.
    }
    Ok(raw) => raw,
  };

  let (parsed, parse_time) = time!(parser::parse(&raw).and_then(|input| {
    let graph = parser::build_graph(&input)?;
    Ok((input, graph))
  }));
  let (input, mut graph) = match parsed {
    Err(e) => {
      eprintln!("{}", e);
      std::process::exit(1); // Parse failed!
    }
    Ok(pair) => pair,
  };

  if input.max_resources < 2 {
    log::warn!(
      "max resource count {} leaves no budgets to attempt",
      input.max_resources
    );
  }

  let stdout = std::io::stdout();
  let mut out = stdout.lock();

  if cfg.dump_graph {
    if let Err(e) = report::write_stats(&mut out, &graph) {
      eprintln!("{}", e);
      std::process::exit(1);
    }
  }

  let (written, sim_time) = time!(report::write_report(&mut out, &input, &mut graph));
  if let Err(e) = written {
    eprintln!("{}", e);
    std::process::exit(1);
  }

  if cfg.find_optimal {
    let line = match report::find_minimum_budget(&mut graph) {
      Some(r) => format!("Graph {} -> Minimum Resources = {}", input.name, r),
      None => format!("Graph {} -> Minimum Resources = none found", input.name),
    };
    if let Err(e) = writeln!(out, "{}", line) {
      eprintln!("{}", e);
      std::process::exit(1);
    }
  }

  if cfg.verbose {
    println!("Read time: {} us", read_time.as_micros());
    println!("Parse time: {} us", parse_time.as_micros());
    println!("Simulation: {} us", sim_time.as_micros());
  }
}

#[wasm_bindgen]
pub fn simulate(input: &str) -> String {
  match report::return_report(input) {
    Ok(report) => report,
    Err(e) => e.to_string(),
  }
}

#[wasm_bindgen]
pub fn analyze(input: &str) -> String {
  match analyze_inner(input) {
    Ok(stats) => stats,
    Err(e) => e.to_string(),
  }
}

fn analyze_inner(input: &str) -> Result<String> {
  let parsed = parser::parse(input)?;
  let graph = parser::build_graph(&parsed)?;
  Ok(serde_json::to_string(&graph.stats())?)
}

#[wasm_bindgen]
pub fn find_optimal(input: &str) -> String {
  match find_optimal_inner(input) {
    Ok(result) => result,
    Err(e) => e.to_string(),
  }
}

fn find_optimal_inner(input: &str) -> Result<String> {
  let parsed = parser::parse(input)?;
  let mut graph = parser::build_graph(&parsed)?;
  let budget = report::find_minimum_budget(&mut graph);
  Ok(serde_json::to_string(&serde_json::json!({
    "graph": parsed.name,
    "resources": budget,
    "success": budget.is_some(),
  }))?)
}
