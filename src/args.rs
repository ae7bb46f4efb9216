//! Parse command line arguments
//! Kept deliberately small; something like clap would be overkill for
//! four flags and a file name.

use std::env;

use serde::Deserialize;

/// Configuration options for this simulator run.
pub struct Config {
  pub verbose: bool,
  pub dump_graph: bool,
  pub find_optimal: bool,

  pub file: Option<String>,
}

/// Tunables read from sim_opt.toml next to the manifest.
#[derive(Deserialize)]
pub struct SimConfig {
  /// Add missing reverse edges at build time instead of trusting the
  /// listing to declare every conflict from both sides.
  pub auto_symmetrize: bool,
  /// Smallest resource budget the sweep attempts.
  pub min_resources: u32,
}

fn get_sim_config_file_path() -> String {
  let source_dir = env!("CARGO_MANIFEST_DIR");
  format!("{}/{}", source_dir, "sim_opt.toml")
}

impl SimConfig {
  pub fn from_config() -> Self {
    let config = std::fs::read_to_string(get_sim_config_file_path());
    if let Ok(config) = config {
      toml::from_str(&config).unwrap()
    } else {
      SimConfig {
        auto_symmetrize: false,
        min_resources: 2,
      }
    }
  }
}

impl Config {
  /// Set your defaults here!
  fn default() -> Self {
    Config {
      verbose: false,      // Print phase timings
      dump_graph: false,   // Print graph statistics before simulating
      find_optimal: false, // Search for the minimum feasible budget

      file: None, // Input file; stdin when absent
    }
  }
}

/// Parses command line input into a configuration. Unknown dashed
/// arguments are ignored.
pub fn parse_args() -> Config {
  let args: Vec<String> = env::args().collect();
  let mut config = Config::default();
  for arg in args.iter().skip(1) {
    match arg.as_str() {
      "-v" | "--verbose" => config.verbose = true,
      "-g" | "--dump-graph" => config.dump_graph = true,
      "-o" | "--find-optimal" => config.find_optimal = true,
      file => {
        if let Some('-') = file.chars().next() {
        } else {
          config.file = Some(file.to_string())
        }
      }
    };
  }

  config
}
