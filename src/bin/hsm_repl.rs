//! Interactive driver for a state machine: start it, then type events on
//! stdin (`EVENT` or `EVENT {"json": "data"}`) and watch the active state,
//! dispatch results and context evolve.
//!
//! With no --config a built-in media player machine is used, wired to a
//! couple of context-mutating actions.  A config loaded from disk runs with
//! an empty registry, so it should only reference guards/actions it can live
//! without.

use std::fs::File;
use std::io;
use std::io::BufRead;
use std::path::PathBuf;

use clap::Parser;
use serde_json::json;

use hsm::{assign, Setup, StateMachine};

#[derive(Parser, Debug)]
#[clap(name = "hsm_repl")]
struct Opts {
  /// Path to a JSON machine config; omit for the built-in sample.
  #[clap(long)]
  config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
  env_logger::init();
  let opts: Opts = Opts::parse();

  let mut machine = match &opts.config {
    Some(path) => {
      let config = serde_json::from_reader(File::open(path)?)?;
      StateMachine::from_value(config, Setup::new())?
    }
    None => sample_machine()?,
  };

  machine.start()?;
  println!("started, active: [{}]", machine.active().unwrap_or("<none>"));

  for line in io::stdin().lock().lines() {
    let line = line?;
    let mut parts = line.trim().splitn(2, ' ');
    let name = match parts.next().filter(|name| !name.is_empty()) {
      Some(name) => name,
      None => continue,
    };
    let data = match parts.next() {
      Some(raw) => match serde_json::from_str(raw) {
        Ok(data) => data,
        Err(e) => {
          println!("bad event data: {}", e);
          continue;
        }
      },
      None => json!({}),
    };

    match machine.dispatch(name, data) {
      Ok(result) => {
        println!("result: {:?}", result);
        println!("active: [{}]", machine.active().unwrap_or("<none>"));
        println!("context: {}", machine.context());
      }
      Err(e) => println!("dispatch failed: {}", e),
    }
  }
  Ok(())
}

fn sample_machine() -> anyhow::Result<StateMachine> {
  let config = json!({
    "id": "player",
    "initial": "stopped",
    "context": { "volume": 5, "plays": 0 },
    "states": {
      "stopped": { "on": { "PLAY": "playing" } },
      "playing": {
        "initial": "normal",
        "entry": "countPlay",
        "on": {
          "STOP": "stopped",
          "VOLUME": { "actions": ["setVolume"] },
        },
        "states": {
          "normal": { "on": { "PAUSE": "paused" } },
          "paused": { "on": { "PAUSE": "normal" } },
        },
      },
    },
  });
  let setup = Setup::new()
      .boxed_action(
        "countPlay",
        assign(|context, _| json!({ "plays": context["plays"].as_i64().unwrap_or(0) + 1 })),
      )
      .boxed_action("setVolume", assign(|_, event| json!({ "volume": event.data["level"] })));
  Ok(StateMachine::from_value(config, setup)?)
}
