use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::app::adb::runner::{Adb, CommandOutput, CommandRunner};

/// Fake runner keyed by the full command line (`"adb -s X push a b"`).
/// Queued outputs are consumed in order; the last one repeats.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, command: &str, exit_code: i32, stdout: &str, stderr: &str) -> &Self {
        self.rules
            .lock()
            .expect("rules lock")
            .entry(command.to_string())
            .or_default()
            .push_back(CommandOutput::new(exit_code, stdout, stderr));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|call| call.as_str() == command).count()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|call| call.starts_with(prefix)).count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[String], _timeout: Duration) -> CommandOutput {
        let key = if args.is_empty() {
            program.to_string()
        } else {
            format!("{program} {}", args.join(" "))
        };
        self.calls.lock().expect("calls lock").push(key.clone());
        let mut rules = self.rules.lock().expect("rules lock");
        match rules.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(ok_empty),
            Some(queue) => queue.front().cloned().unwrap_or_else(ok_empty),
            None => ok_empty(),
        }
    }
}

fn ok_empty() -> CommandOutput {
    CommandOutput::new(0, "", "")
}

pub fn adb_with(runner: &Arc<ScriptedRunner>) -> Adb {
    let runner: Arc<dyn CommandRunner> = runner.clone();
    Adb::new("adb", runner, "trace-test")
}

pub fn devices_output(entries: &[(&str, &str)]) -> String {
    let mut out = String::from("List of devices attached\n");
    for (serial, state) in entries {
        out.push_str(&format!("{serial}\t{state}\n"));
    }
    out.push('\n');
    out
}
