#![cfg(test)]

use std::path::PathBuf;
use std::sync::Mutex;

use crate::config::{CommandKind, CommandSpec};
use crate::report::{ReportLine, ReportSink};

pub fn spec(name: &str, command: &str) -> CommandSpec {
    CommandSpec {
        name: name.to_string(),
        command: command.to_string(),
        pattern: glob::Pattern::new("*").unwrap(),
        kind: CommandKind::Test,
        dir: std::env::temp_dir(),
    }
}

pub fn spec_with_glob(name: &str, glob: &str, kind: CommandKind) -> CommandSpec {
    CommandSpec {
        name: name.to_string(),
        command: format!("echo {}", name),
        pattern: glob::Pattern::new(glob).unwrap(),
        kind,
        dir: PathBuf::from("/"),
    }
}

/// Keeps every emitted report, in emission order.
#[derive(Default)]
pub struct MemorySink {
    reports: Mutex<Vec<Vec<ReportLine>>>,
}

impl MemorySink {
    pub fn reports(&self) -> Vec<Vec<ReportLine>> {
        self.reports.lock().unwrap().clone()
    }
}

impl ReportSink for MemorySink {
    fn emit(&self, lines: &[ReportLine]) {
        self.reports.lock().unwrap().push(lines.to_vec());
    }
}
