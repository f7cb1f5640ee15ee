use super::LedgerError;
use std::process::Command;
use tracing::debug;

pub const POCKETD_BIN: &str = "pocketd";

/// Captured result of one client invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub stdout: String,
    pub stderr: String,
    pub status: Option<i32>,
}

impl Invocation {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// stdout followed by stderr, which is what operators want to see in errors.
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
            (false, true) => self.stdout.clone(),
            (true, _) => self.stderr.clone(),
        }
    }
}

/// Narrow seam over the external ledger executable.
pub trait LedgerClient: Send + Sync {
    fn invoke(&self, args: &[String]) -> Result<Invocation, LedgerError>;
}

#[derive(Debug, Clone)]
pub struct ProcessClient {
    program: String,
}

impl ProcessClient {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ProcessClient {
    fn default() -> Self {
        let program = std::env::var("APPSTAKE_TUI_POCKETD").unwrap_or_else(|_| POCKETD_BIN.into());
        Self::new(program)
    }
}

impl LedgerClient for ProcessClient {
    fn invoke(&self, args: &[String]) -> Result<Invocation, LedgerError> {
        debug!(program = %self.program, ?args, "invoking ledger client");
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| LedgerError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let invocation = Invocation {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        };
        debug!(status = ?invocation.status, "ledger client exited");
        Ok(invocation)
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::{collections::VecDeque, sync::Mutex};

    /// Scripted client: each rule matches when every needle appears in the argument list.
    /// Files passed as `--config=<path>` are read at invoke time, while they still exist.
    #[derive(Default)]
    pub struct ScriptedClient {
        rules: Mutex<Vec<(Vec<String>, VecDeque<Invocation>)>>,
        calls: Mutex<Vec<Vec<String>>>,
        param_files: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on(self, needles: &[&str], stdout: &str, status: i32) -> Self {
            let invocation = Invocation {
                stdout: stdout.to_string(),
                stderr: String::new(),
                status: Some(status),
            };
            self.push(needles, invocation);
            self
        }

        pub fn on_stderr(self, needles: &[&str], stderr: &str, status: i32) -> Self {
            let invocation = Invocation {
                stdout: String::new(),
                stderr: stderr.to_string(),
                status: Some(status),
            };
            self.push(needles, invocation);
            self
        }

        pub fn on_output(self, needles: &[&str], stdout: &str, stderr: &str, status: i32) -> Self {
            let invocation = Invocation {
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
                status: Some(status),
            };
            self.push(needles, invocation);
            self
        }

        fn push(&self, needles: &[&str], invocation: Invocation) {
            let mut rules = self.rules.lock().unwrap();
            let key: Vec<String> = needles.iter().map(|n| n.to_string()).collect();
            if let Some((_, queue)) = rules.iter_mut().find(|(k, _)| *k == key) {
                queue.push_back(invocation);
            } else {
                rules.push((key, VecDeque::from([invocation])));
            }
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }

        pub fn param_files(&self) -> Vec<String> {
            self.param_files.lock().unwrap().clone()
        }
    }

    impl LedgerClient for ScriptedClient {
        fn invoke(&self, args: &[String]) -> Result<Invocation, LedgerError> {
            self.calls.lock().unwrap().push(args.to_vec());
            if let Some(path) = args.iter().find_map(|arg| arg.strip_prefix("--config=")) {
                let contents = std::fs::read_to_string(path).unwrap_or_default();
                self.param_files.lock().unwrap().push(contents);
            }
            let mut rules = self.rules.lock().unwrap();
            let rule = rules
                .iter_mut()
                .find(|(needles, _)| needles.iter().all(|n| args.iter().any(|a| a == n)));
            match rule {
                Some((_, queue)) => {
                    // The last scripted response repeats once the queue is drained.
                    if queue.len() > 1 {
                        Ok(queue.pop_front().unwrap_or_default())
                    } else {
                        Ok(queue.front().cloned().unwrap_or_default())
                    }
                }
                None => Ok(Invocation {
                    stdout: String::new(),
                    stderr: format!("no scripted response for {args:?}"),
                    status: Some(1),
                }),
            }
        }
    }
}
