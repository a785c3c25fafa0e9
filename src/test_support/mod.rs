//! Test utilities and mocks for pydeploy unit tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use pydeploy::test_support::{MockRunner, SysrootFixture};
//!
//! #[test]
//! fn test_example() {
//!     let runner = MockRunner::new();
//!     runner.expect("qmake", &["demo.pro"], b"");
//!
//!     let sysroot = SysrootFixture::new(PythonVersion::new(3, 6)).write_to(tmp.path())?;
//! }
//! ```

pub mod fixtures;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::builder::freeze::Freezer;
use crate::util::process::{check, ProcessBuilder, ProcessOutput, ProcessRunner};

pub use fixtures::*;

/// Expectation for a process run.
#[derive(Debug, Clone)]
pub struct ProcessExpectation {
    /// Program name or path.
    pub program: String,
    /// The arguments must start with these.
    pub args: Vec<String>,
    pub output: ProcessOutput,
    /// Number of times this expectation can be used (None = unlimited).
    pub times: Option<usize>,
    pub used: usize,
}

impl ProcessExpectation {
    pub fn new(program: &str, args: &[&str], output: ProcessOutput) -> Self {
        ProcessExpectation {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            output,
            times: None,
            used: 0,
        }
    }

    pub fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    fn available(&self) -> bool {
        self.times.is_none_or(|n| self.used < n)
    }

    fn matches(&self, process: &ProcessBuilder) -> bool {
        let program = process.get_program();
        let program_matches = program == Path::new(&self.program)
            || program.file_name() == Some(OsStr::new(&self.program));

        program_matches && process.get_args().starts_with(&self.args)
    }
}

/// Mock process runner.
///
/// Records every process run and answers with the first matching
/// expectation. An unexpected process is an error.
#[derive(Debug, Default)]
pub struct MockRunner {
    expectations: Mutex<Vec<ProcessExpectation>>,
    calls: Mutex<Vec<ProcessBuilder>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect a successful run of `program` whose arguments start with
    /// `args`.
    pub fn expect(&self, program: &str, args: &[&str], stdout: &[u8]) -> &Self {
        let output = ProcessOutput {
            code: Some(0),
            stdout: stdout.to_vec(),
            stderr: Vec::new(),
        };
        self.expect_pattern(ProcessExpectation::new(program, args, output))
    }

    /// Expect a failing run of `program`.
    pub fn expect_failure(&self, program: &str, code: i32, stderr: &str) -> &Self {
        let output = ProcessOutput {
            code: Some(code),
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        };
        self.expect_pattern(ProcessExpectation::new(program, &[], output))
    }

    pub fn expect_pattern(&self, expectation: ProcessExpectation) -> &Self {
        lock(&self.expectations).push(expectation);
        self
    }

    /// Every process run so far, in order.
    pub fn calls(&self) -> Vec<ProcessBuilder> {
        lock(&self.calls).clone()
    }

    /// Verify that expectations with a count were used exactly that often.
    pub fn verify(&self) -> Result<()> {
        for (i, exp) in lock(&self.expectations).iter().enumerate() {
            if let Some(expected) = exp.times {
                if exp.used != expected {
                    bail!(
                        "expectation {} was used {} times, expected {}",
                        i,
                        exp.used,
                        expected
                    );
                }
            }
        }
        Ok(())
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, process: &ProcessBuilder) -> Result<ProcessOutput> {
        lock(&self.calls).push(process.clone());

        let output = {
            let mut expectations = lock(&self.expectations);
            let Some(exp) = expectations
                .iter_mut()
                .find(|e| e.available() && e.matches(process))
            else {
                bail!("unexpected command: {}", process.display_command());
            };
            exp.used += 1;
            exp.output.clone()
        };

        check(process, output)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Mock freezer that "compiles" a file to a marker followed by its path.
#[derive(Debug, Default)]
pub struct MockFreezer {
    frozen: Mutex<Vec<PathBuf>>,
}

impl MockFreezer {
    /// Every file frozen so far, in order.
    pub fn frozen(&self) -> Vec<PathBuf> {
        lock(&self.frozen).clone()
    }
}

impl Freezer for MockFreezer {
    fn freeze(&self, path: &Path) -> Result<Vec<u8>> {
        lock(&self.frozen).push(path.to_path_buf());

        let mut code = b"frozen:".to_vec();
        code.extend_from_slice(path.to_string_lossy().as_bytes());
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_runner() {
        let runner = MockRunner::new();
        runner.expect("qmake", &["demo.pro"], b"ok");
        runner.expect_pattern(
            ProcessExpectation::new("make", &[], ProcessOutput {
                code: Some(0),
                ..Default::default()
            })
            .times(1),
        );

        let output = runner
            .run(&ProcessBuilder::new("/opt/qt/bin/qmake").arg("demo.pro"))
            .unwrap();
        assert_eq!(output.stdout, b"ok");

        runner.run(&ProcessBuilder::new("make")).unwrap();
        assert!(runner.run(&ProcessBuilder::new("make")).is_err());
        assert!(runner.run(&ProcessBuilder::new("ninja")).is_err());

        assert_eq!(runner.calls().len(), 4);
        runner.verify().unwrap();
    }

    #[test]
    fn test_mock_freezer() {
        let freezer = MockFreezer::default();
        let code = freezer.freeze(Path::new("main.py")).unwrap();
        assert_eq!(code, b"frozen:main.py");
        assert_eq!(freezer.frozen(), [PathBuf::from("main.py")]);
    }
}
