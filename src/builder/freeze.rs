//! Compiling Python source to marshalled code objects.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::util::process::{check, ProcessBuilder, ProcessRunner};

pub const FROZEN_MAIN_HEADER: &str = "frozen_main.h";

/// Run by the host interpreter with the file to freeze as its argument.
/// Writes the marshalled code object to stdout.
const FREEZE_SCRIPT: &str = "\
import marshal, sys
path = sys.argv[1]
with open(path, 'rb') as f:
    source = f.read()
code = compile(source, path, 'exec')
out = getattr(sys.stdout, 'buffer', sys.stdout)
out.write(marshal.dumps(code))
out.flush()
";

/// Turns a Python source file into bytecode.
pub trait Freezer {
    fn freeze(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Freezes with a host interpreter of the same version as the target.
pub struct HostInterpreterFreezer<'a> {
    interpreter: PathBuf,
    /// 0, 1 (`-O`) or 2 (`-OO`).
    opt: u8,
    runner: &'a dyn ProcessRunner,
}

impl<'a> HostInterpreterFreezer<'a> {
    pub fn new(interpreter: impl Into<PathBuf>, opt: u8, runner: &'a dyn ProcessRunner) -> Self {
        HostInterpreterFreezer {
            interpreter: interpreter.into(),
            opt,
            runner,
        }
    }

    fn command(&self, path: &Path) -> ProcessBuilder {
        let mut process = ProcessBuilder::new(&self.interpreter);
        match self.opt {
            0 => {}
            1 => process = process.arg("-O"),
            _ => process = process.arg("-OO"),
        }
        process.arg("-c").arg(FREEZE_SCRIPT).arg(path)
    }
}

impl Freezer for HostInterpreterFreezer<'_> {
    fn freeze(&self, path: &Path) -> Result<Vec<u8>> {
        debug!("freezing {}", path.display());

        let process = self.command(path);
        let output = self
            .runner
            .run(&process)
            .with_context(|| format!("failed to freeze {}", path.display()))?;
        let output = check(&process, output)?;

        Ok(output.stdout)
    }
}

/// Write the frozen application script as a C header.
pub fn frozen_main_header(code: &[u8]) -> String {
    let mut header = String::from("static unsigned char frozen_main[] = {");

    for (i, byte) in code.iter().enumerate() {
        if i % 16 == 0 {
            header.push_str("\n    ");
        }
        let _ = write!(header, "{},", byte);
    }

    header.push_str("\n};\n");
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockRunner;
    use crate::util::errors::DeployError;

    #[test]
    fn test_header_rows() {
        let code: Vec<u8> = (0..20).collect();
        assert_eq!(
            frozen_main_header(&code),
            "static unsigned char frozen_main[] = {\n    \
             0,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,\n    \
             16,17,18,19,\n};\n"
        );
    }

    #[test]
    fn test_freeze_with_optimisation() {
        let runner = MockRunner::new();
        runner.expect("python3.6", &["-OO", "-c"], b"\xe3code");

        let freezer = HostInterpreterFreezer::new("python3.6", 2, &runner);
        let code = freezer.freeze(Path::new("/app/main.py")).unwrap();

        assert_eq!(code, b"\xe3code");
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].get_args().last().map(String::as_str), Some("/app/main.py"));
    }

    #[test]
    fn test_freeze_without_optimisation() {
        let runner = MockRunner::new();
        runner.expect("python3.6", &["-c"], b"");

        let freezer = HostInterpreterFreezer::new("python3.6", 0, &runner);
        freezer.freeze(Path::new("main.py")).unwrap();

        assert_eq!(runner.calls()[0].get_args()[0], "-c");
    }

    #[test]
    fn test_freeze_failure() {
        let runner = MockRunner::new();
        runner.expect_failure("python3.6", 1, "SyntaxError: invalid syntax");

        let freezer = HostInterpreterFreezer::new("python3.6", 1, &runner);
        let err = freezer.freeze(Path::new("broken.py")).unwrap_err();

        match err.downcast_ref::<DeployError>() {
            Some(DeployError::ExternalTool { stderr, .. }) => assert!(stderr.contains("SyntaxError")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
