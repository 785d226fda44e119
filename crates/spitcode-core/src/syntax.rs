use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{Result, SpitError};

const CHECK_SCRIPT: &str = "\
import ast, sys
src = sys.stdin.read()
try:
    ast.parse(src)
except SyntaxError as e:
    print(f'{e.msg} (line {e.lineno})', file=sys.stderr)
    sys.exit(1)
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxCheck {
    Valid,
    Invalid(String),
}

/// Parse `code` with the Python interpreter's own `ast` module.
///
/// Exit status 0 means the code parses; 1 means a syntax error (message from
/// stderr). Anything else, or a missing interpreter, is an error.
pub fn check_python_syntax(interpreter: &str, code: &str) -> Result<SyntaxCheck> {
    let program = which::which(interpreter)
        .map_err(|_| SpitError::InterpreterNotFound(interpreter.to_string()))?;

    let mut child = Command::new(program)
        .args(["-c", CHECK_SCRIPT])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SpitError::SyntaxCheckFailed(e.to_string()))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(code.as_bytes())
            .map_err(|e| SpitError::SyntaxCheckFailed(format!("failed to write stdin: {e}")))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| SpitError::SyntaxCheckFailed(e.to_string()))?;
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    match output.status.code() {
        Some(0) => Ok(SyntaxCheck::Valid),
        Some(1) => Ok(SyntaxCheck::Invalid(stderr)),
        _ => Err(SpitError::SyntaxCheckFailed(stderr)),
    }
}
