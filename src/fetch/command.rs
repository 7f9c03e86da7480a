//! Running external download tools.

use std::ffi::OsStr;
use std::io;
use std::process::Command;

use super::FetchError;

/// Run `program` with `args`, capturing output.
///
/// A non-zero exit is reduced to the last non-empty stderr line.
pub(crate) fn run_tool<I, S>(program: &OsStr, args: I) -> Result<(), ToolFailure>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = match Command::new(program).args(args).output() {
        Ok(output) => output,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ToolFailure::Missing);
        }
        Err(err) => return Err(ToolFailure::Failed(err.to_string())),
    };

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let reason = stderr
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("exited with {}", output.status));
    Err(ToolFailure::Failed(reason))
}

pub(crate) enum ToolFailure {
    Missing,
    Failed(String),
}

pub(crate) fn tool_missing(program: &OsStr) -> FetchError {
    FetchError::Unavailable(format!("'{}' is not installed", program.to_string_lossy()))
}
