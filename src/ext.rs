use std::{
  ffi::OsStr,
  fs,
  path::Path,
  process::{Command, ExitStatus, Output},
};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

#[extend::ext]
pub impl ExitStatus {
  fn check_success(&self) -> Result<()> {
    if !self.success() {
      anyhow::bail!("exited with non-zero status {self}");
    }

    Ok(())
  }
}

#[extend::ext]
pub impl Command {
  /// The program and its arguments, space separated.
  fn command_line(&self) -> String {
    std::iter::once(self.get_program())
      .chain(self.get_args())
      .map(OsStr::to_string_lossy)
      .collect::<Vec<_>>()
      .join(" ")
  }

  /// Runs the command to completion, capturing stdout and stderr. On non-zero
  /// exit the captured output is logged and an error is returned.
  fn checked_output(&mut self) -> Result<Output> {
    let command_line = self.command_line();
    log::debug!("$ {command_line}");

    let output = self.output().with_context(|| format!("spawn {command_line}"))?;

    if let Err(err) = output.status.check_success() {
      log::error!(
        "{command_line} failed\n--- stdout ---\n{}\n--- stderr ---\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
      );

      return Err(err).context(command_line);
    }

    Ok(output)
  }

  fn check_success(&mut self) -> Result<()> {
    self.checked_output().map(drop)
  }
}

#[extend::ext]
pub impl NamedTempFile {
  /// Creates a temporary file in the directory of `path`, carrying its
  /// permissions, so that it can be persisted over `path`.
  fn beside(path: &Path) -> Result<NamedTempFile> {
    let dir = path.parent().context("parent")?;
    let file = NamedTempFile::new_in(dir).context("tempfile")?;

    let permissions = fs::metadata(path).context("metadata")?.permissions();
    fs::set_permissions(file.path(), permissions).context("set_permissions")?;

    Ok(file)
  }
}
