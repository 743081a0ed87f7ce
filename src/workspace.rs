use std::{
  env,
  ffi::{OsStr, OsString},
  fs,
  path::{Path, PathBuf},
  process::Command,
};

use anyhow::{Context, Result};

/// The directory every clone, build and benchmark run lives in.
///
/// Commands are always spawned with an explicit working directory and the
/// campaign's environment; the process's own working directory and
/// environment are never changed.
pub struct Workspace {
  root: PathBuf,
  search_path: OsString,
}

impl Workspace {
  pub fn new(root: PathBuf) -> Result<Self> {
    Self::with_search_path(root, Vec::new())
  }

  /// Like [`Workspace::new`], with `tools` searched before the system `PATH`.
  #[cfg(test)]
  pub fn with_tools_first(root: PathBuf, tools: &Path) -> Result<Self> {
    Self::with_search_path(root, vec![tools.to_path_buf()])
  }

  fn with_search_path(root: PathBuf, mut paths: Vec<PathBuf>) -> Result<Self> {
    fs::create_dir_all(&root).with_context(|| format!("create_dir {root:?}"))?;
    let root = root.canonicalize().context("canonicalize")?;

    if let Some(path) = env::var_os("PATH") {
      paths.extend(env::split_paths(&path));
    }
    paths.push(root.join("install/bin"));
    paths.push(root.join("install/lib/cmake"));
    let search_path = env::join_paths(paths).context("join PATH")?;

    Ok(Self { root, search_path })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Resolves `relative` against the root.
  pub fn path<P: AsRef<Path>>(&self, relative: P) -> PathBuf {
    self.root.join(relative)
  }

  pub fn install_dir(&self) -> PathBuf {
    self.path("install")
  }

  /// A command running in `dir` (relative to the root) with the campaign's
  /// environment applied.
  pub fn command<S: AsRef<OsStr>, P: AsRef<Path>>(&self, program: S, dir: P) -> Command {
    let mut command = Command::new(program);
    command
      .current_dir(self.path(dir))
      .env("PATH", &self.search_path)
      .env("HOME", &self.root)
      .env("OMP_PROC_BIND", "TRUE");

    command
  }

  /// Locates an executable on the campaign's `PATH`.
  pub fn which(&self, program: &str) -> Result<PathBuf> {
    which::which_in(program, Some(&self.search_path), &self.root).with_context(|| format!("which {program}"))
  }
}
