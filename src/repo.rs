use std::path::Path;

use anyhow::{Context, Result};

use crate::{ext::CommandExt, workspace::Workspace};

/// A repository cloned into the workspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Repo {
  pub url: &'static str,
  /// Clone directory, relative to the workspace root.
  pub dir: &'static str,
}

pub const ADAPTIVE_CPP: Repo = Repo {
  url: "https://github.com/moritz-2001/AdaptiveCpp.git",
  dir: "AdaptiveCpp",
};

pub const PORTBLAS: Repo = Repo {
  url: "https://github.com/moritz-2001/portblas.git",
  dir: "portblas",
};

pub const SYCL_BENCH: Repo = Repo {
  url: "https://github.com/moritz-2001/sycl-bench.git",
  dir: "sycl-bench",
};

pub const ETHMINER: Repo = Repo {
  url: "https://github.com/moritz-2001/ethminer",
  dir: "velocity",
};

pub const ALL: [Repo; 4] = [ADAPTIVE_CPP, PORTBLAS, SYCL_BENCH, ETHMINER];

/// The set of tags the repositories are checked out at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Revision {
  /// The modified compiler and the benchmarks adapted to it.
  Thesis,
  /// The upstream compiler, which only supports subgroup size one.
  SgOne,
}

impl Revision {
  pub fn tag(self, repo: &Repo) -> &'static str {
    match (self, repo.dir) {
      (Revision::Thesis, "AdaptiveCpp") => "tags/bachelor-thesis",
      (Revision::SgOne, "AdaptiveCpp") => "tags/bachelor-thesis-sg-one",
      (Revision::SgOne, "portblas") => "tags/thesis-sg-size-one",
      _ => "tags/thesis",
    }
  }

  /// Whether the compiler's build constants can be patched at this revision.
  pub fn is_patchable(self) -> bool {
    self == Revision::Thesis
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Revision::Thesis => "thesis",
      Revision::SgOne => "sg-one",
    }
  }
}

/// Brings `repo` to `tag`. A missing clone is created with its submodules;
/// an existing one has its local changes stashed, which also drops any
/// previously patched constants.
pub fn sync(workspace: &Workspace, repo: &Repo, tag: &str) -> Result<()> {
  let dir = Path::new(repo.dir);

  if !workspace.path(dir).is_dir() {
    log::info!("cloning {} into {}", repo.url, repo.dir);

    workspace
      .command("git", ".")
      .args(["clone", repo.url, repo.dir])
      .check_success()
      .context("clone")?;
  } else {
    log::info!("updating {}", repo.dir);

    // HOME is the workspace root, which carries no git identity for the stash commit.
    workspace
      .command("git", dir)
      .args(["-c", "user.name=acpp-bench", "-c", "user.email=acpp-bench@localhost", "stash"])
      .check_success()
      .context("stash")?;
  }

  workspace
    .command("git", dir)
    .args(["checkout", tag])
    .check_success()
    .with_context(|| format!("checkout {tag}"))?;

  // Pulling only succeeds on branches; a tag checkout is already up to date.
  let pull = workspace.command("git", dir).arg("pull").output().context("pull")?;
  if !pull.status.success() {
    log::debug!("pull in {} exited with {}", repo.dir, pull.status);
  }

  workspace
    .command("git", dir)
    .args(["submodule", "update", "--init", "--recursive"])
    .check_success()
    .context("submodule update")?;

  Ok(())
}
