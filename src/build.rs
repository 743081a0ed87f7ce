use std::{fmt, fs, path::PathBuf};

use anyhow::{Context, Result};

use crate::{
  config::{BuildConfig, CompilerPass},
  ext::CommandExt,
  workspace::Workspace,
};

/// A CMake project built during the campaign.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Project {
  AdaptiveCpp,
  Portblas,
  SyclBench,
  Ethminer,
}

/// What happens to an existing build directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rebuild {
  /// Reconfigure, clean and rebuild in place.
  Soft,
  /// Remove the build directory and configure from scratch.
  Clean,
}

impl Project {
  /// Source directory, relative to the workspace root.
  pub fn dir(self) -> &'static str {
    match self {
      Project::AdaptiveCpp => "AdaptiveCpp",
      Project::Portblas => "portblas",
      Project::SyclBench => "sycl-bench",
      Project::Ethminer => "velocity/ethminer",
    }
  }

  pub fn build_dir(self) -> PathBuf {
    PathBuf::from(self.dir()).join("build")
  }

  fn rebuild(self) -> Rebuild {
    match self {
      Project::AdaptiveCpp => Rebuild::Clean,
      _ => Rebuild::Soft,
    }
  }

  fn installs(self) -> bool {
    self == Project::AdaptiveCpp
  }

  /// Arguments for configuring the project from its build directory.
  fn cmake_args(self, workspace: &Workspace, config: &BuildConfig) -> Result<Vec<String>> {
    let targets = format!("-DACPP_TARGETS={}", config.target);

    let args = match self {
      Project::AdaptiveCpp => vec![
        "-DCMAKE_BUILD_TYPE=Debug".to_string(),
        "-G".to_string(),
        "Ninja".to_string(),
        format!("-DCMAKE_C_COMPILER={}", workspace.which("clang")?.display()),
        format!("-DCMAKE_CXX_COMPILER={}", workspace.which("clang++")?.display()),
        "-DWITH_SSCP_COMPILER=True".to_string(),
        "-S".to_string(),
        "..".to_string(),
        "-DHIPSYCL_DEBUG_LEVEL=0".to_string(),
        format!("-DCMAKE_INSTALL_PREFIX={}", workspace.install_dir().display()),
      ],
      Project::Portblas => vec![
        "-GNinja".to_string(),
        "../".to_string(),
        "-DCMAKE_BUILD_TYPE=Release".to_string(),
        "-DSYCL_COMPILER=adaptivecpp".to_string(),
        targets,
      ],
      Project::SyclBench => vec![
        "-G".to_string(),
        "Ninja".to_string(),
        "-S".to_string(),
        "..".to_string(),
        targets,
        format!("-DSMCP={}", config.target.compiler_pass() == CompilerPass::Smcp),
      ],
      Project::Ethminer => vec![
        "-DCMAKE_BUILD_TYPE=Release".to_string(),
        "-G".to_string(),
        "Ninja".to_string(),
        format!("-DCMAKE_C_COMPILER={}", workspace.which("clang")?.display()),
        format!("-DCMAKE_CXX_COMPILER={}", workspace.which("clang++")?.display()),
        "..".to_string(),
        targets,
        format!("-DUSE_SG_SIZE_64={}", if config.sg_size == 64 { "True" } else { "False" }),
      ],
    };

    Ok(args)
  }
}

impl fmt::Display for Project {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.dir())
  }
}

/// Builds `project` for `config`, installing it when it is the toolchain.
pub fn build(workspace: &Workspace, project: Project, config: &BuildConfig) -> Result<()> {
  log::info!("building {project} for {}", config.target);

  let build_dir = workspace.path(project.build_dir());
  let cmake_args = project.cmake_args(workspace, config).context("cmake args")?;

  let cmake = || -> Result<()> {
    workspace
      .command("cmake", &build_dir)
      .args(&cmake_args)
      .check_success()
      .context("cmake")
  };
  let ninja = |args: &[&str]| -> Result<()> {
    workspace
      .command("ninja", &build_dir)
      .args(args)
      .check_success()
      .with_context(|| format!("ninja {}", args.join(" ")))
  };

  match project.rebuild() {
    Rebuild::Soft if build_dir.is_dir() => {
      cmake()?;
      ninja(&["clean"])?;
      ninja(&[])?;
    }
    Rebuild::Clean if build_dir.exists() => {
      fs::remove_dir_all(&build_dir).context("remove build dir")?;
    }
    _ => {}
  }

  if !build_dir.is_dir() {
    fs::create_dir_all(&build_dir).context("create build dir")?;
    cmake()?;
    ninja(&[])?;
  }

  if project.installs() {
    ninja(&["install"])?;
  }

  Ok(())
}
