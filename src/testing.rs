use std::{
  fs,
  os::unix::fs::PermissionsExt,
  path::{Path, PathBuf},
  process::Command,
};

/// Writes an executable shell script `name` into `dir`.
pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
  let path = dir.join(name);
  fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
  fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

  path
}

/// A stand-in for `name` that appends `<cwd>: <name> <args>` to `log` and
/// exits with `status`.
pub fn recording_tool(dir: &Path, name: &str, log: &Path, status: i32) -> PathBuf {
  script(dir, name, &format!("{}\nexit {status}", record(name, log)))
}

/// Records the call like [`recording_tool`], then hands it to `program`.
pub fn recording_wrapper(dir: &Path, name: &str, log: &Path, program: &Path) -> PathBuf {
  script(dir, name, &format!("{}\nexec '{}' \"$@\"", record(name, log), program.display()))
}

fn record(name: &str, log: &Path) -> String {
  format!("echo \"$(pwd -P): {name}\" \"$@\" >> '{}'", log.display())
}

/// Recorded calls with `root` stripped from the directories.
pub fn calls(log: &Path, root: &Path) -> Vec<String> {
  let root = format!("{}/", root.display());

  fs::read_to_string(log)
    .unwrap_or_default()
    .lines()
    .map(|line| line.strip_prefix(&root).unwrap_or(line).to_string())
    .collect()
}

/// Creates a repository at `dir` holding `files`, then one commit per tag
/// that writes the tag's name into `REVISION`.
pub fn git_repo(dir: &Path, files: &[(&str, &str)], tags: &[&str]) {
  fs::create_dir_all(dir).unwrap();
  git(dir, &["init", "-q"]);

  for (file, contents) in files {
    let path = dir.join(file);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
  }

  for tag in tags {
    fs::write(dir.join("REVISION"), tag).unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", tag]);
    git(dir, &["tag", tag]);
  }
}

fn git(dir: &Path, args: &[&str]) {
  let status = Command::new("git")
    .current_dir(dir)
    .args(["-c", "user.name=test", "-c", "user.email=test@localhost", "-c", "commit.gpgsign=false"])
    .args(args)
    .status()
    .unwrap();

  assert!(status.success(), "git {args:?} in {dir:?}");
}
