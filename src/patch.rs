use std::{fs, io::Write, path::Path};

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use tempfile::NamedTempFile;

use crate::{config::BuildConfig, ext::NamedTempFileExt};

/// Files declaring `SGSize`, relative to the compiler's source root.
const SG_SIZE_FILES: [&str; 2] = [
  "include/hipSYCL/compiler/cbs/IRUtils.hpp",
  "include/hipSYCL/sycl/libkernel/sub_group.hpp",
];

/// Header holding the optimization switches.
const SWITCHES_FILE: &str = "include/hipSYCL/RV.h";

static SG_SIZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"constexpr size_t SGSize = [0-9]*;").unwrap());

/// Patches every constant of `config` into the compiler sources at
/// `source_dir`.
pub fn apply(source_dir: &Path, config: &BuildConfig) -> Result<()> {
  log::info!(
    "patching sg size {} and {:?} into {source_dir:?}",
    config.sg_size,
    config.defines()
  );

  let sg_size = format!("constexpr size_t SGSize = {};", config.sg_size);
  for file in SG_SIZE_FILES {
    substitute(&source_dir.join(file), &[(&*SG_SIZE, sg_size.as_str())]).with_context(|| format!("patch {file}"))?;
  }

  let defines = config
    .defines()
    .into_iter()
    .map(|(name, value)| -> Result<(Regex, String)> {
      let pattern = Regex::new(&format!("#define {} (false|true)", regex::escape(name)))?;
      Ok((pattern, format!("#define {name} {value}")))
    })
    .collect::<Result<Vec<_>>>()?;
  let defines: Vec<_> = defines.iter().map(|(pattern, line)| (pattern, line.as_str())).collect();

  substitute(&source_dir.join(SWITCHES_FILE), &defines).with_context(|| format!("patch {SWITCHES_FILE}"))
}

/// Replaces every match of each pattern in `path`. Every pattern must match.
/// The file is only rewritten when its contents change.
fn substitute(path: &Path, replacements: &[(&Regex, &str)]) -> Result<()> {
  let original = fs::read_to_string(path).context("read")?;

  let mut patched = original.clone();
  for (pattern, replacement) in replacements {
    if !pattern.is_match(&patched) {
      bail!("{pattern} not found in {path:?}");
    }

    patched = pattern.replace_all(&patched, NoExpand(replacement)).into_owned();
  }

  if patched == original {
    return Ok(());
  }

  let mut file = NamedTempFile::beside(path)?;
  file.write_all(patched.as_bytes()).context("write")?;
  file.persist(path).context("persist")?;

  Ok(())
}
