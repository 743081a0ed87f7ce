use crate::{
  config::{CompilerPass, Variant},
  table::{Row, Table},
};

const REPORTED_DATA_TYPES: [&str; 2] = ["fp64", "bool"];
const REPORTED_PORTBLAS: [&str; 2] = ["portblas-iamax-4194304", "portblas-ger-8192"];

/// Subgroup size of the mask-based reference runs.
const REFERENCE_SG_SIZE: u32 = 32;

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("expected exactly one baseline for {name} on {arch}, found {found}")]
pub struct BaselineError {
  pub name: String,
  pub arch: String,
  pub found: usize,
}

/// Runs compared between the vectorizing and the mask-based variant.
pub fn wfv_filter(row: &Row) -> bool {
  if row.is_special_case() {
    return false;
  }

  if row.name == "ethminer" || REPORTED_PORTBLAS.contains(&row.name.as_str()) {
    return true;
  }

  REPORTED_DATA_TYPES.contains(&row.data_type.as_str())
}

/// Runs compared against the upstream compiler. Subgroup kernels and the
/// kernels written against the upstream group algorithms have no upstream
/// counterpart.
pub fn upstream_filter(row: &Row) -> bool {
  if row.is_special_case() {
    return false;
  }

  if REPORTED_PORTBLAS.contains(&row.name.as_str()) {
    return true;
  }

  if row.name.contains("_upstream") || row.name.contains("sg") {
    return false;
  }

  REPORTED_DATA_TYPES.contains(&row.data_type.as_str())
}

/// Speedup of every single-pass run over the mask-based variant compiled
/// single-pass at subgroup size 32.
pub fn wfv_over_cbs(table: &Table) -> Result<Table, BaselineError> {
  let is_baseline = |row: &Row| {
    row.compiler_pass == CompilerPass::Sscp.as_str()
      && row.sg_size == REFERENCE_SG_SIZE
      && row.variant == Variant::Cbs.as_str()
  };

  normalize(&table.filter(wfv_filter), CompilerPass::Sscp, is_baseline)
}

/// Speedup of every run of `pass` over the upstream compiler at subgroup
/// size one, compiled with the same pass.
pub fn over_upstream(table: &Table, pass: CompilerPass) -> Result<Table, BaselineError> {
  let is_baseline = |row: &Row| {
    row.sg_size == 1 && row.variant == Variant::Upstream.as_str() && row.compiler_pass == pass.as_str()
  };

  normalize(&table.filter(upstream_filter), pass, is_baseline)
}

/// Replaces the time of every non-baseline row of `pass` with its speedup
/// over the baseline sharing its name and machine. Baseline rows are dropped.
fn normalize<B: Fn(&Row) -> bool>(selected: &Table, pass: CompilerPass, is_baseline: B) -> Result<Table, BaselineError> {
  let rows = selected
    .rows
    .iter()
    .filter(|row| !is_baseline(*row) && row.compiler_pass == pass.as_str())
    .map(|row| {
      let baselines: Vec<&Row> = selected
        .rows
        .iter()
        .filter(|candidate| is_baseline(*candidate) && candidate.name == row.name && candidate.arch == row.arch)
        .collect();

      match baselines[..] {
        [baseline] => Ok(Row {
          time: baseline.time / row.time,
          ..row.clone()
        }),
        _ => Err(BaselineError {
          name: row.name.clone(),
          arch: row.arch.clone(),
          found: baselines.len(),
        }),
      }
    })
    .collect::<Result<_, _>>()?;

  Ok(Table { rows })
}
