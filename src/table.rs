use anyhow::{Context, Result};

use crate::record::{ResultRecord, Suffix};

/// One run of the result table, with its time as a number and the
/// optimization isolated by the run (if any) split off its name.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
  pub name: String,
  pub arch: String,
  /// Milliseconds for timed benchmarks, inverse throughput otherwise. After
  /// normalization, a dimensionless speedup.
  pub time: f64,
  pub variant: String,
  pub compiler_pass: String,
  pub sg_size: u32,
  pub data_type: String,
  pub uses_intrinsic: bool,
  pub wo_wg_and_sg_opt: bool,
  pub only_wg_opt: bool,
  pub only_sg_opt: bool,
}

impl Row {
  /// Whether the run isolates a single optimization rather than the default
  /// configuration.
  pub fn is_special_case(&self) -> bool {
    self.only_wg_opt || self.only_sg_opt || !self.uses_intrinsic || self.wo_wg_and_sg_opt
  }

  fn from_record(arch: &str, record: &ResultRecord) -> Result<Self> {
    let (name, suffix) = Suffix::split(&record.name);

    let time = if record.throughput.is_empty() {
      let time: f64 = record.time.parse().context("time")?;
      if name.starts_with("portblas-") {
        // ns
        time / 1e6
      } else {
        // s
        time * 1e3
      }
    } else {
      let throughput: f64 = record.throughput.parse().context("throughput")?;
      1.0 / throughput
    };

    Ok(Row {
      name: name.to_string(),
      arch: arch.to_string(),
      time,
      variant: record.variant.clone(),
      compiler_pass: record.compiler_pass.clone(),
      sg_size: record.sg_size,
      data_type: record.data_type.clone(),
      uses_intrinsic: suffix != Some(Suffix::WithoutReduceIntrinsic),
      wo_wg_and_sg_opt: suffix == Some(Suffix::WithoutWgAndSgOpt),
      only_wg_opt: suffix == Some(Suffix::OnlyWgOpt),
      only_sg_opt: suffix == Some(Suffix::OnlySgOpt),
    })
  }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
  pub rows: Vec<Row>,
}

impl Table {
  /// Appends the records of one machine. Records without a time or a
  /// throughput carry no measurement and are skipped.
  pub fn extend(&mut self, arch: &str, records: &[ResultRecord]) -> Result<()> {
    for record in records {
      if record.time.is_empty() && record.throughput.is_empty() {
        continue;
      }

      let row = Row::from_record(arch, record).with_context(|| format!("record {}", record.name))?;
      self.rows.push(row);
    }

    Ok(())
  }

  pub fn filter<F: Fn(&Row) -> bool>(&self, keep: F) -> Table {
    Table {
      rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
    }
  }
}
