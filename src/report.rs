use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};

use crate::{
  chart::{Bar, Category, Chart, Panel},
  config::{CompilerPass, Variant},
  format, speedup,
  table::{Row, Table},
};

/// Subgroup size the variants are compared at.
const COMPARED_SG_SIZE: u32 = 32;

/// A normalized table together with its chart.
pub struct Report {
  pub name: &'static str,
  pub speedups: Table,
  pub chart: Chart,
}

/// Vectorization against mask-based execution, one bar per benchmark and
/// machine.
pub fn wfv_vs_hcbs(table: &Table) -> Result<Report> {
  let speedups = speedup::wfv_over_cbs(table).context("normalize")?;

  let mut rows: Vec<Row> = speedups
    .rows
    .into_iter()
    .filter(|row| row.compiler_pass == CompilerPass::Sscp.as_str() && row.sg_size == COMPARED_SG_SIZE)
    .map(shorten_name)
    .collect();
  rows.sort_by(|a, b| a.name.cmp(&b.name));

  let panel = Panel {
    x_label: "Benchmark".to_string(),
    y_label: "WFV geomean speedup over H-CBS".to_string(),
    categories: categories(&rows, |row| &row.name, |row| &row.arch),
  };

  Ok(Report {
    name: "wfv_vs_hcbs",
    speedups: Table { rows },
    chart: Chart {
      title: String::new(),
      columns: 1,
      panels: vec![panel],
    },
  })
}

/// Both variants against the upstream compiler, one panel per benchmark with
/// bars per machine and variant.
pub fn versus_upstream(table: &Table) -> Result<Report> {
  let speedups = speedup::over_upstream(table, CompilerPass::Sscp).context("normalize")?;

  let rows: Vec<Row> = speedups
    .rows
    .into_iter()
    .filter(|row| {
      row.compiler_pass == CompilerPass::Sscp.as_str() && (row.sg_size == COMPARED_SG_SIZE || row.sg_size == 1)
    })
    .map(shorten_name)
    .map(|row| Row {
      variant: variant_label(&row.variant).to_string(),
      ..row
    })
    .collect();

  let mut by_name: BTreeMap<&str, Vec<Row>> = BTreeMap::new();
  for row in &rows {
    by_name.entry(&row.name).or_default().push(row.clone());
  }

  let panels = by_name
    .iter()
    .map(|(name, group)| Panel {
      x_label: name.to_string(),
      y_label: "Geomean speedup".to_string(),
      categories: categories(group, |row| &row.arch, |row| &row.variant),
    })
    .collect();

  Ok(Report {
    name: "all",
    speedups: Table { rows },
    chart: Chart {
      title: String::new(),
      columns: 2,
      panels,
    },
  })
}

/// Writes both charts into `out_dir` and returns the speedup tables as text.
pub fn render(table: &Table, out_dir: &Path) -> Result<String> {
  fs::create_dir_all(out_dir).with_context(|| format!("create_dir {out_dir:?}"))?;

  let mut text = String::new();
  for report in [
    wfv_vs_hcbs(table).context("wfv_vs_hcbs")?,
    versus_upstream(table).context("all")?,
  ] {
    report
      .chart
      .save(out_dir.join(format!("{}.png", report.name)))
      .with_context(|| format!("save {}", report.name))?;

    text.push_str(&format::format(report.name, &report.speedups)?);
  }

  Ok(text)
}

fn shorten_name(row: Row) -> Row {
  let name = match row.name.as_str() {
    "portblas-ger-8192" => "portblas-ger".to_string(),
    "portblas-iamax-4194304" => "portblas-iamax".to_string(),
    _ => return row,
  };

  Row { name, ..row }
}

fn variant_label(variant: &str) -> &str {
  if variant == Variant::Cbs.as_str() {
    "H-CBS"
  } else if variant == Variant::Rv.as_str() {
    "WFV"
  } else {
    variant
  }
}

/// Groups `rows` into categories in order of first appearance, with one bar
/// per series. Repeated runs of a series combine into their geometric mean.
fn categories<C, S>(rows: &[Row], category: C, series: S) -> Vec<Category>
where
  C: Fn(&Row) -> &String,
  S: Fn(&Row) -> &String,
{
  let mut grouped: Vec<(&str, Vec<(&str, Vec<f64>)>)> = Vec::new();

  for row in rows {
    let label = category(row).as_str();
    let index = match grouped.iter().position(|(existing, _)| *existing == label) {
      Some(index) => index,
      None => {
        grouped.push((label, Vec::new()));
        grouped.len() - 1
      }
    };

    let bars = &mut grouped[index].1;
    let name = series(row).as_str();
    match bars.iter_mut().find(|(existing, _)| *existing == name) {
      Some((_, values)) => values.push(row.time),
      None => bars.push((name, vec![row.time])),
    }
  }

  grouped
    .into_iter()
    .map(|(label, bars)| Category {
      label: label.to_string(),
      bars: bars
        .into_iter()
        .map(|(series, values)| Bar {
          series: series.to_string(),
          value: geometric_mean(&values),
        })
        .collect(),
    })
    .collect()
}

fn geometric_mean(values: &[f64]) -> f64 {
  if let [value] = values {
    return *value;
  }

  let log_sum: f64 = values.iter().map(|value| value.ln()).sum();

  (log_sum / values.len() as f64).exp()
}
