use std::fmt::Write;

use anyhow::Result;

use crate::table::Table;

const COLUMN_WIDTH: usize = 14;
const NAME_WIDTH: usize = 32;
const COLUMN_PADDING: &str = "  ";

const HEADER: [&str; 6] = ["benchmark", "arch", "variant", "pass", "sg-size", "speedup"];

fn format_row<'a, I: IntoIterator<Item = &'a str>>(columns: I) -> String {
  columns
    .into_iter()
    .enumerate()
    .map(|(i, col)| match i {
      0 => format!("{col:<NAME_WIDTH$}"),
      5 => format!("{col:>COLUMN_WIDTH$}"),
      _ => format!("{col:<COLUMN_WIDTH$}"),
    })
    .collect::<Vec<_>>()
    .join(COLUMN_PADDING)
}

fn format_header() -> String {
  let header = format_row(HEADER);

  format!("{header}\n{}", "=".repeat(header.len()))
}

fn format_rows(table: &Table) -> Result<String> {
  let mut rows = String::new();
  let width = format_row(HEADER).len();
  let mut previous: Option<&str> = None;

  for row in &table.rows {
    if previous.is_some_and(|name| name != row.name) {
      writeln!(rows, "{}", "-".repeat(width))?;
    }
    previous = Some(row.name.as_str());

    let sg_size = row.sg_size.to_string();
    let speedup = format!("{:.2}", row.time);
    let line = format_row([
      row.name.as_str(),
      row.arch.as_str(),
      row.variant.as_str(),
      row.compiler_pass.as_str(),
      sg_size.as_str(),
      speedup.as_str(),
    ]);

    writeln!(rows, "{}", line.trim_end())?;
  }

  Ok(rows)
}

/// Renders a normalized table as a titled text table, one line per run.
pub fn format(title: &str, table: &Table) -> Result<String> {
  let mut text = String::new();

  writeln!(text, "{title}")?;
  writeln!(text, "{}", "=".repeat(title.len()))?;
  writeln!(text)?;

  writeln!(text, "{}", format_header())?;
  writeln!(text, "{}", format_rows(table)?)?;

  Ok(text)
}
