mod bench;
mod build;
mod chart;
mod config;
mod ext;
mod format;
mod parse;
mod patch;
mod record;
mod repo;
mod report;
mod run;
mod speedup;
mod sweep;
mod table;
#[cfg(test)]
mod testing;
mod workspace;

use std::{fs, path::PathBuf, process, str::FromStr};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use self::{bench::Bench, table::Table, workspace::Workspace};

#[derive(Parser)]
struct Args {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Runs the whole campaign and prints the result document.
  Bench {
    /// Directory holding the clones, builds and toolchain install.
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,
    /// Also write the result document to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Lists the campaign's configurations without running anything.
  Plan,
  /// Renders speedup charts from a result document.
  #[command(after_help = "Example: acpp-bench report results/zen4.json zen4")]
  Report {
    /// Result document written by `bench`.
    results: PathBuf,
    /// Label of the machine the results were measured on.
    machine: String,
    /// Further result documents of other machines.
    #[arg(long = "with", value_name = "FILE=MACHINE")]
    more: Vec<Input>,
    /// Directory the charts are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
  },
}

#[derive(Clone, Debug)]
struct Input {
  results: PathBuf,
  machine: String,
}

impl FromStr for Input {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (results, machine) = s.rsplit_once('=').ok_or_else(|| format!("expected FILE=MACHINE, got {s:?}"))?;

    Ok(Input {
      results: PathBuf::from(results),
      machine: machine.to_string(),
    })
  }
}

/// Help and version requests succeed; every other parse error is a usage error.
fn exit_code(err: &clap::Error) -> i32 {
  if err.use_stderr() {
    1
  } else {
    0
  }
}

fn main() -> Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  let args = Args::try_parse().unwrap_or_else(|err| {
    let _ = err.print();
    process::exit(exit_code(&err));
  });

  match args.command {
    Command::Bench { work_dir, output } => {
      let workspace = Workspace::new(work_dir).context("Workspace::new")?;
      log::info!("working in {:?}", workspace.root());

      let mut bench = Bench::new(workspace);
      bench.bench().context("bench")?;

      let document = serde_json::to_string(&record::to_document(&bench.results)).context("serialize")?;
      if let Some(output) = output {
        fs::write(&output, &document).with_context(|| format!("write {output:?}"))?;
      }

      println!("{document}");
    }
    Command::Plan => {
      for (i, point) in sweep::campaign().iter().enumerate() {
        println!("{:>2}  {point}", i + 1);
      }
    }
    Command::Report {
      results,
      machine,
      more,
      out_dir,
    } => {
      let mut table = Table::default();
      let inputs = std::iter::once(Input { results, machine }).chain(more);

      for Input { results, machine } in inputs {
        let records = record::read_document(&results).context("read results")?;
        table.extend(&machine, &records).with_context(|| format!("load {results:?}"))?;
      }

      print!("{}", report::render(&table, &out_dir).context("report")?);
    }
  }

  Ok(())
}
