use std::{fmt, path::Path};

use anyhow::{Context, Result};

use crate::{build::Project, ext::CommandExt, parse, record::Measurement, workspace::Workspace};

/// Repetitions google-benchmark takes the median over.
const PORTBLAS_REPETITIONS: &str = "--benchmark_repetitions=10";

/// ethminer's own limit on how long it mines, in seconds.
const ETHMINER_TIMEOUT: &str = "1000";

/// A benchmark binary and the tool whose output format it uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Benchmark {
  Ethminer,
  SyclBench(&'static str),
  Portblas(&'static str),
}

impl fmt::Display for Benchmark {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Benchmark::Ethminer => f.write_str("ethminer"),
      Benchmark::SyclBench(name) => write!(f, "sycl-bench {name}"),
      Benchmark::Portblas(name) => write!(f, "portblas {name}"),
    }
  }
}

/// The list of benchmarks run at a sweep point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suite {
  Standard,
  /// The kernels affected by the reduction intrinsic.
  WithoutReduceIntrinsic,
}

impl Suite {
  pub fn as_str(self) -> &'static str {
    match self {
      Suite::Standard => "standard",
      Suite::WithoutReduceIntrinsic => "reduce-kernels",
    }
  }

  /// Benchmarks to run for a subgroup size, in execution order.
  pub fn benchmarks(self, sg_size: u32) -> Vec<Benchmark> {
    use Benchmark::{Ethminer, Portblas, SyclBench};

    match self {
      Suite::WithoutReduceIntrinsic => vec![
        SyclBench("group_reduce"),
        SyclBench("vote_all"),
        SyclBench("sg-reduce"),
        SyclBench("sg-vote_all"),
      ],
      Suite::Standard => {
        let mut benchmarks = Vec::new();

        if sg_size == 32 || sg_size == 64 {
          benchmarks.push(Ethminer);
        }

        if sg_size > 1 {
          benchmarks.extend([
            SyclBench("sg-shuffle"),
            SyclBench("sg-shift_left"),
            SyclBench("sg-inclusive_scan"),
            SyclBench("sg-reduce"),
            SyclBench("sg-vote_all"),
          ]);
        }

        benchmarks.extend([
          SyclBench("group_reduce"),
          SyclBench("vote_all"),
          SyclBench("group_inclusive_scan"),
        ]);

        if sg_size <= 32 {
          benchmarks.push(SyclBench("matrix_multiply"));
        }

        benchmarks.extend([
          SyclBench("group_reduce_upstream"),
          SyclBench("group_inclusive_scan_upstream"),
          Portblas("iamax"),
          Portblas("ger"),
        ]);

        benchmarks
      }
    }
  }
}

/// Runs every benchmark of `suite`, collecting their measurements in order.
pub fn suite(workspace: &Workspace, suite: Suite, sg_size: u32) -> Result<Vec<Measurement>> {
  let mut measurements = Vec::new();

  for benchmark in suite.benchmarks(sg_size) {
    measurements.extend(run(workspace, benchmark).with_context(|| format!("{benchmark}"))?);
  }

  Ok(measurements)
}

/// Runs `benchmark` twice, keeping only the measurements of the second run.
pub fn run(workspace: &Workspace, benchmark: Benchmark) -> Result<Vec<Measurement>> {
  log::info!("running {benchmark}");

  run_once(workspace, benchmark).context("warm-up")?;
  run_once(workspace, benchmark)
}

fn run_once(workspace: &Workspace, benchmark: Benchmark) -> Result<Vec<Measurement>> {
  match benchmark {
    Benchmark::Ethminer => {
      let build_dir = Project::Ethminer.build_dir();
      let (_, stderr) = execute(workspace, &build_dir, "ethminer/ethminer", &["-Z", "1", "--timeout", ETHMINER_TIMEOUT])?;

      Ok(vec![parse::ethminer(&stderr).context("parse")?])
    }
    Benchmark::SyclBench(name) => {
      let build_dir = Project::SyclBench.build_dir();
      let (stdout, _) = execute(workspace, &build_dir, name, &[])?;

      parse::sycl_bench(name, &stdout).context("parse")
    }
    Benchmark::Portblas(name) => {
      let build_dir = Project::Portblas.build_dir();
      let binary = format!("benchmark/portblas/bench_{name}");
      let (stdout, _) = execute(workspace, &build_dir, &binary, &[PORTBLAS_REPETITIONS])?;

      Ok(parse::portblas(name, &stdout))
    }
  }
}

/// Executes `binary` (relative to `build_dir`) from within `build_dir` and
/// returns its stdout and stderr.
fn execute(workspace: &Workspace, build_dir: &Path, binary: &str, args: &[&str]) -> Result<(String, String)> {
  let program = workspace.path(build_dir).join(binary);

  let output = workspace.command(&program, build_dir).args(args).checked_output()?;

  Ok((
    String::from_utf8_lossy(&output.stdout).into_owned(),
    String::from_utf8_lossy(&output.stderr).into_owned(),
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn names(benchmarks: &[Benchmark]) -> Vec<String> {
    benchmarks.iter().map(ToString::to_string).collect()
  }

  #[test]
  fn wide_subgroups_include_ethminer_but_not_always_matrix_multiply() {
    let sg_64 = Suite::Standard.benchmarks(64);

    assert_eq!(sg_64[0], Benchmark::Ethminer);
    assert!(!sg_64.contains(&Benchmark::SyclBench("matrix_multiply")));
    assert!(Suite::Standard.benchmarks(32).contains(&Benchmark::SyclBench("matrix_multiply")));
  }

  #[test]
  fn subgroup_size_one_skips_subgroup_kernels() {
    assert_eq!(
      names(&Suite::Standard.benchmarks(1)),
      [
        "sycl-bench group_reduce",
        "sycl-bench vote_all",
        "sycl-bench group_inclusive_scan",
        "sycl-bench matrix_multiply",
        "sycl-bench group_reduce_upstream",
        "sycl-bench group_inclusive_scan_upstream",
        "portblas iamax",
        "portblas ger",
      ]
    );
  }

  #[test]
  fn narrow_subgroups_run_subgroup_kernels_without_ethminer() {
    let sg_8 = Suite::Standard.benchmarks(8);

    assert_eq!(sg_8.len(), 5 + 3 + 1 + 2 + 2);
    assert!(!sg_8.contains(&Benchmark::Ethminer));
    assert_eq!(sg_8[0], Benchmark::SyclBench("sg-shuffle"));
  }

  #[test]
  fn reduce_kernel_suite_ignores_subgroup_size() {
    assert_eq!(
      Suite::WithoutReduceIntrinsic.benchmarks(1),
      Suite::WithoutReduceIntrinsic.benchmarks(64)
    );
  }
}
