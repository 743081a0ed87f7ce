use once_cell::sync::Lazy;
use regex::Regex;

use crate::record::Measurement;

/// Marks the start of every result block in sycl-bench's output.
const RESULTS_DELIMITER: &str = "********** Results for ";

static RUN_TIME_MEDIAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^run-time-median: (.*) \[s\]$").unwrap());
static RUN_TIME_MIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^run-time-min: (.*) \[s\]$").unwrap());
static DATA_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(.*)_.*$").unwrap());
static VERIFICATION_PASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^Verification: PASS$").unwrap());

static PORTBLAS_MEDIAN: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?m)^.*<float>/(.*?)/.*/real_time_median.* (.*) ns .* ns .*$").unwrap());

static HASH_RATE_MEGA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^.*Max ([0-9.]*) Mh Mean.*$").unwrap());
static HASH_RATE_KILO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^.*Max ([0-9.]*) Kh Mean.*$").unwrap());

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseError {
  #[error("{benchmark}: result block {block} has no {field}")]
  MissingField {
    benchmark: String,
    block: usize,
    field: &'static str,
  },
  #[error("{benchmark}: {passed} verification passes for {blocks} result blocks")]
  Verification {
    benchmark: String,
    passed: usize,
    blocks: usize,
  },
  #[error("no hash rate line in ethminer output")]
  MissingHashRate,
  #[error("invalid hash rate {0:?}")]
  InvalidHashRate(String),
}

/// Parses the output of a sycl-bench binary: one measurement per result
/// block, named after the binary.
///
/// # Errors
///
/// This will return an error if:
/// - a block lacks its median, minimum or data type line.
/// - the number of passed verifications differs from the number of blocks.
pub fn sycl_bench(benchmark: &str, stdout: &str) -> Result<Vec<Measurement>, ParseError> {
  let blocks: Vec<&str> = stdout.split(RESULTS_DELIMITER).skip(1).collect();

  let missing = |block, field| ParseError::MissingField {
    benchmark: benchmark.to_string(),
    block,
    field,
  };
  let measurements = blocks
    .iter()
    .enumerate()
    .map(|(i, block)| -> Result<Measurement, ParseError> {
      Ok(Measurement {
        name: benchmark.to_string(),
        data_type: capture(&DATA_TYPE, block).ok_or_else(|| missing(i, "data type"))?,
        time: capture(&RUN_TIME_MEDIAN, block).ok_or_else(|| missing(i, "run-time-median"))?,
        min: capture(&RUN_TIME_MIN, block).ok_or_else(|| missing(i, "run-time-min"))?,
        throughput: String::new(),
      })
    })
    .collect::<Result<Vec<_>, _>>()?;

  let passed = VERIFICATION_PASS.find_iter(stdout).count();
  if passed != blocks.len() {
    return Err(ParseError::Verification {
      benchmark: benchmark.to_string(),
      passed,
      blocks: blocks.len(),
    });
  }

  Ok(measurements)
}

fn capture(regex: &Regex, text: &str) -> Option<String> {
  regex.captures(text).map(|captures| captures[1].to_string())
}

/// Parses the output of a portblas benchmark binary: one measurement per
/// reported median, named `portblas-<benchmark>-<size>`. Times are in
/// nanoseconds.
pub fn portblas(benchmark: &str, stdout: &str) -> Vec<Measurement> {
  PORTBLAS_MEDIAN
    .captures_iter(stdout)
    .map(|captures| Measurement {
      name: format!("portblas-{benchmark}-{}", &captures[1]),
      time: captures[2].to_string(),
      min: captures[2].to_string(),
      ..Default::default()
    })
    .collect()
}

/// Parses the hash rate ethminer reports on stderr, in kH/s. A rate reported
/// in MH/s is converted.
pub fn ethminer(stderr: &str) -> Result<Measurement, ParseError> {
  let (captures, scale) = match HASH_RATE_MEGA.captures(stderr) {
    Some(captures) => (captures, 1000.0),
    None => (HASH_RATE_KILO.captures(stderr).ok_or(ParseError::MissingHashRate)?, 1.0),
  };

  let rate = &captures[1];
  let rate: f64 = rate.parse().map_err(|_| ParseError::InvalidHashRate(rate.to_string()))?;

  Ok(Measurement {
    name: "ethminer".to_string(),
    throughput: (rate * scale).to_string(),
    ..Default::default()
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sycl_block(title: &str, median: &str, min: &str, verification: &str) -> String {
    format!(
      "{RESULTS_DELIMITER}{title}**********\n\
       problem-size: 1048576\n\
       local-size: 256\n\
       device-name: AdaptiveCpp OpenMP host device\n\
       Verification: {verification}\n\
       run-time-mean: {median} [s]\n\
       run-time-median: {median} [s]\n\
       run-time-min: {min} [s]\n"
    )
  }

  #[test]
  fn sycl_bench_parses_every_block() {
    let stdout = format!(
      "********* sycl-bench *********\n{}{}",
      sycl_block("fp64_GroupReduce", "0.0125", "0.0119", "PASS"),
      sycl_block("bool_GroupReduce", "0.0031", "0.0030", "PASS"),
    );

    let measurements = sycl_bench("group_reduce", &stdout).unwrap();

    assert_eq!(
      measurements,
      [
        Measurement {
          name: "group_reduce".to_string(),
          data_type: "fp64".to_string(),
          time: "0.0125".to_string(),
          min: "0.0119".to_string(),
          throughput: String::new(),
        },
        Measurement {
          name: "group_reduce".to_string(),
          data_type: "bool".to_string(),
          time: "0.0031".to_string(),
          min: "0.0030".to_string(),
          throughput: String::new(),
        },
      ]
    );
  }

  #[test]
  fn sycl_bench_requires_a_pass_per_block() {
    let stdout = format!(
      "{}{}",
      sycl_block("fp64_VoteAll", "0.5", "0.4", "PASS"),
      sycl_block("bool_VoteAll", "0.5", "0.4", "FAIL"),
    );

    assert_eq!(
      sycl_bench("vote_all", &stdout),
      Err(ParseError::Verification {
        benchmark: "vote_all".to_string(),
        passed: 1,
        blocks: 2,
      })
    );
  }

  #[test]
  fn sycl_bench_reports_missing_median() {
    let stdout = format!("{RESULTS_DELIMITER}fp64_Scan**********\nVerification: PASS\nrun-time-min: 0.1 [s]\n");

    assert_eq!(
      sycl_bench("group_inclusive_scan", &stdout),
      Err(ParseError::MissingField {
        benchmark: "group_inclusive_scan".to_string(),
        block: 0,
        field: "run-time-median",
      })
    );
  }

  #[test]
  fn sycl_bench_without_blocks_is_empty() {
    assert_eq!(sycl_bench("sg-shuffle", "nothing to see\n"), Ok(vec![]));
  }

  #[test]
  fn portblas_takes_median_rows_only() {
    let stdout = "\
BM_Iamax<float>/4194304/buffer/real_time                  118000 ns       117000 ns           10\n\
BM_Iamax<float>/4194304/buffer/real_time_mean             119500 ns       118500 ns           10 n_fl_ops=4.1943M\n\
BM_Iamax<float>/4194304/buffer/real_time_median           119000 ns       118000 ns           10 n_fl_ops=4.1943M\n\
BM_Iamax<float>/1024/buffer/real_time_median                 900 ns          880 ns           10 n_fl_ops=1.024k\n";

    let measurements = portblas("iamax", stdout);

    assert_eq!(
      measurements,
      [
        Measurement {
          name: "portblas-iamax-4194304".to_string(),
          time: "119000".to_string(),
          min: "119000".to_string(),
          ..Default::default()
        },
        Measurement {
          name: "portblas-iamax-1024".to_string(),
          time: "900".to_string(),
          min: "900".to_string(),
          ..Default::default()
        },
      ]
    );
  }

  #[test]
  fn ethminer_converts_mega_hashes() {
    let stderr = " i 10:21:33 main     Max 31.5 Mh Mean 30.1 Mh Min 28.9 Mh\n";

    assert_eq!(ethminer(stderr).unwrap().throughput, "31500");
  }

  #[test]
  fn ethminer_falls_back_to_kilo_hashes_unscaled() {
    let stderr = " i 10:21:33 main     Max 812.25 Kh Mean 800.00 Kh Min 790.10 Kh\n";

    let measurement = ethminer(stderr).unwrap();

    assert_eq!(measurement.name, "ethminer");
    assert_eq!(measurement.throughput, "812.25");
    assert_eq!(measurement.time, "");
  }

  #[test]
  fn ethminer_prefers_mega_over_kilo() {
    let stderr = "Max 900 Kh Mean 850 Kh\nMax 2 Mh Mean 1.5 Mh\n";

    assert_eq!(ethminer(stderr).unwrap().throughput, "2000");
  }

  #[test]
  fn ethminer_without_rate_fails() {
    assert_eq!(ethminer("no devices found\n"), Err(ParseError::MissingHashRate));
  }
}
