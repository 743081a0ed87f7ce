use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One measurement as scraped from a benchmark's output, before it is tagged
/// with the configuration it was produced under. Values are kept as the text
/// the tool printed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Measurement {
  pub name: String,
  pub data_type: String,
  pub time: String,
  pub min: String,
  pub throughput: String,
}

/// The labels of the sweep point a measurement was taken at.
#[derive(Clone, Debug, PartialEq)]
pub struct Labels {
  pub variant: String,
  pub compiler_pass: String,
  pub sg_size: u32,
}

/// A name suffix marking a run that isolates a single optimization toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suffix {
  WithoutWgAndSgOpt,
  OnlyWgOpt,
  OnlySgOpt,
  WithoutReduceIntrinsic,
}

impl Suffix {
  pub const ALL: [Suffix; 4] = [
    Suffix::WithoutWgAndSgOpt,
    Suffix::OnlyWgOpt,
    Suffix::OnlySgOpt,
    Suffix::WithoutReduceIntrinsic,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Suffix::WithoutWgAndSgOpt => "-wo-wg-and-sg-opt",
      Suffix::OnlyWgOpt => "-only-wg-opt",
      Suffix::OnlySgOpt => "-only-sg-opt",
      Suffix::WithoutReduceIntrinsic => "-without-reduce-intrinsic",
    }
  }

  /// Splits a recorded name into the benchmark name and its suffix, if any.
  pub fn split(name: &str) -> (&str, Option<Suffix>) {
    Suffix::ALL
      .into_iter()
      .find_map(|suffix| name.find(suffix.as_str()).map(|at| (&name[..at], Some(suffix))))
      .unwrap_or((name, None))
  }
}

/// An entry of the result document. Field names follow the document format
/// consumed by the report stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
  pub name: String,
  #[serde(rename = "Variant")]
  pub variant: String,
  #[serde(rename = "compilerPass")]
  pub compiler_pass: String,
  #[serde(rename = "SG-Size")]
  pub sg_size: u32,
  #[serde(rename = "data-type")]
  pub data_type: String,
  pub time: String,
  pub min: String,
  pub throughput: String,
}

impl Measurement {
  pub fn into_record(self, labels: &Labels, suffix: Option<Suffix>) -> ResultRecord {
    let name = match suffix {
      Some(suffix) => format!("{}{}", self.name, suffix.as_str()),
      None => self.name,
    };

    ResultRecord {
      name,
      variant: labels.variant.clone(),
      compiler_pass: labels.compiler_pass.clone(),
      sg_size: labels.sg_size,
      data_type: self.data_type,
      time: self.time,
      min: self.min,
      throughput: self.throughput,
    }
  }
}

/// The serialized form: every record wrapped in a single-element array.
pub type Document = Vec<[ResultRecord; 1]>;

pub fn to_document(records: &[ResultRecord]) -> Document {
  records.iter().cloned().map(|record| [record]).collect()
}

pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Vec<ResultRecord>> {
  let path = path.as_ref();
  let text = fs::read_to_string(path).with_context(|| format!("read {path:?}"))?;
  let document: Document = serde_json::from_str(&text).with_context(|| format!("parse {path:?}"))?;

  Ok(document.into_iter().map(|[record]| record).collect())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn labels() -> Labels {
    Labels {
      variant: "rv".to_string(),
      compiler_pass: "SSCP".to_string(),
      sg_size: 32,
    }
  }

  #[test]
  fn suffix_is_appended_to_the_name() {
    let measurement = Measurement {
      name: "group_reduce".to_string(),
      data_type: "fp64".to_string(),
      time: "0.5".to_string(),
      min: "0.4".to_string(),
      ..Default::default()
    };

    let record = measurement.into_record(&labels(), Some(Suffix::OnlyWgOpt));

    assert_eq!(record.name, "group_reduce-only-wg-opt");
    assert_eq!(record.variant, "rv");
    assert_eq!(record.compiler_pass, "SSCP");
    assert_eq!(record.sg_size, 32);
  }

  #[test]
  fn split_strips_known_suffixes() {
    assert_eq!(Suffix::split("vote_all-without-reduce-intrinsic"), ("vote_all", Some(Suffix::WithoutReduceIntrinsic)));
    assert_eq!(Suffix::split("ethminer-wo-wg-and-sg-opt"), ("ethminer", Some(Suffix::WithoutWgAndSgOpt)));
    assert_eq!(Suffix::split("portblas-ger-8192"), ("portblas-ger-8192", None));
  }

  #[test]
  fn document_wraps_records_and_renames_fields() {
    let record = Measurement {
      name: "ethminer".to_string(),
      throughput: "24500".to_string(),
      ..Default::default()
    }
    .into_record(&labels(), None);

    let json = serde_json::to_value(to_document(&[record])).unwrap();

    assert_eq!(
      json,
      serde_json::json!([[{
        "name": "ethminer",
        "Variant": "rv",
        "compilerPass": "SSCP",
        "SG-Size": 32,
        "data-type": "",
        "time": "",
        "min": "",
        "throughput": "24500",
      }]])
    );
  }

  #[test]
  fn read_document_unwraps_entries() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("results.json");
    fs::write(
      &path,
      r#"[[{"name": "vote_all", "Variant": "cbs", "compilerPass": "SMCP", "SG-Size": 16,
            "data-type": "bool", "time": "0.25", "min": "0.2", "throughput": ""}]]"#,
    )
    .unwrap();

    let records = read_document(&path).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "vote_all");
    assert_eq!(records[0].sg_size, 16);
    assert_eq!(records[0].data_type, "bool");
  }
}
