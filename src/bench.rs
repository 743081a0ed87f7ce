use anyhow::{Context, Result};

use crate::{
  build, patch,
  record::ResultRecord,
  repo::{self, Revision},
  run,
  sweep::{self, SweepPoint},
  workspace::Workspace,
};

pub struct Bench {
  workspace: Workspace,
  /// Revision the clones are currently checked out at.
  revision: Option<Revision>,
  /// Records of every benchmark run so far, in campaign order.
  pub results: Vec<ResultRecord>,
}

impl Bench {
  pub fn new(workspace: Workspace) -> Self {
    Self {
      workspace,
      revision: None,
      results: Vec::new(),
    }
  }

  /// Runs the whole campaign. Any failure aborts it.
  pub fn bench(&mut self) -> Result<()> {
    let points = sweep::campaign();

    for (i, point) in points.iter().enumerate() {
      log::info!("[{}/{}] {point}", i + 1, points.len());

      self.bench_point(point).with_context(|| format!("{point}"))?;
    }

    Ok(())
  }

  fn bench_point(&mut self, point: &SweepPoint) -> Result<()> {
    self.checkout(point.revision).context("checkout")?;

    if point.revision.is_patchable() {
      patch::apply(&self.workspace.path(repo::ADAPTIVE_CPP.dir), &point.config).context("patch")?;
    }

    for project in point.projects() {
      build::build(&self.workspace, project, &point.config).with_context(|| format!("build {project}"))?;
    }

    let labels = point.labels();
    let measurements = run::suite(&self.workspace, point.suite, point.config.sg_size).context("run")?;

    self.results.extend(
      measurements
        .into_iter()
        .map(|measurement| measurement.into_record(&labels, point.suffix)),
    );

    Ok(())
  }

  /// Brings every repository whose tag differs from the current checkout to
  /// `revision`.
  fn checkout(&mut self, revision: Revision) -> Result<()> {
    if self.revision == Some(revision) {
      return Ok(());
    }

    for source in &repo::ALL {
      let tag = revision.tag(source);
      if self.revision.is_some_and(|current| current.tag(source) == tag) {
        continue;
      }

      repo::sync(&self.workspace, source, tag).with_context(|| format!("sync {}", source.dir))?;
    }

    self.revision = Some(revision);

    Ok(())
  }
}
