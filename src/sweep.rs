use std::fmt;

use crate::{
  build::Project,
  config::{BuildConfig, CompilerPass, Toggles, Variant},
  record::{Labels, Suffix},
  repo::Revision,
  run::Suite,
};

const SG_SIZES: [u32; 4] = [32, 64, 8, 16];
const PASSES: [CompilerPass; 2] = [CompilerPass::Sscp, CompilerPass::Smcp];
const VARIANTS: [Variant; 2] = [Variant::Rv, Variant::Cbs];

/// Subgroup size of every isolated-optimization phase.
const ISOLATED_SG_SIZE: u32 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
  /// Every subgroup size, pass and variant with all optimizations on.
  Matrix,
  WithoutWgAndSgOpt,
  OnlyWgOpt,
  WithoutReduceIntrinsic,
  /// The unmodified compiler, as the reference for all other runs.
  Upstream,
}

impl Phase {
  pub fn as_str(self) -> &'static str {
    match self {
      Phase::Matrix => "matrix",
      Phase::WithoutWgAndSgOpt => "wo-wg-and-sg-opt",
      Phase::OnlyWgOpt => "only-wg-opt",
      Phase::WithoutReduceIntrinsic => "without-reduce-intrinsic",
      Phase::Upstream => "upstream",
    }
  }
}

/// One configuration to build and benchmark.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepPoint {
  pub phase: Phase,
  pub revision: Revision,
  pub config: BuildConfig,
  pub suite: Suite,
  pub suffix: Option<Suffix>,
  pub portblas: bool,
  pub ethminer: bool,
}

impl SweepPoint {
  fn new(phase: Phase, config: BuildConfig) -> Self {
    Self {
      phase,
      revision: Revision::Thesis,
      config,
      suite: Suite::Standard,
      suffix: None,
      portblas: true,
      ethminer: false,
    }
  }

  /// Projects to build, in build order. The toolchain always comes first.
  pub fn projects(&self) -> Vec<Project> {
    let mut projects = vec![Project::AdaptiveCpp];
    if self.portblas {
      projects.push(Project::Portblas);
    }
    projects.push(Project::SyclBench);
    if self.ethminer {
      projects.push(Project::Ethminer);
    }

    projects
  }

  pub fn labels(&self) -> Labels {
    Labels {
      variant: self.config.variant.as_str().to_string(),
      compiler_pass: self.config.target.compiler_pass().as_str().to_string(),
      sg_size: self.config.sg_size,
    }
  }
}

impl fmt::Display for SweepPoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{phase} rev={revision} sg={sg} target={target} variant={variant} pass={pass}",
      phase = self.phase.as_str(),
      revision = self.revision.as_str(),
      sg = self.config.sg_size,
      target = self.config.target,
      variant = self.config.variant,
      pass = self.config.target.compiler_pass(),
    )?;

    if let Some(suffix) = self.suffix {
      write!(f, " suffix={}", suffix.as_str())?;
    }

    let projects = self.projects().iter().map(|project| project.dir()).collect::<Vec<_>>();
    write!(f, " suite={} build=[{}]", self.suite.as_str(), projects.join(", "))
  }
}

/// Every configuration of the campaign, in execution order.
pub fn campaign() -> Vec<SweepPoint> {
  let mut points = Vec::new();

  for sg_size in SG_SIZES {
    for pass in PASSES {
      for variant in VARIANTS {
        points.push(SweepPoint {
          ethminer: sg_size == 32 || sg_size == 64,
          ..SweepPoint::new(Phase::Matrix, BuildConfig::new(sg_size, pass, variant))
        });
      }
    }
  }

  let no_wg_and_sg_opt = Toggles {
    incomplete_sgs_opt: false,
    wg_sscp_opt: false,
    ..Toggles::default()
  };
  for variant in VARIANTS {
    for pass in PASSES {
      let config = BuildConfig::new(ISOLATED_SG_SIZE, pass, variant).with_toggles(no_wg_and_sg_opt);
      points.push(SweepPoint {
        suffix: Some(Suffix::WithoutWgAndSgOpt),
        ethminer: true,
        ..SweepPoint::new(Phase::WithoutWgAndSgOpt, config)
      });
    }
  }

  let only_wg_opt = Toggles {
    incomplete_sgs_opt: false,
    ..Toggles::default()
  };
  for variant in VARIANTS {
    let config = BuildConfig::new(ISOLATED_SG_SIZE, CompilerPass::Sscp, variant).with_toggles(only_wg_opt);
    points.push(SweepPoint {
      suffix: Some(Suffix::OnlyWgOpt),
      ethminer: true,
      ..SweepPoint::new(Phase::OnlyWgOpt, config)
    });
  }

  let no_reduce_intrinsic = Toggles {
    use_reduce_intrinsic: false,
    ..Toggles::default()
  };
  for variant in [Variant::Cbs, Variant::Rv] {
    let config = BuildConfig::new(ISOLATED_SG_SIZE, CompilerPass::Sscp, variant).with_toggles(no_reduce_intrinsic);
    points.push(SweepPoint {
      suite: Suite::WithoutReduceIntrinsic,
      suffix: Some(Suffix::WithoutReduceIntrinsic),
      portblas: false,
      ..SweepPoint::new(Phase::WithoutReduceIntrinsic, config)
    });
  }

  points.push(SweepPoint {
    revision: Revision::SgOne,
    ..SweepPoint::new(Phase::Upstream, BuildConfig::new(1, CompilerPass::Sscp, Variant::Upstream))
  });

  points
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Target;

  fn phase(phase: Phase) -> Vec<SweepPoint> {
    campaign().into_iter().filter(|point| point.phase == phase).collect()
  }

  #[test]
  fn phases_run_in_order() {
    let phases = campaign().iter().map(|point| point.phase).collect::<Vec<_>>();
    let mut sorted = phases.clone();
    sorted.sort_by_key(|phase| *phase as u8);

    assert_eq!(phases, sorted);
    assert_eq!(phases.len(), 16 + 4 + 2 + 2 + 1);
  }

  #[test]
  fn matrix_covers_every_combination_once() {
    let matrix = phase(Phase::Matrix);

    assert_eq!(matrix.len(), 16);
    for sg_size in SG_SIZES {
      for pass in PASSES {
        for variant in VARIANTS {
          let count = matrix
            .iter()
            .filter(|point| {
              point.config.sg_size == sg_size
                && point.config.target.compiler_pass() == pass
                && point.config.variant == variant
            })
            .count();
          assert_eq!(count, 1, "sg {sg_size} {pass} {variant}");
        }
      }
    }
  }

  #[test]
  fn matrix_starts_with_sg_32_generic_rv() {
    let first = &campaign()[0];

    assert_eq!(first.config.sg_size, 32);
    assert_eq!(first.config.target, Target::Generic);
    assert_eq!(first.config.variant, Variant::Rv);
    assert_eq!(first.config.toggles, Toggles::default());
    assert_eq!(first.suffix, None);
  }

  #[test]
  fn ethminer_is_built_for_wide_subgroups_only() {
    for point in phase(Phase::Matrix) {
      let wide = point.config.sg_size == 32 || point.config.sg_size == 64;
      assert_eq!(point.projects().contains(&Project::Ethminer), wide);
    }
  }

  #[test]
  fn isolated_phases_disable_their_optimizations() {
    for point in phase(Phase::WithoutWgAndSgOpt) {
      assert!(!point.config.toggles.incomplete_sgs_opt);
      assert!(!point.config.toggles.wg_sscp_opt);
      assert!(point.config.toggles.use_reduce_intrinsic);
      assert_eq!(point.suffix, Some(Suffix::WithoutWgAndSgOpt));
    }

    for point in phase(Phase::OnlyWgOpt) {
      assert!(!point.config.toggles.incomplete_sgs_opt);
      assert!(point.config.toggles.wg_sscp_opt);
      assert_eq!(point.config.target, Target::Generic);
    }

    let no_intrinsic = phase(Phase::WithoutReduceIntrinsic);
    assert_eq!(
      no_intrinsic.iter().map(|point| point.config.variant).collect::<Vec<_>>(),
      [Variant::Cbs, Variant::Rv]
    );
    for point in no_intrinsic {
      assert!(!point.config.toggles.use_reduce_intrinsic);
      assert_eq!(point.suite, Suite::WithoutReduceIntrinsic);
      assert_eq!(point.projects(), [Project::AdaptiveCpp, Project::SyclBench]);
    }
  }

  #[test]
  fn upstream_is_last_and_unpatched() {
    let points = campaign();
    let upstream = points.last().unwrap();

    assert_eq!(upstream.phase, Phase::Upstream);
    assert_eq!(upstream.revision, Revision::SgOne);
    assert_eq!(upstream.config.sg_size, 1);
    assert_eq!(
      upstream.labels(),
      Labels {
        variant: "upstream".to_string(),
        compiler_pass: "SSCP".to_string(),
        sg_size: 1,
      }
    );
    assert!(points[..points.len() - 1].iter().all(|point| point.revision == Revision::Thesis));
  }

  #[test]
  fn display_lists_build_order() {
    let line = campaign()[0].to_string();

    assert_eq!(
      line,
      "matrix rev=thesis sg=32 target=generic variant=rv pass=SSCP suite=standard \
       build=[AdaptiveCpp, portblas, sycl-bench, velocity/ethminer]"
    );
  }
}
