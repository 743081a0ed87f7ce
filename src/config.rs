use std::fmt;

/// The `ACPP_TARGETS` value the benchmarks are compiled for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
  Generic,
  Omp,
  Rv,
}

impl Target {
  /// The target used for a compiler pass. The OpenMP path has a dedicated
  /// target when the vectorizing variant is active.
  pub fn select(pass: CompilerPass, variant: Variant) -> Target {
    match (pass, variant) {
      (CompilerPass::Sscp, _) => Target::Generic,
      (CompilerPass::Smcp, Variant::Rv) => Target::Rv,
      (CompilerPass::Smcp, _) => Target::Omp,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Target::Generic => "generic",
      Target::Omp => "omp",
      Target::Rv => "rv",
    }
  }

  pub fn compiler_pass(self) -> CompilerPass {
    match self {
      Target::Generic => CompilerPass::Sscp,
      Target::Omp | Target::Rv => CompilerPass::Smcp,
    }
  }
}

/// Which compilation pipeline produced the kernels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompilerPass {
  /// Single-pass generic compilation.
  Sscp,
  /// Multi-pass compilation through the OpenMP backend.
  Smcp,
}

impl CompilerPass {
  pub fn as_str(self) -> &'static str {
    match self {
      CompilerPass::Sscp => "SSCP",
      CompilerPass::Smcp => "SMCP",
    }
  }
}

/// How divergent control flow is handled in the kernels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
  /// Whole-function vectorization.
  Rv,
  /// Mask-based continuation splitting.
  Cbs,
  /// The unmodified compiler at subgroup size one.
  Upstream,
}

impl Variant {
  pub fn as_str(self) -> &'static str {
    match self {
      Variant::Rv => "rv",
      Variant::Cbs => "cbs",
      Variant::Upstream => "upstream",
    }
  }
}

macro_rules! impl_display {
  ($($ty:ty),*) => {
    $(impl fmt::Display for $ty {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
      }
    })*
  };
}

impl_display!(Target, CompilerPass, Variant);

/// Optimization switches compiled into the compiler as preprocessor flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Toggles {
  pub use_reduce_intrinsic: bool,
  pub incomplete_sgs_opt: bool,
  pub wg_sscp_opt: bool,
}

impl Default for Toggles {
  fn default() -> Self {
    Self {
      use_reduce_intrinsic: true,
      incomplete_sgs_opt: true,
      wg_sscp_opt: true,
    }
  }
}

/// Everything that has to be compiled into the toolchain and the benchmarks
/// for one point of the sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildConfig {
  pub sg_size: u32,
  pub target: Target,
  pub variant: Variant,
  pub toggles: Toggles,
}

impl BuildConfig {
  pub fn new(sg_size: u32, pass: CompilerPass, variant: Variant) -> Self {
    Self {
      sg_size,
      target: Target::select(pass, variant),
      variant,
      toggles: Toggles::default(),
    }
  }

  pub fn with_toggles(self, toggles: Toggles) -> Self {
    Self { toggles, ..self }
  }

  /// Values of the preprocessor flags in the compiler's `RV.h`.
  pub fn defines(&self) -> [(&'static str, bool); 4] {
    [
      ("USE_RV", self.variant == Variant::Rv),
      ("USE_REDUCE_INTRINSIC", self.toggles.use_reduce_intrinsic),
      ("INCOMPLETE_SGS_OPT", self.toggles.incomplete_sgs_opt),
      ("WG_SSCP_OPT", self.toggles.wg_sscp_opt),
    ]
  }
}
