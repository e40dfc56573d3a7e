// Passes - rewriting passes run by the pipeline, each implementing `Pass`

pub mod caller_capture;
pub mod intrinsics;
pub mod trace_removal;
pub mod trace_scope;
pub mod tracing;

pub use caller_capture::*;
pub use intrinsics::*;
pub use trace_removal::*;
pub use self::tracing::*;

use crate::factory::DescriptorFactory;
use crate::options::TransformOptions;
use crate::runtime::RuntimeIndex;
use sg_core::error::Result;
use sg_core::ir::{Module, SymbolTable};

/// Everything a pass reads besides the module it rewrites. Rebuilt before
/// every pass so symbols reflect the previous pass's output.
pub struct PassEnv<'a> {
    pub options: &'a TransformOptions,
    pub symbols: &'a SymbolTable,
    pub runtime: &'a RuntimeIndex,
    pub factory: DescriptorFactory<'a>,
}

pub trait Pass {
    fn name(&self) -> &'static str;

    /// Rewrite `module` in place and return the number of rewritten nodes.
    fn run(&self, module: &mut Module, env: &PassEnv<'_>) -> Result<usize>;
}
