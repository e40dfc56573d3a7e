// sg-transform: rewriting passes over the sg-core IR
//
// Architecture:
// - context / visit: scope-tracking traversal shared by every pass
// - factory: descriptor construction on top of the shared caches
// - passes: caller capture, intrinsic dispatch, trace removal, instrumentation
// - pipeline: ordering, linkage checks and diagnostics

pub mod context;
pub mod error;
pub mod factory;
pub mod lowering;
pub mod options;
pub mod passes;
pub mod pipeline;
pub mod runtime;
pub mod visit;

pub use context::*;
pub use factory::DescriptorFactory;
pub use options::TransformOptions;
pub use pipeline::{Pipeline, PipelineReport};
pub use runtime::RuntimeIndex;
