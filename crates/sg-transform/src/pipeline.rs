use crate::factory::DescriptorFactory;
use crate::options::TransformOptions;
use crate::passes::trace_scope::traced_types;
use crate::passes::{
    CapturedDefaults, ExtractCallerDefaults, InjectCallerArguments, IntrinsicDispatch,
    IntrinsicRegistry, Pass, PassEnv, TraceRemoval, TracingInstrumentation,
};
use crate::runtime::RuntimeIndex;
use sg_core::config;
use sg_core::descriptors::{descriptor_store, DescriptorStore};
use sg_core::diagnostics::{diagnostic_manager, Diagnostic};
use sg_core::error::{Error, Result};
use sg_core::ir::pretty::{pretty, PrettyOptions};
use sg_core::ir::{AnnotationsExt, Decl, DeclKind, Module, SymbolTable};
use sg_core::source_map::SourceCache;
use sg_core::trace::{TraceType, TraceTypes};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutcome {
    pub pass: &'static str,
    pub changed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub total_changes: usize,
    pub per_pass: Vec<PassOutcome>,
}

impl PipelineReport {
    pub fn changes_of(&self, pass: &str) -> usize {
        self.per_pass
            .iter()
            .filter(|outcome| outcome.pass == pass)
            .map(|outcome| outcome.changed)
            .sum()
    }
}

/// Runs the enabled passes over a module in their fixed order.
pub struct Pipeline {
    options: TransformOptions,
    store: Arc<DescriptorStore>,
    registry: Arc<IntrinsicRegistry>,
}

impl Pipeline {
    pub fn new(options: TransformOptions) -> Self {
        Self {
            options,
            store: descriptor_store(),
            registry: Arc::new(IntrinsicRegistry::with_defaults()),
        }
    }

    /// Use a private descriptor store instead of the process-wide one.
    pub fn with_store(mut self, store: Arc<DescriptorStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_registry(mut self, registry: IntrinsicRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    pub fn store(&self) -> &Arc<DescriptorStore> {
        &self.store
    }

    fn passes(&self) -> Vec<Box<dyn Pass>> {
        let mut passes: Vec<Box<dyn Pass>> = Vec::new();
        if self.options.caller_capture.enabled {
            let captured = Arc::new(CapturedDefaults::new());
            passes.push(Box::new(ExtractCallerDefaults::new(captured.clone())));
            passes.push(Box::new(InjectCallerArguments::new(captured)));
        }
        if self.options.intrinsics.enabled {
            passes.push(Box::new(IntrinsicDispatch::new(self.registry.clone())));
        }
        if self.options.tracing.remove {
            passes.push(Box::new(TraceRemoval));
        }
        if self.options.tracing.instrument {
            passes.push(Box::new(TracingInstrumentation));
        }
        passes
    }

    /// Transform `module` in place. A failure is also recorded with the
    /// global diagnostic manager before it is returned.
    pub fn run(&self, module: &mut Module, sources: &SourceCache) -> Result<PipelineReport> {
        self.run_passes(module, sources).inspect_err(|err| {
            let mut diagnostic = Diagnostic::from_error(err);
            if let Some(span) = err.span() {
                if let Some(file) = module.file(span.file) {
                    let position = sources.resolve(Path::new(&file.path), span.start, span.end);
                    diagnostic = diagnostic.with_location(format!("{}:{}", file.path, position));
                }
            }
            sg_core::debug!("pipeline failed on module {}: {}", module.name, err);
            diagnostic_manager().add_diagnostic(diagnostic);
        })
    }

    fn run_passes(&self, module: &mut Module, sources: &SourceCache) -> Result<PipelineReport> {
        module.sync_ids();
        let module_name = self
            .options
            .module_name
            .clone()
            .unwrap_or_else(|| module.name.clone());

        let symbols = SymbolTable::build(module);
        let runtime = RuntimeIndex::build(&symbols, &self.options)?;
        self.check_linkage(module, &runtime)?;

        let mut report = PipelineReport::default();
        for pass in self.passes() {
            let symbols = SymbolTable::build(module);
            let runtime = RuntimeIndex::build(&symbols, &self.options)?;
            let env = PassEnv {
                options: &self.options,
                symbols: &symbols,
                runtime: &runtime,
                factory: DescriptorFactory::new(
                    &self.store,
                    &symbols,
                    sources,
                    module_name.clone(),
                ),
            };
            sg_core::debug!("running pass {} on module {}", pass.name(), module.name);
            let changed = pass.run(module, &env)?;
            sg_core::debug!("pass {} rewrote {} nodes", pass.name(), changed);
            if config::dump_ir() {
                sg_core::debug!(
                    "module after {}:\n{}",
                    pass.name(),
                    pretty(&*module, PrettyOptions::default()).with_symbols(&symbols)
                );
            }
            report.total_changes += changed;
            report.per_pass.push(PassOutcome {
                pass: pass.name(),
                changed,
            });
        }
        Ok(report)
    }

    /// Hooks of every instrumentation type the module can activate must
    /// resolve before anything is rewritten.
    fn check_linkage(&self, module: &Module, runtime: &RuntimeIndex) -> Result<()> {
        if !self.options.tracing.instrument {
            return Ok(());
        }
        let mut requested = self.options.tracing.default_set();
        let annotation = &self.options.tracing.annotation;
        let mut pending: Vec<&Decl> = module
            .files
            .iter()
            .flat_map(|file| file.declarations.iter())
            .collect();
        while let Some(decl) = pending.pop() {
            for usage in decl.annotations.annotations_of(annotation) {
                requested |= traced_types(usage)?;
            }
            match &decl.kind {
                DeclKind::Class(class) => pending.extend(class.members.iter()),
                DeclKind::Property(property) => pending.extend(
                    [&property.getter, &property.setter]
                        .into_iter()
                        .flatten()
                        .map(|accessor| &**accessor),
                ),
                _ => {}
            }
        }
        let instrumented = requested
            & TraceTypes::from_iter([
                TraceType::FunctionEnter,
                TraceType::FunctionLeave,
                TraceType::BeforeCall,
                TraceType::AfterCall,
                TraceType::SuspensionPoint,
            ]);
        runtime
            .require_hooks(instrumented.types(), &self.options)
            .inspect_err(|err: &Error| sg_core::warn!("linkage check failed: {err}"))
    }
}
