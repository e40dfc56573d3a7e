//! Caller-capture defaults.
//!
//! A parameter whose default value is an intrinsic call (`here()`,
//! `currentFunction()`, `typeOf<T>()`, ...) must resolve against the
//! *caller*, not against the declaration. The first pass strips such defaults
//! and records one mode per parameter in a marker annotation; the second fills
//! every omitted argument at call sites of marked declarations with a fresh
//! intrinsic call spanning the call itself, which intrinsic dispatch then
//! resolves. Type and reference arguments of a stripped default are replayed
//! on the fresh call when the declaration was de-defaulted in the same run.

use crate::context::TraversalContext;
use crate::error::invalid_state;
use crate::passes::{Pass, PassEnv};
use crate::visit::{walk_decl, walk_expr, walk_module, MutVisitor, Slot};
use sg_core::collections::ConcurrentMap;
use sg_core::error::{Error, Result};
use sg_core::intrinsics::IntrinsicKind;
use sg_core::ir::{
    Annotation, AnnotationArg, AnnotationsExt, Call, Decl, DeclId, DeclKind, Expr, ExprKind,
    Module,
};
use sg_core::span::Span;
use std::sync::Arc;

/// Mode of a parameter without a captured default.
pub const NO_CAPTURE: &str = "none";

/// Intrinsic calls stripped from defaults, keyed by declaration and
/// parameter index. Markers read from other modules have no entry.
#[derive(Default)]
pub struct CapturedDefaults(ConcurrentMap<(DeclId, usize), Call>);

impl CapturedDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, function: DeclId, param: usize) -> Option<Call> {
        self.0.get_cloned(&(function, param))
    }

    fn record(&self, function: DeclId, param: usize, call: Call) {
        self.0.insert((function, param), call);
    }
}

pub struct ExtractCallerDefaults {
    captured: Arc<CapturedDefaults>,
}

impl ExtractCallerDefaults {
    pub fn new(captured: Arc<CapturedDefaults>) -> Self {
        Self { captured }
    }
}

impl Pass for ExtractCallerDefaults {
    fn name(&self) -> &'static str {
        "extract-caller-defaults"
    }

    fn run(&self, module: &mut Module, env: &PassEnv<'_>) -> Result<usize> {
        let mut extractor = DefaultExtractor {
            env,
            captured: &self.captured,
            marked: 0,
        };
        let mut cx = TraversalContext::new(env.symbols, module.ids);
        walk_module(&mut extractor, module, &mut cx)?;
        sg_core::debug!("marked {} caller-capture declarations", extractor.marked);
        Ok(extractor.marked)
    }
}

struct DefaultExtractor<'p, 'e> {
    env: &'p PassEnv<'e>,
    captured: &'p CapturedDefaults,
    marked: usize,
}

impl DefaultExtractor<'_, '_> {
    fn capture_kind(&self, default: &Expr) -> Option<IntrinsicKind> {
        self.env.runtime.intrinsic_kind(default.as_call()?.callee)
    }
}

impl MutVisitor for DefaultExtractor<'_, '_> {
    fn visit_decl(&mut self, decl: &mut Decl, cx: &mut TraversalContext<'_>) -> Result<()> {
        let env = self.env;
        let marker = &env.options.caller_capture.marker;
        if let DeclKind::Function(function) = &mut decl.kind {
            if !function.params.is_empty() && !decl.annotations.has_annotation(marker) {
                let modes: Vec<Option<IntrinsicKind>> = function
                    .params
                    .iter()
                    .map(|param| param.default.as_ref().and_then(|d| self.capture_kind(d)))
                    .collect();
                if modes.iter().any(Option::is_some) {
                    for (index, param) in function.params.iter_mut().enumerate() {
                        if modes[index].is_none() {
                            continue;
                        }
                        if let Some(ExprKind::Call(call)) = param.default.take().map(|d| d.kind) {
                            self.captured.record(decl.id, index, call);
                        }
                    }
                    let names = modes
                        .iter()
                        .map(|mode| mode.map_or(NO_CAPTURE, |kind| kind.name()));
                    decl.annotations.push(
                        Annotation::new(marker.clone(), Span::synthetic(decl.span.file))
                            .with_argument("modes", AnnotationArg::strings(names)),
                    );
                    sg_core::trace!("extracted caller defaults of {}", function.name);
                    self.marked += 1;
                }
            }
        }
        walk_decl(self, decl, cx)
    }
}

pub struct InjectCallerArguments {
    captured: Arc<CapturedDefaults>,
}

impl InjectCallerArguments {
    pub fn new(captured: Arc<CapturedDefaults>) -> Self {
        Self { captured }
    }
}

impl Pass for InjectCallerArguments {
    fn name(&self) -> &'static str {
        "inject-caller-arguments"
    }

    fn run(&self, module: &mut Module, env: &PassEnv<'_>) -> Result<usize> {
        let mut injector = ArgumentInjector {
            env,
            captured: &self.captured,
            injected: 0,
        };
        let mut cx = TraversalContext::new(env.symbols, module.ids);
        walk_module(&mut injector, module, &mut cx)?;
        sg_core::debug!("injected {} caller-capture arguments", injector.injected);
        Ok(injector.injected)
    }
}

struct ArgumentInjector<'p, 'e> {
    env: &'p PassEnv<'e>,
    captured: &'p CapturedDefaults,
    injected: usize,
}

impl ArgumentInjector<'_, '_> {
    fn inject(&mut self, call: &mut Call, span: Span) -> Result<()> {
        let symbols = self.env.symbols;
        let Some((symbol, function)) = symbols.function(call.callee) else {
            return Ok(());
        };
        let Some(marker) = symbol
            .annotations
            .find_annotation(&self.env.options.caller_capture.marker)
        else {
            return Ok(());
        };
        let modes = marker
            .argument("modes")
            .and_then(AnnotationArg::as_strings)
            .ok_or_else(|| {
                Error::Config(format!(
                    "caller-capture marker on `{}` has no mode list",
                    symbol.fq_name
                ))
            })?;
        if modes.len() != function.params.len() {
            return Err(Error::ModeListMismatch {
                function: symbol.fq_name.clone(),
                modes: modes.len(),
                params: function.params.len(),
            });
        }
        if call.args.len() < modes.len() {
            call.args.resize(modes.len(), None);
        }
        let callee = call.callee;
        for (index, (arg, mode)) in call.args.iter_mut().zip(modes).enumerate() {
            if mode == NO_CAPTURE || arg.is_some() {
                continue;
            }
            let kind: IntrinsicKind = mode.parse()?;
            let intrinsic = self.env.runtime.intrinsic_decl(kind)?;
            let ty = symbols
                .function(intrinsic)
                .map(|(_, function)| function.return_ty.clone())
                .ok_or_else(|| invalid_state(format!("intrinsic {intrinsic} is not a function")))?;
            let fresh = match self.captured.get(callee, index) {
                Some(stripped) => Call::new(intrinsic, stripped.args)
                    .with_type_args(stripped.type_args),
                None => Call::new(intrinsic, Vec::new()),
            };
            *arg = Some(Expr::call(span, ty, fresh));
            self.injected += 1;
        }
        Ok(())
    }
}

impl MutVisitor for ArgumentInjector<'_, '_> {
    fn visit_expr(
        &mut self,
        expr: &mut Expr,
        _slot: Slot,
        cx: &mut TraversalContext<'_>,
    ) -> Result<()> {
        walk_expr(self, expr, cx)?;
        let span = expr.span;
        if let Some(call) = expr.as_call_mut() {
            self.inject(call, span)?;
        }
        Ok(())
    }
}
