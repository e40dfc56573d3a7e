use serde::{Deserialize, Serialize};
use sg_core::config;
use sg_core::error::{Error, Result};
use sg_core::intrinsics::IntrinsicKind;
use sg_core::trace::{TraceType, TraceTypes};
use std::path::Path;

/// Configuration for a transformation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TransformOptions {
    /// Module name recorded in source locations (defaults to the IR module name)
    pub module_name: Option<String>,
    /// Intrinsic dispatch
    pub intrinsics: IntrinsicOptions,
    /// Caller-capture default parameters
    pub caller_capture: CallerCaptureOptions,
    /// Tracing instrumentation and removal
    pub tracing: TracingOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IntrinsicOptions {
    pub enabled: bool,
    /// Annotation marking a runtime declaration as an intrinsic
    pub annotation: String,
    /// Kinds the dispatcher replaces; calls of other kinds are left alone
    pub kinds: Vec<IntrinsicKind>,
}

impl Default for IntrinsicOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            annotation: "spyglass.Intrinsic".to_string(),
            kinds: IntrinsicKind::all().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CallerCaptureOptions {
    pub enabled: bool,
    /// Marker attached to declarations whose defaults were extracted
    pub marker: String,
}

impl Default for CallerCaptureOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            marker: "spyglass.internal.CallerCapture".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TracingOptions {
    /// Inject enter/leave, call and suspension hooks
    pub instrument: bool,
    /// Strip span and event calls outside their active scope
    pub remove: bool,
    /// Annotation selecting the trace types of a class or function
    pub annotation: String,
    /// Trace types active everywhere, in addition to annotated ones
    pub default_types: Vec<TraceType>,
    pub hooks: HookNames,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            instrument: true,
            remove: true,
            annotation: "spyglass.trace.Traced".to_string(),
            default_types: Vec::new(),
            hooks: HookNames::default(),
        }
    }
}

impl TracingOptions {
    pub fn default_set(&self) -> TraceTypes {
        self.default_types.iter().copied().collect()
    }
}

/// Qualified names of the runtime hook functions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HookNames {
    pub function_enter: String,
    pub function_leave: String,
    pub before_call: String,
    pub after_call: String,
    pub suspension_point: String,
    pub span_enter: String,
    pub span_leave: String,
    pub event: String,
}

impl Default for HookNames {
    fn default() -> Self {
        Self {
            function_enter: "spyglass.trace.Tracer.enterFunction".to_string(),
            function_leave: "spyglass.trace.Tracer.leaveFunction".to_string(),
            before_call: "spyglass.trace.Tracer.beforeCall".to_string(),
            after_call: "spyglass.trace.Tracer.afterCall".to_string(),
            suspension_point: "spyglass.trace.Tracer.suspensionPoint".to_string(),
            span_enter: "spyglass.trace.Tracer.spanEnter".to_string(),
            span_leave: "spyglass.trace.Tracer.spanLeave".to_string(),
            event: "spyglass.trace.Tracer.event".to_string(),
        }
    }
}

impl HookNames {
    pub fn get(&self, ty: TraceType) -> &str {
        match ty {
            TraceType::FunctionEnter => &self.function_enter,
            TraceType::FunctionLeave => &self.function_leave,
            TraceType::BeforeCall => &self.before_call,
            TraceType::AfterCall => &self.after_call,
            TraceType::SuspensionPoint => &self.suspension_point,
            TraceType::SpanEnter => &self.span_enter,
            TraceType::SpanLeave => &self.span_leave,
            TraceType::Event => &self.event,
        }
    }
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            module_name: None,
            intrinsics: IntrinsicOptions::default(),
            caller_capture: CallerCaptureOptions::default(),
            tracing: TracingOptions::default(),
        }
    }
}

impl TransformOptions {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| Error::Config(err.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("cannot read {}: {err}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Apply the `SPYGLASS_DISABLE_*` environment switches.
    pub fn with_env_overrides(mut self) -> Self {
        if config::tracing_disabled() {
            self.tracing.instrument = false;
            self.tracing.remove = false;
        }
        if config::intrinsics_disabled() {
            self.intrinsics.enabled = false;
            self.caller_capture.enabled = false;
        }
        self
    }

    pub fn accepts(&self, kind: IntrinsicKind) -> bool {
        self.intrinsics.enabled && self.intrinsics.kinds.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_toml_yields_defaults() -> Result<()> {
        assert_eq!(TransformOptions::from_toml_str("")?, TransformOptions::default());
        Ok(())
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() -> Result<()> {
        let options = TransformOptions::from_toml_str(
            r#"
            module-name = "app"

            [intrinsics]
            kinds = ["here", "current-class"]

            [tracing]
            remove = false
            default-types = ["function-enter", "function-leave"]

            [tracing.hooks]
            event = "my.Tracer.event"
            "#,
        )?;
        assert_eq!(options.module_name.as_deref(), Some("app"));
        assert_eq!(
            options.intrinsics.kinds,
            vec![IntrinsicKind::Here, IntrinsicKind::CurrentClass]
        );
        assert!(options.accepts(IntrinsicKind::Here));
        assert!(!options.accepts(IntrinsicKind::TypeOf));
        assert!(options.tracing.instrument);
        assert!(!options.tracing.remove);
        assert_eq!(options.tracing.hooks.get(TraceType::Event), "my.Tracer.event");
        assert_eq!(
            options.tracing.hooks.get(TraceType::SpanEnter),
            "spyglass.trace.Tracer.spanEnter"
        );
        assert!(options.tracing.default_set().has(TraceType::FunctionLeave));
        Ok(())
    }

    #[test]
    fn unknown_kind_is_a_config_error() {
        let err = TransformOptions::from_toml_str("[intrinsics]\nkinds = [\"nowhere\"]")
            .expect_err("unknown kind must be rejected");
        assert!(matches!(err, Error::Config(_)));
    }
}
