//! Host functions: native implementations of body-less declarations, looked
//! up by qualified name.

use crate::error::interpretation_error;
use crate::value::Value;
use sg_core::descriptors::{DescriptorRef, FunctionInfo, Handle, SourceLocation};
use sg_core::error::Result;
use sg_core::trace::TraceType;
use sg_transform::options::HookNames;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};

/// A native function callable from interpreted code
pub struct HostFunction {
    pub name: String,
    func: Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>,
}

impl HostFunction {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.func)(args)
    }
}

impl Debug for HostFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostFunction")
            .field("name", &self.name)
            .finish()
    }
}

/// Registry of host functions keyed by qualified name
#[derive(Debug, Default)]
pub struct HostFunctions {
    functions: HashMap<String, HostFunction>,
}

impl HostFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) {
        let function = HostFunction::new(name, func);
        self.functions.insert(function.name.clone(), function);
    }

    pub fn get(&self, name: &str) -> Option<&HostFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// One hook invocation observed while running instrumented code.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Enter(Handle<FunctionInfo>),
    Leave(Handle<FunctionInfo>),
    BeforeCall {
        callee: Handle<FunctionInfo>,
        at: Handle<SourceLocation>,
    },
    AfterCall {
        callee: Handle<FunctionInfo>,
        at: Handle<SourceLocation>,
    },
    Suspension {
        function: Handle<FunctionInfo>,
        at: Handle<SourceLocation>,
    },
    SpanEnter(String),
    SpanLeave(String),
    Event(String),
}

impl TraceEvent {
    pub fn trace_type(&self) -> TraceType {
        match self {
            TraceEvent::Enter(_) => TraceType::FunctionEnter,
            TraceEvent::Leave(_) => TraceType::FunctionLeave,
            TraceEvent::BeforeCall { .. } => TraceType::BeforeCall,
            TraceEvent::AfterCall { .. } => TraceType::AfterCall,
            TraceEvent::Suspension { .. } => TraceType::SuspensionPoint,
            TraceEvent::SpanEnter(_) => TraceType::SpanEnter,
            TraceEvent::SpanLeave(_) => TraceType::SpanLeave,
            TraceEvent::Event(_) => TraceType::Event,
        }
    }
}

fn function_arg(args: &[Value], index: usize) -> Result<Handle<FunctionInfo>> {
    match args.get(index).and_then(Value::as_descriptor) {
        Some(DescriptorRef::Function(handle)) => Ok(handle),
        _ => Err(interpretation_error(format!(
            "trace hook argument {index} must be a function descriptor"
        ))),
    }
}

fn location_arg(args: &[Value], index: usize) -> Result<Handle<SourceLocation>> {
    match args.get(index).and_then(Value::as_descriptor) {
        Some(DescriptorRef::Location(handle)) => Ok(handle),
        _ => Err(interpretation_error(format!(
            "trace hook argument {index} must be a source location"
        ))),
    }
}

fn name_arg(args: &[Value]) -> Result<String> {
    args.first()
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| interpretation_error("trace hook expects a name"))
}

fn decode(ty: TraceType, args: &[Value]) -> Result<TraceEvent> {
    Ok(match ty {
        TraceType::FunctionEnter => TraceEvent::Enter(function_arg(args, 0)?),
        TraceType::FunctionLeave => TraceEvent::Leave(function_arg(args, 0)?),
        TraceType::BeforeCall => TraceEvent::BeforeCall {
            callee: function_arg(args, 0)?,
            at: location_arg(args, 1)?,
        },
        TraceType::AfterCall => TraceEvent::AfterCall {
            callee: function_arg(args, 0)?,
            at: location_arg(args, 1)?,
        },
        TraceType::SuspensionPoint => TraceEvent::Suspension {
            function: function_arg(args, 0)?,
            at: location_arg(args, 1)?,
        },
        TraceType::SpanEnter => TraceEvent::SpanEnter(name_arg(args)?),
        TraceType::SpanLeave => TraceEvent::SpanLeave(name_arg(args)?),
        TraceType::Event => TraceEvent::Event(name_arg(args)?),
    })
}

/// Provides every trace hook and records the calls it receives.
#[derive(Debug, Clone, Default)]
pub struct TraceRecorder {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host function for each hook name.
    pub fn install(&self, host: &mut HostFunctions, hooks: &HookNames) {
        for ty in TraceType::ALL {
            let events = Arc::clone(&self.events);
            host.register(hooks.get(ty), move |args| {
                let event = decode(ty, args)?;
                sg_core::trace!("trace hook {}: {:?}", ty, event);
                events
                    .lock()
                    .map_err(|_| interpretation_error("trace recorder poisoned"))?
                    .push(event);
                Ok(Value::Unit)
            });
        }
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, ty: TraceType) -> usize {
        self.events()
            .iter()
            .filter(|event| event.trace_type() == ty)
            .count()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}
