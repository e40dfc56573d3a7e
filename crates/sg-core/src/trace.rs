//! Trace hook kinds and sets of them.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraceType {
    SpanEnter,
    SpanLeave,
    FunctionEnter,
    FunctionLeave,
    BeforeCall,
    AfterCall,
    SuspensionPoint,
    Event,
}

impl TraceType {
    pub const ALL: [TraceType; 8] = [
        TraceType::SpanEnter,
        TraceType::SpanLeave,
        TraceType::FunctionEnter,
        TraceType::FunctionLeave,
        TraceType::BeforeCall,
        TraceType::AfterCall,
        TraceType::SuspensionPoint,
        TraceType::Event,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TraceType::SpanEnter => "span-enter",
            TraceType::SpanLeave => "span-leave",
            TraceType::FunctionEnter => "function-enter",
            TraceType::FunctionLeave => "function-leave",
            TraceType::BeforeCall => "before-call",
            TraceType::AfterCall => "after-call",
            TraceType::SuspensionPoint => "suspension-point",
            TraceType::Event => "event",
        }
    }

    /// Kinds a user writes explicitly and the removal pass may strip.
    pub fn is_user_call(&self) -> bool {
        matches!(
            self,
            TraceType::SpanEnter | TraceType::SpanLeave | TraceType::Event
        )
    }

    fn flag(&self) -> TraceTypes {
        match self {
            TraceType::SpanEnter => TraceTypes::SPAN_ENTER,
            TraceType::SpanLeave => TraceTypes::SPAN_LEAVE,
            TraceType::FunctionEnter => TraceTypes::FUNCTION_ENTER,
            TraceType::FunctionLeave => TraceTypes::FUNCTION_LEAVE,
            TraceType::BeforeCall => TraceTypes::BEFORE_CALL,
            TraceType::AfterCall => TraceTypes::AFTER_CALL,
            TraceType::SuspensionPoint => TraceTypes::SUSPENSION_POINT,
            TraceType::Event => TraceTypes::EVENT,
        }
    }
}

impl fmt::Display for TraceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TraceType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        TraceType::ALL
            .into_iter()
            .find(|ty| ty.name() == normalized)
            .ok_or_else(|| crate::error::Error::Config(format!("unknown trace type `{s}`")))
    }
}

bitflags! {
    /// A set of trace types.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TraceTypes: u16 {
        const SPAN_ENTER = 1 << 0;
        const SPAN_LEAVE = 1 << 1;
        const FUNCTION_ENTER = 1 << 2;
        const FUNCTION_LEAVE = 1 << 3;
        const BEFORE_CALL = 1 << 4;
        const AFTER_CALL = 1 << 5;
        const SUSPENSION_POINT = 1 << 6;
        const EVENT = 1 << 7;
    }
}

impl TraceTypes {
    pub fn has(&self, ty: TraceType) -> bool {
        self.contains(ty.flag())
    }

    pub fn types(&self) -> impl Iterator<Item = TraceType> {
        let set = *self;
        TraceType::ALL.into_iter().filter(move |ty| set.has(*ty))
    }
}

impl From<TraceType> for TraceTypes {
    fn from(ty: TraceType) -> Self {
        ty.flag()
    }
}

impl FromIterator<TraceType> for TraceTypes {
    fn from_iter<I: IntoIterator<Item = TraceType>>(iter: I) -> Self {
        iter.into_iter()
            .fold(TraceTypes::empty(), |set, ty| set | ty.flag())
    }
}

impl fmt::Display for TraceTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.types().map(|ty| ty.name()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
