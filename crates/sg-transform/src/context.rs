//! Scope tracking for a single traversal.
//!
//! Frames are pushed through [`TraversalContext::enter`], which hands back a
//! [`ScopeGuard`]; dropping the guard truncates the stack to where it was, so
//! the stack stays balanced even when a visit returns early with an error.

use sg_core::error::{Error, Result};
use sg_core::ir::{DeclId, IdAllocator, SymbolTable, Ty, VarId};
use sg_core::span::{FileId, Span};
use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Class,
    Function,
    /// Anonymous init block, or the initializer of a field or property.
    Initializer,
    /// Lexical body (block) of an executable.
    Body,
}

/// A local variable or parameter visible at the current point.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleLocal {
    pub var: VarId,
    pub name: String,
    pub ty: Ty,
    pub span: Span,
    pub mutable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub kind: FrameKind,
    pub decl: Option<DeclId>,
    pub locals: Vec<VisibleLocal>,
}

impl Frame {
    pub fn class(id: DeclId) -> Self {
        Self {
            kind: FrameKind::Class,
            decl: Some(id),
            locals: Vec::new(),
        }
    }

    /// Function frame; its parameters are visible throughout the body.
    pub fn function(id: DeclId, params: Vec<VisibleLocal>) -> Self {
        Self {
            kind: FrameKind::Function,
            decl: Some(id),
            locals: params,
        }
    }

    pub fn initializer(id: DeclId) -> Self {
        Self {
            kind: FrameKind::Initializer,
            decl: Some(id),
            locals: Vec::new(),
        }
    }

    pub fn body() -> Self {
        Self {
            kind: FrameKind::Body,
            decl: None,
            locals: Vec::new(),
        }
    }

    fn is_executable(&self) -> bool {
        matches!(self.kind, FrameKind::Function | FrameKind::Initializer)
    }
}

/// Innermost scope that executes code and can host temporaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Executable {
    Function(DeclId),
    Initializer {
        id: DeclId,
        /// Class whose construction runs the initializer; `None` at top level.
        class: Option<DeclId>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn current_class(&self) -> Option<DeclId> {
        self.innermost(FrameKind::Class)
    }

    /// Innermost function, not looking past the nearest class boundary.
    pub fn current_function(&self) -> Option<DeclId> {
        match self.current_executable()? {
            Executable::Function(id) => Some(id),
            Executable::Initializer { .. } => None,
        }
    }

    pub fn current_initializer(&self) -> Option<DeclId> {
        match self.current_executable()? {
            Executable::Initializer { id, .. } => Some(id),
            Executable::Function(_) => None,
        }
    }

    /// Innermost function or initializer. A class frame in between means the
    /// point is a class member outside any executable, so there is none.
    pub fn current_executable(&self) -> Option<Executable> {
        let (position, frame) = self
            .frames
            .iter()
            .enumerate()
            .rev()
            .find(|(_, frame)| frame.kind != FrameKind::Body)?;
        let id = frame.decl?;
        match frame.kind {
            FrameKind::Function => Some(Executable::Function(id)),
            FrameKind::Initializer => {
                let class = self.frames[..position]
                    .iter()
                    .rev()
                    .find(|frame| frame.kind == FrameKind::Class)
                    .and_then(|frame| frame.decl);
                Some(Executable::Initializer { id, class })
            }
            FrameKind::Class | FrameKind::Body => None,
        }
    }

    /// Like [`ScopeStack::current_executable`], for callers that require one.
    pub fn require_executable(&self) -> Result<Executable> {
        self.current_executable()
            .ok_or_else(|| Error::InvalidState("not inside any function or initializer".into()))
    }

    /// Innermost declaration frame of any kind.
    pub fn innermost_decl(&self) -> Option<DeclId> {
        self.frames.iter().rev().find_map(|frame| frame.decl)
    }

    /// Class and function declarations enclosing this point, outermost first.
    pub fn declarations(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.frames
            .iter()
            .filter(|frame| matches!(frame.kind, FrameKind::Class | FrameKind::Function))
            .filter_map(|frame| frame.decl)
    }

    /// Record a local in the innermost frame. Locals are visible from the
    /// statement after their declaration until their frame is left.
    pub fn declare_local(&mut self, local: VisibleLocal) {
        if let Some(frame) = self.frames.last_mut() {
            frame.locals.push(local);
        }
    }

    /// Parameters and locals of the innermost executable visible at this
    /// point, in declaration order.
    pub fn visible_locals(&self) -> Vec<&VisibleLocal> {
        let start = self
            .frames
            .iter()
            .rposition(Frame::is_executable)
            .unwrap_or(self.frames.len());
        self.frames[start..]
            .iter()
            .flat_map(|frame| frame.locals.iter())
            .collect()
    }

    fn innermost(&self, kind: FrameKind) -> Option<DeclId> {
        self.frames
            .iter()
            .rev()
            .find(|frame| frame.kind == kind)
            .and_then(|frame| frame.decl)
    }
}

/// Per-traversal state threaded through every visit.
pub struct TraversalContext<'a> {
    pub scopes: ScopeStack,
    pub symbols: &'a SymbolTable,
    /// Allocator for temporaries; written back to the module after the traversal.
    pub ids: IdAllocator,
    pub file: FileId,
}

impl<'a> TraversalContext<'a> {
    pub fn new(symbols: &'a SymbolTable, ids: IdAllocator) -> Self {
        Self {
            scopes: ScopeStack::new(),
            symbols,
            ids,
            file: FileId::default(),
        }
    }

    pub fn enter(&mut self, frame: Frame) -> ScopeGuard<'_, 'a> {
        let depth = self.scopes.depth();
        self.scopes.push(frame);
        ScopeGuard { cx: self, depth }
    }
}

/// Keeps a frame on the stack for as long as it lives.
pub struct ScopeGuard<'c, 'a> {
    cx: &'c mut TraversalContext<'a>,
    depth: usize,
}

impl<'a> Deref for ScopeGuard<'_, 'a> {
    type Target = TraversalContext<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.cx
    }
}

impl DerefMut for ScopeGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.cx
    }
}

impl Drop for ScopeGuard<'_, '_> {
    fn drop(&mut self) {
        self.cx.scopes.truncate(self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn local(var: u32, name: &str) -> VisibleLocal {
        VisibleLocal {
            var: VarId(var),
            name: name.to_string(),
            ty: Ty::Int,
            span: Span::synthetic(FileId(0)),
            mutable: false,
        }
    }

    #[test]
    fn guards_pop_in_lifo_order() {
        let symbols = SymbolTable::default();
        let mut cx = TraversalContext::new(&symbols, IdAllocator::new());
        {
            let mut class = cx.enter(Frame::class(DeclId(1)));
            assert_eq!(class.scopes.current_class(), Some(DeclId(1)));
            {
                let function = class.enter(Frame::function(DeclId(2), Vec::new()));
                assert_eq!(function.scopes.current_function(), Some(DeclId(2)));
                assert_eq!(function.scopes.depth(), 2);
            }
            assert_eq!(class.scopes.current_function(), None);
        }
        assert!(cx.scopes.is_empty());
    }

    #[test]
    fn early_return_keeps_the_stack_balanced() {
        fn failing(cx: &mut TraversalContext<'_>) -> Result<()> {
            let mut cx = cx.enter(Frame::function(DeclId(3), Vec::new()));
            let _body = cx.enter(Frame::body());
            Err(Error::InvalidState("boom".into()))
        }

        let symbols = SymbolTable::default();
        let mut cx = TraversalContext::new(&symbols, IdAllocator::new());
        assert!(failing(&mut cx).is_err());
        assert!(cx.scopes.is_empty());
    }

    #[test]
    fn initializer_reports_its_class_and_class_frames_hide_outer_functions() {
        let mut scopes = ScopeStack::new();
        scopes.push(Frame::function(DeclId(1), Vec::new()));
        scopes.push(Frame::class(DeclId(2)));
        assert_eq!(scopes.current_executable(), None);
        assert!(scopes.require_executable().is_err());

        scopes.push(Frame::initializer(DeclId(3)));
        scopes.push(Frame::body());
        assert_eq!(
            scopes.current_executable(),
            Some(Executable::Initializer {
                id: DeclId(3),
                class: Some(DeclId(2)),
            })
        );
        assert_eq!(scopes.current_initializer(), Some(DeclId(3)));
        assert_eq!(scopes.current_function(), None);
        assert_eq!(scopes.declarations().collect::<Vec<_>>(), vec![DeclId(1), DeclId(2)]);
    }

    #[test]
    fn visible_locals_stop_at_the_innermost_executable() {
        let mut scopes = ScopeStack::new();
        scopes.push(Frame::function(DeclId(1), vec![local(0, "outer")]));
        scopes.push(Frame::body());
        scopes.declare_local(local(1, "a"));
        scopes.push(Frame::function(DeclId(2), vec![local(2, "p")]));
        scopes.push(Frame::body());
        scopes.declare_local(local(3, "b"));
        let names: Vec<&str> = scopes
            .visible_locals()
            .into_iter()
            .map(|local| local.name.as_str())
            .collect();
        assert_eq!(names, vec!["p", "b"]);

        scopes.pop();
        scopes.pop();
        let names: Vec<&str> = scopes
            .visible_locals()
            .into_iter()
            .map(|local| local.name.as_str())
            .collect();
        assert_eq!(names, vec!["outer", "a"]);
    }
}
