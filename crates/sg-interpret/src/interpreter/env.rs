use crate::value::Value;
use sg_core::ir::VarId;
use std::collections::HashMap;

/// Variables of one function activation; the innermost lexical scope is last.
#[derive(Debug)]
pub(super) struct Environment {
    scopes: Vec<HashMap<VarId, Value>>,
}

impl Environment {
    pub(super) fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub(super) fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub(super) fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub(super) fn declare(&mut self, var: VarId, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(var, value);
        }
    }

    pub(super) fn lookup(&self, var: VarId) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&var))
    }

    /// Overwrite the innermost binding of `var`; false if it is not bound.
    pub(super) fn assign(&mut self, var: VarId, value: Value) -> bool {
        match self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(&var))
        {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}
