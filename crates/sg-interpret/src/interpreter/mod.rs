//! Tree-walking evaluator over the IR.

mod env;
mod operators;

use crate::error::{interpretation_error, interpretation_error_with_span};
use crate::host::HostFunctions;
use crate::value::Value;
use crate::{interp_bail, interp_ensure};
use env::Environment;
use itertools::Itertools;
use sg_core::descriptors::FrameSnapshot;
use sg_core::error::Result;
use sg_core::ir::visit::{walk_decl, Visitor};
use sg_core::ir::{
    BinOp, Block, Body, Decl, DeclId, Expr, ExprKind, FunctionDecl, Module, ReturnTarget, Stmt,
    SymbolTable, Ty,
};
use sg_core::span::Span;
use std::collections::HashMap;
use std::sync::Arc;

const MAX_CALL_DEPTH: usize = 512;

/// Result of evaluating a node: a value, or a `return` unwinding to its target.
#[derive(Debug)]
enum Flow {
    Value(Value),
    Return(ReturnTarget, Value),
}

/// Evaluate to a value, or propagate an unwinding `return` out of the caller.
macro_rules! value {
    ($flow:expr) => {
        match $flow? {
            Flow::Value(value) => value,
            other => return Ok(other),
        }
    };
}

struct DeclIndex<'m>(HashMap<DeclId, &'m Decl>);

impl<'m> Visitor<'m> for DeclIndex<'m> {
    fn visit_decl(&mut self, decl: &'m Decl) {
        self.0.insert(decl.id, decl);
        walk_decl(self, decl)
    }
}

pub struct Interpreter<'m> {
    decls: HashMap<DeclId, &'m Decl>,
    symbols: SymbolTable,
    host: HostFunctions,
    frames: Vec<Environment>,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m Module) -> Self {
        let mut index = DeclIndex(HashMap::new());
        for file in module.files.iter().chain(module.external.iter()) {
            for decl in &file.declarations {
                index.visit_decl(decl);
            }
        }
        Self {
            decls: index.0,
            symbols: SymbolTable::build(module),
            host: HostFunctions::new(),
            frames: Vec::new(),
        }
    }

    pub fn with_host(mut self, host: HostFunctions) -> Self {
        self.host = host;
        self
    }

    pub fn host_mut(&mut self) -> &mut HostFunctions {
        &mut self.host
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn function_id(&self, fq_name: &str) -> Result<DeclId> {
        self.symbols
            .lookup_function(fq_name)
            .ok_or_else(|| interpretation_error(format!("no function named `{fq_name}`")))
    }

    /// Call a function by qualified name with every argument supplied.
    pub fn call_by_name(&mut self, fq_name: &str, args: Vec<Value>) -> Result<Value> {
        let id = self.function_id(fq_name)?;
        self.call(id, args)
    }

    pub fn call(&mut self, id: DeclId, args: Vec<Value>) -> Result<Value> {
        let span = self
            .decls
            .get(&id)
            .map_or_else(|| Span::undefined(Default::default()), |decl| decl.span);
        self.invoke(id, args.into_iter().map(Some).collect(), span)
    }

    fn env(&self) -> Result<&Environment> {
        self.frames
            .last()
            .ok_or_else(|| interpretation_error("no active call frame"))
    }

    fn env_mut(&mut self) -> Result<&mut Environment> {
        self.frames
            .last_mut()
            .ok_or_else(|| interpretation_error("no active call frame"))
    }

    fn invoke(&mut self, id: DeclId, args: Vec<Option<Value>>, span: Span) -> Result<Value> {
        let Some(decl) = self.decls.get(&id).copied() else {
            interp_bail!(format!("call of unknown declaration {id}"), span);
        };
        let Some(function) = decl.as_function() else {
            interp_bail!(format!("{id} is not callable"), span);
        };
        let fq_name = self
            .symbols
            .get(id)
            .map_or_else(|| function.name.clone(), |symbol| symbol.fq_name.clone());

        if let Some(host) = self.host.get(&fq_name) {
            let args = args
                .into_iter()
                .enumerate()
                .map(|(index, arg)| {
                    arg.ok_or_else(|| {
                        interpretation_error_with_span(
                            format!("host function `{fq_name}` needs argument {index}"),
                            span,
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            sg_core::trace!("host call {}({})", fq_name, args.iter().join(", "));
            return host.call(&args);
        }

        let Some(body) = function.body.as_ref() else {
            interp_bail!(
                format!("`{fq_name}` has no body and no host function"),
                span
            );
        };
        interp_ensure!(
            self.frames.len() < MAX_CALL_DEPTH,
            format!("call depth limit reached calling `{fq_name}`"),
            span
        );
        self.frames.push(Environment::new());
        let result = self.run_function(id, function, body, args);
        self.frames.pop();
        result
    }

    fn run_function(
        &mut self,
        id: DeclId,
        function: &'m FunctionDecl,
        body: &'m Body,
        mut args: Vec<Option<Value>>,
    ) -> Result<Value> {
        for (index, param) in function.params.iter().enumerate() {
            let value = match args.get_mut(index).and_then(Option::take) {
                Some(value) => value,
                None => match &param.default {
                    Some(default) => self.eval_operand(default)?,
                    None => interp_bail!(format!(
                        "missing argument `{}` of `{}`",
                        param.name, function.name
                    )),
                },
            };
            self.env_mut()?.declare(param.id, value);
        }

        let flow = match body {
            Body::Block(block) => self.eval_block(block)?,
            Body::Expression(expr) => self.eval_expr(expr)?,
        };
        match flow {
            Flow::Value(_) if function.return_ty == Ty::Unit => Ok(Value::Unit),
            Flow::Value(value) => Ok(value),
            Flow::Return(ReturnTarget::Function(target), value) if target == id => Ok(value),
            Flow::Return(target, _) => Err(interpretation_error(format!(
                "return to {target:?} escaped `{}`",
                function.name
            ))),
        }
    }

    /// Evaluate an expression that cannot contain a `return` of its own.
    fn eval_operand(&mut self, expr: &'m Expr) -> Result<Value> {
        match self.eval_expr(expr)? {
            Flow::Value(value) => Ok(value),
            Flow::Return(..) => Err(interpretation_error_with_span(
                "return is not allowed here",
                expr.span,
            )),
        }
    }

    fn eval_block(&mut self, block: &'m Block) -> Result<Flow> {
        self.env_mut()?.push_scope();
        let result = self.eval_stmts(&block.stmts);
        self.env_mut()?.pop_scope();
        result
    }

    fn eval_stmts(&mut self, stmts: &'m [Stmt]) -> Result<Flow> {
        let mut last = Value::Unit;
        for stmt in stmts {
            last = match stmt {
                Stmt::Expr(expr) => value!(self.eval_expr(expr)),
                Stmt::Var(var) => {
                    let value = match &var.init {
                        Some(init) => value!(self.eval_expr(init)),
                        None => Value::Null,
                    };
                    self.env_mut()?.declare(var.id, value);
                    Value::Unit
                }
                Stmt::Decl(_) => Value::Unit,
            };
        }
        Ok(Flow::Value(last))
    }

    fn eval_expr(&mut self, expr: &'m Expr) -> Result<Flow> {
        let value = match &expr.kind {
            ExprKind::Const(value) => Value::from(value),
            ExprKind::GetVar(var) => match self.env()?.lookup(*var) {
                Some(value) => value.clone(),
                None => interp_bail!(format!("read of unbound variable {var}"), expr.span),
            },
            ExprKind::SetVar(set) => {
                let value = value!(self.eval_expr(&set.value));
                interp_ensure!(
                    self.env_mut()?.assign(set.var, value),
                    format!("write to unbound variable {}", set.var),
                    expr.span
                );
                Value::Unit
            }
            ExprKind::Call(call) => {
                if let Some(receiver) = &call.receiver {
                    value!(self.eval_expr(receiver));
                }
                let mut args = Vec::with_capacity(call.args.len());
                for arg in &call.args {
                    args.push(match arg {
                        Some(arg) => Some(value!(self.eval_expr(arg))),
                        None => None,
                    });
                }
                self.invoke(call.callee, args, expr.span)?
            }
            ExprKind::FunctionReference(_) | ExprKind::PropertyReference(_) => {
                interp_bail!("references are not first-class values", expr.span)
            }
            ExprKind::Block(block) => return self.eval_block(block),
            ExprKind::ReturnableBlock(returnable) => {
                return match self.eval_block(&returnable.block)? {
                    Flow::Return(ReturnTarget::Block(id), value) if id == returnable.id => {
                        Ok(Flow::Value(value))
                    }
                    other => Ok(other),
                }
            }
            ExprKind::Return(ret) => {
                let value = value!(self.eval_expr(&ret.value));
                return Ok(Flow::Return(ret.target, value));
            }
            ExprKind::When(when) => {
                for branch in &when.branches {
                    if value!(self.eval_expr(&branch.condition)).as_bool()? {
                        return self.eval_expr(&branch.result);
                    }
                }
                match &when.otherwise {
                    Some(otherwise) => return self.eval_expr(otherwise),
                    None => Value::Unit,
                }
            }
            ExprKind::While(looped) => {
                while value!(self.eval_expr(&looped.condition)).as_bool()? {
                    value!(self.eval_expr(&looped.body));
                }
                Value::Unit
            }
            ExprKind::Binary(binary) => match binary.op {
                BinOp::And => {
                    let lhs = value!(self.eval_expr(&binary.lhs)).as_bool()?;
                    Value::Bool(lhs && value!(self.eval_expr(&binary.rhs)).as_bool()?)
                }
                BinOp::Or => {
                    let lhs = value!(self.eval_expr(&binary.lhs)).as_bool()?;
                    Value::Bool(lhs || value!(self.eval_expr(&binary.rhs)).as_bool()?)
                }
                op => {
                    let lhs = value!(self.eval_expr(&binary.lhs));
                    let rhs = value!(self.eval_expr(&binary.rhs));
                    operators::evaluate_binop(op, lhs, rhs)?
                }
            },
            ExprKind::Not(inner) => Value::Bool(!value!(self.eval_expr(inner)).as_bool()?),
            ExprKind::StringConcat(parts) => {
                let mut text = String::new();
                for part in parts {
                    text.push_str(&value!(self.eval_expr(part)).to_string());
                }
                Value::String(text)
            }
            ExprKind::Lambda(_) => interp_bail!("lambdas are not supported", expr.span),
            ExprKind::Descriptor(descriptor) => Value::Descriptor(*descriptor),
            ExprKind::CaptureFrame(capture) => {
                let env = self.env()?;
                let mut snapshot = FrameSnapshot::new(capture.location);
                for entry in &capture.entries {
                    let Some(value) = env.lookup(entry.var) else {
                        interp_bail!(
                            format!("captured variable {} is not bound", entry.var),
                            expr.span
                        );
                    };
                    snapshot.push(entry.local, value.clone());
                }
                Value::Snapshot(Arc::new(snapshot))
            }
        };
        Ok(Flow::Value(value))
    }
}
