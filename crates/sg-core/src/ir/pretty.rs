//! Pseudo-source rendering of the IR, for the CLI and debug logs.

use crate::descriptors::DescriptorRef;
use crate::ir::{
    Annotation, AnnotationArg, Block, Body, Const, Decl, DeclKind, Expr, ExprKind, File,
    FunctionKind, Module, ReturnTarget, Stmt, SymbolTable,
};
use itertools::Itertools;
use std::fmt::{self, Formatter};

/// Configuration for pretty-printing the IR.
#[derive(Debug, Clone)]
pub struct PrettyOptions {
    /// Number of spaces to indent per nesting level.
    pub indent_size: usize,
    /// Include span metadata.
    pub show_spans: bool,
    /// Include static types of expressions.
    pub show_types: bool,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            indent_size: 4,
            show_spans: false,
            show_types: false,
        }
    }
}

/// Formatting context shared across pretty printers.
pub struct PrettyCtx<'a> {
    pub options: &'a PrettyOptions,
    symbols: Option<&'a SymbolTable>,
    indent: usize,
}

impl<'a> PrettyCtx<'a> {
    pub fn new(options: &'a PrettyOptions, symbols: Option<&'a SymbolTable>) -> Self {
        Self {
            options,
            symbols,
            indent: 0,
        }
    }

    pub fn write_indent(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:width$}", "", width = self.indent)
    }

    pub fn writeln(&self, f: &mut Formatter<'_>, line: impl AsRef<str>) -> fmt::Result {
        self.write_indent(f)?;
        writeln!(f, "{}", line.as_ref())
    }

    pub fn with_indent<F>(&mut self, mut f_closure: F) -> fmt::Result
    where
        F: FnMut(&mut Self) -> fmt::Result,
    {
        self.indent += self.options.indent_size;
        let result = f_closure(self);
        self.indent = self.indent.saturating_sub(self.options.indent_size);
        result
    }

    fn name_of(&self, id: crate::ir::DeclId) -> String {
        self.symbols
            .and_then(|symbols| symbols.get(id))
            .map(|symbol| symbol.fq_name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

/// Trait implemented by IR nodes that support pretty-printing.
pub trait PrettyPrintable {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result;
}

/// Helper wrapper implementing `Display` by delegating to `PrettyPrintable`.
pub struct PrettyDisplay<'a, T> {
    value: &'a T,
    options: PrettyOptions,
    symbols: Option<&'a SymbolTable>,
}

impl<'a, T> PrettyDisplay<'a, T> {
    pub fn with_symbols(mut self, symbols: &'a SymbolTable) -> Self {
        self.symbols = Some(symbols);
        self
    }
}

impl<T> fmt::Display for PrettyDisplay<'_, T>
where
    T: PrettyPrintable,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut ctx = PrettyCtx::new(&self.options, self.symbols);
        self.value.fmt_pretty(f, &mut ctx)
    }
}

/// Convenience helper to build a `PrettyDisplay` wrapper.
pub fn pretty<T>(value: &T, options: PrettyOptions) -> PrettyDisplay<'_, T>
where
    T: PrettyPrintable,
{
    PrettyDisplay {
        value,
        options,
        symbols: None,
    }
}

pub fn escape_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

impl PrettyPrintable for Module {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        ctx.writeln(f, format!("module {}", self.name))?;
        for file in &self.files {
            file.fmt_pretty(f, ctx)?;
        }
        Ok(())
    }
}

impl PrettyPrintable for File {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        ctx.writeln(f, format!("// file {} (package {})", self.path, self.package))?;
        for decl in &self.declarations {
            decl.fmt_pretty(f, ctx)?;
        }
        Ok(())
    }
}

fn fmt_annotation(annotation: &Annotation) -> String {
    if annotation.arguments.is_empty() {
        return format!("@{}", annotation.class);
    }
    let args = annotation
        .arguments
        .iter()
        .map(|arg| format!("{} = {}", arg.name, fmt_annotation_arg(&arg.value)))
        .join(", ");
    format!("@{}({})", annotation.class, args)
}

fn fmt_annotation_arg(arg: &AnnotationArg) -> String {
    match arg {
        AnnotationArg::Const(value) => fmt_const(value),
        AnnotationArg::Type(ty) => format!("{ty}::class"),
        AnnotationArg::Array(values) => {
            format!("[{}]", values.iter().map(fmt_annotation_arg).join(", "))
        }
    }
}

fn fmt_const(value: &Const) -> String {
    match value {
        Const::Null => "null".to_string(),
        Const::Unit => "Unit".to_string(),
        Const::Boolean(value) => value.to_string(),
        Const::Int(value) => value.to_string(),
        Const::Long(value) => format!("{value}L"),
        Const::String(value) => format!("\"{}\"", escape_string(value)),
    }
}

impl PrettyPrintable for Decl {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        for annotation in &self.annotations {
            ctx.writeln(f, fmt_annotation(annotation))?;
        }
        let span = if ctx.options.show_spans {
            format!(" // {}", self.span)
        } else {
            String::new()
        };
        match &self.kind {
            DeclKind::Class(class) => {
                let kind = format!("{:?}", class.kind).to_lowercase();
                ctx.writeln(f, format!("{kind} {} {{{span}", class.name))?;
                ctx.with_indent(|ctx| {
                    for member in &class.members {
                        member.fmt_pretty(f, ctx)?;
                    }
                    Ok(())
                })?;
                ctx.writeln(f, "}")
            }
            DeclKind::Function(function) => {
                let keyword = match function.kind {
                    FunctionKind::Constructor { primary: true } => "constructor /*primary*/",
                    FunctionKind::Constructor { primary: false } => "constructor",
                    FunctionKind::Lambda => "lambda",
                    _ => "fun",
                };
                let params = function
                    .params
                    .iter()
                    .map(|param| match &param.default {
                        Some(default) => format!(
                            "{}: {} = {}",
                            param.name,
                            param.ty,
                            ExprDisplay(default, ctx.options, ctx.symbols)
                        ),
                        None => format!("{}: {}", param.name, param.ty),
                    })
                    .join(", ");
                let suspend = if function.is_suspend { "suspend " } else { "" };
                let header = format!(
                    "{suspend}{keyword} {}({params}): {}",
                    function.name, function.return_ty
                );
                match &function.body {
                    None => ctx.writeln(f, format!("{header}{span}")),
                    Some(Body::Expression(expr)) => {
                        ctx.write_indent(f)?;
                        write!(f, "{header} = ")?;
                        expr.fmt_pretty(f, ctx)?;
                        writeln!(f, "{span}")
                    }
                    Some(Body::Block(block)) => {
                        ctx.write_indent(f)?;
                        write!(f, "{header} ")?;
                        fmt_block(block, f, ctx)?;
                        writeln!(f, "{span}")
                    }
                }
            }
            DeclKind::Property(property) => {
                let keyword = if property.mutable { "var" } else { "val" };
                ctx.writeln(f, format!("{keyword} {} {{{span}", property.name))?;
                ctx.with_indent(|ctx| {
                    for accessor in [&property.backing_field, &property.getter, &property.setter]
                        .into_iter()
                        .flatten()
                    {
                        accessor.fmt_pretty(f, ctx)?;
                    }
                    Ok(())
                })?;
                ctx.writeln(f, "}")
            }
            DeclKind::Field(field) => {
                ctx.write_indent(f)?;
                write!(f, "field {}: {}", field.name, field.ty)?;
                if let Some(init) = &field.initializer {
                    write!(f, " = ")?;
                    init.fmt_pretty(f, ctx)?;
                }
                writeln!(f, "{span}")
            }
            DeclKind::Initializer(init) => {
                ctx.write_indent(f)?;
                write!(f, "init ")?;
                fmt_block(&init.body, f, ctx)?;
                writeln!(f, "{span}")
            }
        }
    }
}

fn fmt_block(block: &Block, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
    writeln!(f, "{{")?;
    ctx.with_indent(|ctx| {
        for stmt in &block.stmts {
            match stmt {
                Stmt::Expr(expr) => {
                    ctx.write_indent(f)?;
                    expr.fmt_pretty(f, ctx)?;
                    writeln!(f)?;
                }
                Stmt::Var(var) => {
                    ctx.write_indent(f)?;
                    let keyword = if var.mutable { "var" } else { "val" };
                    write!(f, "{keyword} {}#{}: {}", var.name, var.id, var.ty)?;
                    if let Some(init) = &var.init {
                        write!(f, " = ")?;
                        init.fmt_pretty(f, ctx)?;
                    }
                    writeln!(f)?;
                }
                Stmt::Decl(decl) => decl.fmt_pretty(f, ctx)?,
            }
        }
        Ok(())
    })?;
    ctx.write_indent(f)?;
    write!(f, "}}")
}

struct ExprDisplay<'a>(&'a Expr, &'a PrettyOptions, Option<&'a SymbolTable>);

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut ctx = PrettyCtx::new(self.1, self.2);
        self.0.fmt_pretty(f, &mut ctx)
    }
}

fn fmt_descriptor(descriptor: &DescriptorRef) -> String {
    match descriptor {
        DescriptorRef::Location(handle) => format!("<location {}>", handle.index()),
        DescriptorRef::Type(handle) => format!("<type {}>", handle.index()),
        DescriptorRef::Class(handle) => format!("<class {}>", handle.index()),
        DescriptorRef::Function(handle) => format!("<function {}>", handle.index()),
        DescriptorRef::Property(handle) => format!("<property {}>", handle.index()),
        DescriptorRef::Field(handle) => format!("<field {}>", handle.index()),
        DescriptorRef::Local(handle) => format!("<local {}>", handle.index()),
        DescriptorRef::Parameter(handle) => format!("<parameter {}>", handle.index()),
    }
}

impl PrettyPrintable for Expr {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Const(value) => write!(f, "{}", fmt_const(value))?,
            ExprKind::GetVar(var) => write!(f, "{var}")?,
            ExprKind::SetVar(set) => {
                write!(f, "{} = ", set.var)?;
                set.value.fmt_pretty(f, ctx)?;
            }
            ExprKind::Call(call) => {
                if let Some(receiver) = &call.receiver {
                    receiver.fmt_pretty(f, ctx)?;
                    write!(f, ".")?;
                }
                write!(f, "{}", ctx.name_of(call.callee))?;
                if !call.type_args.is_empty() {
                    write!(f, "<{}>", call.type_args.iter().join(", "))?;
                }
                write!(f, "(")?;
                for (idx, arg) in call.args.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    match arg {
                        Some(arg) => arg.fmt_pretty(f, ctx)?,
                        None => write!(f, "_")?,
                    }
                }
                write!(f, ")")?;
            }
            ExprKind::FunctionReference(id) | ExprKind::PropertyReference(id) => {
                write!(f, "::{}", ctx.name_of(*id))?
            }
            ExprKind::Block(block) => fmt_block(block, f, ctx)?,
            ExprKind::ReturnableBlock(block) => {
                write!(f, "{}@", block.id)?;
                fmt_block(&block.block, f, ctx)?;
            }
            ExprKind::Return(ret) => {
                match ret.target {
                    ReturnTarget::Function(id) => write!(f, "return@{} ", ctx.name_of(id))?,
                    ReturnTarget::Block(id) => write!(f, "return@{id} ")?,
                }
                ret.value.fmt_pretty(f, ctx)?;
            }
            ExprKind::When(when) => {
                writeln!(f, "when {{")?;
                ctx.with_indent(|ctx| {
                    for branch in &when.branches {
                        ctx.write_indent(f)?;
                        branch.condition.fmt_pretty(f, ctx)?;
                        write!(f, " -> ")?;
                        branch.result.fmt_pretty(f, ctx)?;
                        writeln!(f)?;
                    }
                    if let Some(otherwise) = &when.otherwise {
                        ctx.write_indent(f)?;
                        write!(f, "else -> ")?;
                        otherwise.fmt_pretty(f, ctx)?;
                        writeln!(f)?;
                    }
                    Ok(())
                })?;
                ctx.write_indent(f)?;
                write!(f, "}}")?;
            }
            ExprKind::While(looped) => {
                write!(f, "while (")?;
                looped.condition.fmt_pretty(f, ctx)?;
                write!(f, ") ")?;
                looped.body.fmt_pretty(f, ctx)?;
            }
            ExprKind::Binary(binary) => {
                write!(f, "(")?;
                binary.lhs.fmt_pretty(f, ctx)?;
                write!(f, " {} ", binary.op.symbol())?;
                binary.rhs.fmt_pretty(f, ctx)?;
                write!(f, ")")?;
            }
            ExprKind::Not(inner) => {
                write!(f, "!")?;
                inner.fmt_pretty(f, ctx)?;
            }
            ExprKind::StringConcat(parts) => {
                write!(f, "concat(")?;
                for (idx, part) in parts.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    part.fmt_pretty(f, ctx)?;
                }
                write!(f, ")")?;
            }
            ExprKind::Lambda(decl) => {
                writeln!(f, "{{")?;
                ctx.with_indent(|ctx| decl.fmt_pretty(f, ctx))?;
                ctx.write_indent(f)?;
                write!(f, "}}")?;
            }
            ExprKind::Descriptor(descriptor) => write!(f, "{}", fmt_descriptor(descriptor))?,
            ExprKind::CaptureFrame(capture) => write!(
                f,
                "<snapshot [{}]>",
                capture.entries.iter().map(|entry| entry.var).join(", ")
            )?,
        }
        if ctx.options.show_types {
            write!(f, " /*: {}*/", self.ty)?;
        }
        Ok(())
    }
}
