//! Declaration index over a module: the read-only metadata view passes use to
//! resolve callees, hooks and descriptor inputs.

use crate::ir::visit::{self, Visitor};
use crate::ir::{
    Annotation, Body, ClassKind, Decl, DeclId, DeclKind, FunctionKind, Modality, Module, Origin,
    StructuralKind, Ty, VarDecl, VarId, Visibility,
};
use crate::span::{FileId, Span};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct FileSymbol {
    pub path: String,
    pub package: String,
    pub external: bool,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: DeclId,
    pub parent: Option<DeclId>,
    pub file: FileId,
    pub fq_name: String,
    pub name: String,
    pub span: Span,
    pub origin: Origin,
    pub annotations: Vec<Annotation>,
    pub external: bool,
    pub kind: SymbolKind,
}

#[derive(Debug, Clone)]
pub enum SymbolKind {
    Class(ClassSymbol),
    Function(FunctionSymbol),
    Property(PropertySymbol),
    Field(FieldSymbol),
    Initializer,
}

#[derive(Debug, Clone)]
pub struct ClassSymbol {
    pub kind: ClassKind,
    pub is_companion: bool,
    pub structural: Option<StructuralKind>,
    pub visibility: Visibility,
    pub modality: Modality,
    pub type_params: Vec<String>,
    pub members: Vec<DeclId>,
    pub primary_constructor: Option<DeclId>,
}

#[derive(Debug, Clone)]
pub struct ParamSymbol {
    pub id: VarId,
    pub name: String,
    pub ty: Ty,
    pub span: Span,
    pub annotations: Vec<Annotation>,
    pub has_default: bool,
}

#[derive(Debug, Clone)]
pub struct LocalSymbol {
    pub id: VarId,
    pub name: String,
    pub ty: Ty,
    pub mutable: bool,
    pub span: Span,
    pub annotations: Vec<Annotation>,
}

impl From<&VarDecl> for LocalSymbol {
    fn from(var: &VarDecl) -> Self {
        Self {
            id: var.id,
            name: var.name.clone(),
            ty: var.ty.clone(),
            mutable: var.mutable,
            span: var.span,
            annotations: var.annotations.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    pub kind: FunctionKind,
    pub visibility: Visibility,
    pub modality: Modality,
    pub type_params: Vec<String>,
    pub params: Vec<ParamSymbol>,
    pub return_ty: Ty,
    pub is_suspend: bool,
    pub is_expect: bool,
    pub has_body: bool,
    /// Locals declared directly in the body, excluding nested functions and lambdas.
    pub locals: Vec<LocalSymbol>,
}

impl FunctionSymbol {
    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, FunctionKind::Constructor { .. })
    }
}

#[derive(Debug, Clone)]
pub struct PropertySymbol {
    pub mutable: bool,
    pub visibility: Visibility,
    pub modality: Modality,
    pub getter: Option<DeclId>,
    pub setter: Option<DeclId>,
    pub backing_field: Option<DeclId>,
}

#[derive(Debug, Clone)]
pub struct FieldSymbol {
    pub ty: Ty,
    pub is_static: bool,
    pub is_external: bool,
    pub is_final: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    module_name: String,
    symbols: HashMap<DeclId, Symbol>,
    by_name: HashMap<String, Vec<DeclId>>,
    files: HashMap<FileId, FileSymbol>,
}

impl SymbolTable {
    pub fn build(module: &Module) -> Self {
        let mut table = SymbolTable {
            module_name: module.name.clone(),
            ..SymbolTable::default()
        };
        let sources = module.files.iter().map(|file| (file, false));
        let externals = module.external.iter().map(|file| (file, true));
        for (file, external) in sources.chain(externals) {
            table.files.insert(
                file.id,
                FileSymbol {
                    path: file.path.clone(),
                    package: file.package.clone(),
                    external,
                },
            );
            let mut builder = TableBuilder {
                table: &mut table,
                file: file.id,
                external,
            };
            for decl in &file.declarations {
                builder.add(decl, None, &file.package);
            }
        }
        debug!(
            "indexed {} declarations of module {}",
            table.symbols.len(),
            table.module_name
        );
        table
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, id: DeclId) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    pub fn file(&self, id: FileId) -> Option<&FileSymbol> {
        self.files.get(&id)
    }

    pub fn function(&self, id: DeclId) -> Option<(&Symbol, &FunctionSymbol)> {
        let symbol = self.symbols.get(&id)?;
        match &symbol.kind {
            SymbolKind::Function(function) => Some((symbol, function)),
            _ => None,
        }
    }

    pub fn class(&self, id: DeclId) -> Option<(&Symbol, &ClassSymbol)> {
        let symbol = self.symbols.get(&id)?;
        match &symbol.kind {
            SymbolKind::Class(class) => Some((symbol, class)),
            _ => None,
        }
    }

    pub fn property(&self, id: DeclId) -> Option<(&Symbol, &PropertySymbol)> {
        let symbol = self.symbols.get(&id)?;
        match &symbol.kind {
            SymbolKind::Property(property) => Some((symbol, property)),
            _ => None,
        }
    }

    pub fn field(&self, id: DeclId) -> Option<(&Symbol, &FieldSymbol)> {
        let symbol = self.symbols.get(&id)?;
        match &symbol.kind {
            SymbolKind::Field(field) => Some((symbol, field)),
            _ => None,
        }
    }

    pub fn lookup(&self, fq_name: &str) -> &[DeclId] {
        self.by_name.get(fq_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn lookup_function(&self, fq_name: &str) -> Option<DeclId> {
        self.lookup(fq_name)
            .iter()
            .copied()
            .find(|id| self.function(*id).is_some())
    }

    pub fn lookup_class(&self, fq_name: &str) -> Option<DeclId> {
        self.lookup(fq_name)
            .iter()
            .copied()
            .find(|id| self.class(*id).is_some())
    }

    /// Parents of `id`, innermost first.
    pub fn ancestors(&self, id: DeclId) -> impl Iterator<Item = &Symbol> + '_ {
        let mut next = self.get(id).and_then(|symbol| symbol.parent);
        std::iter::from_fn(move || {
            let symbol = self.get(next?)?;
            next = symbol.parent;
            Some(symbol)
        })
    }

    /// Innermost class that declares `id`, directly or through nested declarations.
    pub fn enclosing_class(&self, id: DeclId) -> Option<DeclId> {
        self.ancestors(id)
            .find(|symbol| matches!(symbol.kind, SymbolKind::Class(_)))
            .map(|symbol| symbol.id)
    }

    /// All symbols ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        let mut symbols: Vec<&Symbol> = self.symbols.values().collect();
        symbols.sort_by_key(|symbol| symbol.id);
        symbols.into_iter()
    }
}

struct TableBuilder<'t> {
    table: &'t mut SymbolTable,
    file: FileId,
    external: bool,
}

impl TableBuilder<'_> {
    fn add(&mut self, decl: &Decl, parent: Option<DeclId>, prefix: &str) {
        let name = symbol_name(decl);
        let fq_name = qualify(prefix, &name);
        let kind = match &decl.kind {
            DeclKind::Class(class) => {
                for member in &class.members {
                    self.add(member, Some(decl.id), &fq_name);
                }
                let primary_constructor = class
                    .members
                    .iter()
                    .find(|member| {
                        member
                            .as_function()
                            .is_some_and(|function| function.is_primary_constructor())
                    })
                    .map(|member| member.id);
                SymbolKind::Class(ClassSymbol {
                    kind: class.kind,
                    is_companion: class.is_companion,
                    structural: class.structural,
                    visibility: class.visibility,
                    modality: class.modality,
                    type_params: class.type_params.clone(),
                    members: class.members.iter().map(|member| member.id).collect(),
                    primary_constructor,
                })
            }
            DeclKind::Function(function) => {
                let mut scan = BodyScan::default();
                for param in &function.params {
                    if let Some(default) = &param.default {
                        scan.nested_only = true;
                        scan.visit_expr(default);
                    }
                }
                scan.nested_only = false;
                match &function.body {
                    Some(Body::Block(block)) => visit::walk_block(&mut scan, block),
                    Some(Body::Expression(expr)) => scan.visit_expr(expr),
                    None => {}
                }
                for nested in &scan.nested {
                    self.add(nested, Some(decl.id), &fq_name);
                }
                SymbolKind::Function(FunctionSymbol {
                    kind: function.kind,
                    visibility: function.visibility,
                    modality: function.modality,
                    type_params: function.type_params.clone(),
                    params: function
                        .params
                        .iter()
                        .map(|param| ParamSymbol {
                            id: param.id,
                            name: param.name.clone(),
                            ty: param.ty.clone(),
                            span: param.span,
                            annotations: param.annotations.clone(),
                            has_default: param.default.is_some(),
                        })
                        .collect(),
                    return_ty: function.return_ty.clone(),
                    is_suspend: function.is_suspend,
                    is_expect: function.is_expect,
                    has_body: function.body.is_some(),
                    locals: scan.locals,
                })
            }
            DeclKind::Property(property) => {
                let mut accessor_id = |slot: &Option<Box<Decl>>| {
                    slot.as_deref().map(|accessor| {
                        self.add(accessor, Some(decl.id), prefix);
                        accessor.id
                    })
                };
                let backing_field = accessor_id(&property.backing_field);
                let getter = accessor_id(&property.getter);
                let setter = accessor_id(&property.setter);
                SymbolKind::Property(PropertySymbol {
                    mutable: property.mutable,
                    visibility: property.visibility,
                    modality: property.modality,
                    getter,
                    setter,
                    backing_field,
                })
            }
            DeclKind::Field(field) => {
                if let Some(init) = &field.initializer {
                    let mut scan = BodyScan {
                        nested_only: true,
                        ..BodyScan::default()
                    };
                    scan.visit_expr(init);
                    for nested in &scan.nested {
                        self.add(nested, Some(decl.id), &fq_name);
                    }
                }
                SymbolKind::Field(FieldSymbol {
                    ty: field.ty.clone(),
                    is_static: field.is_static,
                    is_external: field.is_external,
                    is_final: field.is_final,
                })
            }
            DeclKind::Initializer(init) => {
                let mut scan = BodyScan::default();
                visit::walk_block(&mut scan, &init.body);
                for nested in &scan.nested {
                    self.add(nested, Some(decl.id), &fq_name);
                }
                SymbolKind::Initializer
            }
        };

        let symbol = Symbol {
            id: decl.id,
            parent,
            file: self.file,
            fq_name: fq_name.clone(),
            name,
            span: decl.span,
            origin: decl.origin,
            annotations: decl.annotations.clone(),
            external: self.external,
            kind,
        };
        self.table.by_name.entry(fq_name).or_default().push(decl.id);
        self.table.symbols.insert(decl.id, symbol);
    }
}

fn symbol_name(decl: &Decl) -> String {
    match &decl.kind {
        DeclKind::Class(class) if class.kind == ClassKind::AnonymousObject => {
            "<anonymous>".to_string()
        }
        DeclKind::Function(function) => match function.kind {
            FunctionKind::Constructor { .. } => "<init>".to_string(),
            FunctionKind::Lambda => "<anonymous>".to_string(),
            _ => function.name.clone(),
        },
        DeclKind::Initializer(_) => "<init-block>".to_string(),
        _ => decl.name().unwrap_or_default().to_string(),
    }
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Collects the locals of one body and the declarations nested in it, without
/// descending into those declarations.
#[derive(Default)]
struct BodyScan<'ir> {
    nested_only: bool,
    locals: Vec<LocalSymbol>,
    nested: Vec<&'ir Decl>,
}

impl<'ir> Visitor<'ir> for BodyScan<'ir> {
    fn visit_decl(&mut self, decl: &'ir Decl) {
        self.nested.push(decl);
    }

    fn visit_var(&mut self, var: &'ir VarDecl) {
        if !self.nested_only {
            self.locals.push(LocalSymbol::from(var));
        }
        visit::walk_var(self, var)
    }
}
