//! Builds descriptors for declarations of the module being transformed.
//!
//! Every request goes through the [`DescriptorStore`] arenas, so asking twice
//! for the same declaration yields the same handle. Builders may ask for
//! descriptors that are still under construction (a class and the functions
//! it declares refer to each other); the arena hands out the pending handle.

use crate::context::{Executable, VisibleLocal};
use crate::error::invalid_state;
use sg_core::descriptors::{
    stable_hash, AnnotationMap, AnnotationUsageInfo, AnnotationValue, ClassInfo, DescriptorStore,
    FieldInfo, FieldKey, FunctionInfo, FunctionKey, Handle, LocalInfo, ParameterInfo, PropertyInfo,
    PropertyKey, SourceLocation, TypeInfo, VariableKey,
};
use sg_core::error::Result;
use sg_core::ir::{
    Annotation, AnnotationArg, CapturedLocal, ClassKind, Const, DeclId, FrameCapture, FunctionKind,
    LocalSymbol, Modality, Origin, ParamSymbol, Symbol, SymbolKind, SymbolTable, Ty, Visibility,
};
use sg_core::source_map::{LineColumn, SourceCache};
use sg_core::span::{FileId, Span};
use std::collections::BTreeMap;
use std::path::Path;

/// Inputs of a local-variable descriptor.
#[derive(Debug, Clone, Copy)]
pub struct VariableSite<'s> {
    pub name: &'s str,
    pub ty: &'s Ty,
    pub span: Span,
    pub mutable: bool,
    pub annotations: &'s [Annotation],
}

impl<'s> From<&'s VisibleLocal> for VariableSite<'s> {
    fn from(local: &'s VisibleLocal) -> Self {
        Self {
            name: &local.name,
            ty: &local.ty,
            span: local.span,
            mutable: local.mutable,
            annotations: &[],
        }
    }
}

impl<'s> From<&'s LocalSymbol> for VariableSite<'s> {
    fn from(local: &'s LocalSymbol) -> Self {
        Self {
            name: &local.name,
            ty: &local.ty,
            span: local.span,
            mutable: local.mutable,
            annotations: &local.annotations,
        }
    }
}

pub struct DescriptorFactory<'a> {
    store: &'a DescriptorStore,
    symbols: &'a SymbolTable,
    sources: &'a SourceCache,
    module: String,
}

impl<'a> DescriptorFactory<'a> {
    pub fn new(
        store: &'a DescriptorStore,
        symbols: &'a SymbolTable,
        sources: &'a SourceCache,
        module: impl Into<String>,
    ) -> Self {
        Self {
            store,
            symbols,
            sources,
            module: module.into(),
        }
    }

    pub fn store(&self) -> &'a DescriptorStore {
        self.store
    }

    pub fn symbols(&self) -> &'a SymbolTable {
        self.symbols
    }

    pub fn module_name(&self) -> &str {
        &self.module
    }

    pub fn file_path(&self, file: FileId) -> &'a str {
        self.symbols
            .file(file)
            .map(|file| file.path.as_str())
            .unwrap_or("")
    }

    pub fn position(&self, span: Span) -> LineColumn {
        self.sources
            .resolve(Path::new(self.file_path(span.file)), span.start, span.end)
    }

    pub fn location(&self, span: Span) -> Result<Handle<SourceLocation>> {
        self.location_at(span.file, self.position(span))
    }

    fn location_at(&self, file: FileId, position: LineColumn) -> Result<Handle<SourceLocation>> {
        self.store.location(SourceLocation::new(
            self.module.clone(),
            self.file_path(file),
            position,
        ))
    }

    fn undefined_location(&self) -> Result<Handle<SourceLocation>> {
        self.store.location(SourceLocation::new(
            self.module.clone(),
            "",
            LineColumn::UNDEFINED,
        ))
    }

    fn decl_location(&self, symbol: &Symbol) -> Result<Handle<SourceLocation>> {
        match symbol.origin {
            Origin::FakeOverride => self.location_at(symbol.file, LineColumn::FAKE_OVERRIDE),
            Origin::Library => self.location_at(symbol.file, LineColumn::UNDEFINED),
            Origin::Source | Origin::Synthetic => self.location(symbol.span),
        }
    }

    pub fn type_info(&self, ty: &Ty) -> Result<Handle<TypeInfo>> {
        self.store.types.get_or_create(ty.clone(), |_| {
            let declared = ty
                .class_name()
                .and_then(|name| self.symbols.lookup_class(name))
                .and_then(|id| self.symbols.get(id));
            let location = match declared {
                Some(symbol) => self.decl_location(symbol)?,
                None => self.undefined_location()?,
            };
            Ok(TypeInfo {
                handle: ty.clone(),
                qualified_name: ty.qualified_name(),
                simple_name: ty.simple_name(),
                location,
            })
        })
    }

    pub fn class_info(&self, id: DeclId) -> Result<Handle<ClassInfo>> {
        let (symbol, class) = self
            .symbols
            .class(id)
            .ok_or_else(|| invalid_state(format!("declaration {id} is not a class")))?;
        self.store
            .classes
            .get_or_create(symbol.fq_name.clone(), |_| {
                let mut companions = Vec::new();
                let mut functions = Vec::new();
                let mut properties = Vec::new();
                for member in &class.members {
                    match self.symbols.get(*member).map(|member| &member.kind) {
                        Some(SymbolKind::Class(nested)) if nested.is_companion => {
                            companions.push(self.class_info(*member)?)
                        }
                        Some(SymbolKind::Function(_)) => {
                            functions.push(self.function_info(*member)?)
                        }
                        Some(SymbolKind::Property(_)) => {
                            properties.push(self.property_info(*member)?)
                        }
                        _ => {}
                    }
                }
                Ok(ClassInfo {
                    location: self.decl_location(symbol)?,
                    qualified_name: symbol.fq_name.clone(),
                    simple_name: symbol.name.clone(),
                    type_parameters: class.type_params.clone(),
                    companions,
                    functions,
                    properties,
                    is_interface: class.kind == ClassKind::Interface,
                    is_object: matches!(class.kind, ClassKind::Object | ClassKind::AnonymousObject),
                    is_companion: class.is_companion,
                    visibility: class.visibility,
                    modality: class.modality,
                    structural_kind: class.structural,
                    annotations: self.annotations(&symbol.annotations)?,
                })
            })
    }

    /// Class descriptor of a type. Types without a class declaration in
    /// scope (builtins, unresolved library classes) get a member-less one.
    pub fn class_info_for_type(&self, ty: &Ty) -> Result<Handle<ClassInfo>> {
        if let Some(id) = ty.class_name().and_then(|name| self.symbols.lookup_class(name)) {
            return self.class_info(id);
        }
        let qualified_name = ty.qualified_name();
        self.store
            .classes
            .get_or_create(qualified_name.clone(), |_| {
                Ok(ClassInfo {
                    location: self.undefined_location()?,
                    simple_name: ty.simple_name(),
                    qualified_name,
                    type_parameters: Vec::new(),
                    companions: Vec::new(),
                    functions: Vec::new(),
                    properties: Vec::new(),
                    is_interface: false,
                    is_object: false,
                    is_companion: false,
                    visibility: Visibility::Public,
                    modality: Modality::Final,
                    structural_kind: None,
                    annotations: AnnotationMap::new(),
                })
            })
    }

    pub fn function_key(&self, id: DeclId) -> Result<FunctionKey> {
        let (symbol, function) = self
            .symbols
            .function(id)
            .ok_or_else(|| invalid_state(format!("declaration {id} is not a function")))?;
        let mut enclosing = self.enclosing_hash(symbol);
        if function.kind == FunctionKind::Lambda {
            // lambdas share a name; their position tells them apart
            enclosing = stable_hash(&(enclosing, symbol.span.start));
        }
        Ok(FunctionKey {
            qualified_name: symbol.fq_name.clone(),
            return_type: function.return_ty.clone(),
            parameter_types: function.params.iter().map(|param| param.ty.clone()).collect(),
            enclosing,
        })
    }

    pub fn function_info(&self, id: DeclId) -> Result<Handle<FunctionInfo>> {
        let (symbol, function) = self
            .symbols
            .function(id)
            .ok_or_else(|| invalid_state(format!("declaration {id} is not a function")))?;
        let key = self.function_key(id)?;
        self.store.functions.get_or_create(key.clone(), |_| {
            let owner = stable_hash(&key);
            let parameters = function
                .params
                .iter()
                .enumerate()
                .map(|(index, param)| self.parameter_info(owner, &symbol.fq_name, index, param))
                .collect::<Result<Vec<_>>>()?;
            let locals = function
                .locals
                .iter()
                .map(|local| self.local_info(owner, &symbol.fq_name, local.into()))
                .collect::<Result<Vec<_>>>()?;
            let declaring_class = self
                .declaring_class(id)
                .map(|class| self.class_info(class))
                .transpose()?;
            Ok(FunctionInfo {
                location: self.decl_location(symbol)?,
                qualified_name: symbol.fq_name.clone(),
                simple_name: symbol.name.clone(),
                type_parameters: function.type_params.clone(),
                return_type: self.type_info(&function.return_ty)?,
                parameters,
                visibility: function.visibility,
                modality: function.modality,
                locals,
                is_expect: function.is_expect,
                is_suspend: function.is_suspend,
                declaring_class,
                annotations: self.annotations(&symbol.annotations)?,
                key,
            })
        })
    }

    /// Function-equivalent descriptor of an executable scope. Initializers
    /// stand in for their class's primary constructor.
    pub fn executable_info(&self, executable: Executable) -> Result<Handle<FunctionInfo>> {
        match executable {
            Executable::Function(id) => self.function_info(id),
            Executable::Initializer {
                class: Some(class), ..
            } => self.primary_constructor_info(class),
            Executable::Initializer { id, class: None } => Err(invalid_state(format!(
                "initializer {id} does not belong to a class"
            ))),
        }
    }

    pub fn primary_constructor_info(&self, class: DeclId) -> Result<Handle<FunctionInfo>> {
        let (symbol, class_symbol) = self
            .symbols
            .class(class)
            .ok_or_else(|| invalid_state(format!("declaration {class} is not a class")))?;
        let constructor = class_symbol.primary_constructor.ok_or_else(|| {
            invalid_state(format!("class {} has no primary constructor", symbol.fq_name))
        })?;
        self.function_info(constructor)
    }

    /// Identity of the executable that owns the locals visible in it.
    pub fn variable_owner(&self, executable: Executable) -> Result<(u64, String)> {
        match executable {
            Executable::Function(id) => {
                let key = self.function_key(id)?;
                Ok((stable_hash(&key), key.qualified_name))
            }
            Executable::Initializer { id, .. } => {
                let symbol = self
                    .symbols
                    .get(id)
                    .ok_or_else(|| invalid_state(format!("unknown initializer {id}")))?;
                Ok((
                    stable_hash(&(symbol.fq_name.as_str(), symbol.span.start)),
                    symbol.fq_name.clone(),
                ))
            }
        }
    }

    pub fn property_info(&self, id: DeclId) -> Result<Handle<PropertyInfo>> {
        let (symbol, property) = self
            .symbols
            .property(id)
            .ok_or_else(|| invalid_state(format!("declaration {id} is not a property")))?;
        let key = PropertyKey {
            qualified_name: symbol.fq_name.clone(),
            enclosing: self.enclosing_hash(symbol),
        };
        self.store.properties.get_or_create(key.clone(), |_| {
            if property.getter.is_none()
                && property.setter.is_none()
                && property.backing_field.is_none()
            {
                return Err(invalid_state(format!(
                    "property {} has neither accessors nor a backing field",
                    symbol.fq_name
                )));
            }
            Ok(PropertyInfo {
                location: self.decl_location(symbol)?,
                qualified_name: symbol.fq_name.clone(),
                simple_name: symbol.name.clone(),
                mutable: property.mutable,
                visibility: property.visibility,
                modality: property.modality,
                getter: property
                    .getter
                    .map(|getter| self.function_info(getter))
                    .transpose()?,
                setter: property
                    .setter
                    .map(|setter| self.function_info(setter))
                    .transpose()?,
                backing_field: property
                    .backing_field
                    .map(|field| self.field_info(field))
                    .transpose()?,
                annotations: self.annotations(&symbol.annotations)?,
                key,
            })
        })
    }

    pub fn field_info(&self, id: DeclId) -> Result<Handle<FieldInfo>> {
        let (symbol, field) = self
            .symbols
            .field(id)
            .ok_or_else(|| invalid_state(format!("declaration {id} is not a field")))?;
        let key = FieldKey {
            qualified_name: symbol.fq_name.clone(),
            ty: field.ty.clone(),
            enclosing: self.enclosing_hash(symbol),
        };
        self.store.fields.get_or_create(key, |_| {
            Ok(FieldInfo {
                location: self.decl_location(symbol)?,
                qualified_name: symbol.fq_name.clone(),
                simple_name: symbol.name.clone(),
                ty: self.type_info(&field.ty)?,
                is_static: field.is_static,
                is_external: field.is_external,
                is_final: field.is_final,
                annotations: self.annotations(&symbol.annotations)?,
            })
        })
    }

    pub fn parameter_info(
        &self,
        owner: u64,
        owner_name: &str,
        index: usize,
        param: &ParamSymbol,
    ) -> Result<Handle<ParameterInfo>> {
        let key = VariableKey {
            owner,
            name: param.name.clone(),
            ty: param.ty.clone(),
            offset: param.span.start,
        };
        self.store.parameters.get_or_create(key, |_| {
            Ok(ParameterInfo {
                location: self.location(param.span)?,
                qualified_name: format!("{owner_name}.{}", param.name),
                simple_name: param.name.clone(),
                ty: self.type_info(&param.ty)?,
                index,
                annotations: self.annotations(&param.annotations)?,
            })
        })
    }

    pub fn local_info(
        &self,
        owner: u64,
        owner_name: &str,
        site: VariableSite<'_>,
    ) -> Result<Handle<LocalInfo>> {
        let key = VariableKey {
            owner,
            name: site.name.to_string(),
            ty: site.ty.clone(),
            offset: site.span.start,
        };
        self.store.locals.get_or_create(key, |_| {
            Ok(LocalInfo {
                location: self.location(site.span)?,
                qualified_name: format!("{owner_name}.{}", site.name),
                simple_name: site.name.to_string(),
                ty: self.type_info(site.ty)?,
                mutable: site.mutable,
                annotations: self.annotations(site.annotations)?,
            })
        })
    }

    /// Capture of `locals` (all owned by `executable`) at `span`.
    pub fn frame_capture(
        &self,
        executable: Executable,
        locals: &[&VisibleLocal],
        span: Span,
    ) -> Result<FrameCapture> {
        let (owner, owner_name) = self.variable_owner(executable)?;
        let entries = locals
            .iter()
            .map(|local| {
                Ok(CapturedLocal {
                    local: self.local_info(owner, &owner_name, VariableSite::from(*local))?,
                    var: local.var,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FrameCapture {
            location: self.location(span)?,
            entries,
        })
    }

    pub fn annotations(&self, annotations: &[Annotation]) -> Result<AnnotationMap> {
        let mut map = AnnotationMap::new();
        for annotation in annotations {
            let mut arguments = BTreeMap::new();
            for argument in &annotation.arguments {
                arguments.insert(
                    argument.name.clone(),
                    self.annotation_value(&argument.value)?,
                );
            }
            map.push(AnnotationUsageInfo {
                location: self.location(annotation.span)?,
                annotation: self.type_info(&annotation.ty())?,
                arguments,
            });
        }
        Ok(map)
    }

    fn annotation_value(&self, value: &AnnotationArg) -> Result<AnnotationValue> {
        Ok(match value {
            AnnotationArg::Const(Const::Null | Const::Unit) => AnnotationValue::Null,
            AnnotationArg::Const(Const::Boolean(value)) => AnnotationValue::Boolean(*value),
            AnnotationArg::Const(Const::Int(value)) => AnnotationValue::Int(*value),
            AnnotationArg::Const(Const::Long(value)) => AnnotationValue::Long(*value),
            AnnotationArg::Const(Const::String(value)) => AnnotationValue::String(value.clone()),
            AnnotationArg::Type(ty) => AnnotationValue::Type(self.type_info(ty)?),
            AnnotationArg::Array(values) => AnnotationValue::List(
                values
                    .iter()
                    .map(|value| self.annotation_value(value))
                    .collect::<Result<Vec<_>>>()?,
            ),
        })
    }

    /// Hash of the declaration that encloses `symbol`, distinguishing
    /// same-named declarations in different scopes.
    fn enclosing_hash(&self, symbol: &Symbol) -> u64 {
        let path = self.file_path(symbol.file);
        match symbol.parent.and_then(|parent| self.symbols.get(parent)) {
            Some(parent) => stable_hash(&(parent.fq_name.as_str(), path, parent.span.start)),
            None => stable_hash(&(path, symbol.file)),
        }
    }

    /// Class declaring `id` as a member, looking through properties for accessors.
    fn declaring_class(&self, id: DeclId) -> Option<DeclId> {
        for ancestor in self.symbols.ancestors(id) {
            match ancestor.kind {
                SymbolKind::Class(_) => return Some(ancestor.id),
                SymbolKind::Property(_) => continue,
                _ => return None,
            }
        }
        None
    }
}
