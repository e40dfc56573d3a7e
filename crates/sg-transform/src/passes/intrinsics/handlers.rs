use super::{IntrinsicCall, IntrinsicRegistry, Resolved};
use crate::context::{Executable, ScopeStack};
use crate::error::{invalid_argument, not_in_scope};
use crate::passes::PassEnv;
use sg_core::descriptors::DescriptorRef;
use sg_core::error::Result;
use sg_core::intrinsics::IntrinsicKind;
use sg_core::ir::{DeclId, ExprKind, Ty};

pub(super) fn register_defaults(registry: &mut IntrinsicRegistry) {
    registry.register(IntrinsicKind::Here, here);
    registry.register(IntrinsicKind::CurrentFile, current_file);
    registry.register(IntrinsicKind::CurrentLine, current_line);
    registry.register(IntrinsicKind::CurrentFunction, current_function);
    registry.register(IntrinsicKind::CurrentFunctionHash, current_function_hash);
    registry.register(IntrinsicKind::CurrentClass, current_class);
    registry.register(IntrinsicKind::CurrentClassHash, current_class_hash);
    registry.register(IntrinsicKind::ClassOf, class_of);
    registry.register(IntrinsicKind::ClassOfHash, class_of_hash);
    registry.register(IntrinsicKind::TypeOf, type_of);
    registry.register(IntrinsicKind::FunctionOf, function_of);
    registry.register(IntrinsicKind::FunctionOfHash, function_of_hash);
    registry.register(IntrinsicKind::PropertyOf, property_of);
    registry.register(IntrinsicKind::FrameSnapshot, frame_snapshot);
}

fn here(call: &IntrinsicCall<'_>, _: &ScopeStack, env: &PassEnv<'_>) -> Result<Resolved> {
    let location = env.factory.location(call.span)?;
    Ok(Resolved::Descriptor(DescriptorRef::Location(location)))
}

fn current_file(call: &IntrinsicCall<'_>, _: &ScopeStack, env: &PassEnv<'_>) -> Result<Resolved> {
    Ok(Resolved::String(
        env.factory.file_path(call.span.file).to_string(),
    ))
}

fn current_line(call: &IntrinsicCall<'_>, _: &ScopeStack, env: &PassEnv<'_>) -> Result<Resolved> {
    Ok(Resolved::Int(env.factory.position(call.span).line()))
}

fn executable(call: &IntrinsicCall<'_>, scopes: &ScopeStack) -> Result<Executable> {
    scopes
        .current_executable()
        .ok_or_else(|| not_in_scope(call.kind, "function", call.span))
}

fn current_function(
    call: &IntrinsicCall<'_>,
    scopes: &ScopeStack,
    env: &PassEnv<'_>,
) -> Result<Resolved> {
    let info = env.factory.executable_info(executable(call, scopes)?)?;
    Ok(Resolved::Descriptor(DescriptorRef::Function(info)))
}

fn current_function_hash(
    call: &IntrinsicCall<'_>,
    scopes: &ScopeStack,
    env: &PassEnv<'_>,
) -> Result<Resolved> {
    let info = env.factory.executable_info(executable(call, scopes)?)?;
    let info = env.factory.store().functions.resolve(info)?;
    Ok(Resolved::Int(info.structural_hash()))
}

fn enclosing_class(call: &IntrinsicCall<'_>, scopes: &ScopeStack) -> Result<DeclId> {
    scopes
        .current_class()
        .ok_or_else(|| not_in_scope(call.kind, "class", call.span))
}

fn current_class(
    call: &IntrinsicCall<'_>,
    scopes: &ScopeStack,
    env: &PassEnv<'_>,
) -> Result<Resolved> {
    let info = env.factory.class_info(enclosing_class(call, scopes)?)?;
    Ok(Resolved::Descriptor(DescriptorRef::Class(info)))
}

fn current_class_hash(
    call: &IntrinsicCall<'_>,
    scopes: &ScopeStack,
    env: &PassEnv<'_>,
) -> Result<Resolved> {
    let info = env.factory.class_info(enclosing_class(call, scopes)?)?;
    let info = env.factory.store().classes.resolve(info)?;
    Ok(Resolved::Int(info.structural_hash()))
}

/// The single type argument; type parameters have no class to describe.
fn type_argument<'c>(call: &IntrinsicCall<'c>) -> Result<&'c Ty> {
    match call.call.type_args.as_slice() {
        [Ty::TypeParameter(name)] => Err(invalid_argument(
            call.kind,
            format!("type parameter `{name}` cannot be resolved at compile time"),
            call.span,
        )),
        [ty] => Ok(ty),
        args => Err(invalid_argument(
            call.kind,
            format!("expected one type argument, found {}", args.len()),
            call.span,
        )),
    }
}

fn class_of(call: &IntrinsicCall<'_>, _: &ScopeStack, env: &PassEnv<'_>) -> Result<Resolved> {
    let info = env.factory.class_info_for_type(type_argument(call)?)?;
    Ok(Resolved::Descriptor(DescriptorRef::Class(info)))
}

fn class_of_hash(call: &IntrinsicCall<'_>, _: &ScopeStack, env: &PassEnv<'_>) -> Result<Resolved> {
    let info = env.factory.class_info_for_type(type_argument(call)?)?;
    let info = env.factory.store().classes.resolve(info)?;
    Ok(Resolved::Int(info.structural_hash()))
}

fn type_of(call: &IntrinsicCall<'_>, _: &ScopeStack, env: &PassEnv<'_>) -> Result<Resolved> {
    let info = env.factory.type_info(type_argument(call)?)?;
    Ok(Resolved::Descriptor(DescriptorRef::Type(info)))
}

fn function_reference(call: &IntrinsicCall<'_>) -> Result<DeclId> {
    match call.argument().map(|arg| &arg.kind) {
        Some(ExprKind::FunctionReference(id)) => Ok(*id),
        _ => Err(invalid_argument(
            call.kind,
            "argument must be a function reference",
            call.span,
        )),
    }
}

fn function_of(call: &IntrinsicCall<'_>, _: &ScopeStack, env: &PassEnv<'_>) -> Result<Resolved> {
    let info = env.factory.function_info(function_reference(call)?)?;
    Ok(Resolved::Descriptor(DescriptorRef::Function(info)))
}

fn function_of_hash(
    call: &IntrinsicCall<'_>,
    _: &ScopeStack,
    env: &PassEnv<'_>,
) -> Result<Resolved> {
    let key = env.factory.function_key(function_reference(call)?)?;
    Ok(Resolved::Int(sg_core::descriptors::fold_hash(
        sg_core::descriptors::stable_hash(&key),
    )))
}

fn property_of(call: &IntrinsicCall<'_>, _: &ScopeStack, env: &PassEnv<'_>) -> Result<Resolved> {
    let id = match call.argument().map(|arg| &arg.kind) {
        Some(ExprKind::PropertyReference(id)) => *id,
        _ => {
            return Err(invalid_argument(
                call.kind,
                "argument must be a property reference",
                call.span,
            ))
        }
    };
    let info = env.factory.property_info(id)?;
    Ok(Resolved::Descriptor(DescriptorRef::Property(info)))
}

fn frame_snapshot(
    call: &IntrinsicCall<'_>,
    scopes: &ScopeStack,
    env: &PassEnv<'_>,
) -> Result<Resolved> {
    let executable = executable(call, scopes)?;
    let capture = env
        .factory
        .frame_capture(executable, &scopes.visible_locals(), call.span)?;
    Ok(Resolved::Snapshot(capture))
}
