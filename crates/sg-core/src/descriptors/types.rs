use crate::descriptors::{Handle, SourceLocation};
use crate::ir::Ty;

/// A type, identified by its handle (the IR type itself).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    pub handle: Ty,
    pub qualified_name: String,
    pub simple_name: String,
    pub location: Handle<SourceLocation>,
}
