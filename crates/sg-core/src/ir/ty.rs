use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassTy {
    pub fq_name: String,
    #[serde(default)]
    pub args: Vec<Ty>,
    #[serde(default)]
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionTy {
    pub params: Vec<Ty>,
    pub ret: Box<Ty>,
    #[serde(default)]
    pub is_suspend: bool,
}

/// Static type of an IR node, as computed by the host.
///
/// Class types are identified by qualified name only, which keeps them stable
/// across modules that see the same library class under different decl ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ty {
    Unit,
    Nothing,
    Boolean,
    Int,
    Long,
    String,
    Any,
    Class(ClassTy),
    TypeParameter(String),
    Function(FunctionTy),
}

impl Ty {
    pub fn class(fq_name: impl Into<String>) -> Ty {
        Ty::Class(ClassTy {
            fq_name: fq_name.into(),
            args: Vec::new(),
            nullable: false,
        })
    }

    /// `Unit` and `Nothing` carry no value worth preserving in a temporary.
    pub fn is_trivial(&self) -> bool {
        matches!(self, Ty::Unit | Ty::Nothing)
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Ty::Nothing)
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            Ty::Class(class) => Some(class.fq_name.as_str()),
            _ => None,
        }
    }

    pub fn qualified_name(&self) -> String {
        match self {
            Ty::Unit => "Unit".into(),
            Ty::Nothing => "Nothing".into(),
            Ty::Boolean => "Boolean".into(),
            Ty::Int => "Int".into(),
            Ty::Long => "Long".into(),
            Ty::String => "String".into(),
            Ty::Any => "Any".into(),
            Ty::Class(class) => class.fq_name.clone(),
            Ty::TypeParameter(name) => name.clone(),
            Ty::Function(function) => format!(
                "{}Function{}",
                if function.is_suspend { "Suspend" } else { "" },
                function.params.len()
            ),
        }
    }

    pub fn simple_name(&self) -> String {
        let qualified = self.qualified_name();
        match qualified.rsplit_once('.') {
            Some((_, simple)) => simple.to_string(),
            None => qualified,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Class(class) => {
                write!(f, "{}", class.fq_name)?;
                if !class.args.is_empty() {
                    write!(f, "<")?;
                    for (idx, arg) in class.args.iter().enumerate() {
                        if idx > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                if class.nullable {
                    write!(f, "?")?;
                }
                Ok(())
            }
            Ty::Function(function) => {
                if function.is_suspend {
                    write!(f, "suspend ")?;
                }
                write!(f, "(")?;
                for (idx, param) in function.params.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> {}", function.ret)
            }
            other => write!(f, "{}", other.qualified_name()),
        }
    }
}
