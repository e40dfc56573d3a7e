use crate::ir::{Const, Ty};
use crate::span::Span;
use serde::{Deserialize, Serialize};

/// A value passed to an annotation constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationArg {
    Const(Const),
    Type(Ty),
    Array(Vec<AnnotationArg>),
}

impl AnnotationArg {
    pub fn string(value: impl Into<String>) -> Self {
        AnnotationArg::Const(Const::String(value.into()))
    }

    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnnotationArg::Array(values.into_iter().map(AnnotationArg::string).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationArg::Const(Const::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AnnotationArg]> {
        match self {
            AnnotationArg::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Every element of an array argument as a string, or `None` if any element is not one.
    pub fn as_strings(&self) -> Option<Vec<&str>> {
        self.as_array()?.iter().map(AnnotationArg::as_str).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationArgument {
    pub name: String,
    pub value: AnnotationArg,
}

/// One application of an annotation class to a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    pub class: String,
    pub span: Span,
    #[serde(default)]
    pub arguments: Vec<AnnotationArgument>,
}

impl Annotation {
    pub fn new(class: impl Into<String>, span: Span) -> Self {
        Self {
            class: class.into(),
            span,
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: AnnotationArg) -> Self {
        self.arguments.push(AnnotationArgument {
            name: name.into(),
            value,
        });
        self
    }

    pub fn argument(&self, name: &str) -> Option<&AnnotationArg> {
        self.arguments
            .iter()
            .find(|argument| argument.name == name)
            .map(|argument| &argument.value)
    }

    pub fn ty(&self) -> Ty {
        Ty::class(self.class.clone())
    }
}

/// Query helpers over a declaration's annotation list.
pub trait AnnotationsExt {
    fn annotation_list(&self) -> &[Annotation];

    fn find_annotation(&self, class: &str) -> Option<&Annotation> {
        self.annotation_list().iter().find(|a| a.class == class)
    }

    fn annotations_of<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a Annotation> + 'a {
        self.annotation_list().iter().filter(move |a| a.class == class)
    }

    fn has_annotation(&self, class: &str) -> bool {
        self.find_annotation(class).is_some()
    }
}

impl AnnotationsExt for [Annotation] {
    fn annotation_list(&self) -> &[Annotation] {
        self
    }
}

impl AnnotationsExt for Vec<Annotation> {
    fn annotation_list(&self) -> &[Annotation] {
        self
    }
}
