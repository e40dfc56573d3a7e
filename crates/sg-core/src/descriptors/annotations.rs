use crate::descriptors::{Handle, SourceLocation, TypeInfo};
use std::collections::BTreeMap;

/// Constructor argument of an annotation usage. Lists nest without limit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnotationValue {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    String(String),
    Type(Handle<TypeInfo>),
    List(Vec<AnnotationValue>),
}

impl AnnotationValue {
    /// Nesting depth; scalars are depth 0.
    pub fn depth(&self) -> usize {
        match self {
            AnnotationValue::List(values) => {
                1 + values.iter().map(AnnotationValue::depth).max().unwrap_or(0)
            }
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationUsageInfo {
    pub location: Handle<SourceLocation>,
    pub annotation: Handle<TypeInfo>,
    pub arguments: BTreeMap<String, AnnotationValue>,
}

/// Annotation type to usages, in declaration order. The same annotation type
/// may be applied several times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AnnotationMap {
    entries: Vec<(Handle<TypeInfo>, Vec<AnnotationUsageInfo>)>,
}

impl AnnotationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, usage: AnnotationUsageInfo) {
        match self
            .entries
            .iter_mut()
            .find(|(annotation, _)| *annotation == usage.annotation)
        {
            Some((_, usages)) => usages.push(usage),
            None => self.entries.push((usage.annotation, vec![usage])),
        }
    }

    pub fn get(&self, annotation: Handle<TypeInfo>) -> &[AnnotationUsageInfo] {
        self.entries
            .iter()
            .find(|(key, _)| *key == annotation)
            .map(|(_, usages)| usages.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct annotation types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<TypeInfo>, &[AnnotationUsageInfo])> {
        self.entries
            .iter()
            .map(|(annotation, usages)| (*annotation, usages.as_slice()))
    }
}
