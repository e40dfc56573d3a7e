use crate::descriptors::{Handle, LocalInfo, SourceLocation};

/// Values of the visible locals at one program point, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot<V> {
    pub location: Handle<SourceLocation>,
    pub values: Vec<(Handle<LocalInfo>, V)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameChange<V> {
    /// Not visible in the earlier snapshot.
    Defined { local: Handle<LocalInfo>, value: V },
    Changed {
        local: Handle<LocalInfo>,
        before: V,
        after: V,
    },
}

impl<V> FrameSnapshot<V> {
    pub fn new(location: Handle<SourceLocation>) -> Self {
        Self {
            location,
            values: Vec::new(),
        }
    }

    pub fn push(&mut self, local: Handle<LocalInfo>, value: V) {
        self.values.push((local, value));
    }

    pub fn get(&self, local: Handle<LocalInfo>) -> Option<&V> {
        self.values
            .iter()
            .find(|(key, _)| *key == local)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<V: Clone + PartialEq> FrameSnapshot<V> {
    /// Changes from `self` to the `later` snapshot, in the later snapshot's order.
    pub fn diff(&self, later: &FrameSnapshot<V>) -> Vec<FrameChange<V>> {
        later
            .values
            .iter()
            .filter_map(|(local, after)| match self.get(*local) {
                None => Some(FrameChange::Defined {
                    local: *local,
                    value: after.clone(),
                }),
                Some(before) if before != after => Some(FrameChange::Changed {
                    local: *local,
                    before: before.clone(),
                    after: after.clone(),
                }),
                Some(_) => None,
            })
            .collect()
    }
}
