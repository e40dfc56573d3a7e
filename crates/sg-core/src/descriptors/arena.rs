use crate::error::{Error, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, RwLock};
use std::thread::{self, ThreadId};

/// Typed index into a [`DescriptorArena`]. Two handles are equal exactly when
/// they name the same descriptor instance.
pub struct Handle<T> {
    index: u32,
    marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: u32) -> Self {
        Self {
            index,
            marker: PhantomData,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state)
    }
}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

impl<T> Serialize for Handle<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.index.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Handle<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        u32::deserialize(deserializer).map(Handle::new)
    }
}

/// Append-only store of descriptors with identity-based get-or-create.
///
/// Construction is two-phase: the handle is published in the key index before
/// the builder runs, so a builder that asks for its own key (directly or
/// through other descriptors) receives the handle under construction. Other
/// threads asking for a key under construction block until the builder has
/// finished, so they only ever see filled slots.
pub struct DescriptorArena<K, T> {
    index: DashMap<K, Handle<T>>,
    slots: RwLock<Vec<Arc<Slot<T>>>>,
}

enum SlotState<T> {
    Building(ThreadId),
    Ready(Arc<T>),
    Failed(String),
}

struct Slot<T> {
    state: Mutex<SlotState<T>>,
    settled: Condvar,
}

impl<T> Slot<T> {
    fn building() -> Self {
        Self {
            state: Mutex::new(SlotState::Building(thread::current().id())),
            settled: Condvar::new(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SlotState<T>>> {
        self.state.lock().map_err(|_| poisoned())
    }

    fn ready(&self) -> Option<Arc<T>> {
        match &*self.state.lock().ok()? {
            SlotState::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    fn settle(&self, state: SlotState<T>) -> Result<()> {
        let mut guard = self.lock()?;
        crate::ensure_state!(
            matches!(*guard, SlotState::Building(_)),
            "descriptor slot settled twice"
        );
        *guard = state;
        self.settled.notify_all();
        Ok(())
    }
}

fn poisoned() -> Error {
    Error::InvalidState("descriptor arena lock poisoned".into())
}

impl<K, T> Default for DescriptorArena<K, T>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> DescriptorArena<K, T>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            index: DashMap::new(),
            slots: RwLock::new(Vec::new()),
        }
    }

    pub fn get_or_create<F>(&self, key: K, build: F) -> Result<Handle<T>>
    where
        F: FnOnce(Handle<T>) -> Result<T>,
    {
        // The shard guard must be gone before waiting on another builder.
        let (handle, fresh) = match self.index.entry(key.clone()) {
            Entry::Occupied(entry) => (*entry.get(), false),
            Entry::Vacant(entry) => {
                let handle = self.allocate()?;
                entry.insert(handle);
                (handle, true)
            }
        };
        if !fresh {
            return self.wait_settled(handle);
        }

        let slot = self.slot(handle)?;
        match build(handle) {
            Ok(value) => {
                slot.settle(SlotState::Ready(Arc::new(value)))?;
                Ok(handle)
            }
            Err(err) => {
                self.index.remove(&key);
                slot.settle(SlotState::Failed(err.to_string()))?;
                Err(err)
            }
        }
    }

    pub fn lookup(&self, key: &K) -> Option<Handle<T>> {
        self.index.get(key).map(|entry| *entry.value())
    }

    /// The finished descriptor, or `None` while it is still being built.
    pub fn get(&self, handle: Handle<T>) -> Option<Arc<T>> {
        self.slot(handle).ok()?.ready()
    }

    pub fn resolve(&self, handle: Handle<T>) -> Result<Arc<T>> {
        self.get(handle).ok_or_else(|| {
            Error::InvalidState(format!(
                "descriptor {} requested before construction finished",
                handle.index
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Every finished descriptor, in allocation order.
    pub fn values(&self) -> Vec<(Handle<T>, Arc<T>)> {
        let Ok(slots) = self.slots.read() else {
            return Vec::new();
        };
        slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| Some((Handle::new(index as u32), slot.ready()?)))
            .collect()
    }

    fn allocate(&self) -> Result<Handle<T>> {
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        let index = u32::try_from(slots.len())
            .map_err(|_| Error::InvalidState("descriptor arena exhausted".into()))?;
        slots.push(Arc::new(Slot::building()));
        Ok(Handle::new(index))
    }

    fn slot(&self, handle: Handle<T>) -> Result<Arc<Slot<T>>> {
        let slots = self.slots.read().map_err(|_| poisoned())?;
        slots
            .get(handle.index as usize)
            .cloned()
            .ok_or_else(|| Error::InvalidState(format!("unknown descriptor slot {}", handle.index)))
    }

    /// Block until the slot behind `handle` is filled. The building thread
    /// itself gets the pending handle back straight away.
    fn wait_settled(&self, handle: Handle<T>) -> Result<Handle<T>> {
        let slot = self.slot(handle)?;
        let mut state = slot.lock()?;
        loop {
            match &*state {
                SlotState::Ready(_) => return Ok(handle),
                SlotState::Building(owner) if *owner == thread::current().id() => {
                    return Ok(handle)
                }
                SlotState::Building(_) => {
                    state = slot.settled.wait(state).map_err(|_| poisoned())?;
                }
                SlotState::Failed(message) => {
                    return Err(Error::InvalidState(format!(
                        "descriptor {} failed to build: {message}",
                        handle.index
                    )))
                }
            }
        }
    }
}

impl<K: Eq + Hash, T> fmt::Debug for DescriptorArena<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorArena")
            .field("len", &self.index.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::time::Duration;

    #[derive(Debug)]
    struct Node {
        name: &'static str,
        parent: Option<Handle<Node>>,
    }

    #[test]
    fn equal_keys_share_one_instance() -> Result<()> {
        let arena: DescriptorArena<&str, Node> = DescriptorArena::new();
        let first = arena.get_or_create("a", |_| {
            Ok(Node {
                name: "a",
                parent: None,
            })
        })?;
        let second = arena.get_or_create("a", |_| panic!("builder must not run twice"))?;
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&arena.resolve(first)?, &arena.resolve(second)?));
        assert_eq!(arena.len(), 1);
        Ok(())
    }

    #[test]
    fn builder_can_request_its_own_key() -> Result<()> {
        let arena: DescriptorArena<&str, Node> = DescriptorArena::new();
        let handle = arena.get_or_create("self", |this| {
            assert!(arena.get(this).is_none());
            let again = arena.get_or_create("self", |_| panic!("re-entered builder"))?;
            Ok(Node {
                name: "self",
                parent: Some(again),
            })
        })?;
        let node = arena.resolve(handle)?;
        assert_eq!(node.name, "self");
        assert_eq!(node.parent, Some(handle));
        Ok(())
    }

    #[test]
    fn failed_build_releases_the_key() -> Result<()> {
        let arena: DescriptorArena<&str, Node> = DescriptorArena::new();
        let failed = arena.get_or_create("k", |_| Err(Error::Generic("boom".into())));
        assert!(failed.is_err());
        assert!(arena.lookup(&"k").is_none());
        let handle = arena.get_or_create("k", |_| {
            Ok(Node {
                name: "k",
                parent: None,
            })
        })?;
        assert_eq!(arena.resolve(handle)?.name, "k");
        Ok(())
    }

    #[test]
    fn debug_output_reports_the_key_count() -> Result<()> {
        let arena: DescriptorArena<String, Node> = DescriptorArena::new();
        arena.get_or_create("a".to_string(), |_| {
            Ok(Node {
                name: "a",
                parent: None,
            })
        })?;
        assert_eq!(format!("{arena:?}"), "DescriptorArena { len: 1 }");
        Ok(())
    }

    #[test]
    fn other_threads_wait_for_the_builder() -> Result<()> {
        let arena: DescriptorArena<&str, Node> = DescriptorArena::new();
        let building = Barrier::new(2);
        let (first, second) = thread::scope(|scope| {
            let builder = scope.spawn(|| {
                arena.get_or_create("k", |_| {
                    building.wait();
                    thread::sleep(Duration::from_millis(100));
                    Ok(Node {
                        name: "k",
                        parent: None,
                    })
                })
            });
            let waiter = scope.spawn(|| {
                building.wait();
                let handle = arena.get_or_create("k", |_| panic!("key is already building"))?;
                arena.resolve(handle).map(|node| (handle, node.name))
            });
            (builder.join(), waiter.join())
        });
        let first = first.expect("builder thread")?;
        let (second, name) = second.expect("waiter thread")?;
        assert_eq!(first, second);
        assert_eq!(name, "k");
        Ok(())
    }

    #[test]
    fn waiters_see_a_failed_build() {
        let arena: DescriptorArena<&str, Node> = DescriptorArena::new();
        let building = Barrier::new(2);
        let waited = thread::scope(|scope| {
            scope.spawn(|| {
                arena.get_or_create("k", |_| {
                    building.wait();
                    thread::sleep(Duration::from_millis(100));
                    Err(Error::Generic("boom".into()))
                })
            });
            let waiter = scope.spawn(|| {
                building.wait();
                arena.get_or_create("k", |_| panic!("key is already building"))
            });
            waiter.join().expect("waiter thread")
        });
        let err = waited.expect_err("the build failed");
        assert!(err.to_string().contains("boom"), "{err}");
        assert!(arena.lookup(&"k").is_none());
    }
}
