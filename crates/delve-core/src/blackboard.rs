use std::any::{type_name, Any};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::marker::PhantomData;

use crate::CoreError;

/// Typed handle for a string-keyed blackboard slot.
///
/// The name is the shared contract between behaviors (`"ActionVoxel"`, `"PathToVoxel"`,
/// `"NoPath"`); the type parameter only saves callers from repeating the value type.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BbKey<T: 'static> {
    name: &'static str,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Copy for BbKey<T> {}

impl<T: 'static> Clone for BbKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> BbKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _phantom: PhantomData,
        }
    }

    pub fn name(self) -> &'static str {
        self.name
    }
}

struct Slot {
    type_name: &'static str,
    value: Box<dyn Any>,
}

/// Per-agent scratch store shared by every node of one behavior tree.
///
/// Keys are strings, values are arbitrary `'static` types. Reading a key with the wrong type
/// is a programming error: [`Blackboard::try_get`] reports it, [`Blackboard::get`] logs it and
/// behaves as if the key were absent.
#[derive(Default)]
pub struct Blackboard {
    values: BTreeMap<Cow<'static, str>, Slot>,
}

impl std::fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.values.iter().map(|(k, slot)| (k, slot.type_name)))
            .finish()
    }
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains<T: 'static>(&self, key: BbKey<T>) -> bool {
        self.contains_name(key.name)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_ref())
    }

    pub fn set<T: 'static>(&mut self, key: BbKey<T>, value: T) {
        self.set_named(key.name, value);
    }

    /// Write a value under a dynamic name, overwriting whatever was stored there.
    pub fn set_named<T: 'static>(&mut self, name: impl Into<Cow<'static, str>>, value: T) {
        self.values.insert(
            name.into(),
            Slot {
                type_name: type_name::<T>(),
                value: Box::new(value),
            },
        );
    }

    pub fn get<T: 'static>(&self, key: BbKey<T>) -> Option<&T> {
        self.get_named(key.name)
    }

    pub fn get_named<T: 'static>(&self, name: &str) -> Option<&T> {
        match self.try_get_named(name) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%err, "blackboard read ignored");
                None
            }
        }
    }

    pub fn try_get<T: 'static>(&self, key: BbKey<T>) -> Result<Option<&T>, CoreError> {
        self.try_get_named(key.name)
    }

    pub fn try_get_named<T: 'static>(&self, name: &str) -> Result<Option<&T>, CoreError> {
        let Some(slot) = self.values.get(name) else {
            return Ok(None);
        };
        slot.value
            .downcast_ref::<T>()
            .map(Some)
            .ok_or_else(|| CoreError::BlackboardTypeMismatch {
                key: name.to_string(),
                stored: slot.type_name,
                requested: type_name::<T>(),
            })
    }

    pub fn get_mut<T: 'static>(&mut self, key: BbKey<T>) -> Option<&mut T> {
        let slot = self.values.get_mut(key.name)?;
        let stored = slot.type_name;
        let value = slot.value.downcast_mut::<T>();
        if value.is_none() {
            tracing::warn!(
                key = key.name,
                stored,
                requested = type_name::<T>(),
                "blackboard type mismatch on mutable read"
            );
        }
        value
    }

    /// Copy out a value, falling back to `default` when absent.
    pub fn get_or<T: Copy + 'static>(&self, key: BbKey<T>, default: T) -> T {
        self.get(key).copied().unwrap_or(default)
    }

    pub fn remove<T: 'static>(&mut self, key: BbKey<T>) -> Option<T> {
        let slot = self.values.remove(key.name)?;
        match slot.value.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(value) => {
                tracing::warn!(
                    key = key.name,
                    stored = slot.type_name,
                    requested = type_name::<T>(),
                    "blackboard type mismatch on remove; value dropped"
                );
                drop(value);
                None
            }
        }
    }

    /// Erase a key regardless of the stored type.
    pub fn erase(&mut self, name: &str) -> bool {
        self.values.remove(name).is_some()
    }
}
