// src/types.rs

use std::collections::BTreeMap;

/// Canonical task identity type used throughout the crate.
pub type TaskId = String;

/// Shape of a task's declared dependencies.
///
/// The shape is preserved when deriving the input view for a task body, so a
/// task that declares a keyed map of dependencies receives a keyed map of
/// their outputs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Dependencies<T> {
    #[default]
    None,
    Single(T),
    List(Vec<T>),
    Map(BTreeMap<String, T>),
}

impl<T> Dependencies<T> {
    /// Flatten the shape into its members, in declaration order (map keys in
    /// key order).
    pub fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        match self {
            Dependencies::None => Box::new(std::iter::empty()),
            Dependencies::Single(t) => Box::new(std::iter::once(t)),
            Dependencies::List(items) => Box::new(items.iter()),
            Dependencies::Map(items) => Box::new(items.values()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Dependencies::None => 0,
            Dependencies::Single(_) => 1,
            Dependencies::List(items) => items.len(),
            Dependencies::Map(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map every member while keeping the shape.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Dependencies<U> {
        match self {
            Dependencies::None => Dependencies::None,
            Dependencies::Single(t) => Dependencies::Single(f(t)),
            Dependencies::List(items) => Dependencies::List(items.iter().map(f).collect()),
            Dependencies::Map(items) => {
                Dependencies::Map(items.iter().map(|(k, v)| (k.clone(), f(v))).collect())
            }
        }
    }

    /// Fallible variant of [`Dependencies::map`]; stops at the first error.
    pub fn try_map<U, E>(
        &self,
        mut f: impl FnMut(&T) -> Result<U, E>,
    ) -> Result<Dependencies<U>, E> {
        Ok(match self {
            Dependencies::None => Dependencies::None,
            Dependencies::Single(t) => Dependencies::Single(f(t)?),
            Dependencies::List(items) => {
                Dependencies::List(items.iter().map(f).collect::<Result<_, _>>()?)
            }
            Dependencies::Map(items) => Dependencies::Map(
                items
                    .iter()
                    .map(|(k, v)| f(v).map(|u| (k.clone(), u)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Borrow the single member, if this is a `Single` shape.
    pub fn as_single(&self) -> Option<&T> {
        match self {
            Dependencies::Single(t) => Some(t),
            _ => None,
        }
    }

    /// Look up a member of a `Map` shape by key.
    pub fn get(&self, key: &str) -> Option<&T> {
        match self {
            Dependencies::Map(items) => items.get(key),
            _ => None,
        }
    }
}

impl From<&str> for Dependencies<TaskId> {
    fn from(id: &str) -> Self {
        Dependencies::Single(id.to_string())
    }
}

impl From<Vec<&str>> for Dependencies<TaskId> {
    fn from(ids: Vec<&str>) -> Self {
        Dependencies::List(ids.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<TaskId>> for Dependencies<TaskId> {
    fn from(ids: Vec<TaskId>) -> Self {
        Dependencies::List(ids)
    }
}

impl From<BTreeMap<String, TaskId>> for Dependencies<TaskId> {
    fn from(ids: BTreeMap<String, TaskId>) -> Self {
        Dependencies::Map(ids)
    }
}
