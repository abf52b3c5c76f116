//! Dense, ID-indexed storage for model objects.

use serde::{Deserialize, Serialize};
use std::iter::Map;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut, Range};

/// An opaque ID usable as an [`Arena`] key.
pub trait ArenaId: Copy {
    /// Creates an ID from a raw index.
    fn from_raw(index: u32) -> Self;

    /// Returns the raw index.
    fn as_raw(self) -> u32;
}

/// Append-only vector keyed by an ID type.
///
/// Objects are never removed, so IDs stay valid for as long as the owning
/// module or design lives. Discarding a module instance discards its arenas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena<I: ArenaId, T> {
    items: Vec<T>,
    #[serde(skip)]
    _marker: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Stores `item` and returns its ID.
    pub fn alloc(&mut self, item: T) -> I {
        let id = I::from_raw(self.items.len() as u32);
        self.items.push(item);
        id
    }

    /// Returns the item for `id`, or `None` if the ID belongs to another arena.
    pub fn try_get(&self, id: I) -> Option<&T> {
        self.items.get(id.as_raw() as usize)
    }

    /// Returns the item for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of bounds.
    pub fn get(&self, id: I) -> &T {
        &self.items[id.as_raw() as usize]
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.as_raw() as usize]
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `(ID, &T)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_raw(i as u32), item))
    }

    /// IDs in allocation order. The iterator does not borrow the arena.
    pub fn ids(&self) -> Map<Range<u32>, fn(u32) -> I> {
        (0..self.items.len() as u32).map(I::from_raw as fn(u32) -> I)
    }

    /// Items in allocation order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        self.get(id)
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        self.get_mut(id)
    }
}
