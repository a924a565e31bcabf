//! Growable owning collection used for spans, peaks and footprints.
//!
//! `OwnedVec` is a thin wrapper over `Vec` with two additions the detection
//! code relies on: growth reports allocation failure as an error instead of
//! aborting, and an optional per-collection destructor runs on every element
//! still held when the collection is destroyed.

use std::cmp::Ordering;
use std::ops::{Deref, DerefMut};
use std::slice::Iter;

use thiserror::Error;

/// Allocation failure while growing an [`OwnedVec`].
///
/// Callers should treat this as fatal for the current operation; retrying
/// the same allocation is not expected to succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to grow collection to {requested} elements")]
pub struct AllocationError {
    /// Number of elements the collection tried to hold.
    pub requested: usize,
}

/// Hook invoked on each live element when the collection is destroyed.
pub type Destructor<T> = fn(T);

/// A resizable sequence of owned elements with an optional destructor.
///
/// Appends grow geometrically (amortized O(1)), `remove_at` compacts in O(n)
/// and `sort_by` is a stable O(n log n) sort.
#[derive(Debug)]
pub struct OwnedVec<T> {
    items: Vec<T>,
    destructor: Option<Destructor<T>>,
}

impl<T> OwnedVec<T> {
    /// Creates an empty collection with room for `capacity` elements.
    pub fn new(capacity: usize) -> Result<Self, AllocationError> {
        let mut items = Vec::new();
        items
            .try_reserve_exact(capacity)
            .map_err(|_| AllocationError {
                requested: capacity,
            })?;
        Ok(Self {
            items,
            destructor: None,
        })
    }

    /// Creates an empty collection whose elements are passed to
    /// `destructor` when the collection is destroyed.
    pub fn with_destructor(
        capacity: usize,
        destructor: Destructor<T>,
    ) -> Result<Self, AllocationError> {
        let mut collection = Self::new(capacity)?;
        collection.destructor = Some(destructor);
        Ok(collection)
    }

    /// Appends an element, taking ownership of it.
    pub fn append(&mut self, element: T) -> Result<(), AllocationError> {
        if self.items.len() == self.items.capacity() {
            // Double, but always make room for at least a handful of elements.
            let additional = self.items.len().max(4);
            self.items
                .try_reserve(additional)
                .map_err(|_| AllocationError {
                    requested: self.items.len() + additional,
                })?;
        }
        self.items.push(element);
        Ok(())
    }

    /// Removes the element at `index`, shifting later elements down.
    ///
    /// Returns `None` if `index` is out of range.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Sorts the elements in place, preserving the order of equal elements.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.items.sort_by(compare);
    }

    /// Returns the number of elements in the collection.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the collection holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of elements the collection can hold without growing.
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Destroys the collection, running the destructor on every element.
    pub fn destroy(self) {
        drop(self);
    }

    /// Detaches the elements from the collection without running the
    /// destructor on them.
    pub fn into_vec(mut self) -> Vec<T> {
        std::mem::take(&mut self.items)
    }
}

impl<T> Deref for OwnedVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> DerefMut for OwnedVec<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.items
    }
}

impl<T: Clone> Clone for OwnedVec<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            destructor: self.destructor,
        }
    }
}

impl<T> Default for OwnedVec<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            destructor: None,
        }
    }
}

impl<T> Drop for OwnedVec<T> {
    fn drop(&mut self) {
        if let Some(destructor) = self.destructor {
            for item in self.items.drain(..) {
                destructor(item);
            }
        }
    }
}

impl<'a, T> IntoIterator for &'a OwnedVec<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> IntoIterator for OwnedVec<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}
