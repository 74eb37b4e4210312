use std::fmt::{Debug, Error, Formatter};
use std::iter::{DoubleEndedIterator, Enumerate, FromIterator};
use std::ops::Sub;
use std::result::Result;
use std::slice::Iter;
use std::vec::IntoIter as VecIntoIter;

/// Elements with a width (eg. when used in an `OffsetVec`)
///
/// The width may depend on where the element ends up. This is the case for `tableswitch` and
/// `lookupswitch`, whose padding is chosen so that their operands are four-byte aligned.
pub trait Width {
    fn width(&self, offset: Offset) -> usize;
}

/// A vector of elements of different logical "widths", where offsets into the vector are given in
/// terms of the sum of the widths of the previous elements (as opposed to the number of preceding
/// elements).
///
/// This sort of structure ends up being convenient in several places for modelling JVM classfiles:
///
///   - constant pool and indices (most entries have width 1, but some have width 2)
///   - method code and jump targets (different instructions have different sizes)
///
/// Unlike a plain `Vec`, inserting or removing an element in the middle shifts the offsets of
/// every element after it. Offsets are always recomputed from the widths, so the invariant
/// `offset(n + 1) == offset(n) + width(n)` holds after every mutation.
#[derive(Clone)]
pub struct OffsetVec<T: Sized> {
    /// Entries, along with their offset
    entries: Vec<(Offset, T)>,

    /// Offset of the next element to be added
    offset_len: Offset,

    /// Offset for the first element (usually 0, but sometimes 1)
    initial_offset: Offset,
}

/// Offset into an `OffsetVec`
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Offset(pub usize);

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "@{}", self.0)
    }
}

impl Sub for Offset {
    type Output = isize;

    fn sub(self, other: Offset) -> isize {
        (self.0 as isize) - (other.0 as isize)
    }
}

impl<T: Sized + Width> OffsetVec<T> {
    /// New empty offset vector
    pub fn new() -> OffsetVec<T> {
        OffsetVec::new_starting_at(Offset(0))
    }

    /// New empty offset vector, with a custom starting offset
    pub fn new_starting_at(initial_offset: Offset) -> OffsetVec<T> {
        OffsetVec::with_capacity_starting_at(0, initial_offset)
    }

    /// New empty offset vector with room for `capacity` entries before reallocating
    pub fn with_capacity_starting_at(capacity: usize, initial_offset: Offset) -> OffsetVec<T> {
        OffsetVec {
            entries: Vec::with_capacity(capacity),
            offset_len: initial_offset,
            initial_offset,
        }
    }

    /// Length of the `OffsetVec` (aka. number of entries)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current offset size of the `OffsetVec` (aka. offset of the next element
    /// to be added)
    pub fn offset_len(&self) -> Offset {
        self.offset_len
    }

    /// Add an entry to the back
    pub fn push(&mut self, slot: T) -> Offset {
        let offset = self.offset_len;
        self.offset_len.0 += slot.width(offset);
        self.entries.push((offset, slot));

        offset
    }

    /// Insert an entry so that it ends up at position `index`, shifting everything after it
    ///
    /// Panics if `index > len`, like `Vec::insert`.
    pub fn insert(&mut self, index: usize, slot: T) -> Offset {
        let offset = self.start_of(index);
        self.entries.insert(index, (offset, slot));
        self.relayout_from(index);
        offset
    }

    /// Remove the entry at position `index`, shifting everything after it back
    ///
    /// Panics if `index >= len`, like `Vec::remove`.
    pub fn remove(&mut self, index: usize) -> (Offset, T) {
        let removed = self.entries.remove(index);
        self.relayout_from(index);
        removed
    }

    /// Swap out the entry at position `index`, returning the old entry
    ///
    /// Panics if `index >= len`.
    pub fn replace(&mut self, index: usize, slot: T) -> T {
        let replaced = std::mem::replace(&mut self.entries[index].1, slot);
        self.relayout_from(index);
        replaced
    }

    /// Get an entry (and its index) by its offset in the vector
    ///
    /// Note: this uses binary search to find the offset
    pub fn get_offset(&self, offset: Offset) -> OffsetResult<&T> {
        match self.find_offset(offset) {
            OffsetResult::Ok(found_idx, ()) => OffsetResult::Ok(found_idx, &self.entries[found_idx].1),
            OffsetResult::InvalidOffset(idx) => OffsetResult::InvalidOffset(idx),
            OffsetResult::TooLarge => OffsetResult::TooLarge,
        }
    }

    fn find_offset(&self, offset: Offset) -> OffsetResult<()> {
        match self.entries.binary_search_by_key(&offset, |(off, _)| *off) {
            Err(insert_at) if insert_at == self.entries.len() => {
                // The offset may still fall inside the last element
                if offset < self.offset_len && insert_at > 0 {
                    OffsetResult::InvalidOffset(insert_at - 1)
                } else {
                    OffsetResult::TooLarge
                }
            }
            Err(0) => OffsetResult::TooLarge,
            Err(insert_at) => OffsetResult::InvalidOffset(insert_at - 1),
            Ok(found_idx) => OffsetResult::Ok(found_idx, ()),
        }
    }

    /// Get an entry (and its offset) by its position in the vector
    pub fn get_index(&self, index: usize) -> Option<(Offset, &T)> {
        self.entries.get(index).map(|(offset, t)| (*offset, t))
    }

    /// Mutably get an entry (and its offset) by its position in the vector
    ///
    /// The caller must not change the width of the entry (use `replace` for that).
    pub fn get_index_mut(&mut self, index: usize) -> Option<(Offset, &mut T)> {
        self.entries.get_mut(index).map(|(offset, t)| (*offset, t))
    }

    pub fn iter<'a>(&'a self) -> OffsetVecIter<'a, T> {
        self.into_iter()
    }

    /// Mutably iterate over the entries (the same width caveat as `get_index_mut` applies)
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Offset, usize, &mut T)> {
        self.entries
            .iter_mut()
            .enumerate()
            .map(|(idx, (off, elem))| (*off, idx, elem))
    }

    /// Offset at which an element inserted at `index` would start
    fn start_of(&self, index: usize) -> Offset {
        match self.entries.get(index) {
            Some((offset, _)) => *offset,
            None => self.offset_len,
        }
    }

    /// Recompute offsets from position `index` onwards
    ///
    /// Widths can depend on offsets, so this can't just add a fixed delta to everything after
    /// `index`: each element is re-measured at its new position.
    fn relayout_from(&mut self, index: usize) {
        let mut offset = if index == 0 {
            self.initial_offset
        } else {
            let (prev_offset, prev) = &self.entries[index - 1];
            Offset(prev_offset.0 + prev.width(*prev_offset))
        };
        for (entry_offset, entry) in &mut self.entries[index..] {
            *entry_offset = offset;
            offset.0 += entry.width(offset);
        }
        self.offset_len = offset;
    }
}

impl<A: PartialEq> PartialEq for OffsetVec<A> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<A: Eq> Eq for OffsetVec<A> {}

impl<A: Width> Default for OffsetVec<A> {
    fn default() -> Self {
        OffsetVec::new()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum OffsetResult<T> {
    /// Element was accessed
    Ok(usize, T),

    /// Offset was invalid, and falls in the middle of the element at this index
    InvalidOffset(usize),

    /// Offset is too big (or smaller than the initial offset)
    TooLarge,
}

/// Iterator for owned `OffsetVec`
pub struct OffsetVecIntoIter<T>(Enumerate<VecIntoIter<(Offset, T)>>);

impl<T> Iterator for OffsetVecIntoIter<T> {
    type Item = (Offset, usize, T);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(idx, (off, elem))| (off, idx, elem))
    }
}

impl<T> DoubleEndedIterator for OffsetVecIntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0
            .next_back()
            .map(|(idx, (off, elem))| (off, idx, elem))
    }
}

impl<T> IntoIterator for OffsetVec<T> {
    type Item = (Offset, usize, T);
    type IntoIter = OffsetVecIntoIter<T>;

    fn into_iter(self) -> OffsetVecIntoIter<T> {
        OffsetVecIntoIter(self.entries.into_iter().enumerate())
    }
}

/// Iterator for borrowed `OffsetVec`
pub struct OffsetVecIter<'a, T>(Enumerate<Iter<'a, (Offset, T)>>);

impl<'a, T> Iterator for OffsetVecIter<'a, T> {
    type Item = (Offset, usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(idx, (off, elem))| (*off, idx, elem))
    }
}

impl<'a, T> DoubleEndedIterator for OffsetVecIter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0
            .next_back()
            .map(|(idx, (off, elem))| (*off, idx, elem))
    }
}

impl<'a, T> IntoIterator for &'a OffsetVec<T> {
    type Item = (Offset, usize, &'a T);
    type IntoIter = OffsetVecIter<'a, T>;

    fn into_iter(self) -> OffsetVecIter<'a, T> {
        OffsetVecIter(self.entries.iter().enumerate())
    }
}

impl<T: Width> FromIterator<T> for OffsetVec<T> {
    fn from_iter<A: IntoIterator<Item = T>>(elems: A) -> Self {
        let mut offset_vec = OffsetVec::new();
        for elem in elems {
            offset_vec.push(elem);
        }
        offset_vec
    }
}

impl<T: Debug> Debug for OffsetVec<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let mut list = f.debug_list();
        for (off, elem) in &self.entries {
            list.entry(&format_args!("#{} = {:?}", off.0, elem));
        }
        list.finish()
    }
}
