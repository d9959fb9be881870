//! "Matters" bit-sets.
//!
//! On disk a set is `(legacy_count: i32, word_count: i32, word_count x i32)`.
//! Bit `i` of word `w` marks index `w * 32 + i`. The legacy count is written as
//! `word_count` again; readers ignore it.

use super::{ByteReader, ByteWriter};
use crate::util::{Error, Result};

const WORD_BITS: usize = 32;

/// Dense set of small non-negative indices (node, object or IFL indices).
///
/// The number of stored words is remembered so that a decoded set re-encodes
/// to the same bytes. Equality compares membership only.
#[derive(Clone, Default)]
pub struct BitSet {
    words: Vec<u32>,
}

impl BitSet {
    /// Empty set with no storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty set sized for indices `0..bits` (encodes to `ceil(bits / 32)` words).
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: vec![0; bits.div_ceil(WORD_BITS)],
        }
    }

    /// Build from a dense boolean array, one entry per index.
    pub fn from_bools(bits: &[bool]) -> Self {
        let mut set = Self::with_capacity(bits.len());
        for (i, _) in bits.iter().enumerate().filter(|(_, b)| **b) {
            set.insert(i);
        }
        set
    }

    /// Build from raw words as stored on disk.
    pub fn from_words(words: Vec<u32>) -> Self {
        Self { words }
    }

    /// Raw words as stored on disk.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Number of indices the stored words can represent.
    pub fn capacity(&self) -> usize {
        self.words.len() * WORD_BITS
    }

    /// Add an index, growing storage as needed.
    pub fn insert(&mut self, index: usize) {
        let word = index / WORD_BITS;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u32 << (index % WORD_BITS);
    }

    /// Remove an index.
    pub fn remove(&mut self, index: usize) {
        if let Some(word) = self.words.get_mut(index / WORD_BITS) {
            *word &= !(1u32 << (index % WORD_BITS));
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.words
            .get(index / WORD_BITS)
            .is_some_and(|word| word & (1u32 << (index % WORD_BITS)) != 0)
    }

    /// Number of set indices.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Number of set indices strictly below `index`.
    ///
    /// This is the slot a node occupies in a sequence's block of the flat
    /// channel arrays: set members consume slots in ascending index order.
    pub fn rank(&self, index: usize) -> usize {
        let word = index / WORD_BITS;
        let full: usize = self
            .words
            .iter()
            .take(word)
            .map(|w| w.count_ones() as usize)
            .sum();
        let partial = match self.words.get(word) {
            Some(w) => (w & ((1u32 << (index % WORD_BITS)) - 1)).count_ones() as usize,
            None => 0,
        };
        full + partial
    }

    /// Set indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, word)| {
            (0..WORD_BITS)
                .filter(move |bit| word & (1u32 << bit) != 0)
                .map(move |bit| w * WORD_BITS + bit)
        })
    }

    /// Dense boolean view of length [`BitSet::capacity`].
    pub fn to_bools(&self) -> Vec<bool> {
        (0..self.capacity()).map(|i| self.contains(i)).collect()
    }

    /// Decode a set from a plain section.
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        let _legacy_count = r.read_i32()?;
        let num_words = r.read_count("bit-set word")?;
        let mut words = Vec::with_capacity(num_words.min(r.remaining() / 4));
        for _ in 0..num_words {
            words.push(r.read_u32()?);
        }
        Ok(Self { words })
    }

    /// Encode a set to a plain section.
    pub fn write(&self, w: &mut ByteWriter) -> Result<()> {
        w.write_count(self.words.len())?;
        w.write_count(self.words.len())?;
        for word in &self.words {
            w.write_u32(*word)?;
        }
        Ok(())
    }

    /// Members of either set.
    pub fn union(&self, other: &BitSet) -> BitSet {
        let len = self.words.len().max(other.words.len());
        let word = |set: &BitSet, i: usize| set.words.get(i).copied().unwrap_or(0);
        BitSet {
            words: (0..len).map(|i| word(self, i) | word(other, i)).collect(),
        }
    }

    /// Highest set index, if any.
    pub fn max(&self) -> Option<usize> {
        self.iter().last()
    }

    /// Check every member is below `limit`.
    pub(crate) fn check_bound(&self, limit: usize, what: &str) -> Result<()> {
        match self.max() {
            Some(max) if max >= limit => Err(Error::invariant(format!(
                "{what} set contains index {max}, limit is {limit}"
            ))),
            _ => Ok(()),
        }
    }
}

impl PartialEq for BitSet {
    fn eq(&self, other: &Self) -> bool {
        let len = self.words.len().max(other.words.len());
        let word = |set: &BitSet, i: usize| set.words.get(i).copied().unwrap_or(0);
        (0..len).all(|i| word(self, i) == word(other, i))
    }
}

impl Eq for BitSet {}

impl std::fmt::Debug for BitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<usize> for BitSet {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        let mut set = Self::new();
        for i in iter {
            set.insert(i);
        }
        set
    }
}
