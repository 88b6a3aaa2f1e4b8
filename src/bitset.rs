//! Compact bitset representation for taxon sets and splits.
//!
//! # Overview
//! A bitset records which taxa sit on one side of a tree edge.
//! Each bit position corresponds to a taxon index in the shared universe.
//!
//! # Example
//! For a universe [A, B, C, D] mapped to indices [0, 1, 2, 3]:
//! - Split side {B, C} → bitset `0b0110` (bits 1 and 2 set)
//! - Universe mask → bitset `0b1111`
//! - Complement of {B, C} within the universe → `0b1001`

/// A compact bitset for representing which taxa belong to a split side.
///
/// Internally stores bits in `Vec<u64>` words to support arbitrarily large trees.
/// Each u64 word holds 64 taxon indices. Two bitsets are only comparable when
/// they were built against the same universe (same word count).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bitset(pub Vec<u64>);

impl Bitset {
    /// Creates a new bitset with all bits set to 0.
    ///
    /// # Parameters
    /// - `words`: Number of u64 words needed. Calculate as `num_taxa.div_ceil(64)`
    ///
    /// # Example
    /// ```
    /// # use rust_python_split_conflicts::bitset::Bitset;
    /// // For a universe of 100 taxa, need 2 words (128 bits)
    /// let bs = Bitset::zeros(2);
    /// assert_eq!(bs.0.len(), 2);
    /// ```
    pub fn zeros(words: usize) -> Self {
        Bitset(vec![0u64; words])
    }

    /// Creates a bitset with the first `n` bits set: the universe mask for `n` taxa.
    ///
    /// # Example
    /// ```
    /// # use rust_python_split_conflicts::bitset::Bitset;
    /// let all = Bitset::ones(4);
    /// assert_eq!(all.0, vec![0b1111]);
    ///
    /// let wide = Bitset::ones(65);
    /// assert_eq!(wide.0, vec![u64::MAX, 1]);
    /// ```
    pub fn ones(n: usize) -> Self {
        let mut bitset = Bitset::zeros(n.div_ceil(64));
        let full_words = n >> 6;
        for word in bitset.0.iter_mut().take(full_words) {
            *word = u64::MAX;
        }
        let rest = n & 63;
        if rest > 0 {
            bitset.0[full_words] = (1u64 << rest) - 1;
        }
        bitset
    }

    /// Sets the bit at the given index to 1.
    ///
    /// Marks a taxon as present on this side of the split.
    ///
    /// # Example
    /// ```
    /// # use rust_python_split_conflicts::bitset::Bitset;
    /// let mut bs = Bitset::zeros(1);
    /// bs.set(0);
    /// bs.set(5);
    /// assert_eq!(bs.0[0], 0b00100001);
    /// ```
    #[inline]
    pub fn set(&mut self, idx: usize) {
        let word = idx >> 6;     // Equivalent to idx / 64
        let bit = idx & 63;      // Equivalent to idx % 64
        self.0[word] |= 1u64 << bit;
    }

    /// Returns true if the bit at `idx` is set.
    #[inline]
    pub fn contains(&self, idx: usize) -> bool {
        let word = idx >> 6;
        let bit = idx & 63;
        self.0.get(word).is_some_and(|w| w & (1u64 << bit) != 0)
    }

    /// Performs bitwise OR with another bitset (union operation).
    ///
    /// # Example
    /// ```
    /// # use rust_python_split_conflicts::bitset::Bitset;
    /// let mut left = Bitset::zeros(1);
    /// left.set(0);   // {0}
    ///
    /// let mut right = Bitset::zeros(1);
    /// right.set(1);  // {1}
    ///
    /// left.or_assign(&right);  // {0} ∪ {1} = {0, 1}
    /// assert_eq!(left.0[0], 0b11);
    /// ```
    #[inline]
    pub fn or_assign(&mut self, other: &Bitset) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a |= *b;
        }
    }

    /// Bitwise AND (intersection), returning a new bitset.
    #[inline]
    pub fn and(&self, other: &Bitset) -> Bitset {
        Bitset(self.0.iter().zip(&other.0).map(|(a, b)| a & b).collect())
    }

    /// Complement of this bitset relative to `universe`.
    ///
    /// Bits outside the universe mask stay cleared, so the complement of a
    /// split side is the other side of the same bipartition.
    ///
    /// # Example
    /// ```
    /// # use rust_python_split_conflicts::bitset::Bitset;
    /// let universe = Bitset::ones(4);
    /// let mut bc = Bitset::zeros(1);
    /// bc.set(1);
    /// bc.set(2);
    /// assert_eq!(bc.complement_within(&universe).0[0], 0b1001);
    /// ```
    #[inline]
    pub fn complement_within(&self, universe: &Bitset) -> Bitset {
        Bitset(self.0.iter().zip(&universe.0).map(|(a, u)| !a & u).collect())
    }

    /// Counts the number of set bits (population count).
    ///
    /// # Example
    /// ```
    /// # use rust_python_split_conflicts::bitset::Bitset;
    /// let mut bs = Bitset::zeros(1);
    /// bs.set(0);
    /// bs.set(2);
    /// bs.set(5);
    /// assert_eq!(bs.count_ones(), 3);
    /// ```
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True when no bit is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    /// Iterates over the indices of set bits in ascending order.
    pub fn ones_iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().flat_map(|(w, &word)| {
            let mut rest = word;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some((w << 6) + bit)
            })
        })
    }

    /// Number of u64 words backing this bitset.
    #[inline]
    pub fn words(&self) -> usize {
        self.0.len()
    }
}
