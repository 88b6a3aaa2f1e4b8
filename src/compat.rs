//! Pairwise split compatibility.
//!
//! Two bipartitions can live in the same tree iff at least one of the four
//! quadrants formed by their sides is empty:
//!
//! ```text
//!            b        ¬b
//!      a   a∩b      a∩¬b
//!     ¬a  ¬a∩b     ¬a∩¬b
//! ```
//!
//! Example over {A,B,C,D}: `{B,C}` and `{B,D}` fill all four quadrants
//! (B, C, D, A), so they conflict. `{B,C}` and `{B,C,D}` leave `{B,C}∩¬{B,C,D}`
//! empty, so they are compatible (nested).

use crate::bitset::Bitset;

/// Returns true if split sides `a` and `b` are compatible within `universe`.
///
/// Works word by word on the three masks and never allocates. Bits outside
/// `universe` are ignored.
///
/// Callers comparing a target tree against a reference pass the target split
/// first: `is_compatible(target_split, reference_split, universe)`.
///
/// # Example
/// ```
/// # use rust_python_split_conflicts::bitset::Bitset;
/// # use rust_python_split_conflicts::compat::is_compatible;
/// let universe = Bitset::ones(4);           // A B C D
/// let bc = Bitset(vec![0b0110]);
/// let bd = Bitset(vec![0b1010]);
/// let bcd = Bitset(vec![0b1110]);
/// assert!(!is_compatible(&bd, &bc, &universe));
/// assert!(is_compatible(&bcd, &bc, &universe));
/// ```
pub fn is_compatible(a: &Bitset, b: &Bitset, universe: &Bitset) -> bool {
    let mut a_b = 0u64;
    let mut a_not_b = 0u64;
    let mut not_a_b = 0u64;
    let mut not_a_not_b = 0u64;

    for ((&x, &y), &u) in a.0.iter().zip(&b.0).zip(&universe.0) {
        let x = x & u;
        let y = y & u;
        a_b |= x & y;
        a_not_b |= x & !y & u;
        not_a_b |= !x & y & u;
        not_a_not_b |= !x & !y & u;
    }

    a_b == 0 || a_not_b == 0 || not_a_b == 0 || not_a_not_b == 0
}
