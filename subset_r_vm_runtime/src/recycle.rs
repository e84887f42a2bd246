//! Vector recycling.
//!
//! Shorter operands of an elementwise operation are logically repeated to
//! the length of the longest one. A zero-length operand makes the whole
//! result empty.

use crate::error::{RError, RResult};
use crate::na::{Element, INT_NA};
use crate::vector::Vector;

pub const RECYCLE_WARNING: &str =
    "longer object length is not a multiple of shorter object length";

/// Iteration shape of an elementwise operation over several operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recycling {
    len: usize,
    lengths: Vec<usize>,
}

/// Output length and index mapping for operands of the given lengths.
///
/// ```
/// use subset_r_vm_runtime::recycle::recycle;
///
/// let r = recycle(&[6, 2, 1]);
/// assert_eq!(r.len(), 6);
/// assert_eq!(r.index(1, 5), 1);
/// assert_eq!(r.index(2, 5), 0);
/// assert!(!r.is_ragged());
/// ```
pub fn recycle(lengths: &[usize]) -> Recycling {
    let len = if lengths.iter().any(|l| *l == 0) {
        0
    } else {
        lengths.iter().copied().max().unwrap_or(0)
    };
    Recycling {
        len,
        lengths: lengths.to_vec(),
    }
}

impl Recycling {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index into operand `k` for output position `i`.
    #[inline]
    pub fn index(&self, k: usize, i: usize) -> usize {
        let n = self.lengths[k];
        if n == self.len {
            i
        } else {
            i % n
        }
    }

    /// Every operand already has the output length.
    pub fn is_identity(&self) -> bool {
        self.lengths.iter().all(|l| *l == self.len)
    }

    /// Some operand's length does not divide the output length.
    pub fn is_ragged(&self) -> bool {
        self.len > 0 && self.lengths.iter().any(|l| self.len % l != 0)
    }
}

/// Source indices of `rep.int(x, times)`.
///
/// A single count repeats the whole vector; one count per element repeats
/// each element in place. Any other shape of `times` is an error.
pub fn rep_int_layout(x_len: usize, times: &[i32]) -> RResult<Vec<usize>> {
    let invalid = || RError::value_error("invalid 'times' value");
    if times.len() == 1 {
        let t = times[0];
        if t == INT_NA || t < 0 {
            return Err(invalid());
        }
        let mut out = layout_buffer(x_len.checked_mul(t as usize))?;
        if x_len > 0 {
            for _ in 0..t {
                out.extend(0..x_len);
            }
        }
        Ok(out)
    } else if times.len() == x_len {
        if times.iter().any(|t| *t == INT_NA || *t < 0) {
            return Err(invalid());
        }
        let total = times
            .iter()
            .try_fold(0usize, |acc, t| acc.checked_add(*t as usize));
        let mut out = layout_buffer(total)?;
        for (i, t) in times.iter().enumerate() {
            out.extend(std::iter::repeat(i).take(*t as usize));
        }
        Ok(out)
    } else {
        Err(invalid())
    }
}

/// Vectors are indexed by `i32`, so no result may be longer than this.
pub const MAX_VECTOR_LENGTH: usize = i32::MAX as usize;

/// Empty buffer for `len` layout entries; `None` means the length
/// overflowed.
fn layout_buffer(len: Option<usize>) -> RResult<Vec<usize>> {
    let too_long = || {
        RError::value_error(match len {
            Some(n) => format!("cannot allocate a vector of length {}", n),
            None => "cannot allocate a vector of that length".to_string(),
        })
    };
    let len = len.filter(|n| *n <= MAX_VECTOR_LENGTH).ok_or_else(too_long)?;
    let mut out = Vec::new();
    out.try_reserve_exact(len).map_err(|_| too_long())?;
    Ok(out)
}

/// `rep.int` on a typed vector. Attributes are not kept.
pub fn rep_int<T: Element>(x: &Vector<T>, times: &[i32]) -> RResult<Vector<T>> {
    let layout = rep_int_layout(x.len(), times)?;
    let data = x.as_slice();
    Ok(Vector::new(
        layout.into_iter().map(|i| data[i].clone()).collect(),
        x.is_complete(),
    ))
}

/// Cyclic repetition to exactly `len` elements. An empty `x` gives NA.
pub fn rep_len<T: Element>(x: &Vector<T>, len: usize) -> Vector<T> {
    if x.is_empty() {
        return Vector::na(len);
    }
    let data = x.as_slice();
    Vector::new(
        (0..len).map(|i| data[i % data.len()].clone()).collect(),
        x.is_complete(),
    )
}
