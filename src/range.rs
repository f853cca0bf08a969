/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A range of positions along one dimension: a start index, an extent
/// (element count), and a stride. Ranges are convertible from native
/// Rust ranges.
///
/// An extent of `None` is the *full* range: "everything from `start`
/// to the end of the dimension, in steps of `stride`". Its concrete
/// extent is only known once the range is composed against a parent
/// dimension, so it is resolved lazily (see [`Range::resolve`]).
///
/// ```
/// use ndtensor::Range;
///
/// let r: Range = (2..6).into();
/// assert_eq!((r.start(), r.extent(), r.stride()), (2, Some(4), 1));
///
/// let rest: Range = (3..).into();
/// assert_eq!(rest.extent(), None);
///
/// let every_other = Range::strided(0, 2, 2);
/// assert_eq!(every_other.stride(), 2);
/// ```
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Range {
    start: usize,
    extent: Option<usize>,
    stride: usize,
}

impl Range {
    /// A range of `extent` positions starting at `start`, stride 1.
    pub const fn new(start: usize, extent: usize) -> Self {
        Self {
            start,
            extent: Some(extent),
            stride: 1,
        }
    }

    /// A range of `extent` positions starting at `start`, taking
    /// every `stride`-th position.
    pub const fn strided(start: usize, extent: usize, stride: usize) -> Self {
        Self {
            start,
            extent: Some(extent),
            stride,
        }
    }

    /// The full range: every position of the dimension it is later
    /// composed against.
    pub const fn all() -> Self {
        Self {
            start: 0,
            extent: None,
            stride: 1,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// The requested extent, or `None` for a full range.
    pub fn extent(&self) -> Option<usize> {
        self.extent
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Whether this range still needs a parent extent to become
    /// concrete.
    pub fn is_full(&self) -> bool {
        self.extent.is_none()
    }

    /// Resolve against a parent dimension of `extent` positions,
    /// yielding concrete `(start, extent, stride)`. A full range
    /// becomes "from `start` to the end": `⌈(extent - start) /
    /// stride⌉` positions.
    ///
    /// Resolution is purely arithmetic; bounds against the parent are
    /// checked where the range is composed into a layout (see
    /// [`Layout::select`](crate::Layout::select)).
    pub(crate) fn resolve(&self, extent: usize) -> (usize, usize, usize) {
        match self.extent {
            Some(n) => (self.start, n, self.stride),
            None => {
                let n = extent
                    .saturating_sub(self.start)
                    .div_ceil(self.stride.max(1));
                (self.start, n, self.stride)
            }
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.extent {
            Some(n) => write!(f, "{}:{}:{}", self.start, n, self.stride),
            None => write!(f, "{}:*:{}", self.start, self.stride),
        }
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::new(r.start, r.end.saturating_sub(r.start))
    }
}

impl From<std::ops::RangeInclusive<usize>> for Range {
    fn from(r: std::ops::RangeInclusive<usize>) -> Self {
        Self::new(*r.start(), (*r.end() + 1).saturating_sub(*r.start()))
    }
}

impl From<std::ops::RangeFrom<usize>> for Range {
    fn from(r: std::ops::RangeFrom<usize>) -> Self {
        Self {
            start: r.start,
            extent: None,
            stride: 1,
        }
    }
}

impl From<std::ops::RangeFull> for Range {
    fn from(_: std::ops::RangeFull) -> Self {
        Self::all()
    }
}

impl From<usize> for Range {
    fn from(idx: usize) -> Self {
        Self::new(idx, 1)
    }
}

/// One indexing argument: either a scalar index, which collapses its
/// dimension away, or a [`Range`], which keeps it. A rank-`n` view is
/// indexed by `n` of these, and the result rank is the number of
/// `Span` arguments — see
/// [`TensorView::slice`](crate::TensorView::slice).
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub enum Idx {
    /// Select a single position; the dimension disappears.
    At(usize),
    /// Select a sub-range; the dimension remains.
    Span(Range),
}

impl From<usize> for Idx {
    fn from(idx: usize) -> Self {
        Self::At(idx)
    }
}

impl From<Range> for Idx {
    fn from(r: Range) -> Self {
        Self::Span(r)
    }
}

impl From<std::ops::Range<usize>> for Idx {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::Span(r.into())
    }
}

impl From<std::ops::RangeInclusive<usize>> for Idx {
    fn from(r: std::ops::RangeInclusive<usize>) -> Self {
        Self::Span(r.into())
    }
}

impl From<std::ops::RangeFrom<usize>> for Idx {
    fn from(r: std::ops::RangeFrom<usize>) -> Self {
        Self::Span(r.into())
    }
}

impl From<std::ops::RangeFull> for Idx {
    fn from(_: std::ops::RangeFull) -> Self {
        Self::Span(Range::all())
    }
}

impl fmt::Display for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Idx::At(i) => write!(f, "{}", i),
            Idx::Span(r) => write!(f, "{}", r),
        }
    }
}

/// Build an indexing argument list for
/// [`TensorView::slice`](crate::TensorView::slice) and friends. Each
/// element is anything convertible to [`Idx`]: a scalar index, a
/// native Rust range, `..`, or an explicit [`Range`].
///
/// ```
/// use ndtensor::{idx, Range, Tensor};
///
/// let t = Tensor::from_flat(vec![2, 3], vec![1, 2, 3, 4, 5, 6]).unwrap();
/// let row = t.slice(&idx![1, ..]).unwrap();
/// assert_eq!(row.iter().copied().collect::<Vec<_>>(), [4, 5, 6]);
///
/// let corner = t.slice(&idx![.., Range::strided(0, 2, 2)]).unwrap();
/// assert_eq!(corner.extents(), &[2, 2]);
/// ```
#[macro_export]
macro_rules! idx {
    ( $( $arg:expr ),* $(,)? ) => {
        [ $( $crate::Idx::from($arg) ),* ]
    };
}
