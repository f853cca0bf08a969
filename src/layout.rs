/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use itertools::izip;
use serde::Deserialize;
use serde::Serialize;

use crate::range::Idx;
use crate::range::Range;

/// The type of error for layout operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LayoutError {
    #[error("invalid rank: expected {expected} dimensions, got {got}")]
    RankMismatch { expected: usize, got: usize },

    #[error("index {index} out of range for dimension {dim} of extent {extent}")]
    IndexOutOfRange {
        dim: usize,
        index: usize,
        extent: usize,
    },

    #[error("range {range} out of bounds for dimension {dim} of extent {extent}")]
    RangeOutOfBounds {
        dim: usize,
        range: Range,
        extent: usize,
    },

    #[error("range {range} for dimension {dim} has zero stride")]
    ZeroStride { dim: usize, range: Range },

    #[error("dimension {dim} out of range for rank {rank}")]
    DimensionOutOfRange { dim: usize, rank: usize },
}

/// A layout maps multidimensional coordinates to offsets into a flat
/// element buffer: an offset, an extent for each dimension, and a
/// stride for each dimension. The offset of a coordinate is
///
/// ```text
/// location(i) = offset + ∑ iₖ × strides[k]
/// ```
///
/// Layouts are the pure index algebra behind
/// [`TensorView`](crate::TensorView) and [`Tensor`](crate::Tensor):
/// they carry no elements, only addressing. Scalar indexing collapses
/// a dimension into the offset ([`collapse`](Layout::collapse)),
/// sub-ranging composes a [`Range`] into a dimension
/// ([`select`](Layout::select)), and both generalize to one combined
/// operation over every dimension at once
/// ([`compose`](Layout::compose)).
///
/// ```
/// use ndtensor::Layout;
///
/// let l = Layout::row_major([2, 3, 4]);
/// assert_eq!(l.strides(), &[12, 4, 1]);
/// assert_eq!(l.location(&[1, 2, 3]).unwrap(), 23);
/// ```
#[derive(Clone, Eq, Hash, PartialEq, Debug, Serialize, Deserialize)]
pub struct Layout {
    offset: usize,
    extents: Vec<usize>,
    strides: Vec<usize>,
}

impl Layout {
    /// Create a layout from raw parts. The only structural
    /// requirement is one stride per extent; whether the layout fits
    /// a particular buffer is checked when the two are bound together
    /// (see [`TensorView::from_parts`](crate::TensorView::from_parts)).
    pub fn new(
        offset: usize,
        extents: Vec<usize>,
        strides: Vec<usize>,
    ) -> Result<Self, LayoutError> {
        if extents.len() != strides.len() {
            return Err(LayoutError::RankMismatch {
                expected: extents.len(),
                got: strides.len(),
            });
        }
        Ok(Self {
            offset,
            extents,
            strides,
        })
    }

    /// A dense row-major layout of the given extents, offset 0: the
    /// outermost dimension varies slowest and
    /// `strides[i] = extents[i+1] × extents[i+2] × …`.
    pub fn row_major(extents: impl Into<Vec<usize>>) -> Self {
        let extents = extents.into();
        let mut strides = vec![1; extents.len()];
        for i in (0..extents.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * extents[i + 1];
        }
        Self {
            offset: 0,
            extents,
            strides,
        }
    }

    /// The number of dimensions.
    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    /// The number of addressed elements: the product of the extents.
    /// A rank-0 layout addresses exactly one element.
    pub fn len(&self) -> usize {
        self.extents.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The offset of the first addressed element.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The extent of each dimension, outermost first.
    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    /// The stride of each dimension, in element units.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Whether the addressed elements form one gap-free row-major run
    /// starting at `offset`.
    pub fn is_contiguous(&self) -> bool {
        let mut expected = 1;
        for (&stride, &extent) in izip!(&self.strides, &self.extents).rev() {
            if stride != expected {
                return false;
            }
            expected *= extent;
        }
        true
    }

    /// The least buffer length this layout can be bound to: one past
    /// the largest reachable offset, or 0 if no element is addressed.
    pub fn span(&self) -> usize {
        if self.extents.iter().any(|&e| e == 0) {
            return 0;
        }
        let reach: usize = izip!(&self.extents, &self.strides)
            .map(|(&e, &s)| (e - 1) * s)
            .sum();
        self.offset + reach + 1
    }

    /// The flat offset of the given coordinates. Every coordinate is
    /// bounds-checked against its extent.
    pub fn location(&self, coords: &[usize]) -> Result<usize, LayoutError> {
        if coords.len() != self.rank() {
            return Err(LayoutError::RankMismatch {
                expected: self.rank(),
                got: coords.len(),
            });
        }
        let mut loc = self.offset;
        for (dim, (&index, &extent, &stride)) in
            izip!(coords, &self.extents, &self.strides).enumerate()
        {
            if index >= extent {
                return Err(LayoutError::IndexOutOfRange { dim, index, extent });
            }
            loc += index * stride;
        }
        Ok(loc)
    }

    /// Fix one dimension to a single index, removing it. The fixed
    /// coordinate's contribution (`index × stride`) is absorbed into
    /// the offset; the remaining dimensions keep their strides.
    pub fn collapse(&self, dim: usize, index: usize) -> Result<Self, LayoutError> {
        if dim >= self.rank() {
            return Err(LayoutError::DimensionOutOfRange {
                dim,
                rank: self.rank(),
            });
        }
        let extent = self.extents[dim];
        if index >= extent {
            return Err(LayoutError::IndexOutOfRange { dim, index, extent });
        }
        let mut extents = self.extents.clone();
        let mut strides = self.strides.clone();
        extents.remove(dim);
        strides.remove(dim);
        Ok(Self {
            offset: self.offset + index * self.strides[dim],
            extents,
            strides,
        })
    }

    /// Restrict one dimension to a [`Range`]:
    ///
    /// ```text
    /// offset       += start × strides[dim]
    /// extents[dim]  = range extent (resolved if full)
    /// strides[dim] ×= range stride
    /// ```
    ///
    /// The result is again zero-based in the selected dimension; the
    /// restriction is absorbed into offset and stride, so `select`
    /// composes — selecting twice is one select of the composed
    /// range. The last selected position must lie within the
    /// dimension.
    pub fn select(&self, dim: usize, range: Range) -> Result<Self, LayoutError> {
        if dim >= self.rank() {
            return Err(LayoutError::DimensionOutOfRange {
                dim,
                rank: self.rank(),
            });
        }
        let (start, extent, step) = checked_resolve(dim, range, self.extents[dim])?;
        let mut out = self.clone();
        out.offset += start * self.strides[dim];
        out.extents[dim] = extent;
        out.strides[dim] *= step;
        Ok(out)
    }

    /// Apply one indexing argument per dimension: scalars collapse
    /// their dimension, ranges restrict it. The result rank is the
    /// number of range arguments, and kept dimensions preserve their
    /// relative order. This is the single code path behind every
    /// scalar/range indexing combination of a rank-`n` view.
    pub fn compose(&self, spec: &[Idx]) -> Result<Self, LayoutError> {
        if spec.len() != self.rank() {
            return Err(LayoutError::RankMismatch {
                expected: self.rank(),
                got: spec.len(),
            });
        }
        let mut offset = self.offset;
        let mut extents = Vec::with_capacity(self.rank());
        let mut strides = Vec::with_capacity(self.rank());
        for (dim, (arg, &extent, &stride)) in
            izip!(spec, &self.extents, &self.strides).enumerate()
        {
            match *arg {
                Idx::At(index) => {
                    if index >= extent {
                        return Err(LayoutError::IndexOutOfRange { dim, index, extent });
                    }
                    offset += index * stride;
                }
                Idx::Span(range) => {
                    let (start, n, step) = checked_resolve(dim, range, extent)?;
                    offset += start * stride;
                    extents.push(n);
                    strides.push(stride * step);
                }
            }
        }
        Ok(Self {
            offset,
            extents,
            strides,
        })
    }

    /// Insert a degenerate (extent 1) dimension at position `dim`,
    /// reinterpreting the same addressed elements at rank + 1.
    pub fn insert_axis(&self, dim: usize) -> Result<Self, LayoutError> {
        if dim > self.rank() {
            return Err(LayoutError::DimensionOutOfRange {
                dim,
                rank: self.rank(),
            });
        }
        // The stride of an extent-1 dimension is never multiplied by
        // a nonzero index; pick the value that keeps dense layouts
        // dense.
        let stride = if dim < self.rank() {
            self.extents[dim] * self.strides[dim]
        } else {
            1
        };
        let mut extents = self.extents.clone();
        let mut strides = self.strides.clone();
        extents.insert(dim, 1);
        strides.insert(dim, stride);
        Ok(Self {
            offset: self.offset,
            extents,
            strides,
        })
    }

    /// Insert a degenerate dimension as the new outermost dimension.
    pub fn expand_outer(&self) -> Self {
        self.insert_axis(0).expect("dimension 0 is always insertable")
    }

    /// Iterator over the flat offsets of every addressed element, in
    /// row-major order (last dimension varies fastest).
    pub fn locations(&self) -> Locations {
        Locations {
            extents: self.extents.clone(),
            strides: self.strides.clone(),
            coords: vec![0; self.rank()],
            offset: self.offset,
            remaining: self.len(),
        }
    }
}

fn checked_resolve(
    dim: usize,
    range: Range,
    extent: usize,
) -> Result<(usize, usize, usize), LayoutError> {
    if range.stride() == 0 {
        return Err(LayoutError::ZeroStride { dim, range });
    }
    let (start, n, step) = range.resolve(extent);
    let in_bounds = if n == 0 {
        start <= extent
    } else {
        start + (n - 1) * step < extent
    };
    if !in_bounds {
        return Err(LayoutError::RangeOutOfBounds { dim, range, extent });
    }
    Ok((start, n, step))
}

/// Iterates over the flat offsets addressed by a [`Layout`], in
/// row-major order. Produced by [`Layout::locations`]; the layout's
/// dimensions are captured at creation, so the iterator is
/// self-contained.
pub struct Locations {
    extents: Vec<usize>,
    strides: Vec<usize>,
    coords: Vec<usize>,
    offset: usize,
    remaining: usize,
}

impl Iterator for Locations {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.offset;
        self.remaining -= 1;
        if self.remaining > 0 {
            // Odometer step: bump the innermost coordinate, carrying
            // outward, and adjust the running offset as we go.
            for dim in (0..self.coords.len()).rev() {
                self.coords[dim] += 1;
                if self.coords[dim] < self.extents[dim] {
                    self.offset += self.strides[dim];
                    break;
                }
                self.coords[dim] = 0;
                self.offset -= (self.extents[dim] - 1) * self.strides[dim];
            }
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Locations {}
