/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt;

use crate::layout::Layout;
use crate::layout::LayoutError;
use crate::layout::Locations;
use crate::range::Idx;
use crate::range::Range;
use crate::tensor::Tensor;

/// The type of error for tensor and view operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TensorError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("shape mismatch: destination {dst:?}, source {src:?}")]
    ShapeMismatch { dst: Vec<usize>, src: Vec<usize> },

    #[error("layout spans {required} elements, buffer holds {available}")]
    BufferTooShort { required: usize, available: usize },

    #[error("view is not contiguous")]
    NonContiguous,

    #[error("flat data of length {len} cannot fill extents {extents:?} ({expected} elements)")]
    LengthMismatch {
        extents: Vec<usize>,
        expected: usize,
        len: usize,
    },
}

/// A shared, non-owning view of tensor elements: a [`Layout`] bound
/// to a borrowed slice of element storage.
///
/// A view never allocates and never copies; sub-ranging a view yields
/// another view over the same storage, with the restriction absorbed
/// into the layout. The borrow ties the view's lifetime to the
/// storage it reads, so a view cannot outlive — or observe a resize
/// of — the [`Tensor`] it came from.
///
/// ```
/// use ndtensor::{idx, Tensor};
///
/// let t = Tensor::from_flat(vec![3, 3], (1..=9).collect::<Vec<i64>>()).unwrap();
/// let inner = t.slice(&idx![1..3, 1..3]).unwrap();
/// assert_eq!(inner.iter().copied().collect::<Vec<_>>(), [5, 6, 8, 9]);
///
/// // Sub-ranging a sub-range stays a view of the original storage.
/// let corner = inner.slice(&idx![1, 1]).unwrap();
/// assert_eq!(*corner.get(&[]).unwrap(), 9);
/// ```
#[derive(Debug, Clone)]
pub struct TensorView<'a, T> {
    layout: Layout,
    data: &'a [T],
}

impl<'a, T> TensorView<'a, T> {
    /// Bind a layout to element storage. Fails if the layout
    /// addresses offsets past the end of the buffer.
    pub fn from_parts(layout: Layout, data: &'a [T]) -> Result<Self, TensorError> {
        check_span(&layout, data.len())?;
        Ok(Self { layout, data })
    }

    pub(crate) fn new_unchecked(layout: Layout, data: &'a [T]) -> Self {
        debug_assert!(layout.span() <= data.len());
        Self { layout, data }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    pub fn extents(&self) -> &[usize] {
        self.layout.extents()
    }

    pub fn strides(&self) -> &[usize] {
        self.layout.strides()
    }

    /// The number of addressed elements.
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// The element at the given coordinates, one per dimension.
    pub fn get(&self, coords: &[usize]) -> Result<&'a T, TensorError> {
        let data = self.data;
        Ok(&data[self.layout.location(coords)?])
    }

    /// The element at the given coordinates, without bounds checks.
    ///
    /// # Safety
    ///
    /// `coords` must have exactly `rank()` entries and every
    /// coordinate must be less than its dimension's extent.
    pub unsafe fn get_unchecked(&self, coords: &[usize]) -> &'a T {
        let data = self.data;
        let mut loc = self.layout.offset();
        for (index, stride) in coords.iter().zip(self.layout.strides()) {
            loc += index * stride;
        }
        // SAFETY: in-bounds coordinates address within the layout's
        // span, which was checked against the buffer when this view
        // was created.
        unsafe { data.get_unchecked(loc) }
    }

    /// Sub-range this view with one argument per dimension: scalar
    /// indices collapse their dimension, ranges keep it. The result
    /// rank is the number of range arguments; with all scalars it is
    /// a rank-0 view of a single element. The result borrows the same
    /// storage as `self` (not `self` itself), so it may outlive the
    /// view it was derived from.
    pub fn slice(&self, spec: &[Idx]) -> Result<TensorView<'a, T>, TensorError> {
        Ok(TensorView {
            layout: self.layout.compose(spec)?,
            data: self.data,
        })
    }

    /// Restrict a single dimension to a [`Range`], keeping the rank.
    pub fn select(&self, dim: usize, range: Range) -> Result<TensorView<'a, T>, TensorError> {
        Ok(TensorView {
            layout: self.layout.select(dim, range)?,
            data: self.data,
        })
    }

    /// Fix a single dimension to one index, reducing the rank by one.
    pub fn collapse(&self, dim: usize, index: usize) -> Result<TensorView<'a, T>, TensorError> {
        Ok(TensorView {
            layout: self.layout.collapse(dim, index)?,
            data: self.data,
        })
    }

    /// View the same elements with a degenerate (extent 1) outermost
    /// dimension prepended: a rank-`k` view becomes rank `k + 1`
    /// without copying. Composable up to any rank.
    pub fn expand_outer(&self) -> TensorView<'a, T> {
        TensorView {
            layout: self.layout.expand_outer(),
            data: self.data,
        }
    }

    /// As [`expand_outer`](Self::expand_outer), inserting the
    /// degenerate dimension at an arbitrary position instead.
    pub fn insert_axis(&self, dim: usize) -> Result<TensorView<'a, T>, TensorError> {
        Ok(TensorView {
            layout: self.layout.insert_axis(dim)?,
            data: self.data,
        })
    }

    /// Iterator over the elements in row-major order, whatever the
    /// strides.
    pub fn iter(&self) -> Elements<'a, T> {
        Elements {
            data: self.data,
            locations: self.layout.locations(),
        }
    }

    /// Iterator over the outermost dimension, yielding one rank-`k-1`
    /// view per index. On a rank-0 view this yields nothing.
    pub fn outer_iter(&self) -> OuterIter<'a, T> {
        OuterIter {
            extent: self.extents().first().copied().unwrap_or(0),
            layout: self.layout.clone(),
            data: self.data,
            index: 0,
        }
    }

    /// The elements as one flat row-major slice, if the view is
    /// contiguous.
    pub fn as_contiguous(&self) -> Result<&'a [T], TensorError> {
        if !self.layout.is_contiguous() {
            return Err(TensorError::NonContiguous);
        }
        if self.is_empty() {
            return Ok(&[]);
        }
        let data = self.data;
        let start = self.layout.offset();
        Ok(&data[start..start + self.len()])
    }

    /// Copy the addressed elements into a new owning [`Tensor`] of
    /// the same extents.
    pub fn to_tensor(&self) -> Tensor<T>
    where
        T: Clone,
    {
        let data: Vec<T> = self.iter().cloned().collect();
        Tensor::from_flat(self.extents().to_vec(), data)
            .expect("extent product matches element count")
    }
}

impl<T: PartialEq> PartialEq for TensorView<'_, T> {
    /// Views are equal when they have the same extents and address
    /// equal elements, regardless of strides or offsets.
    fn eq(&self, other: &Self) -> bool {
        self.extents() == other.extents() && self.iter().eq(other.iter())
    }
}

/// An exclusive, non-owning view of tensor elements; the mutable
/// counterpart of [`TensorView`].
///
/// Mutation is always elementwise through the layout, so it is
/// correct on arbitrarily strided sub-views. Exclusivity of the
/// underlying borrow means a mutable view can never alias its source
/// operand: elementwise operations take the destination by `&mut` and
/// the source as a shared [`TensorView`], and the borrow checker
/// rejects overlap.
#[derive(Debug)]
pub struct TensorViewMut<'a, T> {
    layout: Layout,
    data: &'a mut [T],
}

impl<'a, T> TensorViewMut<'a, T> {
    /// Bind a layout to mutable element storage. Fails if the layout
    /// addresses offsets past the end of the buffer.
    pub fn from_parts(layout: Layout, data: &'a mut [T]) -> Result<Self, TensorError> {
        check_span(&layout, data.len())?;
        Ok(Self { layout, data })
    }

    pub(crate) fn new_unchecked(layout: Layout, data: &'a mut [T]) -> Self {
        debug_assert!(layout.span() <= data.len());
        Self { layout, data }
    }

    /// Reborrow as a shared view.
    pub fn as_view(&self) -> TensorView<'_, T> {
        TensorView {
            layout: self.layout.clone(),
            data: &*self.data,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    pub fn extents(&self) -> &[usize] {
        self.layout.extents()
    }

    pub fn strides(&self) -> &[usize] {
        self.layout.strides()
    }

    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    pub fn get(&self, coords: &[usize]) -> Result<&T, TensorError> {
        Ok(&self.data[self.layout.location(coords)?])
    }

    pub fn get_mut(&mut self, coords: &[usize]) -> Result<&mut T, TensorError> {
        let loc = self.layout.location(coords)?;
        Ok(&mut self.data[loc])
    }

    pub fn iter(&self) -> Elements<'_, T> {
        Elements {
            data: &*self.data,
            locations: self.layout.locations(),
        }
    }

    /// Sub-range into a shared view; see [`TensorView::slice`].
    pub fn slice(&self, spec: &[Idx]) -> Result<TensorView<'_, T>, TensorError> {
        Ok(TensorView {
            layout: self.layout.compose(spec)?,
            data: &*self.data,
        })
    }

    /// Sub-range into a mutable view of the same storage. The result
    /// reborrows `self`, so the parent view is inaccessible until the
    /// sub-view is dropped.
    pub fn slice_mut(&mut self, spec: &[Idx]) -> Result<TensorViewMut<'_, T>, TensorError> {
        Ok(TensorViewMut {
            layout: self.layout.compose(spec)?,
            data: &mut *self.data,
        })
    }

    /// See [`TensorView::expand_outer`]. Consumes the view so the
    /// expansion keeps the original borrow.
    pub fn expand_outer(self) -> TensorViewMut<'a, T> {
        TensorViewMut {
            layout: self.layout.expand_outer(),
            data: self.data,
        }
    }

    /// See [`TensorView::insert_axis`].
    pub fn insert_axis(self, dim: usize) -> Result<TensorViewMut<'a, T>, TensorError> {
        Ok(TensorViewMut {
            layout: self.layout.insert_axis(dim)?,
            data: self.data,
        })
    }

    /// Assign `value` to every addressed element.
    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        for loc in self.layout.locations() {
            self.data[loc] = value.clone();
        }
    }

    /// Apply `f` to every addressed element in place, in row-major
    /// order.
    pub fn apply<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut T),
    {
        for loc in self.layout.locations() {
            f(&mut self.data[loc]);
        }
    }

    /// Combine every addressed element with the corresponding element
    /// of `src`, which must have identical extents. Either side may
    /// be arbitrarily strided; neither is required to be contiguous.
    pub fn zip_apply<F>(&mut self, src: &TensorView<'_, T>, mut f: F) -> Result<(), TensorError>
    where
        F: FnMut(&mut T, &T),
    {
        if self.extents() != src.extents() {
            return Err(TensorError::ShapeMismatch {
                dst: self.extents().to_vec(),
                src: src.extents().to_vec(),
            });
        }
        for (dst, s) in self.layout.locations().zip(src.layout.locations()) {
            f(&mut self.data[dst], &src.data[s]);
        }
        Ok(())
    }

    /// Elementwise copy from a view of identical extents.
    pub fn assign(&mut self, src: &TensorView<'_, T>) -> Result<(), TensorError>
    where
        T: Clone,
    {
        self.zip_apply(src, |dst, s| *dst = s.clone())
    }
}

fn check_span(layout: &Layout, available: usize) -> Result<(), TensorError> {
    let required = layout.span();
    if required > available {
        return Err(TensorError::BufferTooShort {
            required,
            available,
        });
    }
    Ok(())
}

/// Iterator over a view's elements in row-major order. See
/// [`TensorView::iter`].
pub struct Elements<'a, T> {
    data: &'a [T],
    locations: Locations,
}

impl<'a, T> Iterator for Elements<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let data = self.data;
        self.locations.next().map(|loc| &data[loc])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.locations.size_hint()
    }
}

impl<T> ExactSizeIterator for Elements<'_, T> {}

/// Iterator over the outermost dimension of a view, yielding one
/// rank-`k-1` view per step. See [`TensorView::outer_iter`].
pub struct OuterIter<'a, T> {
    layout: Layout,
    data: &'a [T],
    index: usize,
    extent: usize,
}

impl<'a, T> Iterator for OuterIter<'a, T> {
    type Item = TensorView<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.extent {
            return None;
        }
        let layout = self
            .layout
            .collapse(0, self.index)
            .expect("index below outermost extent");
        self.index += 1;
        Some(TensorView {
            layout,
            data: self.data,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.extent - self.index;
        (left, Some(left))
    }
}

impl<T> ExactSizeIterator for OuterIter<'_, T> {}

/// Renders elements grouped by dimension: rank 1 space-separated,
/// rank 2 one row per line, higher ranks as rank-2 blocks separated
/// by blank lines.
impl<T: fmt::Display> fmt::Display for TensorView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rank() {
            0 => {
                let elem = self.get(&[]).map_err(|_| fmt::Error)?;
                write!(f, "{}", elem)
            }
            1 => {
                for (i, elem) in self.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", elem)?;
                }
                Ok(())
            }
            rank => {
                let gap = "\n".repeat(rank - 1);
                for (i, sub) in self.outer_iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", gap)?;
                    }
                    write!(f, "{}", sub)?;
                }
                Ok(())
            }
        }
    }
}

impl<T: fmt::Display> fmt::Display for TensorViewMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_view(), f)
    }
}
