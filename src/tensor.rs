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

use crate::layout::Layout;
use crate::range::Idx;
use crate::view::TensorError;
use crate::view::TensorView;
use crate::view::TensorViewMut;

/// An owning, dense, row-major tensor of arbitrary rank: the
/// container behind [`TensorView`] and [`TensorViewMut`].
///
/// A `Tensor` owns a flat buffer of exactly `product(extents)`
/// elements, laid out row-major (outermost dimension slowest). Views
/// borrow that buffer, so the borrow checker guarantees no view
/// survives a resize, move, or drop of its container. Cloning deep-
/// copies the buffer; dropping releases it.
///
/// ```
/// use ndtensor::{idx, Tensor};
///
/// let mut t = Tensor::filled(&[2, 3], 0.0);
/// t.slice_mut(&idx![1, ..]).unwrap().fill(7.0);
/// assert_eq!(t.as_slice(), &[0.0, 0.0, 0.0, 7.0, 7.0, 7.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TensorRepr<T>")]
pub struct Tensor<T> {
    extents: Vec<usize>,
    data: Vec<T>,
}

/// Wire shape of [`Tensor`]; deserialization revalidates the length
/// invariant through `TryFrom`.
#[derive(Deserialize)]
struct TensorRepr<T> {
    extents: Vec<usize>,
    data: Vec<T>,
}

impl<T> TryFrom<TensorRepr<T>> for Tensor<T> {
    type Error = TensorError;

    fn try_from(repr: TensorRepr<T>) -> Result<Self, Self::Error> {
        Tensor::from_flat(repr.extents, repr.data)
    }
}

impl<T> Tensor<T> {
    /// Allocate a tensor of the given extents with every element set
    /// to `value`. A rank-0 tensor (`extents == []`) holds exactly
    /// one element.
    pub fn filled(extents: &[usize], value: T) -> Self
    where
        T: Clone,
    {
        let len: usize = extents.iter().product();
        tracing::trace!(extents = ?extents, elements = len, "allocate tensor buffer");
        Self {
            extents: extents.to_vec(),
            data: vec![value; len],
        }
    }

    /// Adopt an existing row-major buffer. The buffer length must
    /// equal the product of the extents.
    pub fn from_flat(extents: impl Into<Vec<usize>>, data: Vec<T>) -> Result<Self, TensorError> {
        let extents = extents.into();
        let expected: usize = extents.iter().product();
        if data.len() != expected {
            return Err(TensorError::LengthMismatch {
                extents,
                expected,
                len: data.len(),
            });
        }
        Ok(Self { extents, data })
    }

    /// The number of dimensions.
    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    /// The extent of each dimension, outermost first.
    pub fn extents(&self) -> &[usize] {
        self.extents.as_slice()
    }

    /// The total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reshape in place. A resize to the current extents keeps the
    /// contents; any other resize discards them and refills the new
    /// buffer with `value`. All views are necessarily gone by then —
    /// they borrow this tensor.
    pub fn resize(&mut self, extents: &[usize], value: T)
    where
        T: Clone,
    {
        if self.extents == extents {
            return;
        }
        let len: usize = extents.iter().product();
        tracing::trace!(from = ?self.extents, to = ?extents, elements = len, "resize tensor buffer");
        self.extents = extents.to_vec();
        self.data.clear();
        self.data.resize(len, value);
    }

    /// The elements as one flat row-major slice of exactly
    /// `product(extents)` elements — the bulk read escape hatch for
    /// serialization-style consumers.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable counterpart of [`as_slice`](Self::as_slice).
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// A shared view of the whole tensor.
    pub fn view(&self) -> TensorView<'_, T> {
        TensorView::new_unchecked(self.layout(), &self.data)
    }

    /// A mutable view of the whole tensor.
    pub fn view_mut(&mut self) -> TensorViewMut<'_, T> {
        TensorViewMut::new_unchecked(self.layout(), &mut self.data)
    }

    /// Sub-range the tensor; see [`TensorView::slice`].
    pub fn slice(&self, spec: &[Idx]) -> Result<TensorView<'_, T>, TensorError> {
        let layout = self.layout().compose(spec)?;
        Ok(TensorView::new_unchecked(layout, &self.data))
    }

    /// Mutably sub-range the tensor; see
    /// [`TensorViewMut::slice_mut`](crate::TensorViewMut::slice_mut).
    pub fn slice_mut(&mut self, spec: &[Idx]) -> Result<TensorViewMut<'_, T>, TensorError> {
        let layout = self.layout().compose(spec)?;
        Ok(TensorViewMut::new_unchecked(layout, &mut self.data))
    }

    /// The element at the given coordinates.
    pub fn get(&self, coords: &[usize]) -> Result<&T, TensorError> {
        self.view().get(coords)
    }

    /// The element at the given coordinates, mutably.
    pub fn get_mut(&mut self, coords: &[usize]) -> Result<&mut T, TensorError> {
        let loc = self.layout().location(coords)?;
        Ok(&mut self.data[loc])
    }

    /// Iterator over the elements in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Iterator over the outermost dimension; see
    /// [`TensorView::outer_iter`].
    pub fn outer_iter(&self) -> crate::view::OuterIter<'_, T> {
        self.view().outer_iter()
    }

    /// Assign `value` to every element.
    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        for elem in &mut self.data {
            *elem = value.clone();
        }
    }

    /// View the tensor with a degenerate outermost dimension
    /// prepended; see [`TensorView::expand_outer`].
    pub fn expand_outer(&self) -> TensorView<'_, T> {
        self.view().expand_outer()
    }

    fn layout(&self) -> Layout {
        Layout::row_major(self.extents.as_slice())
    }
}

impl<T: fmt::Display> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.view(), f)
    }
}

impl<'a, T: PartialEq> PartialEq<TensorView<'a, T>> for Tensor<T> {
    fn eq(&self, other: &TensorView<'a, T>) -> bool {
        self.view() == *other
    }
}
