/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Dense, strided, arbitrary-rank tensors and views.
//!
//! Provides [`Tensor`], an owning row-major container, and
//! [`TensorView`]/[`TensorViewMut`], non-owning strided views into
//! it. Views are produced by a recursive sub-ranging algebra: each
//! dimension is indexed independently by a scalar (collapsing it) or
//! a [`Range`] (keeping it), a sub-view of a sub-view is again a
//! view, and every elementwise operation walks the strides, so it is
//! correct on non-contiguous memory.
//!
//! Views borrow their container's buffer. The lifetime discipline of
//! a strided-view library — no view may outlive, or observe a resize
//! of, its storage, and an in-place operation's source and
//! destination must not overlap — is enforced by the borrow checker
//! rather than by convention.
//!
//! ```
//! use ndtensor::{idx, Range, Tensor};
//!
//! let mut t = Tensor::from_flat(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
//!
//! let row = t.slice(&idx![1, ..]).unwrap();
//! assert_eq!(row.iter().copied().collect::<Vec<_>>(), [4.0, 5.0, 6.0]);
//!
//! let mut col = t.slice_mut(&idx![.., 0]).unwrap();
//! col += 10.0;
//! assert_eq!(t.as_slice(), &[11.0, 2.0, 3.0, 14.0, 5.0, 6.0]);
//!
//! let every_other = t.slice(&idx![.., Range::strided(0, 2, 2)]).unwrap();
//! assert_eq!(ndtensor::max(&every_other), Some(14.0));
//! ```

mod range;
pub use range::Idx;
pub use range::Range;

mod layout;
pub use layout::Layout;
pub use layout::LayoutError;
pub use layout::Locations;

mod view;
pub use view::Elements;
pub use view::OuterIter;
pub use view::TensorError;
pub use view::TensorView;
pub use view::TensorViewMut;

mod tensor;
pub use tensor::Tensor;

/// Elementwise arithmetic and stride-correct reductions.
pub mod numeric;
pub use numeric::max;
pub use numeric::min;
pub use numeric::sum;
pub use numeric::transform;

/// Property-based generators for randomized test input.
#[cfg(test)]
pub mod strategy;
