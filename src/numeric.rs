/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Elementwise arithmetic and reductions over views and tensors.
//!
//! Scalar operands compound-assign infallibly (`view += 2.0`). View
//! operands require identical extents on both sides: the operator
//! forms panic on mismatch, and
//! [`TensorViewMut::zip_apply`](crate::TensorViewMut::zip_apply) is
//! the `Result`-returning form. Everything here walks the layouts, so
//! it is correct on arbitrarily strided, non-contiguous views; the
//! destination is exclusive (`&mut`) and the source shared, so the
//! two can never overlap.

use std::ops::AddAssign;
use std::ops::DivAssign;
use std::ops::MulAssign;
use std::ops::SubAssign;

use crate::tensor::Tensor;
use crate::view::TensorError;
use crate::view::TensorView;
use crate::view::TensorViewMut;

macro_rules! scalar_assign_ops {
    ( $( $trait_:ident :: $method:ident ),* $(,)? ) => {
        $(
            impl<T: Copy + $trait_> $trait_<T> for TensorViewMut<'_, T> {
                fn $method(&mut self, rhs: T) {
                    self.apply(|elem| elem.$method(rhs));
                }
            }

            impl<T: Copy + $trait_> $trait_<T> for Tensor<T> {
                fn $method(&mut self, rhs: T) {
                    // Containers are always contiguous; skip the
                    // layout walk.
                    for elem in self.as_mut_slice() {
                        elem.$method(rhs);
                    }
                }
            }
        )*
    };
}

scalar_assign_ops!(
    AddAssign::add_assign,
    SubAssign::sub_assign,
    MulAssign::mul_assign,
    DivAssign::div_assign,
);

macro_rules! elementwise_assign_ops {
    ( $( $trait_:ident :: $method:ident / $symbol:literal ),* $(,)? ) => {
        $(
            /// # Panics
            ///
            /// Panics if the operand extents differ.
            impl<'l, 'r, 's, T: Copy + $trait_> $trait_<&'r TensorView<'s, T>>
                for TensorViewMut<'l, T>
            {
                fn $method(&mut self, rhs: &'r TensorView<'s, T>) {
                    if let Err(err) = self.zip_apply(rhs, |dst, src| dst.$method(*src)) {
                        panic!("tensor {}: {}", $symbol, err);
                    }
                }
            }

            /// # Panics
            ///
            /// Panics if the operand extents differ.
            impl<'r, 's, T: Copy + $trait_> $trait_<&'r TensorView<'s, T>> for Tensor<T> {
                fn $method(&mut self, rhs: &'r TensorView<'s, T>) {
                    self.view_mut().$method(rhs);
                }
            }

            /// # Panics
            ///
            /// Panics if the operand extents differ.
            impl<'r, T: Copy + $trait_> $trait_<&'r Tensor<T>> for Tensor<T> {
                fn $method(&mut self, rhs: &'r Tensor<T>) {
                    self.view_mut().$method(&rhs.view());
                }
            }
        )*
    };
}

elementwise_assign_ops!(
    AddAssign::add_assign / "+=",
    SubAssign::sub_assign / "-=",
    MulAssign::mul_assign / "*=",
    DivAssign::div_assign / "/=",
);

/// The smallest element of the view, or `None` if it is empty.
pub fn min<T: Copy + PartialOrd>(view: &TensorView<'_, T>) -> Option<T> {
    view.iter().copied().fold(None, |acc, x| match acc {
        Some(m) if m <= x => Some(m),
        _ => Some(x),
    })
}

/// The largest element of the view, or `None` if it is empty.
pub fn max<T: Copy + PartialOrd>(view: &TensorView<'_, T>) -> Option<T> {
    view.iter().copied().fold(None, |acc, x| match acc {
        Some(m) if m >= x => Some(m),
        _ => Some(x),
    })
}

/// The sum of all elements; zero for an empty view.
pub fn sum<T: Copy + std::iter::Sum<T>>(view: &TensorView<'_, T>) -> T {
    view.iter().copied().sum()
}

/// Apply `f` to every element of `src`, writing the results into the
/// corresponding elements of `dst`. The extents must match; the
/// strides of either side are free.
pub fn transform<T, F>(
    dst: &mut TensorViewMut<'_, T>,
    f: F,
    src: &TensorView<'_, T>,
) -> Result<(), TensorError>
where
    T: Copy,
    F: Fn(T) -> T,
{
    dst.zip_apply(src, |out, x| *out = f(*x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Range;
    use crate::idx;

    fn iota(extents: &[usize]) -> Tensor<f64> {
        let len: usize = extents.iter().product();
        Tensor::from_flat(extents.to_vec(), (1..=len).map(|i| i as f64).collect()).unwrap()
    }

    #[test]
    fn test_scalar_ops_on_tensor() {
        let mut t = iota(&[2, 2]);
        t += 10.0;
        assert_eq!(t.as_slice(), &[11.0, 12.0, 13.0, 14.0]);
        t *= 2.0;
        assert_eq!(t.as_slice(), &[22.0, 24.0, 26.0, 28.0]);
        t -= 22.0;
        t /= 2.0;
        assert_eq!(t.as_slice(), &[0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_strided_scalar_add() {
        // Every second row and every second column of a 4x4: only
        // the four addressed corners change.
        let mut t = iota(&[4, 4]);
        let mut sub = t
            .slice_mut(&idx![Range::strided(0, 2, 2), Range::strided(0, 2, 2)])
            .unwrap();
        sub += 10.0;
        let expected: Vec<f64> = (1..=16)
            .map(|i| {
                let (row, col) = ((i - 1) / 4, (i - 1) % 4);
                if row % 2 == 0 && col % 2 == 0 {
                    i as f64 + 10.0
                } else {
                    i as f64
                }
            })
            .collect();
        assert_eq!(t.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_elementwise_view_ops() {
        let mut t = iota(&[2, 2]);
        let u = iota(&[2, 2]);
        t += &u.view();
        assert_eq!(t.as_slice(), &[2.0, 4.0, 6.0, 8.0]);
        t -= &u;
        assert_eq!(t.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        t *= &u;
        assert_eq!(t.as_slice(), &[1.0, 4.0, 9.0, 16.0]);
        t /= &u;
        assert_eq!(t.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_elementwise_between_strided_views() {
        let mut t = iota(&[4]);
        let u = iota(&[8]);
        let mut dst = t.slice_mut(&idx![0..2]).unwrap();
        let src = u.slice(&idx![Range::strided(0, 2, 4)]).unwrap();
        dst += &src;
        assert_eq!(t.as_slice(), &[2.0, 7.0, 3.0, 4.0]);
    }

    #[test]
    #[should_panic(expected = "tensor +=")]
    fn test_shape_mismatch_panics() {
        let mut t = iota(&[2, 2]);
        let u = iota(&[2, 3]);
        t += &u;
    }

    #[test]
    fn test_min_max_sum() {
        let t = iota(&[3, 3]);
        assert_eq!(min(&t.view()), Some(1.0));
        assert_eq!(max(&t.view()), Some(9.0));
        assert_eq!(sum(&t.view()), 45.0);

        // Reductions see through strides: the middle column only.
        let col = t.slice(&idx![.., 1]).unwrap();
        assert_eq!(min(&col), Some(2.0));
        assert_eq!(max(&col), Some(8.0));
        assert_eq!(sum(&col), 15.0);

        let empty = t.slice(&idx![0..0, ..]).unwrap();
        assert_eq!(min(&empty), None);
        assert_eq!(max(&empty), None);
        assert_eq!(sum(&empty), 0.0);
    }

    #[test]
    fn test_transform() {
        let src = iota(&[2, 3]);
        let mut dst = Tensor::filled(&[2, 3], 0.0);
        let mut out = dst.view_mut();
        transform(&mut out, |x| x * x, &src.view()).unwrap();
        assert_eq!(dst.as_slice(), &[1.0, 4.0, 9.0, 16.0, 25.0, 36.0]);

        // Shape mismatch is a recoverable error here, not a panic.
        let mut bad = Tensor::filled(&[3, 2], 0.0);
        let mut out = bad.view_mut();
        assert!(transform(&mut out, |x| x, &src.view()).is_err());
    }

    #[test]
    fn test_transform_into_strided_destination() {
        let src = iota(&[2]);
        let mut dst = Tensor::filled(&[4], 0.0);
        let mut out = dst.slice_mut(&idx![Range::strided(1, 2, 2)]).unwrap();
        transform(&mut out, |x| x + 0.5, &src.view()).unwrap();
        assert_eq!(dst.as_slice(), &[0.0, 1.5, 0.0, 2.5]);
    }
}
