/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Property-based generators for tensors, extents and ranges.
//!
//! These strategies construct randomized inputs for `proptest`-based
//! tests of the sub-ranging algebra and the elementwise operations.
//! This module is only included in test builds (`#[cfg(test)]`).

use proptest::prelude::*;

use crate::Range;
use crate::Tensor;

/// Generates extents with up to `max_rank` dimensions, each of size
/// 1 to `max_extent` (inclusive).
pub fn gen_extents(max_rank: usize, max_extent: usize) -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1..=max_extent, 1..=max_rank)
}

/// Generates a tensor with random extents and elements `0, 1, 2, …`
/// in row-major order, so every element value identifies its
/// position.
pub fn gen_iota_tensor(
    max_rank: usize,
    max_extent: usize,
) -> impl Strategy<Value = Tensor<i64>> {
    gen_extents(max_rank, max_extent).prop_map(|extents| {
        let len: usize = extents.iter().product();
        Tensor::from_flat(extents, (0..len as i64).collect::<Vec<_>>())
            .expect("extent product matches element count")
    })
}

/// Generates a range guaranteed to compose against a dimension of
/// the given extent: `start + (n - 1) × stride` stays in bounds.
pub fn gen_range_in(extent: usize) -> impl Strategy<Value = Range> {
    (0..extent, 1..=3usize).prop_flat_map(move |(start, stride)| {
        let max_n = (extent - start).div_ceil(stride);
        (0..=max_n).prop_map(move |n| Range::strided(start, n, stride))
    })
}

