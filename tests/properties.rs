/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! End-to-end checks of the sub-ranging algebra: whole-view round
//! trips, composition, iteration order, strided in-place arithmetic,
//! rank expansion, and container lifecycle.

use anyhow::Result;
use ndtensor::Idx;
use ndtensor::Range;
use ndtensor::Tensor;
use ndtensor::idx;
use proptest::prelude::*;

/// A tensor with the given extents and elements `0, 1, 2, …` in
/// row-major order.
fn iota(extents: &[usize]) -> Tensor<i64> {
    let len: usize = extents.iter().product();
    Tensor::from_flat(extents.to_vec(), (0..len as i64).collect::<Vec<_>>()).unwrap()
}

/// A range that composes against a dimension of the given (nonzero)
/// extent.
fn range_in(extent: usize) -> impl Strategy<Value = Range> {
    (0..extent, 1..=3usize).prop_flat_map(move |(start, stride)| {
        let max_n = (extent - start).div_ceil(stride);
        (0..=max_n).prop_map(move |n| Range::strided(start, n, stride))
    })
}

/// An extent plus two ranges, the second valid against the extent
/// the first resolves to.
fn nested_ranges() -> impl Strategy<Value = (usize, Range, Range)> {
    (1..16usize).prop_flat_map(|extent| {
        range_in(extent).prop_flat_map(move |a| {
            let n = a.extent().unwrap();
            let b = if n == 0 {
                Just(Range::new(0, 0)).boxed()
            } else {
                range_in(n).boxed()
            };
            b.prop_map(move |b| (extent, a, b))
        })
    })
}

proptest! {
    #[test]
    fn round_trip_subranging(extents in prop::collection::vec(0..5usize, 1..=4)) {
        // Taking the whole range in every dimension reproduces the
        // container's contents exactly.
        let t = iota(&extents);
        let spec: Vec<Idx> = extents.iter().map(|_| Idx::from(..)).collect();
        let whole = t.slice(&spec).unwrap();
        prop_assert_eq!(whole.extents(), t.extents());
        prop_assert!(whole.iter().copied().eq(t.iter().copied()));
    }

    #[test]
    fn composition_associativity((extent, a, b) in nested_ranges()) {
        // Sub-ranging by A and then by B addresses the same elements
        // as sub-ranging once by the composed range
        // (a.start + b.start × a.stride, b.extent, a.stride × b.stride).
        let t = iota(&[extent]);
        let twice = t
            .slice(&idx![a])
            .unwrap()
            .slice(&idx![b])
            .unwrap();
        let composed = Range::strided(
            a.start() + b.start() * a.stride(),
            b.extent().unwrap(),
            a.stride() * b.stride(),
        );
        let direct = t.slice(&idx![composed]).unwrap();
        prop_assert_eq!(twice, direct);
    }

    #[test]
    fn joker_equals_explicit_range(extent in 0..8usize) {
        // The full range against a parent of extent e behaves
        // identically to an explicit (0, e, 1).
        let t = iota(&[extent]);
        let full = t.slice(&idx![..]).unwrap();
        let explicit = t.slice(&idx![Range::new(0, extent)]).unwrap();
        prop_assert_eq!(full.layout(), explicit.layout());
        prop_assert_eq!(full, explicit);
    }
}

#[test]
fn rank_collapse_consistency() -> Result<()> {
    // All-scalar indexing returns the same element as all-singleton
    // ranges followed by reading the sole element.
    let t = iota(&[3, 4, 5]);
    for p in 0..3 {
        for r in 0..4 {
            for c in 0..5 {
                let direct = *t.get(&[p, r, c])?;
                let singleton = t.slice(&idx![
                    Range::from(p),
                    Range::from(r),
                    Range::from(c)
                ])?;
                assert_eq!(singleton.extents(), &[1, 1, 1]);
                assert_eq!(*singleton.get(&[0, 0, 0])?, direct);

                let collapsed = t.slice(&idx![p, r, c])?;
                assert_eq!(collapsed.rank(), 0);
                assert_eq!(*collapsed.get(&[])?, direct);
            }
        }
    }
    Ok(())
}

#[test]
fn iteration_completeness_and_order() -> Result<()> {
    let t = iota(&[2, 3]);
    let coords = [[0, 0], [0, 1], [0, 2], [1, 0], [1, 1], [1, 2]];
    let in_order: Vec<i64> = coords
        .iter()
        .map(|c| t.get(c).copied())
        .collect::<std::result::Result<_, _>>()?;
    assert!(t.iter().copied().eq(in_order.iter().copied()));
    assert!(t.view().iter().copied().eq(in_order.iter().copied()));
    Ok(())
}

#[test]
fn strided_arithmetic_touches_exactly_the_addressed_elements() -> Result<()> {
    // 4x4 filled 1..=16 row-major; every second row and every second
    // column += 10.
    let mut t = Tensor::from_flat(vec![4, 4], (1..=16).collect::<Vec<i64>>())?;
    let mut sub = t.slice_mut(&idx![Range::strided(0, 2, 2), Range::strided(0, 2, 2)])?;
    sub += 10;

    for row in 0..4 {
        for col in 0..4 {
            let original = (row * 4 + col + 1) as i64;
            let expected = if row % 2 == 0 && col % 2 == 0 {
                original + 10
            } else {
                original
            };
            assert_eq!(*t.get(&[row, col])?, expected);
        }
    }
    Ok(())
}

#[test]
fn resize_discards_contents() {
    let mut t = Tensor::from_flat(vec![2, 2], vec![1, 2, 3, 4]).unwrap();
    t.resize(&[3, 3], 0);
    assert_eq!(t.extents(), &[3, 3]);
    // No preservation contract: the new buffer is the fill value
    // throughout.
    assert!(t.iter().all(|&x| x == 0));
}

#[test]
fn rank_expansion_identity() -> Result<()> {
    let v = iota(&[5]);

    let wide = v.expand_outer();
    assert_eq!(wide.extents(), &[1, 5]);
    assert!(wide.iter().copied().eq(v.iter().copied()));
    for i in 0..5 {
        assert_eq!(wide.get(&[0, i])?, v.get(&[i])?);
    }

    let tall = v.view().insert_axis(1)?;
    assert_eq!(tall.extents(), &[5, 1]);
    assert!(tall.iter().copied().eq(v.iter().copied()));
    for i in 0..5 {
        assert_eq!(tall.get(&[i, 0])?, v.get(&[i])?);
    }

    // Expansion composes without copying, up through rank 7.
    let mut stacked = v.view().expand_outer();
    for _ in 0..5 {
        stacked = stacked.expand_outer();
    }
    assert_eq!(stacked.rank(), 7);
    assert_eq!(stacked.len(), 5);
    assert!(stacked.iter().copied().eq(v.iter().copied()));
    Ok(())
}

#[test]
fn views_compose_across_ranks() -> Result<()> {
    // A rank-7 walk down to rank 1 through repeated outermost
    // collapse addresses the same elements as direct indexing.
    let t = iota(&[2, 1, 3, 1, 2, 1, 2]);
    let mut view = t.view();
    let coords = [1usize, 0, 2, 0, 1, 0, 1];
    for &c in &coords {
        view = view.collapse(0, c)?;
    }
    assert_eq!(view.rank(), 0);
    assert_eq!(view.get(&[])?, t.get(&coords)?);
    Ok(())
}

#[test]
fn render_groups_by_dimension() {
    let t = iota(&[2, 2, 2]);
    assert_eq!(t.to_string(), "0 1\n2 3\n\n4 5\n6 7");
}
