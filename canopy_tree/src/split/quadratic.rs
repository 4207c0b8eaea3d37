// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Guttman's quadratic split.

use canopy_bound::HRectBound;

use super::{Partition, SplitStrategy};

/// Quadratic-cost split from the original R-tree.
///
/// The two entries that would waste the most volume if grouped together seed
/// the groups. The remaining entries are then assigned one at a time: each
/// round picks the entry whose preferred group grows the least and places it
/// there, unless a group needs every remaining entry to reach the minimum fill.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuadraticSplit;

struct Group {
    members: Vec<usize>,
    bound: HRectBound,
    volume: f64,
}

impl Group {
    fn seeded(entries: &[HRectBound], seed: usize) -> Self {
        let bound = entries[seed].clone();
        Self {
            members: vec![seed],
            volume: bound.volume(),
            bound,
        }
    }

    fn push(&mut self, entries: &[HRectBound], entry: usize) {
        self.members.push(entry);
        self.bound.union_with(&entries[entry]);
        self.volume = self.bound.volume();
    }

    /// Volume the group would gain by taking `entry`.
    fn growth(&self, entry: &HRectBound) -> f64 {
        union_volume(&self.bound, entry) - self.volume
    }
}

fn union_volume(a: &HRectBound, b: &HRectBound) -> f64 {
    a.ranges()
        .iter()
        .zip(b.ranges())
        .map(|(x, y)| x.union(y).width())
        .product()
}

/// Pair of entries that would waste the most volume in one group.
fn pick_seeds(entries: &[HRectBound]) -> (usize, usize) {
    let mut seeds = (0, 1);
    let mut worst = f64::MIN;
    for i in 0..entries.len() {
        for j in i + 1..entries.len() {
            let waste =
                union_volume(&entries[i], &entries[j]) - entries[i].volume() - entries[j].volume();
            if waste > worst {
                worst = waste;
                seeds = (i, j);
            }
        }
    }
    seeds
}

/// Group that should receive `entry`, and how much it would grow.
fn preferred_group(groups: &[Group; 2], entry: &HRectBound) -> (usize, f64) {
    let g0 = groups[0].growth(entry);
    let g1 = groups[1].growth(entry);
    let second_wins = if g0 != g1 {
        g1 < g0
    } else {
        let (v0, v1) = (groups[0].volume + g0, groups[1].volume + g1);
        if v0 != v1 {
            v1 < v0
        } else {
            groups[1].members.len() < groups[0].members.len()
        }
    };
    if second_wins { (1, g1) } else { (0, g0) }
}

impl SplitStrategy for QuadraticSplit {
    fn partition(entries: &[HRectBound], min_fill: usize) -> Partition {
        debug_assert!(
            entries.len() >= 2 && entries.len() >= 2 * min_fill,
            "too few entries to split"
        );
        let (si, sj) = pick_seeds(entries);

        // Removal mirrors a swap-with-last work list; the visiting order
        // decides which entry wins a tie.
        let mut remaining: Vec<usize> = (0..entries.len()).collect();
        remaining.swap_remove(sj);
        remaining.swap_remove(si);

        let mut groups = [Group::seeded(entries, si), Group::seeded(entries, sj)];
        while !remaining.is_empty() {
            if let Some(needy) =
                (0..2).find(|&g| groups[g].members.len() + remaining.len() <= min_fill)
            {
                for entry in remaining.drain(..) {
                    groups[needy].push(entries, entry);
                }
                break;
            }

            let mut best_pos = 0;
            let mut best_group = 0;
            let mut best_growth = f64::MAX;
            for (pos, &entry) in remaining.iter().enumerate() {
                let (group, growth) = preferred_group(&groups, &entries[entry]);
                if growth < best_growth {
                    best_pos = pos;
                    best_group = group;
                    best_growth = growth;
                }
            }
            let entry = remaining.swap_remove(best_pos);
            groups[best_group].push(entries, entry);
        }

        let [first, second] = groups;
        Partition {
            first: first.members,
            second: second.members,
        }
    }
}
