//! Derivation of the reverse, intersection, and union orientations.
//!
//! Each derivation is a linear two-pass counting algorithm. The first pass
//! counts per-vertex edges and prefix-sums them into the boundary array; the
//! second pass re-walks the input and fills the target array back-to-front
//! through decrementing fill pointers, so within a vertex the realized order
//! is the reverse of discovery order. Intersection and union share a
//! versioned visited array sized `n`: instead of zeroing marks between
//! vertices, each vertex bumps a monotonic version counter and only marks
//! equal to the current version count as set.
//!
//! Generation is one-way per orientation; a second request is a no-op. The
//! visited/fill scratch lives for the duration of one pass only.

use tracing::debug;

use crate::graph::Graph;
use crate::progress::Progress;
use crate::types::Orientation;

impl Graph {
    /// Derives the given orientation from the forward one, if not yet done.
    ///
    /// `Forward` and already-generated orientations are no-ops.
    /// `Intersection` materializes `Reverse` first as a prerequisite;
    /// `Union` reads the reverse adjacency but does not trigger it, so
    /// callers must materialize `Reverse` before `Union`.
    pub fn materialize(&mut self, orientation: Orientation) {
        if self.repr(orientation).generated {
            return;
        }
        match orientation {
            Orientation::Forward => {}
            Orientation::Reverse => self.reverse(),
            Orientation::Intersection => self.intersect(),
            Orientation::Union => self.union(),
        }
    }

    /// Counting-sort transpose of the forward orientation.
    fn reverse(&mut self) {
        let n = self.vertex_count;
        let verbose = self.verbose;
        let progress = Progress::new("reverse graph generation", n as u64, verbose);
        let (head, tail) = self.reprs.split_at_mut(1);
        let origin = &head[0];
        let derived = &mut tail[0];
        if derived.generated {
            return;
        }
        debug_assert!(origin.generated, "forward orientation must be populated");
        derived.clear();
        derived.generated = true;
        derived.edge_count = origin.edge_count;
        derived.boundaries = vec![0u32; n];
        derived.targets = vec![0u32; origin.edge_count];

        for &target in &origin.targets {
            derived.boundaries[target as usize] += 1;
        }
        for i in 1..n {
            derived.boundaries[i] += derived.boundaries[i - 1];
        }

        let mut fill = derived.boundaries.clone();
        let mut j = 0usize;
        for i in 0..n {
            while j < origin.boundaries[i] as usize {
                let y = origin.targets[j] as usize;
                fill[y] -= 1;
                derived.targets[fill[y] as usize] = i as u32;
                j += 1;
            }
            progress.update(i as u64);
        }
        let elapsed = progress.finish();
        debug!(edges = derived.edge_count, elapsed, "reverse orientation generated");
    }

    /// Mutual edges: `(i, y)` kept iff `y` appears in both the forward and
    /// the reverse adjacency of `i`.
    fn intersect(&mut self) {
        self.reverse();
        let n = self.vertex_count;
        let verbose = self.verbose;
        let progress = Progress::new("intersection graph generation", 2 * n as u64, verbose);
        let (head, tail) = self.reprs.split_at_mut(2);
        let origin = &head[0];
        let reverse = &head[1];
        let derived = &mut tail[0];
        if derived.generated {
            return;
        }
        derived.clear();
        derived.generated = true;
        derived.boundaries = vec![0u32; n];

        let mut visited = vec![0u64; n];
        let mut version = 0u64;

        // Pass 1: count matches per vertex.
        {
            let (mut j, mut j1) = (0usize, 0usize);
            for i in 0..n {
                version += 1;
                while j < origin.boundaries[i] as usize {
                    visited[origin.targets[j] as usize] = version;
                    j += 1;
                }
                while j1 < reverse.boundaries[i] as usize {
                    let y = reverse.targets[j1] as usize;
                    if visited[y] == version {
                        derived.edge_count += 1;
                        derived.boundaries[i] += 1;
                    }
                    j1 += 1;
                }
                progress.update(i as u64);
            }
        }
        for i in 1..n {
            derived.boundaries[i] += derived.boundaries[i - 1];
        }

        // Pass 2: refill through decrementing per-vertex pointers.
        let mut fill = derived.boundaries.clone();
        derived.targets = vec![0u32; derived.edge_count];
        let (mut j, mut j1) = (0usize, 0usize);
        for i in 0..n {
            version += 1;
            while j < origin.boundaries[i] as usize {
                visited[origin.targets[j] as usize] = version;
                j += 1;
            }
            while j1 < reverse.boundaries[i] as usize {
                let y = reverse.targets[j1] as usize;
                if visited[y] == version {
                    fill[i] -= 1;
                    derived.targets[fill[i] as usize] = y as u32;
                }
                j1 += 1;
            }
            progress.update((n + i) as u64);
        }
        let elapsed = progress.finish();
        debug!(edges = derived.edge_count, elapsed, "intersection orientation generated");
    }

    /// Set union of forward and reverse neighbors per vertex.
    ///
    /// Reads the reverse orientation without triggering it; every internal
    /// call site materializes `Reverse` beforehand.
    fn union(&mut self) {
        let n = self.vertex_count;
        let verbose = self.verbose;
        let progress = Progress::new("union graph generation", 2 * n as u64, verbose);
        let (head, tail) = self.reprs.split_at_mut(3);
        let origin = &head[0];
        let reverse = &head[1];
        let derived = &mut tail[0];
        if derived.generated {
            return;
        }
        debug_assert!(reverse.generated, "reverse orientation must be generated before union");
        derived.clear();
        derived.generated = true;
        derived.boundaries = vec![0u32; n];

        let mut visited = vec![0u64; n];
        let mut version = 0u64;

        // Pass 1: forward neighbors count unconditionally, reverse neighbors
        // only while unmarked.
        {
            let (mut j, mut j1) = (0usize, 0usize);
            for i in 0..n {
                version += 1;
                while j < origin.boundaries[i] as usize {
                    visited[origin.targets[j] as usize] = version;
                    derived.edge_count += 1;
                    derived.boundaries[i] += 1;
                    j += 1;
                }
                while j1 < reverse.boundaries[i] as usize {
                    let y = reverse.targets[j1] as usize;
                    if visited[y] != version {
                        derived.edge_count += 1;
                        derived.boundaries[i] += 1;
                    }
                    j1 += 1;
                }
                progress.update(i as u64);
            }
        }
        for i in 1..n {
            derived.boundaries[i] += derived.boundaries[i - 1];
        }

        // Pass 2: identical branches, filling instead of counting.
        let mut fill = derived.boundaries.clone();
        derived.targets = vec![0u32; derived.edge_count];
        let (mut j, mut j1) = (0usize, 0usize);
        for i in 0..n {
            version += 1;
            while j < origin.boundaries[i] as usize {
                let y = origin.targets[j] as usize;
                visited[y] = version;
                fill[i] -= 1;
                derived.targets[fill[i] as usize] = y as u32;
                j += 1;
            }
            while j1 < reverse.boundaries[i] as usize {
                let y = reverse.targets[j1] as usize;
                if visited[y] != version {
                    fill[i] -= 1;
                    derived.targets[fill[i] as usize] = y as u32;
                }
                j1 += 1;
            }
            progress.update((n + i) as u64);
        }
        let elapsed = progress.finish();
        debug!(edges = derived.edge_count, elapsed, "union orientation generated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn sample_graph() -> Graph {
        Graph::from_edges(4, &[(0, 1), (1, 2), (2, 0), (0, 2)], false).expect("valid edges")
    }

    fn neighbor_set(graph: &Graph, v: u32, orientation: Orientation) -> BTreeSet<u32> {
        graph
            .neighbor_slice(v, orientation)
            .expect("vertex in range")
            .iter()
            .copied()
            .collect()
    }

    #[test]
    fn reverse_transposes_the_forward_orientation() {
        let mut graph = sample_graph();
        graph.materialize(Orientation::Reverse);
        assert_eq!(graph.edge_count(Orientation::Reverse), 4);
        assert_eq!(neighbor_set(&graph, 0, Orientation::Reverse), BTreeSet::from([2]));
        assert_eq!(neighbor_set(&graph, 1, Orientation::Reverse), BTreeSet::from([0]));
        assert_eq!(neighbor_set(&graph, 2, Orientation::Reverse), BTreeSet::from([0, 1]));
        assert!(neighbor_set(&graph, 3, Orientation::Reverse).is_empty());
    }

    #[test]
    fn reverse_fill_runs_back_to_front() {
        // Sources 0 and 2 both point at 1; discovery order is ascending
        // source, so the realized list is descending.
        let mut graph = Graph::from_edges(3, &[(0, 1), (2, 1)], false).expect("valid edges");
        graph.materialize(Orientation::Reverse);
        assert_eq!(graph.neighbor_slice(1, Orientation::Reverse).unwrap(), &[2, 0]);
    }

    #[test]
    fn intersection_keeps_mutual_edges_only() {
        let mut graph = sample_graph();
        graph.materialize(Orientation::Intersection);
        assert_eq!(graph.edge_count(Orientation::Intersection), 2);
        assert_eq!(neighbor_set(&graph, 0, Orientation::Intersection), BTreeSet::from([2]));
        assert!(neighbor_set(&graph, 1, Orientation::Intersection).is_empty());
        assert_eq!(neighbor_set(&graph, 2, Orientation::Intersection), BTreeSet::from([0]));
        assert!(neighbor_set(&graph, 3, Orientation::Intersection).is_empty());
    }

    #[test]
    fn intersection_triggers_reverse() {
        let mut graph = sample_graph();
        graph.materialize(Orientation::Intersection);
        assert!(graph.is_generated(Orientation::Reverse));
    }

    #[test]
    fn union_merges_both_directions_without_duplicates() {
        let mut graph = sample_graph();
        graph.materialize(Orientation::Reverse);
        graph.materialize(Orientation::Union);
        assert_eq!(graph.edge_count(Orientation::Union), 6);
        assert_eq!(neighbor_set(&graph, 0, Orientation::Union), BTreeSet::from([1, 2]));
        assert_eq!(neighbor_set(&graph, 1, Orientation::Union), BTreeSet::from([0, 2]));
        assert_eq!(neighbor_set(&graph, 2, Orientation::Union), BTreeSet::from([0, 1]));
        assert!(neighbor_set(&graph, 3, Orientation::Union).is_empty());
        // No duplicates within any vertex's list.
        for v in 0..4 {
            let slice = graph.neighbor_slice(v, Orientation::Union).unwrap();
            assert_eq!(slice.len(), neighbor_set(&graph, v, Orientation::Union).len());
        }
    }

    #[test]
    fn materialize_twice_is_a_no_op() {
        let mut graph = sample_graph();
        graph.materialize(Orientation::Reverse);
        let before = graph.neighbor_slice(2, Orientation::Reverse).unwrap().to_vec();
        graph.materialize(Orientation::Reverse);
        assert_eq!(graph.neighbor_slice(2, Orientation::Reverse).unwrap(), &before[..]);
    }

    #[test]
    fn degree_sums_match_edge_counts() {
        let mut graph = sample_graph();
        graph.materialize(Orientation::Intersection);
        graph.materialize(Orientation::Union);
        for orientation in Orientation::ALL {
            let total: usize = (0..graph.vertex_count() as u32)
                .map(|v| graph.degree(v, orientation).unwrap())
                .sum();
            assert_eq!(total, graph.edge_count(orientation), "{orientation:?}");
        }
    }

    #[test]
    fn empty_graph_derives_empty_orientations() {
        let mut graph = Graph::from_edges(0, &[], false).expect("empty");
        graph.materialize(Orientation::Intersection);
        graph.materialize(Orientation::Union);
        for orientation in Orientation::ALL {
            assert_eq!(graph.edge_count(orientation), 0);
        }
    }
}
