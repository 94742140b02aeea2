//! The CSR graph store: four adjacency orientations over one vertex set.
//!
//! Each orientation is a compressed representation made of a prefix-sum
//! boundary array (`boundaries[i]` = total out-edges of vertices `0..=i`)
//! and a flat target array. The forward orientation is supplied by a file
//! load, the RMAT generator, or [`Graph::from_edges`]; the reverse,
//! intersection, and union orientations are derived from it on demand and
//! cached.

mod derive;
mod mapping;
mod persist;
mod rmat;

pub use rmat::RmatConfig;

use std::io;
use std::path::Path;

use crate::error::{GraphError, Result};
use crate::types::{Orientation, VertexId};

pub(crate) use mapping::IdMapping;

/// One orientation's compressed adjacency arrays.
#[derive(Clone, Debug, Default)]
pub(crate) struct CsrRepr {
    pub(crate) generated: bool,
    pub(crate) edge_count: usize,
    pub(crate) boundaries: Vec<u32>,
    pub(crate) targets: Vec<u32>,
}

impl CsrRepr {
    /// Resets to the ungenerated empty state.
    pub(crate) fn clear(&mut self) {
        self.generated = false;
        self.edge_count = 0;
        self.boundaries = Vec::new();
        self.targets = Vec::new();
    }

    /// Target-array range `[lo, hi)` for vertex `v`, which must be in range.
    pub(crate) fn range(&self, v: usize) -> (usize, usize) {
        if !self.generated {
            return (0, 0);
        }
        let lo = if v == 0 {
            0
        } else {
            self.boundaries[v - 1] as usize
        };
        (lo, self.boundaries[v] as usize)
    }
}

/// A directed graph held as four derivable CSR orientations.
#[derive(Clone, Debug)]
pub struct Graph {
    pub(crate) vertex_count: usize,
    /// Forward edge count, used for index-file bookkeeping.
    pub(crate) edge_count: usize,
    pub(crate) reprs: [CsrRepr; 4],
    pub(crate) mapping: Option<IdMapping>,
    pub(crate) verbose: bool,
}

impl Graph {
    /// Creates an empty graph with no vertices and no generated orientations.
    pub fn new(verbose: bool) -> Self {
        Self {
            vertex_count: 0,
            edge_count: 0,
            reprs: Default::default(),
            mapping: None,
            verbose,
        }
    }

    /// Creates a graph and immediately loads it from `base`.
    pub fn open(base: impl AsRef<Path>, verbose: bool) -> Result<Self> {
        let mut graph = Self::new(verbose);
        graph.load(base)?;
        Ok(graph)
    }

    /// Builds the forward orientation from an explicit edge list.
    ///
    /// Edges keep their input order within each source vertex. The derived
    /// orientations stay ungenerated until [`Graph::materialize`] is called.
    pub fn from_edges(n: usize, edges: &[(VertexId, VertexId)], verbose: bool) -> Result<Self> {
        for &(source, target) in edges {
            if (source as usize) >= n || (target as usize) >= n {
                return Err(GraphError::InvalidArgument(format!(
                    "edge ({source}, {target}) outside vertex range 0..{n}"
                )));
            }
        }
        let mut graph = Self::new(verbose);
        graph.vertex_count = n;
        graph.edge_count = edges.len();

        let forward = &mut graph.reprs[Orientation::Forward.index()];
        forward.generated = true;
        forward.edge_count = edges.len();
        forward.boundaries = vec![0u32; n];
        for &(source, _) in edges {
            forward.boundaries[source as usize] += 1;
        }
        for i in 1..n {
            forward.boundaries[i] += forward.boundaries[i - 1];
        }
        let mut fill = forward.boundaries.clone();
        forward.targets = vec![0u32; edges.len()];
        // Fill back-to-front per source so input order survives.
        for &(source, target) in edges.iter().rev() {
            let s = source as usize;
            fill[s] -= 1;
            forward.targets[fill[s] as usize] = target;
        }
        Ok(graph)
    }

    /// Number of vertices in every orientation.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Edge count of the given orientation; zero while ungenerated.
    pub fn edge_count(&self, orientation: Orientation) -> usize {
        self.repr(orientation).edge_count
    }

    /// Whether the given orientation has been supplied or derived.
    pub fn is_generated(&self, orientation: Orientation) -> bool {
        self.repr(orientation).generated
    }

    /// Whether progress reporting and verbose logging are enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Enables or disables progress reporting.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Resets every orientation and the mapping to the empty state.
    ///
    /// The verbosity flag is untouched.
    pub fn clear(&mut self) {
        self.vertex_count = 0;
        self.edge_count = 0;
        for repr in &mut self.reprs {
            repr.clear();
        }
        self.mapping = None;
    }

    /// Out-degree of `vertex` in the given orientation.
    ///
    /// Zero for an ungenerated orientation, consistent with its zero edge
    /// count. Fails for vertices outside `[0, n)`.
    pub fn degree(&self, vertex: VertexId, orientation: Orientation) -> Result<usize> {
        let v = self.check_vertex(vertex)?;
        let (lo, hi) = self.repr(orientation).range(v);
        Ok(hi - lo)
    }

    /// Copied, restartable iterator over the neighbors of `vertex`.
    pub fn neighbors(&self, vertex: VertexId, orientation: Orientation) -> Result<Neighbors> {
        Ok(Neighbors::new(self.neighbor_slice(vertex, orientation)?.to_vec()))
    }

    /// Zero-copy borrow of the contiguous target slice for `vertex`.
    pub fn neighbor_slice(&self, vertex: VertexId, orientation: Orientation) -> Result<&[VertexId]> {
        let v = self.check_vertex(vertex)?;
        let repr = self.repr(orientation);
        let (lo, hi) = repr.range(v);
        Ok(&repr.targets[lo..hi])
    }

    /// Writes a bounded human-readable adjacency dump.
    ///
    /// At most `range` vertices and `range` neighbors per vertex are shown;
    /// zero means unlimited.
    pub fn write_dump<W: io::Write>(
        &self,
        out: &mut W,
        orientation: Orientation,
        range: usize,
    ) -> io::Result<()> {
        writeln!(
            out,
            "n = {}, e = {}",
            self.vertex_count,
            self.edge_count(orientation)
        )?;
        for v in 0..self.vertex_count {
            if range > 0 && v == range {
                writeln!(out, "...")?;
                break;
            }
            let slice = self
                .neighbor_slice(v as VertexId, orientation)
                .expect("vertex in range");
            write!(out, "v{v} d{} [", slice.len())?;
            for (i, target) in slice.iter().enumerate() {
                if range > 0 && i == range {
                    write!(out, "...")?;
                    break;
                }
                if i > 0 {
                    write!(out, ", ")?;
                }
                write!(out, "{target}")?;
            }
            writeln!(out, "]")?;
        }
        Ok(())
    }

    pub(crate) fn repr(&self, orientation: Orientation) -> &CsrRepr {
        &self.reprs[orientation.index()]
    }

    pub(crate) fn repr_mut(&mut self, orientation: Orientation) -> &mut CsrRepr {
        &mut self.reprs[orientation.index()]
    }

    fn check_vertex(&self, vertex: VertexId) -> Result<usize> {
        let v = vertex as usize;
        if v >= self.vertex_count {
            return Err(GraphError::InvalidArgument(format!(
                "vertex {vertex} outside range 0..{}",
                self.vertex_count
            )));
        }
        Ok(v)
    }
}

/// Owned cursor over one vertex's neighbors.
///
/// The targets are copied out of the backing array, so the cursor stays
/// valid after the graph changes and can be cloned to restart iteration.
#[derive(Clone, Debug)]
pub struct Neighbors {
    targets: Vec<VertexId>,
    index: usize,
}

impl Neighbors {
    pub(crate) fn new(targets: Vec<VertexId>) -> Self {
        Self { targets, index: 0 }
    }

    /// Total number of neighbors, independent of cursor position.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True when the vertex has no neighbors in this orientation.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Rewinds the cursor to the first neighbor.
    pub fn restart(&mut self) {
        self.index = 0;
    }
}

impl Iterator for Neighbors {
    type Item = VertexId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.targets.len() {
            return None;
        }
        let item = self.targets[self.index];
        self.index += 1;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Graph {
        Graph::from_edges(4, &[(0, 1), (1, 2), (2, 0), (0, 2)], false).expect("valid edges")
    }

    #[test]
    fn from_edges_builds_prefix_sums() {
        let graph = diamond();
        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.edge_count(Orientation::Forward), 4);
        assert_eq!(graph.neighbor_slice(0, Orientation::Forward).unwrap(), &[1, 2]);
        assert_eq!(graph.neighbor_slice(1, Orientation::Forward).unwrap(), &[2]);
        assert_eq!(graph.neighbor_slice(2, Orientation::Forward).unwrap(), &[0]);
        assert_eq!(graph.neighbor_slice(3, Orientation::Forward).unwrap(), &[] as &[u32]);
    }

    #[test]
    fn from_edges_rejects_out_of_range_targets() {
        let err = Graph::from_edges(2, &[(0, 5)], false).unwrap_err();
        assert!(matches!(err, GraphError::InvalidArgument(_)));
    }

    #[test]
    fn degree_out_of_range_fails() {
        let graph = diamond();
        assert!(graph.degree(4, Orientation::Forward).is_err());
    }

    #[test]
    fn ungenerated_orientation_reads_as_empty() {
        let graph = diamond();
        assert!(!graph.is_generated(Orientation::Reverse));
        assert_eq!(graph.edge_count(Orientation::Reverse), 0);
        assert_eq!(graph.degree(0, Orientation::Reverse).unwrap(), 0);
        assert!(graph.neighbor_slice(0, Orientation::Reverse).unwrap().is_empty());
    }

    #[test]
    fn neighbors_cursor_restarts() {
        let graph = diamond();
        let mut cursor = graph.neighbors(0, Orientation::Forward).expect("cursor");
        assert_eq!(cursor.len(), 2);
        assert_eq!(cursor.next(), Some(1));
        assert_eq!(cursor.next(), Some(2));
        assert_eq!(cursor.next(), None);
        cursor.restart();
        assert_eq!(cursor.next(), Some(1));
    }

    #[test]
    fn clear_resets_everything_but_verbosity() {
        let mut graph = diamond();
        graph.set_verbose(true);
        graph.clear();
        assert_eq!(graph.vertex_count(), 0);
        assert_eq!(graph.edge_count(Orientation::Forward), 0);
        assert!(!graph.is_generated(Orientation::Forward));
        assert!(!graph.has_mapping());
        assert!(graph.is_verbose());
    }

    #[test]
    fn dump_is_bounded_by_range() {
        let graph = diamond();
        let mut out = Vec::new();
        graph
            .write_dump(&mut out, Orientation::Forward, 2)
            .expect("dump");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("n = 4, e = 4"));
        assert!(text.contains("v0 d2 [1, 2]"));
        assert!(text.ends_with("...\n"));
    }
}
