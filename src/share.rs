//! Cross-process graph sharing through a flat, self-describing segment.
//!
//! A fully materialized graph is serialized into a byte segment (magic,
//! version, counts, then the raw arrays) and published under an integer key
//! in the shared-memory filesystem. Readers attach by key and size and get
//! a typed view that decodes borrowed slices of the segment on demand; the
//! in-process [`Graph`] object is never copied byte-for-byte.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::types::{Orientation, RawId, VertexId};

const MAGIC: &[u8; 8] = b"QVRGRPH\0";
const VERSION_MAJOR: u16 = 1;
const VERSION_MINOR: u16 = 0;

/// Directory backing published segments.
const SEGMENT_DIR: &str = "/dev/shm";

fn segment_path(dir: &Path, key: i32) -> PathBuf {
    dir.join(format!("quiver.seg.{key}"))
}

/// Derives a stable publish key from a graph's counts.
pub fn derive_key(graph: &Graph) -> i32 {
    let n = graph.vertex_count() as u64;
    let m = graph.edge_count(Orientation::Forward) as u64;
    (((n.wrapping_mul(0x9e37_79b9) ^ m) & 0x7fff_ffff) as i32).max(1)
}

/// Publishes `graph` under `key`, returning the segment size in bytes.
pub fn publish(graph: &Graph, key: i32) -> Result<usize> {
    publish_in(Path::new(SEGMENT_DIR), graph, key)
}

/// Attaches to the segment published under `key` with the given size.
pub fn attach(key: i32, size: usize) -> Result<SharedSegment> {
    attach_in(Path::new(SEGMENT_DIR), key, size)
}

pub(crate) fn publish_in(dir: &Path, graph: &Graph, key: i32) -> Result<usize> {
    if key <= 0 {
        return Err(GraphError::BadSegmentKey(key));
    }
    let bytes = encode_segment(graph);
    let path = segment_path(dir, key);
    fs::write(&path, &bytes).map_err(|err| {
        GraphError::SegmentMap(format!("cannot write {}: {err}", path.display()))
    })?;
    info!(key, size = bytes.len(), "graph published to shared segment");
    Ok(bytes.len())
}

pub(crate) fn attach_in(dir: &Path, key: i32, size: usize) -> Result<SharedSegment> {
    if key <= 0 {
        return Err(GraphError::BadSegmentKey(key));
    }
    let path = segment_path(dir, key);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(GraphError::BadSegmentKey(key))
        }
        Err(err) => {
            return Err(GraphError::SegmentMap(format!(
                "cannot read {}: {err}",
                path.display()
            )))
        }
    };
    if bytes.len() != size {
        return Err(GraphError::SegmentMap(format!(
            "segment {} holds {} bytes, expected {size}",
            path.display(),
            bytes.len()
        )));
    }
    Ok(SharedSegment { bytes })
}

/// Serializes a graph into the flat segment layout.
pub(crate) fn encode_segment(graph: &Graph) -> Vec<u8> {
    let n = graph.vertex_count;
    let mut bytes = Vec::new();
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&VERSION_MAJOR.to_le_bytes());
    bytes.extend_from_slice(&VERSION_MINOR.to_le_bytes());
    bytes.extend_from_slice(&(n as u32).to_le_bytes());
    for orientation in Orientation::ALL {
        let repr = graph.repr(orientation);
        bytes.extend_from_slice(&u32::from(repr.generated).to_le_bytes());
        bytes.extend_from_slice(&(repr.edge_count as u32).to_le_bytes());
        if repr.generated {
            for value in &repr.boundaries {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
            for value in &repr.targets {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
    }
    match &graph.mapping {
        Some(mapping) => {
            bytes.extend_from_slice(&1u32.to_le_bytes());
            for value in &mapping.to_raw {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        None => bytes.extend_from_slice(&0u32.to_le_bytes()),
    }
    bytes
}

/// An attached segment owning the raw bytes read from the backing store.
pub struct SharedSegment {
    bytes: Vec<u8>,
}

impl SharedSegment {
    /// Interprets the segment, validating magic, version, and array sizes.
    pub fn view(&self) -> Result<SegmentView<'_>> {
        SegmentView::parse(&self.bytes)
    }
}

/// Borrowed little-endian `u32` array inside a segment.
#[derive(Clone, Copy, Debug)]
struct U32View<'a> {
    bytes: &'a [u8],
}

impl<'a> U32View<'a> {
    fn len(&self) -> usize {
        self.bytes.len() / 4
    }

    fn get(&self, index: usize) -> u32 {
        let b = &self.bytes[index * 4..index * 4 + 4];
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    fn iter(&self) -> impl Iterator<Item = u32> + 'a {
        self.bytes
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

struct SegmentCursor<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> SegmentCursor<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.index + len > self.data.len() {
            return Err(GraphError::Corruption(
                "shared segment shorter than its declared contents".into(),
            ));
        }
        let start = self.index;
        self.index += len;
        Ok(&self.data[start..start + len])
    }

    fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }
}

struct OrientationView<'a> {
    generated: bool,
    edge_count: usize,
    boundaries: U32View<'a>,
    targets: U32View<'a>,
}

/// Typed reader over a published segment.
///
/// Array accessors decode directly from the borrowed segment bytes; nothing
/// is copied until [`SegmentView::to_graph`] is called.
pub struct SegmentView<'a> {
    vertex_count: usize,
    orientations: [OrientationView<'a>; 4],
    to_raw: Option<U32View<'a>>,
}

impl<'a> SegmentView<'a> {
    fn parse(data: &'a [u8]) -> Result<Self> {
        let mut cursor = SegmentCursor { data, index: 0 };
        if cursor.take(MAGIC.len())? != MAGIC {
            return Err(GraphError::Corruption("invalid segment magic".into()));
        }
        let major = cursor.read_u16()?;
        let minor = cursor.read_u16()?;
        if major != VERSION_MAJOR || minor != VERSION_MINOR {
            return Err(GraphError::Corruption(format!(
                "unsupported segment version {major}.{minor}"
            )));
        }
        let n = cursor.read_u32()? as usize;
        let mut orientations = Vec::with_capacity(4);
        for _ in Orientation::ALL {
            let generated = match cursor.read_u32()? {
                0 => false,
                1 => true,
                other => {
                    return Err(GraphError::Corruption(format!(
                        "invalid generated flag {other}"
                    )))
                }
            };
            let edge_count = cursor.read_u32()? as usize;
            let (boundaries, targets) = if generated {
                (
                    U32View { bytes: cursor.take(n * 4)? },
                    U32View { bytes: cursor.take(edge_count * 4)? },
                )
            } else {
                (U32View { bytes: &[] }, U32View { bytes: &[] })
            };
            orientations.push(OrientationView {
                generated,
                edge_count,
                boundaries,
                targets,
            });
        }
        let to_raw = match cursor.read_u32()? {
            0 => None,
            1 => Some(U32View { bytes: cursor.take(n * 4)? }),
            other => {
                return Err(GraphError::Corruption(format!(
                    "invalid mapping flag {other}"
                )))
            }
        };
        if cursor.index != data.len() {
            return Err(GraphError::Corruption(
                "trailing bytes after segment contents".into(),
            ));
        }
        let orientations: [OrientationView<'a>; 4] = orientations
            .try_into()
            .map_err(|_| GraphError::Corruption("orientation table truncated".into()))?;
        Ok(Self {
            vertex_count: n,
            orientations,
            to_raw,
        })
    }

    /// Number of vertices described by the segment.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Whether the given orientation was generated when published.
    pub fn is_generated(&self, orientation: Orientation) -> bool {
        self.orientations[orientation.index()].generated
    }

    /// Edge count of the given orientation.
    pub fn edge_count(&self, orientation: Orientation) -> usize {
        self.orientations[orientation.index()].edge_count
    }

    /// Whether a to-raw identifier mapping was published alongside edges.
    pub fn has_mapping(&self) -> bool {
        self.to_raw.is_some()
    }

    /// Raw id of a compact index, or `None` without a mapping or in-range id.
    pub fn to_raw_id(&self, id: VertexId) -> Option<RawId> {
        let view = self.to_raw.as_ref()?;
        if (id as usize) < view.len() {
            Some(view.get(id as usize))
        } else {
            None
        }
    }

    /// Out-degree of `vertex` in the given orientation.
    pub fn degree(&self, vertex: VertexId, orientation: Orientation) -> Result<usize> {
        let (lo, hi) = self.range(vertex, orientation)?;
        Ok(hi - lo)
    }

    /// Iterator over the neighbors of `vertex`, decoded from the segment.
    pub fn neighbors(
        &self,
        vertex: VertexId,
        orientation: Orientation,
    ) -> Result<impl Iterator<Item = VertexId> + 'a> {
        let (lo, hi) = self.range(vertex, orientation)?;
        let targets = self.orientations[orientation.index()].targets;
        Ok(U32View {
            bytes: &targets.bytes[lo * 4..hi * 4],
        }
        .iter())
    }

    /// Copies the segment back into an owned [`Graph`].
    pub fn to_graph(&self, verbose: bool) -> Graph {
        let mut graph = Graph::new(verbose);
        graph.vertex_count = self.vertex_count;
        graph.edge_count = self.edge_count(Orientation::Forward);
        for orientation in Orientation::ALL {
            let view = &self.orientations[orientation.index()];
            if !view.generated {
                continue;
            }
            let repr = graph.repr_mut(orientation);
            repr.generated = true;
            repr.edge_count = view.edge_count;
            repr.boundaries = view.boundaries.iter().collect();
            repr.targets = view.targets.iter().collect();
        }
        if let Some(to_raw) = &self.to_raw {
            graph.mapping = Some(crate::graph::IdMapping::from_to_raw(to_raw.iter().collect()));
        }
        graph
    }

    fn range(&self, vertex: VertexId, orientation: Orientation) -> Result<(usize, usize)> {
        let v = vertex as usize;
        if v >= self.vertex_count {
            return Err(GraphError::InvalidArgument(format!(
                "vertex {vertex} outside range 0..{}",
                self.vertex_count
            )));
        }
        let view = &self.orientations[orientation.index()];
        if !view.generated {
            return Ok((0, 0));
        }
        let lo = if v == 0 {
            0
        } else {
            view.boundaries.get(v - 1) as usize
        };
        Ok((lo, view.boundaries.get(v) as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn materialized_graph() -> Graph {
        let mut graph =
            Graph::from_edges(4, &[(0, 1), (1, 2), (2, 0), (0, 2)], false).expect("edges");
        graph.materialize(Orientation::Reverse);
        graph.materialize(Orientation::Intersection);
        graph.materialize(Orientation::Union);
        graph
    }

    #[test]
    fn publish_attach_round_trip() {
        let dir = TempDir::new().expect("temp dir");
        let graph = materialized_graph();
        let size = publish_in(dir.path(), &graph, 41).expect("publish");
        let segment = attach_in(dir.path(), 41, size).expect("attach");
        let view = segment.view().expect("view");
        assert_eq!(view.vertex_count(), 4);
        for orientation in Orientation::ALL {
            assert_eq!(view.edge_count(orientation), graph.edge_count(orientation));
            for v in 0..4u32 {
                assert_eq!(
                    view.degree(v, orientation).unwrap(),
                    graph.degree(v, orientation).unwrap()
                );
                let from_view: Vec<u32> = view.neighbors(v, orientation).unwrap().collect();
                assert_eq!(from_view, graph.neighbor_slice(v, orientation).unwrap());
            }
        }
        let rebuilt = view.to_graph(false);
        assert_eq!(rebuilt.vertex_count(), graph.vertex_count());
        assert_eq!(
            rebuilt.edge_count(Orientation::Union),
            graph.edge_count(Orientation::Union)
        );
    }

    #[test]
    fn invalid_keys_fail_distinctly_from_map_failures() {
        let dir = TempDir::new().expect("temp dir");
        let graph = materialized_graph();
        assert!(matches!(
            publish_in(dir.path(), &graph, 0),
            Err(GraphError::BadSegmentKey(0))
        ));
        assert!(matches!(
            attach_in(dir.path(), 7, 128),
            Err(GraphError::BadSegmentKey(7))
        ));
        let size = publish_in(dir.path(), &graph, 7).expect("publish");
        assert!(matches!(
            attach_in(dir.path(), 7, size + 1),
            Err(GraphError::SegmentMap(_))
        ));
    }

    #[test]
    fn corrupted_magic_is_rejected() {
        let graph = materialized_graph();
        let mut bytes = encode_segment(&graph);
        bytes[0] ^= 0xFF;
        let segment = SharedSegment { bytes };
        assert!(matches!(
            segment.view(),
            Err(GraphError::Corruption(_))
        ));
    }

    #[test]
    fn ungenerated_orientations_read_as_empty() {
        let graph = Graph::from_edges(2, &[(0, 1)], false).expect("edges");
        let segment = SharedSegment {
            bytes: encode_segment(&graph),
        };
        let view = segment.view().expect("view");
        assert!(!view.is_generated(Orientation::Reverse));
        assert_eq!(view.degree(0, Orientation::Reverse).unwrap(), 0);
    }

    #[test]
    fn derived_key_is_positive() {
        assert!(derive_key(&materialized_graph()) > 0);
        assert!(derive_key(&Graph::new(false)) > 0);
    }
}
