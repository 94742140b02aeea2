//! Optional mapping between compact vertex indices and external raw ids.
//!
//! The to-raw array is persisted; the raw-to-compact map is rebuilt in full
//! after every load and never written out, so it cannot go stale.

use std::io::BufWriter;
use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::codec;
use crate::error::{GraphError, Result};
use crate::fsutil;
use crate::graph::persist::suffixed;
use crate::graph::Graph;
use crate::types::{RawId, VertexId};

/// Bidirectional vertex identifier mapping owned by a [`Graph`].
#[derive(Clone, Debug)]
pub(crate) struct IdMapping {
    pub(crate) to_raw: Vec<RawId>,
    pub(crate) from_raw: FxHashMap<RawId, VertexId>,
}

impl IdMapping {
    /// Builds the inverse map from a to-raw array.
    ///
    /// Insertion runs in increasing compact id, so on duplicate raw ids the
    /// last writer wins; raw ids are expected unique and not validated.
    pub(crate) fn from_to_raw(to_raw: Vec<RawId>) -> Self {
        let mut from_raw =
            FxHashMap::with_capacity_and_hasher(to_raw.len(), Default::default());
        for (id, &raw) in to_raw.iter().enumerate() {
            from_raw.insert(raw, id as VertexId);
        }
        Self { to_raw, from_raw }
    }
}

impl Graph {
    /// Whether an identifier mapping has been loaded.
    pub fn has_mapping(&self) -> bool {
        self.mapping.is_some()
    }

    /// Attempts to load the mapping file next to `base`.
    ///
    /// Returns `Ok(false)` when neither `<base>.map` nor `<base>.map.bin`
    /// exists; finding both is a fatal ambiguity.
    pub fn load_mapping(&mut self, base: impl AsRef<Path>) -> Result<bool> {
        let base = base.as_ref();
        let text_path = suffixed(base, ".map");
        let binary_path = suffixed(base, ".map.bin");
        let to_raw = match (text_path.exists(), binary_path.exists()) {
            (true, true) => {
                return Err(GraphError::AmbiguousMapping {
                    text: text_path,
                    binary: binary_path,
                })
            }
            (false, false) => return Ok(false),
            (true, false) => {
                let mut stream = fsutil::open_for_read(&text_path)?;
                codec::read_text(&text_path, &mut stream, self.vertex_count, self.verbose)?
            }
            (false, true) => {
                let mut stream = fsutil::open_for_read(&binary_path)?;
                codec::read_binary(&binary_path, &mut stream, self.vertex_count, self.verbose)?
            }
        };
        self.mapping = Some(IdMapping::from_to_raw(to_raw));
        debug!(vertices = self.vertex_count, "identifier mapping rebuilt");
        Ok(true)
    }

    /// Writes the to-raw array next to `base`, text or binary.
    ///
    /// Hard error when no mapping has been loaded.
    pub fn save_mapping(&self, base: impl AsRef<Path>, binary: bool) -> Result<()> {
        let mapping = self.mapping.as_ref().ok_or(GraphError::MappingMissing)?;
        let path = if binary {
            suffixed(base.as_ref(), ".map.bin")
        } else {
            suffixed(base.as_ref(), ".map")
        };
        fsutil::ensure_absent(&path)?;
        let mut stream = BufWriter::new(fsutil::create_new(&path)?);
        if binary {
            codec::write_binary(&path, &mut stream, &mapping.to_raw, self.verbose)
        } else {
            codec::write_text(&path, &mut stream, &mapping.to_raw, self.verbose)
        }
    }

    /// Raw id of a compact vertex index, or `None` when no mapping is
    /// loaded or the index is out of range.
    pub fn to_raw_id(&self, id: VertexId) -> Option<RawId> {
        self.mapping.as_ref()?.to_raw.get(id as usize).copied()
    }

    /// Compact vertex index of a raw id, or `None` when no mapping is
    /// loaded or the raw id is unknown.
    pub fn from_raw_id(&self, raw_id: RawId) -> Option<VertexId> {
        self.mapping.as_ref()?.from_raw.get(&raw_id).copied()
    }

    /// Elementwise [`Graph::to_raw_id`] over a slice.
    pub fn to_raw_ids(&self, ids: &[VertexId]) -> Vec<Option<RawId>> {
        ids.iter().map(|&id| self.to_raw_id(id)).collect()
    }

    /// Elementwise [`Graph::from_raw_id`] over a slice.
    pub fn from_raw_ids(&self, raw_ids: &[RawId]) -> Vec<Option<VertexId>> {
        raw_ids.iter().map(|&raw| self.from_raw_id(raw)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapped_graph() -> Graph {
        let mut graph = Graph::from_edges(3, &[(0, 1)], false).expect("edges");
        graph.mapping = Some(IdMapping::from_to_raw(vec![700, 800, 900]));
        graph
    }

    #[test]
    fn lookups_round_trip() {
        let graph = mapped_graph();
        for id in 0..3u32 {
            let raw = graph.to_raw_id(id).expect("raw id");
            assert_eq!(graph.from_raw_id(raw), Some(id));
        }
    }

    #[test]
    fn sentinels_for_unknown_ids() {
        let graph = mapped_graph();
        assert_eq!(graph.to_raw_id(3), None);
        assert_eq!(graph.from_raw_id(12345), None);

        let unmapped = Graph::from_edges(3, &[], false).expect("edges");
        assert_eq!(unmapped.to_raw_id(0), None);
        assert_eq!(unmapped.from_raw_id(700), None);
    }

    #[test]
    fn batch_forms_match_scalar_forms() {
        let graph = mapped_graph();
        assert_eq!(
            graph.to_raw_ids(&[0, 2, 9]),
            vec![Some(700), Some(900), None]
        );
        assert_eq!(
            graph.from_raw_ids(&[800, 1]),
            vec![Some(1), None]
        );
    }

    #[test]
    fn duplicate_raw_ids_keep_last_writer() {
        let mapping = IdMapping::from_to_raw(vec![5, 5, 7]);
        assert_eq!(mapping.from_raw.get(&5).copied(), Some(1));
        assert_eq!(mapping.from_raw.get(&7).copied(), Some(2));
    }

    #[test]
    fn save_without_mapping_is_a_hard_error() {
        let graph = Graph::from_edges(2, &[], false).expect("edges");
        let dir = tempfile::TempDir::new().expect("temp dir");
        let err = graph.save_mapping(dir.path().join("g"), false).unwrap_err();
        assert!(matches!(err, GraphError::MappingMissing));
    }
}
