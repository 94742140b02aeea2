//! Quiver: a compressed-adjacency (CSR) directed-graph storage engine.
//!
//! A [`Graph`] keeps up to four adjacency orientations over one vertex set:
//! forward edges as stored, their transpose, their mutual intersection, and
//! their either-direction union. The derived orientations are generated by
//! linear counting passes on first demand and cached. Graphs persist in a
//! compact binary layout or a human-inspectable text layout, optionally
//! carry a mapping to external raw vertex ids, and can be produced
//! synthetically by the RMAT generator or published to other processes
//! through a flat shared segment.

#![warn(missing_docs)]

mod codec;
mod fsutil;
mod progress;

pub mod error;
pub mod graph;
pub mod share;
pub mod types;

pub use error::{GraphError, Result};
pub use graph::{Graph, Neighbors, RmatConfig};
pub use types::{save_flags, Orientation, RawId, VertexId};
