//! Synthetic recursive-matrix (RMAT) graph generation.
//!
//! Each trial edge descends the quadrant grid `scale` times, accumulating
//! bit contributions into its source and target coordinates. Per-vertex
//! lists are sorted and deduplicated before packing, so the realized forward
//! edge count is the number of distinct edges and usually falls below the
//! requested count.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::progress::Progress;
use crate::types::Orientation;

/// Parameters for [`Graph::generate_rmat`].
///
/// `n = 2^scale` vertices; `floor(n * (n - 1) * edge_factor)` trial edges;
/// `a`, `b`, `c` are the top-left, top-right, and bottom-left quadrant
/// probabilities (bottom-right takes the remainder). A seed makes the
/// generated graph reproducible.
#[derive(Clone, Copy, Debug)]
pub struct RmatConfig {
    /// log2 of the vertex count.
    pub scale: u32,
    /// Requested edges as a fraction of `n * (n - 1)`.
    pub edge_factor: f64,
    /// Top-left quadrant probability (neither bit set).
    pub a: f64,
    /// Top-right quadrant probability (target bit set).
    pub b: f64,
    /// Bottom-left quadrant probability (source bit set).
    pub c: f64,
    /// RNG seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for RmatConfig {
    fn default() -> Self {
        Self {
            scale: 10,
            edge_factor: 0.9,
            a: 0.60,
            b: 0.20,
            c: 0.15,
            seed: None,
        }
    }
}

impl Graph {
    /// Replaces this graph with a synthetic RMAT graph.
    ///
    /// All three derived orientations are generated eagerly afterwards, so
    /// the returned graph is fully materialized.
    pub fn generate_rmat(&mut self, config: &RmatConfig) -> Result<()> {
        if config.scale >= 31 {
            return Err(GraphError::InvalidArgument(format!(
                "scale {} exceeds the addressable vertex range",
                config.scale
            )));
        }
        let RmatConfig { a, b, c, .. } = *config;
        if !(0.0..=1.0).contains(&a) || b < 0.0 || c < 0.0 || a + b + c > 1.0 {
            return Err(GraphError::InvalidArgument(format!(
                "quadrant probabilities a={a} b={b} c={c} do not form a distribution"
            )));
        }

        let n = 1usize << config.scale;
        let requested = (n as f64 * (n as f64 - 1.0) * config.edge_factor) as usize;
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let (ab, abc) = (a + b, a + b + c);

        let progress = Progress::new("rmat edge sampling", requested as u64, self.verbose);
        let mut adjacency: Vec<Vec<u32>> = vec![Vec::new(); n];
        for trial in 0..requested {
            let (mut source, mut target) = (0u32, 0u32);
            for level in 0..config.scale {
                let bit = 1u32 << (config.scale - 1 - level);
                let draw: f64 = rng.gen();
                if draw < a {
                    // top-left quadrant, no bit set
                } else if draw < ab {
                    target += bit;
                } else if draw < abc {
                    source += bit;
                } else {
                    source += bit;
                    target += bit;
                }
            }
            adjacency[source as usize].push(target);
            progress.update((trial + 1) as u64);
        }
        progress.finish();

        self.clear();
        self.vertex_count = n;
        let forward = self.repr_mut(Orientation::Forward);
        forward.generated = true;
        forward.boundaries = vec![0u32; n];
        forward.targets = Vec::new();
        let mut total = 0u32;
        for (i, list) in adjacency.iter_mut().enumerate() {
            list.sort_unstable();
            list.dedup();
            total += list.len() as u32;
            forward.boundaries[i] = total;
            forward.targets.extend_from_slice(list);
        }
        forward.edge_count = total as usize;
        self.edge_count = total as usize;
        info!(
            scale = config.scale,
            vertices = n,
            requested,
            realized = total,
            "rmat forward orientation packed"
        );

        self.materialize(Orientation::Reverse);
        self.materialize(Orientation::Intersection);
        self.materialize(Orientation::Union);
        Ok(())
    }
}
