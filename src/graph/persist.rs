//! Load/save orchestration: dual formats, fallback, selective artifacts.
//!
//! A load prefers the text layout and retries the whole edge set in binary
//! when the forward text files are unusable. Within the surviving format
//! every derived orientation loads independently; any failure there falls
//! back to on-the-fly derivation instead of failing the load. Saves write a
//! caller-selected subset of artifacts and refuse to overwrite existing
//! files.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::codec;
use crate::error::{GraphError, Result};
use crate::fsutil;
use crate::graph::Graph;
use crate::types::{save_flags, Orientation};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Format {
    Text,
    Binary,
}

/// Appends a suffix to a base path without touching its existing extension.
pub(crate) fn suffixed(base: &Path, suffix: &str) -> PathBuf {
    let mut os = base.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

/// The three companion files of one orientation in one format.
struct OrientationPaths {
    index: PathBuf,
    boundaries: PathBuf,
    targets: PathBuf,
}

fn read_array(
    format: Format,
    path: &Path,
    stream: &mut File,
    len: usize,
    verbose: bool,
) -> Result<Vec<u32>> {
    match format {
        Format::Text => codec::read_text(path, stream, len, verbose),
        Format::Binary => codec::read_binary(path, stream, len, verbose),
    }
}

fn write_array(
    format: Format,
    path: &Path,
    stream: &mut BufWriter<File>,
    values: &[u32],
    verbose: bool,
) -> Result<()> {
    match format {
        Format::Text => codec::write_text(path, stream, values, verbose),
        Format::Binary => codec::write_binary(path, stream, values, verbose),
    }
}

impl OrientationPaths {
    fn new(base: &Path, orientation: Orientation, format: Format) -> Self {
        let qualifier = match format {
            Format::Text => "",
            Format::Binary => "_bin",
        };
        let stem = suffixed(base, &format!(".imp_{}{qualifier}", orientation.file_tag()));
        Self {
            index: suffixed(&stem, ".ind"),
            boundaries: suffixed(&stem, ".bou"),
            targets: suffixed(&stem, ".tar"),
        }
    }
}

impl Graph {
    /// Loads the graph from the files at `base`, clearing any prior state.
    ///
    /// Fails only when the top-level index file or the forward orientation
    /// cannot be obtained in either format. Missing derived orientations are
    /// regenerated; a missing mapping file is not an error.
    pub fn load(&mut self, base: impl AsRef<Path>) -> Result<()> {
        let base = base.as_ref();
        self.clear();

        let index_path = suffixed(base, ".ind");
        let mut index_stream = fsutil::open_for_read(&index_path)?;
        let header = codec::read_text(&index_path, &mut index_stream, 2, self.verbose)?;
        self.vertex_count = header[0] as usize;
        self.edge_count = header[1] as usize;
        info!(
            base = %base.display(),
            vertices = self.vertex_count,
            edges = self.edge_count,
            "loading graph"
        );

        let format = match self.load_orientation(base, Orientation::Forward, Format::Text) {
            Ok(()) => Format::Text,
            Err(err) => {
                debug!(%err, "text-format forward load failed, retrying binary");
                self.load_orientation(base, Orientation::Forward, Format::Binary)?;
                Format::Binary
            }
        };

        // Reverse first: union reads it without triggering it.
        for orientation in [
            Orientation::Reverse,
            Orientation::Intersection,
            Orientation::Union,
        ] {
            if let Err(err) = self.load_orientation(base, orientation, format) {
                debug!(
                    orientation = orientation.file_tag(),
                    %err,
                    "orientation files unusable, deriving instead"
                );
                self.materialize(orientation);
            }
        }

        if self.load_mapping(base)? {
            info!(base = %base.display(), "identifier mapping loaded");
        }
        Ok(())
    }

    /// Writes the artifacts selected by `mask` (see [`save_flags`]).
    ///
    /// The top-level index file is always text. Requesting an ungenerated
    /// orientation or an unloaded mapping is a hard error, as is any output
    /// file that already exists.
    pub fn save(&self, base: impl AsRef<Path>, mask: u32) -> Result<()> {
        let base = base.as_ref();
        let format = if mask & save_flags::BINARY != 0 {
            Format::Binary
        } else {
            Format::Text
        };
        if mask & save_flags::INDEX != 0 {
            let index_path = suffixed(base, ".ind");
            fsutil::ensure_absent(&index_path)?;
            let mut stream = BufWriter::new(fsutil::create_new(&index_path)?);
            codec::write_text(
                &index_path,
                &mut stream,
                &[self.vertex_count as u32, self.edge_count as u32],
                self.verbose,
            )?;
        }
        if mask & save_flags::IN != 0 {
            self.save_orientation(base, Orientation::Reverse, format)?;
        }
        if mask & save_flags::OUT != 0 {
            self.save_orientation(base, Orientation::Forward, format)?;
        }
        if mask & save_flags::INTERSECT != 0 {
            self.save_orientation(base, Orientation::Intersection, format)?;
        }
        if mask & save_flags::UNION != 0 {
            self.save_orientation(base, Orientation::Union, format)?;
        }
        if mask & save_flags::MAPPING != 0 {
            self.save_mapping(base, format == Format::Binary)?;
        }
        info!(base = %base.display(), mask, "graph saved");
        Ok(())
    }

    /// Loads one orientation's three companion files in one format.
    ///
    /// The representation is only committed once all three files parsed, so
    /// a failure leaves it in its prior state.
    fn load_orientation(
        &mut self,
        base: &Path,
        orientation: Orientation,
        format: Format,
    ) -> Result<()> {
        let paths = OrientationPaths::new(base, orientation, format);
        let mut index_stream = fsutil::open_for_read(&paths.index)?;
        let mut boundary_stream = fsutil::open_for_read(&paths.boundaries)?;
        let mut target_stream = fsutil::open_for_read(&paths.targets)?;

        let index = read_array(format, &paths.index, &mut index_stream, 2, self.verbose)?;
        if index[0] as usize != self.vertex_count {
            return Err(GraphError::Corruption(format!(
                "{} names {} vertices, graph has {}",
                paths.index.display(),
                index[0],
                self.vertex_count
            )));
        }
        let edge_count = index[1] as usize;
        let boundaries = read_array(
            format,
            &paths.boundaries,
            &mut boundary_stream,
            self.vertex_count,
            self.verbose,
        )?;
        if self.vertex_count > 0 && boundaries[self.vertex_count - 1] as usize != edge_count {
            return Err(GraphError::Corruption(format!(
                "{} ends at {} but {} edges were declared",
                paths.boundaries.display(),
                boundaries[self.vertex_count - 1],
                edge_count
            )));
        }
        let targets = read_array(
            format,
            &paths.targets,
            &mut target_stream,
            edge_count,
            self.verbose,
        )?;

        let repr = self.repr_mut(orientation);
        repr.generated = true;
        repr.edge_count = edge_count;
        repr.boundaries = boundaries;
        repr.targets = targets;
        debug!(
            orientation = orientation.file_tag(),
            format = ?format,
            edges = edge_count,
            "orientation loaded"
        );
        Ok(())
    }

    /// Writes one orientation's three companion files in one format.
    fn save_orientation(&self, base: &Path, orientation: Orientation, format: Format) -> Result<()> {
        let repr = self.repr(orientation);
        if !repr.generated {
            return Err(GraphError::InvalidArgument(format!(
                "{} orientation has not been generated",
                orientation.file_tag()
            )));
        }
        let paths = OrientationPaths::new(base, orientation, format);
        fsutil::ensure_absent(&paths.index)?;
        fsutil::ensure_absent(&paths.boundaries)?;
        fsutil::ensure_absent(&paths.targets)?;
        let mut index_stream = BufWriter::new(fsutil::create_new(&paths.index)?);
        let mut boundary_stream = BufWriter::new(fsutil::create_new(&paths.boundaries)?);
        let mut target_stream = BufWriter::new(fsutil::create_new(&paths.targets)?);

        write_array(
            format,
            &paths.index,
            &mut index_stream,
            &[self.vertex_count as u32, repr.edge_count as u32],
            self.verbose,
        )?;
        write_array(
            format,
            &paths.boundaries,
            &mut boundary_stream,
            &repr.boundaries,
            self.verbose,
        )?;
        write_array(
            format,
            &paths.targets,
            &mut target_stream,
            &repr.targets,
            self.verbose,
        )?;
        debug!(
            orientation = orientation.file_tag(),
            format = ?format,
            edges = repr.edge_count,
            "orientation saved"
        );
        Ok(())
    }
}
