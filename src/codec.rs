//! Integer-array transports shared by every persisted artifact.
//!
//! Two interchangeable layouts: a fixed-width little-endian binary form
//! moved in large chunks, and a newline-delimited decimal text form. Index
//! metadata, boundary arrays, target arrays, and the mapping array all go
//! through these four functions.

use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{GraphError, Result};
use crate::progress::Progress;

/// Elements moved per binary read or write call.
pub(crate) const BINARY_CHUNK: usize = 65536;

/// Reads `len` little-endian `u32` values from `reader`.
///
/// `path` only labels progress and corruption reports; the stream itself is
/// opened by the caller.
pub(crate) fn read_binary(
    path: &Path,
    reader: &mut impl Read,
    len: usize,
    verbose: bool,
) -> Result<Vec<u32>> {
    let progress = Progress::new(format!("load of binary file {}", path.display()), len as u64, verbose);
    let mut values = Vec::with_capacity(len);
    let mut buf = vec![0u8; BINARY_CHUNK * 4];
    let mut done = 0usize;
    while done < len {
        let take = BINARY_CHUNK.min(len - done);
        let chunk = &mut buf[..take * 4];
        reader.read_exact(chunk).map_err(|err| {
            GraphError::Corruption(format!(
                "binary file {} truncated at element {done} of {len}: {err}",
                path.display()
            ))
        })?;
        values.extend(
            chunk
                .chunks_exact(4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        );
        done += take;
        progress.update(done as u64);
    }
    let elapsed = progress.finish();
    debug!(path = %path.display(), len, elapsed, "binary load");
    Ok(values)
}

/// Writes `values` as little-endian `u32`s to `writer` in chunks.
pub(crate) fn write_binary(
    path: &Path,
    writer: &mut impl Write,
    values: &[u32],
    verbose: bool,
) -> Result<()> {
    let progress = Progress::new(
        format!("save of binary file {}", path.display()),
        values.len() as u64,
        verbose,
    );
    let mut done = 0usize;
    for chunk in values.chunks(BINARY_CHUNK) {
        let mut bytes = Vec::with_capacity(chunk.len() * 4);
        for value in chunk {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        writer.write_all(&bytes)?;
        done += chunk.len();
        progress.update(done as u64);
    }
    writer.flush()?;
    let elapsed = progress.finish();
    debug!(path = %path.display(), len = values.len(), elapsed, "binary save");
    Ok(())
}

/// Reads `len` whitespace-delimited decimal values from `reader`.
pub(crate) fn read_text(
    path: &Path,
    reader: &mut impl Read,
    len: usize,
    verbose: bool,
) -> Result<Vec<u32>> {
    let progress = Progress::new(format!("load of text file {}", path.display()), len as u64, verbose);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    let mut values = Vec::with_capacity(len);
    let mut tokens = contents.split_ascii_whitespace();
    for i in 0..len {
        let token = tokens.next().ok_or_else(|| {
            GraphError::Corruption(format!(
                "text file {} ended at element {i} of {len}",
                path.display()
            ))
        })?;
        let value: u32 = token.parse().map_err(|_| {
            GraphError::Corruption(format!(
                "text file {} holds non-integer value {token:?} at element {i}",
                path.display()
            ))
        })?;
        values.push(value);
        progress.update((i + 1) as u64);
    }
    let elapsed = progress.finish();
    debug!(path = %path.display(), len, elapsed, "text load");
    Ok(values)
}

/// Writes `values` as decimal text, one value per line.
pub(crate) fn write_text(
    path: &Path,
    writer: &mut impl Write,
    values: &[u32],
    verbose: bool,
) -> Result<()> {
    let progress = Progress::new(
        format!("save of text file {}", path.display()),
        values.len() as u64,
        verbose,
    );
    for (i, value) in values.iter().enumerate() {
        writeln!(writer, "{value}")?;
        progress.update((i + 1) as u64);
    }
    writer.flush()?;
    let elapsed = progress.finish();
    debug!(path = %path.display(), len = values.len(), elapsed, "text save");
    Ok(())
}
