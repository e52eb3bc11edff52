//! Splits a dump file into line-aligned, non-overlapping byte ranges for
//! parallel ingestion (spec §4.1 "Partitioning").
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::ops::Range;
use std::path::Path;

use crate::error::Error;

/// A line-aligned byte range `[start, end)` into a dump file.
pub type ChunkRange = Range<u64>;

/// Splits `path` into `k` line-aligned byte ranges covering the whole file.
///
/// Each raw offset `i * (size / k)` is advanced backward to the nearest
/// preceding newline; if that collapses two chunk boundaries onto the same
/// position, the end is instead advanced forward to the next line start.
pub fn plan_chunks(path: &Path, k: usize) -> Result<Vec<ChunkRange>, Error> {
    assert!(k > 0, "chunk count must be positive");

    let file = File::open(path)?;
    let size = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    if size == 0 {
        return Ok(vec![0..0]);
    }

    let chunk_size = size / k as u64;
    let mut ranges = Vec::with_capacity(k);
    let mut start = 0u64;

    while start < size {
        let mut end = (start + chunk_size).min(size);
        end = nearest_preceding_newline(&mut reader, end)?;

        if end <= start {
            end = next_line_start(&mut reader, end)?.min(size);
        }

        ranges.push(start..end);
        start = end;
    }

    Ok(ranges)
}

/// walks `pos` backward until it is the start of a line (position 0, or the
/// byte right after a `\n`).
fn nearest_preceding_newline(reader: &mut BufReader<File>, mut pos: u64) -> Result<u64, Error> {
    if pos == 0 || pos >= reader.get_ref().metadata()?.len() {
        return Ok(pos.min(reader.get_ref().metadata()?.len()));
    }

    loop {
        if pos == 0 {
            return Ok(0);
        }
        reader.seek(SeekFrom::Start(pos - 1))?;
        let mut byte = [0u8; 1];
        use std::io::Read;
        reader.read_exact(&mut byte)?;
        if byte[0] == b'\n' {
            return Ok(pos);
        }
        pos -= 1;
    }
}

/// returns the byte offset right after the next newline at or after `pos`.
fn next_line_start(reader: &mut BufReader<File>, pos: u64) -> Result<u64, Error> {
    reader.seek(SeekFrom::Start(pos))?;
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(reader.stream_position()?)
}
