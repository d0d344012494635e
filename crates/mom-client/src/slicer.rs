//! Byte range slicing

use std::ops::Range;

/// One contiguous byte range of a file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkRange {
    /// Zero-based chunk index
    pub index: usize,
    /// Bytes `[start, end)`
    pub range: Range<u64>,
    /// Number of chunks the file was split into
    pub total: usize,
}

impl ChunkRange {
    /// Chunk length in bytes
    pub fn len(&self) -> u64 {
        self.range.end - self.range.start
    }

    /// Whether the range is empty (never produced by [`slice`])
    pub fn is_empty(&self) -> bool {
        self.range.start == self.range.end
    }

    /// Whether this is the final chunk of the file
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }
}

/// `ceil(size / chunk_size)`
///
/// # Panics
/// If `chunk_size` is zero. [`Config::validate`](crate::Config::validate)
/// rejects that before any upload starts.
pub fn total_chunks(size: u64, chunk_size: u64) -> usize {
    assert!(chunk_size > 0, "chunk_size must be positive");
    size.div_ceil(chunk_size) as usize
}

/// Split `[0, size)` into ascending, non-overlapping ranges of `chunk_size`
/// bytes; the last one may be shorter.
pub fn slice(size: u64, chunk_size: u64) -> Vec<ChunkRange> {
    let total = total_chunks(size, chunk_size);
    let mut chunks = Vec::with_capacity(total);
    let mut offset = 0u64;
    let mut index = 0;

    while offset < size {
        let end = std::cmp::min(offset + chunk_size, size);
        chunks.push(ChunkRange {
            index,
            range: offset..end,
            total,
        });
        offset = end;
        index += 1;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    fn assert_covers(size: u64, chunk_size: u64) {
        let chunks = slice(size, chunk_size);
        assert_eq!(chunks.len(), total_chunks(size, chunk_size));

        let mut expected_start = 0;
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.range.start, expected_start, "gap or overlap at chunk {}", i);
            assert!(!chunk.is_empty());
            expected_start = chunk.range.end;
        }
        assert_eq!(expected_start, size);

        if let Some(last) = chunks.last() {
            let expected_last = if size % chunk_size == 0 { chunk_size } else { size % chunk_size };
            assert_eq!(last.len(), expected_last);
            assert!(last.is_last());
        }
    }

    #[test]
    fn test_exact_and_partial_coverage() {
        for &(size, chunk) in &[
            (1, 1),
            (1, 7),
            (7, 7),
            (8, 7),
            (99, 10),
            (100, 10),
            (101, 10),
            (250 * MB, 100 * MB),
            (650 * MB, 100 * MB),
        ] {
            assert_covers(size, chunk);
        }
    }

    #[test]
    fn test_250mb_splits_into_three() {
        let chunks = slice(250 * MB, 100 * MB);
        let lens: Vec<u64> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(lens, vec![100 * MB, 100 * MB, 50 * MB]);
        assert!(!chunks[1].is_last());
        assert!(chunks[2].is_last());
    }

    #[test]
    fn test_empty_file_has_no_chunks() {
        assert_eq!(total_chunks(0, 100), 0);
        assert!(slice(0, 100).is_empty());
    }
}
