//  Copyright 2026 Robert Zavalczki
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

//! Reads the binary co-occurrence stream: fixed-width `(word1, word2, val)`
//! records, partitioned into contiguous byte spans so each training worker
//! can seek to its own slice of the file and read forward with no
//! coordination.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Result, TrainerError};
use crate::real::{REAL_SIZE, real_from_le_bytes};

/// `word1: i32, word2: i32, val: Real`, little-endian, back to back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoOccurRecord {
    pub word1: i32,
    pub word2: i32,
    pub val: crate::real::Real,
}

pub const RECORD_HEADER_SIZE: usize = 4 + 4;

pub fn record_size() -> usize {
    RECORD_HEADER_SIZE + REAL_SIZE
}

/// A worker's half-open span of records `[start, end)` within the file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

impl Span {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Number of complete records in the file at `path`. A trailing partial
/// record (file size not a multiple of the record size) is silently
/// dropped by the floor division, matching the reference implementation's
/// `num_lines = size / sizeof(CREC)`.
pub fn num_lines_in_file(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let meta = std::fs::metadata(path).map_err(|e| TrainerError::io(path, e))?;
    let size = meta.len();
    let rec = record_size() as u64;
    Ok(size / rec)
}

/// Split `num_records` records into `num_workers` contiguous spans of
/// `num_records / num_workers` each, with any remainder folded into the
/// last span so every record is covered exactly once.
pub fn partition_spans(num_records: u64, num_workers: usize) -> Vec<Span> {
    if num_workers == 0 {
        return Vec::new();
    }
    let per_worker = num_records / num_workers as u64;
    let mut spans = Vec::with_capacity(num_workers);
    let mut start = 0;
    for i in 0..num_workers {
        let end = if i + 1 == num_workers {
            num_records
        } else {
            start + per_worker
        };
        spans.push(Span { start, end });
        start = end;
    }
    spans
}

/// Sequential reader over one worker's span. Opens its own file handle so
/// concurrent workers never share seek position.
pub struct CoOccurReader {
    reader: BufReader<File>,
    pos: u64,
    span: Span,
}

impl CoOccurReader {
    pub fn open_at(path: impl AsRef<Path>, span: Span) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| TrainerError::io(path, e))?;
        let rec = record_size() as u64;
        file.seek(SeekFrom::Start(span.start * rec))
            .map_err(|e| TrainerError::io(path, e))?;
        Ok(CoOccurReader {
            reader: BufReader::new(file),
            pos: span.start,
            span,
        })
    }

    pub fn remaining(&self) -> u64 {
        self.span.end.saturating_sub(self.pos)
    }

    /// Read the next record, or `None` once the span is exhausted.
    pub fn read_record(&mut self) -> Result<Option<CoOccurRecord>> {
        if self.pos >= self.span.end {
            return Ok(None);
        }
        let mut word1_buf = [0u8; 4];
        let mut word2_buf = [0u8; 4];
        let mut val_buf = [0u8; REAL_SIZE];

        self.reader
            .read_exact(&mut word1_buf)
            .map_err(|e| TrainerError::format(Path::new("<cooccurrence stream>"), e.to_string()))?;
        self.reader
            .read_exact(&mut word2_buf)
            .map_err(|e| TrainerError::format(Path::new("<cooccurrence stream>"), e.to_string()))?;
        self.reader
            .read_exact(&mut val_buf)
            .map_err(|e| TrainerError::format(Path::new("<cooccurrence stream>"), e.to_string()))?;

        self.pos += 1;
        Ok(Some(CoOccurRecord {
            word1: i32::from_le_bytes(word1_buf),
            word2: i32::from_le_bytes(word2_buf),
            val: real_from_le_bytes(&val_buf),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_records(path: &Path, records: &[(i32, i32, f32)]) {
        let mut f = File::create(path).unwrap();
        for &(w1, w2, v) in records {
            f.write_all(&w1.to_le_bytes()).unwrap();
            f.write_all(&w2.to_le_bytes()).unwrap();
            #[cfg(not(feature = "f64"))]
            f.write_all(&v.to_le_bytes()).unwrap();
            #[cfg(feature = "f64")]
            f.write_all(&(v as f64).to_le_bytes()).unwrap();
        }
    }

    #[test]
    fn partition_spans_covers_every_record_exactly_once() {
        let spans = partition_spans(10, 3);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0], Span { start: 0, end: 3 });
        assert_eq!(spans[1], Span { start: 3, end: 6 });
        // remainder folds into the last span
        assert_eq!(spans[2], Span { start: 6, end: 10 });
    }

    #[test]
    fn partition_spans_handles_more_workers_than_records() {
        let spans = partition_spans(2, 5);
        assert_eq!(spans.len(), 5);
        assert_eq!(spans.iter().map(Span::len).sum::<u64>(), 2);
    }

    #[test]
    fn reads_records_back_in_order() {
        let dir = std::env::temp_dir().join(format!("cooccur-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cooccur.bin");
        write_records(&path, &[(1, 2, 3.5), (2, 3, 1.0)]);

        let n = num_lines_in_file(&path).unwrap();
        assert_eq!(n, 2);

        let mut reader = CoOccurReader::open_at(&path, Span { start: 0, end: 2 }).unwrap();
        let r1 = reader.read_record().unwrap().unwrap();
        assert_eq!(r1.word1, 1);
        assert_eq!(r1.word2, 2);
        let r2 = reader.read_record().unwrap().unwrap();
        assert_eq!(r2.word1, 2);
        assert!(reader.read_record().unwrap().is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn trailing_partial_record_is_silently_dropped() {
        let dir = std::env::temp_dir().join(format!("cooccur-test3-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cooccur.bin");
        write_records(&path, &[(1, 1, 1.0), (2, 2, 2.0)]);
        // Append a few stray bytes, less than one full record.
        {
            use std::io::Write as _;
            let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
            f.write_all(&[0u8, 1, 2]).unwrap();
        }

        let n = num_lines_in_file(&path).unwrap();
        assert_eq!(n, 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn worker_span_seeks_to_its_own_offset() {
        let dir = std::env::temp_dir().join(format!("cooccur-test2-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cooccur.bin");
        write_records(&path, &[(1, 1, 1.0), (2, 2, 2.0), (3, 3, 3.0)]);

        let mut reader = CoOccurReader::open_at(&path, Span { start: 1, end: 3 }).unwrap();
        let r = reader.read_record().unwrap().unwrap();
        assert_eq!(r.word1, 2);

        std::fs::remove_dir_all(&dir).ok();
    }
}
