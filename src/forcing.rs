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

//! Parses the four forcing-parameter files and builds the in-memory index
//! the trainer consults per record. Grounded line-by-line on
//! `get_forced_dims` in the original GloVe-with-forcing source: the
//! dimensions file's bare-index/range grammar, the word-ids file's
//! exactly-`F`-lines requirement, and the polarities/k-values files'
//! `+`/`-`/`*`/`**` prefix rules all carry over unchanged.

use std::collections::HashMap;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use crate::error::{Result, TrainerError};
use crate::real::Real;

/// One forcing term that applies to a specific word: dimension, polarity,
/// and strength.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForcedEntry {
    pub dim: usize,
    pub polarity: Real,
    pub k: Real,
}

pub struct ForcingTable {
    forced_dims: Vec<usize>,
    word_ids: Vec<Vec<u32>>,
    polarities: Vec<Vec<i8>>,
    kvals: Vec<Vec<Real>>,
    lookup: HashMap<u32, Vec<ForcedEntry>>,
}

impl ForcingTable {
    /// An empty table: no dimensions are forced. Used when forcing is
    /// administratively disabled.
    pub fn empty() -> Self {
        ForcingTable {
            forced_dims: Vec::new(),
            word_ids: Vec::new(),
            polarities: Vec::new(),
            kvals: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    pub fn num_forced_dims(&self) -> usize {
        self.forced_dims.len()
    }

    pub fn forced_dims(&self) -> &[usize] {
        &self.forced_dims
    }

    pub fn num_words_per_dim(&self, f: usize) -> usize {
        self.word_ids[f].len()
    }

    /// Entries that apply to 1-based vocabulary id `word_id`, in
    /// increasing-dimension order.
    pub fn lookup(&self, word_id: u32) -> &[ForcedEntry] {
        self.lookup
            .get(&word_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn load(
        dims_file: impl AsRef<Path>,
        word_ids_file: impl AsRef<Path>,
        polarities_file: impl AsRef<Path>,
        kvals_file: impl AsRef<Path>,
        dim: usize,
        vocab_size: usize,
    ) -> Result<Self> {
        let dims_file = dims_file.as_ref();
        let forced_dims = parse_dims_file(dims_file, dim)?;
        let f = forced_dims.len();

        if f == 0 {
            return Ok(Self::empty());
        }

        if !forced_dims.windows(2).all(|w| w[0] <= w[1]) {
            return Err(TrainerError::invariant(format!(
                "{}: forced dimensions are not in non-decreasing order",
                dims_file.display()
            )));
        }
        if forced_dims.iter().any(|&d| d >= dim) {
            return Err(TrainerError::invariant(format!(
                "{}: a forced dimension equals or exceeds the bias column",
                dims_file.display()
            )));
        }

        let word_ids = parse_word_ids_file(word_ids_file.as_ref(), f, vocab_size)?;
        let counts: Vec<usize> = word_ids.iter().map(Vec::len).collect();

        let polarities = parse_polarities_file(polarities_file.as_ref(), f, &counts)?;
        let kvals = parse_kvals_file(kvals_file.as_ref(), f, &counts)?;

        for (name, shape) in [
            ("word-ids", word_ids.iter().map(Vec::len).collect::<Vec<_>>()),
            ("polarities", polarities.iter().map(Vec::len).collect()),
            ("k-values", kvals.iter().map(Vec::len).collect()),
        ] {
            if shape != counts {
                return Err(TrainerError::invariant(format!(
                    "forcing files disagree on ragged shape at {name}"
                )));
            }
        }

        let mut lookup: HashMap<u32, Vec<ForcedEntry>> = HashMap::new();
        for fidx in 0..f {
            for j in 0..counts[fidx] {
                let entry = ForcedEntry {
                    dim: forced_dims[fidx],
                    polarity: polarities[fidx][j] as Real,
                    k: kvals[fidx][j],
                };
                lookup.entry(word_ids[fidx][j]).or_default().push(entry);
            }
        }

        Ok(ForcingTable {
            forced_dims,
            word_ids,
            polarities,
            kvals,
            lookup,
        })
    }
}

/// Non-blank, non-comment lines, in file order. `#`-prefixed and empty
/// lines (after trimming) are ignored entirely, per the shared grammar of
/// all four forcing files.
fn significant_lines(path: &Path) -> Result<Vec<String>> {
    let text = read_to_string(path).map_err(|e| TrainerError::io(path, e))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn parse_uint(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_dims_file(path: &Path, dim: usize) -> Result<Vec<usize>> {
    let mut forced_dims = Vec::new();
    for line in significant_lines(path)? {
        if line.contains('.') {
            return Err(TrainerError::format(
                path,
                format!("decimal point not allowed in dimension line '{line}'"),
            ));
        }
        if let Some(colon) = line.find(':') {
            let (before, after) = (&line[..colon], &line[colon + 1..]);
            let start = if before.is_empty() {
                0
            } else {
                parse_uint(before).ok_or_else(|| {
                    TrainerError::format(path, format!("invalid range start in '{line}'"))
                })?
            };
            let stop = if after.is_empty() {
                dim
            } else {
                parse_uint(after).ok_or_else(|| {
                    TrainerError::format(path, format!("invalid range stop in '{line}'"))
                })?
            };
            if stop <= start || stop > dim {
                return Err(TrainerError::format(
                    path,
                    format!("range '{line}' is out of bounds for vector size {dim}"),
                ));
            }
            forced_dims.extend(start..stop);
        } else {
            let d = parse_uint(&line).ok_or_else(|| {
                TrainerError::format(path, format!("'{line}' is not a non-negative integer"))
            })?;
            if d >= dim {
                return Err(TrainerError::format(
                    path,
                    format!("dimension {d} is out of bounds for vector size {dim}"),
                ));
            }
            forced_dims.push(d);
        }
    }
    Ok(forced_dims)
}

fn parse_word_ids_file(path: &Path, f: usize, vocab_size: usize) -> Result<Vec<Vec<u32>>> {
    let lines = significant_lines(path)?;
    if lines.len() != f {
        return Err(TrainerError::format(
            path,
            format!("expected exactly {f} line(s), found {}", lines.len()),
        ));
    }

    lines
        .iter()
        .map(|line| {
            line.split_whitespace()
                .map(|tok| {
                    if tok.contains('.') {
                        return Err(TrainerError::format(
                            path,
                            format!("decimal point not allowed in word id '{tok}'"),
                        ));
                    }
                    let id: i64 = tok
                        .parse()
                        .map_err(|_| TrainerError::format(path, format!("invalid word id '{tok}'")))?;
                    if id <= 0 || id as u64 > vocab_size as u64 {
                        return Err(TrainerError::format(
                            path,
                            format!("word id {id} is out of range (0, {vocab_size}]"),
                        ));
                    }
                    Ok(id as u32)
                })
                .collect::<Result<Vec<u32>>>()
        })
        .collect()
}

/// Shared grammar for the polarities and k-values files: `**<token>` must be
/// the file's sole content and applies globally; `*<token>` must be a
/// line's sole content and applies to every word on that line; otherwise
/// one token per word, in word-ids order.
fn parse_prefixed_file<T: Copy>(
    path: &Path,
    f: usize,
    counts: &[usize],
    parse_token: impl Fn(&str) -> Option<T>,
    valid_chars: &str,
) -> Result<Vec<Vec<T>>> {
    let lines = significant_lines(path)?;

    if lines.is_empty() {
        return Err(TrainerError::format(
            path,
            format!("expected forcing parameters for {f} dimension(s), found none"),
        ));
    }

    if let Some(bad) = lines
        .iter()
        .find(|l| !l.chars().all(|c| valid_chars.contains(c) || c.is_whitespace()))
    {
        return Err(TrainerError::format(
            path,
            format!("line contains a character outside the allowed set: '{bad}'"),
        ));
    }

    // Global `**token` form: must be the file's only non-blank content.
    {
        let first_tokens: Vec<&str> = lines[0].split_whitespace().collect();
        if first_tokens.len() == 1 && first_tokens[0].starts_with("**") {
            if lines.len() != 1 {
                return Err(TrainerError::format(
                    path,
                    "'**' form must be the only content in the file",
                ));
            }
            let rest = &first_tokens[0][2..];
            let value = parse_token(rest)
                .ok_or_else(|| TrainerError::format(path, format!("invalid global value '{rest}'")))?;
            return Ok(counts.iter().map(|&n| vec![value; n]).collect());
        }
    }

    if lines.len() > f {
        return Err(TrainerError::format(
            path,
            format!("expected at most {f} line(s), found {}", lines.len()),
        ));
    }

    let mut result = Vec::with_capacity(f);
    for (idx, line) in lines.iter().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        if tokens.len() == 1 && tokens[0].starts_with('*') && !tokens[0].starts_with("**") {
            let rest = &tokens[0][1..];
            let value = parse_token(rest)
                .ok_or_else(|| TrainerError::format(path, format!("invalid per-line value '{rest}'")))?;
            result.push(vec![value; counts[idx]]);
            continue;
        }

        if tokens.len() != counts[idx] {
            return Err(TrainerError::format(
                path,
                format!(
                    "line {} has {} token(s), expected {}",
                    idx + 1,
                    tokens.len(),
                    counts[idx]
                ),
            ));
        }

        let mut row = Vec::with_capacity(tokens.len());
        for tok in tokens {
            let value = parse_token(tok)
                .ok_or_else(|| TrainerError::format(path, format!("invalid value '{tok}'")))?;
            row.push(value);
        }
        result.push(row);
    }

    if result.len() < f {
        return Err(TrainerError::format(
            path,
            format!("expected {f} line(s), found {}", result.len()),
        ));
    }

    Ok(result)
}

fn parse_polarities_file(path: &Path, f: usize, counts: &[usize]) -> Result<Vec<Vec<i8>>> {
    parse_prefixed_file(
        path,
        f,
        counts,
        |tok| match tok {
            "+" => Some(1i8),
            "-" => Some(-1),
            _ => None,
        },
        "+-* ",
    )
}

fn parse_kvals_file(path: &Path, f: usize, counts: &[usize]) -> Result<Vec<Vec<Real>>> {
    parse_prefixed_file(
        path,
        f,
        counts,
        |tok| {
            let v: Real = tok.parse().ok()?;
            if v < 0.0 { None } else { Some(v) }
        },
        "0123456789.* ",
    )
}

/// Path bundle for the four forcing files, used when the caller wants to
/// refer to forcing configuration as a single value.
pub struct ForcingPaths {
    pub dims: PathBuf,
    pub word_ids: PathBuf,
    pub polarities: PathBuf,
    pub kvals: PathBuf,
}
