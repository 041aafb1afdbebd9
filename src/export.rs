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

//! Writes the trained parameters to disk: an optional raw binary dump of
//! `W` (and `G`), and an optional text rendering keyed by the vocabulary
//! file, with a synthesized `<unk>` row appended. Grounded on `save_params`
//! in the reference implementation.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, TrainerError};
use crate::params::ParameterStore;
use crate::real::{Real, real_to_le_bytes};
use crate::vocab::Vocabulary;

/// Which columns a text export row contains. Any `model` value outside
/// `{0, 1}` is treated as `Full` here; the caller maps that coercion from
/// the raw CLI integer before constructing a `Layout`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Focal and context vectors plus both biases.
    AllParameters,
    /// Focal vector only, no bias.
    WordOnly,
    /// Elementwise sum of focal and context vectors, no bias.
    SummedVectors,
}

pub fn resolve_layout(model: u8) -> Layout {
    match model {
        0 => Layout::AllParameters,
        1 => Layout::WordOnly,
        _ => Layout::SummedVectors,
    }
}

pub struct Exporter<'a> {
    params: &'a ParameterStore,
    vocab: &'a Vocabulary,
}

impl<'a> Exporter<'a> {
    pub fn new(params: &'a ParameterStore, vocab: &'a Vocabulary) -> Self {
        Exporter { params, vocab }
    }

    /// Dump the raw `W` buffer, row-major, little-endian.
    pub fn write_binary(&self, path: impl AsRef<Path>) -> Result<()> {
        write_binary_buffer(path, &self.params.w_snapshot())
    }

    /// Dump the raw `G` buffer, row-major, little-endian.
    pub fn write_binary_gradsq(&self, path: impl AsRef<Path>) -> Result<()> {
        write_binary_buffer(path, &self.params.g_snapshot())
    }

    /// Write the text rendering of `W`, one vocabulary row per line plus a
    /// synthesized `<unk>` row, using `layout` to decide which columns to
    /// print.
    pub fn write_text(&self, path: impl AsRef<Path>, layout: Layout) -> Result<()> {
        self.write_text_buffer(path, &self.params.w_snapshot(), layout)
    }

    /// Same as [`Self::write_text`] but over the `G` accumulator, used when
    /// squared-gradient export is requested.
    pub fn write_text_gradsq(&self, path: impl AsRef<Path>, layout: Layout) -> Result<()> {
        self.write_text_buffer(path, &self.params.g_snapshot(), layout)
    }

    fn write_text_buffer(&self, path: impl AsRef<Path>, data: &[Real], layout: Layout) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| TrainerError::io(path, e))?;
        let mut out = BufWriter::new(file);

        let vocab_size = self.params.vocab_size();
        let row_width = self.params.row_width();
        let dim = self.params.dim();

        for id in 1..=vocab_size as u32 {
            let word = self.vocab.word(id).ok_or_else(|| {
                TrainerError::invariant(format!(
                    "vocabulary has fewer entries than the parameter store ({vocab_size} expected)"
                ))
            })?;
            let focal = &data[self.params.focal_row_offset(id)..self.params.focal_row_offset(id) + row_width];
            let context =
                &data[self.params.context_row_offset(id)..self.params.context_row_offset(id) + row_width];
            write_row(&mut out, path, word, focal, context, dim, layout)?;
        }

        let (unk_focal, unk_context) = self.synthesize_unk(data);
        write_row(&mut out, path, "<unk>", &unk_focal, &unk_context, dim, layout)?;

        out.flush().map_err(|e| TrainerError::io(path, e))?;
        Ok(())
    }

    /// Mean of the last `min(vocab_size, 100)` rows' focal and context
    /// vectors, used as the out-of-vocabulary fallback.
    fn synthesize_unk(&self, data: &[Real]) -> (Vec<Real>, Vec<Real>) {
        let vocab_size = self.params.vocab_size();
        let row_width = self.params.row_width();
        let num_rare = vocab_size.min(100);

        let mut unk_focal = vec![0.0 as Real; row_width];
        let mut unk_context = vec![0.0 as Real; row_width];

        if num_rare == 0 {
            return (unk_focal, unk_context);
        }

        for id in (vocab_size - num_rare + 1)..=vocab_size as usize {
            let id = id as u32;
            let focal = &data[self.params.focal_row_offset(id)..self.params.focal_row_offset(id) + row_width];
            let context =
                &data[self.params.context_row_offset(id)..self.params.context_row_offset(id) + row_width];
            for i in 0..row_width {
                unk_focal[i] += focal[i] / num_rare as Real;
                unk_context[i] += context[i] / num_rare as Real;
            }
        }

        (unk_focal, unk_context)
    }
}

fn write_binary_buffer(path: impl AsRef<Path>, data: &[Real]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| TrainerError::io(path, e))?;
    let mut out = BufWriter::new(file);
    for &v in data {
        out.write_all(&real_to_le_bytes(v))
            .map_err(|e| TrainerError::io(path, e))?;
    }
    out.flush().map_err(|e| TrainerError::io(path, e))?;
    Ok(())
}

fn write_row(
    out: &mut impl Write,
    path: &Path,
    word: &str,
    focal: &[Real],
    context: &[Real],
    dim: usize,
    layout: Layout,
) -> Result<()> {
    write!(out, "{word}").map_err(|e| TrainerError::io(path, e))?;
    match layout {
        Layout::AllParameters => {
            for &v in focal {
                write!(out, " {v:.6}").map_err(|e| TrainerError::io(path, e))?;
            }
            for &v in context {
                write!(out, " {v:.6}").map_err(|e| TrainerError::io(path, e))?;
            }
        }
        Layout::WordOnly => {
            for &v in &focal[..dim] {
                write!(out, " {v:.6}").map_err(|e| TrainerError::io(path, e))?;
            }
        }
        Layout::SummedVectors => {
            for i in 0..dim {
                write!(out, " {:.6}", focal[i] + context[i]).map_err(|e| TrainerError::io(path, e))?;
            }
        }
    }
    writeln!(out).map_err(|e| TrainerError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::random_init;

    fn vocab(words: &[&str]) -> Vocabulary {
        let text: String = words.iter().map(|w| format!("{w} 1\n")).collect();
        Vocabulary::load_from_reader(text.as_bytes(), std::path::Path::new("<test>")).unwrap()
    }

    #[test]
    fn resolve_layout_coerces_out_of_range_to_summed_vectors() {
        assert_eq!(resolve_layout(0), Layout::AllParameters);
        assert_eq!(resolve_layout(1), Layout::WordOnly);
        assert_eq!(resolve_layout(2), Layout::SummedVectors);
        assert_eq!(resolve_layout(99), Layout::SummedVectors);
    }

    #[test]
    fn text_export_appends_unk_row() {
        let dir = std::env::temp_dir().join(format!("export-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let out_path = dir.join("vectors.txt");

        let v = vocab(&["the", "cat"]);
        let params = ParameterStore::allocate(2, 3);
        random_init(&params, 5);

        let exporter = Exporter::new(&params, &v);
        exporter.write_text(&out_path, Layout::SummedVectors).unwrap();

        let content = std::fs::read_to_string(&out_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("<unk>"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn binary_export_round_trips_through_file_init() {
        let dir = std::env::temp_dir().join(format!("export-test2-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let bin_path = dir.join("vectors.bin");

        let v = vocab(&["the", "cat"]);
        let params = ParameterStore::allocate(2, 3);
        random_init(&params, 9);
        let before = params.w_snapshot();

        let exporter = Exporter::new(&params, &v);
        exporter.write_binary(&bin_path).unwrap();

        let reloaded = ParameterStore::allocate(2, 3);
        crate::init::file_init(&reloaded, &bin_path).unwrap();
        assert_eq!(before, reloaded.w_snapshot());

        std::fs::remove_dir_all(&dir).ok();
    }
}
