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

//! Command-line surface and the immutable run configuration it resolves
//! into. Field names track the reference tool's flags so existing training
//! scripts port over unchanged; parsing itself uses `clap`'s derive API the
//! way the rest of this pack's trainers do.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{Result, TrainerError};
use crate::export::Layout;
use crate::real::Real;

#[derive(Parser, Debug)]
#[command(name = "forced-glove-train", version, about = "Train word vectors with per-dimension polarity forcing")]
pub struct CliArgs {
    /// Verbosity: 0, 1, or 2.
    #[arg(long, default_value_t = 2)]
    pub verbose: u8,

    /// Word vector dimensionality, excluding the bias column.
    #[arg(long = "vector-size", default_value_t = 50)]
    pub vector_size: usize,

    /// Number of full passes over the co-occurrence stream.
    #[arg(long, default_value_t = 25)]
    pub iter: usize,

    /// Number of training threads.
    #[arg(long, default_value_t = 8)]
    pub threads: usize,

    /// Initial AdaGrad learning rate.
    #[arg(long, default_value_t = 0.05)]
    pub eta: f64,

    /// Weighting function exponent.
    #[arg(long, default_value_t = 0.75)]
    pub alpha: f64,

    /// Weighting function cutoff.
    #[arg(long = "x-max", default_value_t = 100.0)]
    pub x_max: f64,

    /// 0: text only, 1: binary only, 2: both.
    #[arg(long, default_value_t = 1)]
    pub binary: u8,

    /// Text export layout: 0 full, 1 word-only, 2 (or anything else) summed.
    #[arg(long, default_value_t = 2)]
    pub model: u8,

    /// Also export the AdaGrad squared-gradient accumulator.
    #[arg(long = "save-gradsq", default_value_t = false)]
    pub save_gradsq: bool,

    /// Skip loading an init file and fill `W` with a seeded random draw.
    #[arg(long = "ignore-init-file", default_value_t = false)]
    pub ignore_init_file: bool,

    /// Seed for random initialization, used only with `--ignore-init-file`.
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Disable dimension forcing entirely, ignoring the four forcing files.
    #[arg(long = "no-forcing", default_value_t = false)]
    pub no_forcing: bool,

    #[arg(long = "vocab-file")]
    pub vocab_file: PathBuf,

    #[arg(long = "save-file")]
    pub save_file: PathBuf,

    #[arg(long = "gradsq-file")]
    pub gradsq_file: Option<PathBuf>,

    #[arg(long = "input-file")]
    pub input_file: PathBuf,

    #[arg(long = "init-file")]
    pub init_file: Option<PathBuf>,

    #[arg(long = "dims-file")]
    pub dims_file: Option<PathBuf>,

    #[arg(long = "pols-file")]
    pub pols_file: Option<PathBuf>,

    #[arg(long = "forcedids-file")]
    pub forcedids_file: Option<PathBuf>,

    #[arg(long = "kvals-file")]
    pub kvals_file: Option<PathBuf>,
}

/// Whether and how to write each export format.
#[derive(Clone, Copy, Debug)]
pub struct ExportConfig {
    pub write_binary: bool,
    pub write_text: bool,
    pub layout: Layout,
    pub save_gradsq: bool,
}

pub struct Config {
    pub verbose: u8,
    pub vector_size: usize,
    pub num_iter: usize,
    pub num_threads: usize,
    pub eta: Real,
    pub alpha: Real,
    pub x_max: Real,
    pub export: ExportConfig,
    pub ignore_init_file: bool,
    pub seed: u64,
    pub forcing_enabled: bool,
    pub vocab_file: PathBuf,
    pub save_file: PathBuf,
    pub gradsq_file: PathBuf,
    pub input_file: PathBuf,
    pub init_file: Option<PathBuf>,
    pub dims_file: Option<PathBuf>,
    pub pols_file: Option<PathBuf>,
    pub forcedids_file: Option<PathBuf>,
    pub kvals_file: Option<PathBuf>,
}

impl Config {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        if args.threads == 0 {
            return Err(TrainerError::config("--threads must be at least 1"));
        }
        if args.vector_size == 0 {
            return Err(TrainerError::config("--vector-size must be at least 1"));
        }

        let forcing_enabled = !args.no_forcing;
        if forcing_enabled {
            for (name, value) in [
                ("--dims-file", &args.dims_file),
                ("--pols-file", &args.pols_file),
                ("--forcedids-file", &args.forcedids_file),
                ("--kvals-file", &args.kvals_file),
            ] {
                if value.is_none() {
                    return Err(TrainerError::config(format!(
                        "{name} is required unless --no-forcing is set"
                    )));
                }
            }
        }
        if !args.ignore_init_file && args.init_file.is_none() {
            return Err(TrainerError::config(
                "--init-file is required unless --ignore-init-file is set",
            ));
        }

        let gradsq_file = args
            .gradsq_file
            .clone()
            .unwrap_or_else(|| append_suffix(&args.save_file, ".gradsq"));

        let export = ExportConfig {
            write_binary: args.binary != 0,
            write_text: args.binary != 1,
            layout: crate::export::resolve_layout(args.model),
            save_gradsq: args.save_gradsq,
        };

        Ok(Config {
            verbose: args.verbose,
            vector_size: args.vector_size,
            num_iter: args.iter,
            num_threads: args.threads,
            eta: args.eta as Real,
            alpha: args.alpha as Real,
            x_max: args.x_max as Real,
            export,
            ignore_init_file: args.ignore_init_file,
            seed: args.seed,
            forcing_enabled,
            vocab_file: args.vocab_file,
            save_file: args.save_file,
            gradsq_file,
            input_file: args.input_file,
            init_file: args.init_file,
            dims_file: args.dims_file,
            pols_file: args.pols_file,
            forcedids_file: args.forcedids_file,
            kvals_file: args.kvals_file,
        })
    }
}

fn append_suffix(path: &std::path::Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            verbose: 2,
            vector_size: 50,
            iter: 25,
            threads: 8,
            eta: 0.05,
            alpha: 0.75,
            x_max: 100.0,
            binary: 1,
            model: 2,
            save_gradsq: false,
            ignore_init_file: true,
            seed: 1,
            no_forcing: true,
            vocab_file: PathBuf::from("vocab.txt"),
            save_file: PathBuf::from("vectors"),
            gradsq_file: None,
            input_file: PathBuf::from("cooccurrence.bin"),
            init_file: None,
            dims_file: None,
            pols_file: None,
            forcedids_file: None,
            kvals_file: None,
        }
    }

    #[test]
    fn rejects_zero_threads() {
        let mut args = base_args();
        args.threads = 0;
        let err = Config::from_args(args).unwrap_err();
        assert!(matches!(err, TrainerError::Config(_)));
    }

    #[test]
    fn requires_forcing_files_unless_disabled() {
        let mut args = base_args();
        args.no_forcing = false;
        let err = Config::from_args(args).unwrap_err();
        assert!(matches!(err, TrainerError::Config(_)));
    }

    #[test]
    fn defaults_gradsq_file_from_save_file() {
        let args = base_args();
        let config = Config::from_args(args).unwrap();
        assert_eq!(config.gradsq_file, PathBuf::from("vectors.gradsq"));
    }
}
