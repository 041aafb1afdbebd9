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

//! Standalone init-file generator: reads a vocabulary and writes a random
//! `W` buffer others can later load with `--init-file`. Mirrors
//! `generate_init_file.c`, with the implicit libc RNG state replaced by an
//! explicit, reproducible seed.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use forced_glove::error::TrainerError;
use forced_glove::init::random_buffer;
use forced_glove::real::real_to_le_bytes;
use forced_glove::vocab::Vocabulary;

#[derive(Parser, Debug)]
#[command(name = "forced-glove-init", version, about = "Generate a random initial parameter file")]
struct Args {
    /// Verbosity: 0, 1, or 2.
    #[arg(long, default_value_t = 2)]
    verbose: u8,

    /// Word vector dimensionality, excluding the bias column.
    #[arg(long = "vector-size", default_value_t = 50)]
    vector_size: usize,

    #[arg(long = "vocab-file", default_value = "vocab.txt")]
    vocab_file: PathBuf,

    #[arg(long = "init-file", default_value = "out/init.bin")]
    init_file: PathBuf,

    /// Seed for the random draw.
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> forced_glove::Result<()> {
    if args.vector_size == 0 {
        return Err(TrainerError::config("--vector-size must be at least 1"));
    }

    let vocab = Vocabulary::load_from_file(&args.vocab_file)?;
    if args.verbose > 1 {
        info!("initializing parameters...");
    }

    let data = random_buffer(vocab.len(), args.vector_size, args.seed);

    if let Some(parent) = args.init_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| TrainerError::io(&args.init_file, e))?;
        }
    }

    let mut out = Vec::with_capacity(data.len() * forced_glove::real::REAL_SIZE);
    for v in data {
        out.extend_from_slice(&real_to_le_bytes(v));
    }
    std::fs::write(&args.init_file, out).map_err(|e| TrainerError::io(&args.init_file, e))?;

    info!("wrote {} bytes to {}", vocab.len(), args.init_file.display());
    Ok(())
}
