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

//! Entry point: parse the CLI, load the vocabulary and forcing files, train,
//! then export. Mirrors the reference tool's `main`/`train_glove` sequence.

use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use forced_glove::config::{CliArgs, Config};
use forced_glove::forcing::ForcingTable;
use forced_glove::init;
use forced_glove::params::ParameterStore;
use forced_glove::trainer::{Trainer, TrainerConfig};
use forced_glove::vocab::Vocabulary;

fn main() -> ExitCode {
    env_logger::init();

    let args = CliArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> forced_glove::Result<()> {
    let config = Config::from_args(args)?;

    let vocab = Vocabulary::load_from_file(&config.vocab_file)?;
    info!("vocab size: {}", vocab.len());
    info!("vector size: {}", config.vector_size);
    info!("x_max: {}", config.x_max);
    info!("alpha: {}", config.alpha);

    let params = ParameterStore::allocate(vocab.len(), config.vector_size);

    if config.ignore_init_file {
        init::random_init(&params, config.seed);
    } else {
        let init_file = config
            .init_file
            .as_ref()
            .expect("Config::from_args guarantees init_file is set when ignore_init_file is false");
        init::file_init(&params, init_file)?;
    }

    let forcing = if config.forcing_enabled {
        let table = ForcingTable::load(
            config.dims_file.as_ref().expect("checked in Config::from_args"),
            config
                .forcedids_file
                .as_ref()
                .expect("checked in Config::from_args"),
            config.pols_file.as_ref().expect("checked in Config::from_args"),
            config.kvals_file.as_ref().expect("checked in Config::from_args"),
            config.vector_size,
            vocab.len(),
        )?;
        info!("number of forced dims = {}", table.num_forced_dims());
        for (i, &dim) in table.forced_dims().iter().enumerate() {
            info!(
                "forced dim {} (index {}): {} word(s)",
                dim + 1,
                i,
                table.num_words_per_dim(i)
            );
        }
        table
    } else {
        info!("forcing disabled");
        ForcingTable::empty()
    };

    let trainer_config = TrainerConfig {
        input_file: config.input_file.clone(),
        num_threads: config.num_threads,
        num_iter: config.num_iter,
        vector_size: config.vector_size,
        eta: config.eta,
        alpha: config.alpha,
        x_max: config.x_max,
    };
    let trainer = Trainer::new(trainer_config, &params, &forcing);
    trainer.run()?;

    let exporter = forced_glove::export::Exporter::new(&params, &vocab);
    if config.export.write_binary {
        let bin_path = with_extension(&config.save_file, "bin");
        exporter.write_binary(&bin_path)?;
        if config.export.save_gradsq {
            let gradsq_bin_path = with_extension(&config.gradsq_file, "bin");
            exporter.write_binary_gradsq(&gradsq_bin_path)?;
        }
    }
    if config.export.write_text {
        let txt_path = with_extension(&config.save_file, "txt");
        exporter.write_text(&txt_path, config.export.layout)?;
        if config.export.save_gradsq {
            let gradsq_txt_path = with_extension(&config.gradsq_file, "txt");
            exporter.write_text_gradsq(&gradsq_txt_path, config.export.layout)?;
        }
    }

    Ok(())
}

fn with_extension(path: &std::path::Path, ext: &str) -> std::path::PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    std::path::PathBuf::from(s)
}
