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

//! The training loop itself: for each pass over the co-occurrence stream,
//! spawn one worker per thread, each reading its own contiguous span and
//! applying unsynchronized AdaGrad updates to the shared parameter store.
//! Grounded on `glove_thread`/`train_glove` in the reference implementation,
//! with `pthread_create`/`pthread_join` replaced by `std::thread::scope`
//! following the pattern already used in the teacher repo's worker pool.

use std::path::PathBuf;

use log::info;

use crate::cooccur::{CoOccurReader, Span, num_lines_in_file, partition_spans};
use crate::error::{Result, TrainerError};
use crate::forcing::ForcingTable;
use crate::params::ParameterStore;
use crate::real::{Real, dot, phi, phi_prime, weight};

pub struct TrainerConfig {
    pub input_file: PathBuf,
    pub num_threads: usize,
    pub num_iter: usize,
    pub vector_size: usize,
    pub eta: Real,
    pub alpha: Real,
    pub x_max: Real,
}

pub struct Trainer<'a> {
    config: TrainerConfig,
    params: &'a ParameterStore,
    forcing: &'a ForcingTable,
}

impl<'a> Trainer<'a> {
    pub fn new(config: TrainerConfig, params: &'a ParameterStore, forcing: &'a ForcingTable) -> Self {
        Trainer {
            config,
            params,
            forcing,
        }
    }

    /// Run all configured passes, logging the mean per-record cost after
    /// each one. Returns the final pass's mean cost.
    pub fn run(&self) -> Result<Real> {
        let num_records = num_lines_in_file(&self.config.input_file)?;
        info!("read {num_records} co-occurrence records");

        if self.config.num_threads == 0 {
            return Err(TrainerError::config("num_threads must be at least 1"));
        }

        let spans = partition_spans(num_records, self.config.num_threads);
        let mut last_mean_cost = 0.0;

        for pass in 1..=self.config.num_iter {
            let costs = self.run_pass(&spans)?;
            let total: Real = costs.iter().sum();
            last_mean_cost = if num_records > 0 {
                total / num_records as Real
            } else {
                0.0
            };
            info!("iter: {:03}, cost: {:.6}", pass, last_mean_cost);
        }

        Ok(last_mean_cost)
    }

    fn run_pass(&self, spans: &[Span]) -> Result<Vec<Real>> {
        let input_file = &self.config.input_file;
        let results: Vec<Result<Real>> = std::thread::scope(|scope| {
            let handles: Vec<_> = spans
                .iter()
                .map(|&span| {
                    scope.spawn(move || {
                        let mut reader = CoOccurReader::open_at(input_file, span)?;
                        Ok(self.worker_loop(&mut reader))
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("training worker panicked"))
                .collect()
        });

        results.into_iter().collect()
    }

    /// Drain one worker's span, applying an AdaGrad update per record, and
    /// return the span's accumulated cost.
    fn worker_loop(&self, reader: &mut CoOccurReader) -> Real {
        let dim = self.config.vector_size;
        let row_width = dim + 1;
        let alpha = self.config.alpha;
        let x_max = self.config.x_max;
        let eta = self.config.eta;

        let mut cost = 0.0 as Real;
        let mut focal = vec![0.0 as Real; row_width];
        let mut context = vec![0.0 as Real; row_width];

        loop {
            let record = match reader.read_record() {
                Ok(Some(r)) => r,
                Ok(None) => break,
                Err(_) => break,
            };

            if record.val <= 0.0 {
                continue;
            }

            let l1 = self.params.focal_row_offset(record.word1 as u32);
            let l2 = self.params.context_row_offset(record.word2 as u32);

            for i in 0..row_width {
                focal[i] = self.params.w_load(l1 + i);
                context[i] = self.params.w_load(l2 + i);
            }

            let bias1 = focal[dim];
            let bias2 = context[dim];
            let dotprod = dot(&focal[..dim], &context[..dim]) + bias1 + bias2;
            let diff = dotprod - record.val.ln();

            let word1_forced = self.forcing.lookup(record.word1 as u32);
            let word2_forced = self.forcing.lookup(record.word2 as u32);

            let mut forced_cost = 0.0 as Real;
            for entry in word1_forced {
                forced_cost += phi(focal[entry.dim], entry.polarity, entry.k);
            }
            for entry in word2_forced {
                forced_cost += phi(context[entry.dim], entry.polarity, entry.k);
            }

            let w = weight(record.val, x_max, alpha);
            cost += 0.5 * w * (diff * diff + forced_cost);

            let temp = w * diff;

            let mut m1 = 0usize;
            let mut m2 = 0usize;
            for i in 0..dim {
                let mut grad_w1 = temp * context[i];
                let mut grad_w2 = temp * focal[i];

                if m1 < word1_forced.len() && word1_forced[m1].dim == i {
                    let e = word1_forced[m1];
                    grad_w1 += w * phi_prime(focal[i], e.polarity, e.k);
                    m1 += 1;
                }
                if m2 < word2_forced.len() && word2_forced[m2].dim == i {
                    let e = word2_forced[m2];
                    grad_w2 += w * phi_prime(context[i], e.polarity, e.k);
                    m2 += 1;
                }

                self.params.adagrad_update(l1 + i, grad_w1, eta);
                self.params.adagrad_update(l2 + i, grad_w2, eta);
            }

            let grad_b = temp;
            self.params.adagrad_update(l1 + dim, grad_b, eta);
            self.params.adagrad_update(l2 + dim, grad_b, eta);
        }

        cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forcing::ForcedEntry;
    use crate::init::random_init;
    use std::io::Write;

    fn write_record(f: &mut std::fs::File, w1: i32, w2: i32, v: Real) {
        f.write_all(&w1.to_le_bytes()).unwrap();
        f.write_all(&w2.to_le_bytes()).unwrap();
        f.write_all(&crate::real::real_to_le_bytes(v)).unwrap();
    }

    #[test]
    fn one_pass_reduces_total_cost_on_repeated_pair() {
        let dir = std::env::temp_dir().join(format!("trainer-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cooccur.bin");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            for _ in 0..20 {
                write_record(&mut f, 1, 2, 5.0);
            }
        }

        let params = ParameterStore::allocate(2, 4);
        random_init(&params, 1);
        let forcing = ForcingTable::empty();

        let config = TrainerConfig {
            input_file: path,
            num_threads: 2,
            num_iter: 1,
            vector_size: 4,
            eta: 0.05,
            alpha: 0.75,
            x_max: 100.0,
        };
        let trainer = Trainer::new(config, &params, &forcing);
        let cost = trainer.run().unwrap();
        assert!(cost.is_finite());
        assert!(cost >= 0.0);

        std::fs::remove_dir_all(&dir).ok();
    }

    /// V=2, D=1, single record (1, 2, e), W and G at their allocation
    /// defaults, no forcing. Matches the worked example in the spec's
    /// testable-properties section.
    #[test]
    fn worked_example_without_forcing_matches_expected_bias_update() {
        let dir = std::env::temp_dir().join(format!("trainer-worked1-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cooccur.bin");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            write_record(&mut f, 1, 2, std::f64::consts::E as Real);
        }

        let params = ParameterStore::allocate(2, 1);
        let forcing = ForcingTable::empty();
        let config = TrainerConfig {
            input_file: path,
            num_threads: 1,
            num_iter: 1,
            vector_size: 1,
            eta: 0.1,
            alpha: 0.75,
            x_max: 100.0,
        };
        let trainer = Trainer::new(config, &params, &forcing);
        trainer.run().unwrap();

        let snapshot = params.w_snapshot();
        // focal1 = row 0, ctx2 = row 3 (vocab_size=2, row_width=2).
        assert!((snapshot[0] - 0.0).abs() < 1e-6, "focal1 coordinate should stay 0");
        assert!((snapshot[6] - 0.0).abs() < 1e-6, "ctx2 coordinate should stay 0");
        assert!(
            (snapshot[1] - 0.00668).abs() < 1e-3,
            "focal1 bias, got {}",
            snapshot[1]
        );
        assert!(
            (snapshot[7] - 0.00668).abs() < 1e-3,
            "ctx2 bias, got {}",
            snapshot[7]
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    /// Same setup as above, plus one forcing entry (dim=0, word=1, polarity
    /// +1, k=1): the focal1 coordinate should move instead of staying at 0.
    #[test]
    fn worked_example_with_forcing_pushes_focal_coordinate() {
        let dir = std::env::temp_dir().join(format!("trainer-worked2-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let cooccur_path = dir.join("cooccur.bin");
        {
            let mut f = std::fs::File::create(&cooccur_path).unwrap();
            write_record(&mut f, 1, 2, std::f64::consts::E as Real);
        }

        let dims_path = dir.join("dims.txt");
        let ids_path = dir.join("ids.txt");
        let pols_path = dir.join("pols.txt");
        let kvals_path = dir.join("kvals.txt");
        std::fs::write(&dims_path, "0\n").unwrap();
        std::fs::write(&ids_path, "1\n").unwrap();
        std::fs::write(&pols_path, "+\n").unwrap();
        std::fs::write(&kvals_path, "1\n").unwrap();

        let params = ParameterStore::allocate(2, 1);
        let forcing =
            ForcingTable::load(&dims_path, &ids_path, &pols_path, &kvals_path, 1, 2).unwrap();
        assert_eq!(forcing.lookup(1), &[ForcedEntry { dim: 0, polarity: 1.0, k: 1.0 }]);

        let config = TrainerConfig {
            input_file: cooccur_path,
            num_threads: 1,
            num_iter: 1,
            vector_size: 1,
            eta: 0.1,
            alpha: 0.75,
            x_max: 100.0,
        };
        let trainer = Trainer::new(config, &params, &forcing);
        trainer.run().unwrap();

        let snapshot = params.w_snapshot();
        // focal1's single coordinate (row 0, column 0) is pushed by the
        // forcing gradient alone, since the plain GloVe gradient there is 0.
        assert!(
            (snapshot[0] - 0.00668).abs() < 1e-3,
            "focal1 coordinate, got {}",
            snapshot[0]
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn zero_weight_records_leave_parameters_untouched() {
        let dir = std::env::temp_dir().join(format!("trainer-test2-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cooccur.bin");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            write_record(&mut f, 1, 1, 0.0);
        }

        let params = ParameterStore::allocate(1, 2);
        let before = params.w_snapshot();

        let forcing = ForcingTable::empty();
        let config = TrainerConfig {
            input_file: path,
            num_threads: 1,
            num_iter: 1,
            vector_size: 2,
            eta: 0.05,
            alpha: 0.75,
            x_max: 100.0,
        };
        let trainer = Trainer::new(config, &params, &forcing);
        trainer.run().unwrap();
        assert_eq!(before, params.w_snapshot());

        std::fs::remove_dir_all(&dir).ok();
    }
}
