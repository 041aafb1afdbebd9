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

//! Fills `W` either from a precomputed binary init file or by pseudo-random
//! generation, and resets `G` to the all-ones baseline in both cases. The
//! random-fill routine is shared with the standalone init-file generator
//! binary so the two stay bit-for-bit consistent.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{Result, TrainerError};
use crate::params::ParameterStore;
use crate::real::{Real, REAL_SIZE, real_from_le_bytes};

/// Draw `2 * vocab_size * (dim + 1)` scalars uniformly from
/// `[-0.5 / (dim + 1), 0.5 / (dim + 1))`, in row-major order matching `W`'s
/// in-memory layout.
pub fn random_buffer(vocab_size: usize, dim: usize, seed: u64) -> Vec<Real> {
    let row_width = dim + 1;
    let len = 2 * vocab_size * row_width;
    let bound = 0.5 / row_width as Real;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len)
        .map(|_| rng.random_range(-bound..bound))
        .collect()
}

/// Populate `store` with pseudo-random vectors seeded by `seed`, then reset
/// `G` to 1.0.
pub fn random_init(store: &ParameterStore, seed: u64) {
    let data = random_buffer(store.vocab_size(), store.dim(), seed);
    store.w_bulk_store(&data);
    store.g_fill(1.0);
}

/// Populate `store` by reading `2 * vocab_size * (dim + 1)` scalars from
/// `path`, then reset `G` to 1.0. Fails if the file is smaller than
/// expected.
pub fn file_init(store: &ParameterStore, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| TrainerError::io(path, e))?;

    let expected_len = store.total_len();
    let mut bytes = vec![0u8; expected_len * REAL_SIZE];
    file.read_exact(&mut bytes).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            TrainerError::format(
                path,
                format!(
                    "init file is smaller than the expected {} scalars",
                    expected_len
                ),
            )
        } else {
            TrainerError::io(path, e)
        }
    })?;

    let data: Vec<Real> = bytes
        .chunks_exact(REAL_SIZE)
        .map(real_from_le_bytes)
        .collect();
    store.w_bulk_store(&data);
    store.g_fill(1.0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_init_keeps_values_in_bound_and_sets_gradsq_to_one() {
        let store = ParameterStore::allocate(3, 4);
        random_init(&store, 42);
        let bound = 0.5 / 5.0;
        for v in store.w_snapshot() {
            assert!(v >= -bound && v < bound);
        }
        for v in store.g_snapshot() {
            assert_eq!(v, 1.0);
        }
    }

    #[test]
    fn same_seed_is_reproducible() {
        let a = random_buffer(4, 3, 7);
        let b = random_buffer(4, 3, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_differ() {
        let a = random_buffer(4, 3, 1);
        let b = random_buffer(4, 3, 2);
        assert_ne!(a, b);
    }
}
