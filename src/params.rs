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

//! The shared parameter matrix `W` and its AdaGrad squared-gradient
//! accumulator `G`. Both are dense `2 * vocab_size` by `dim + 1` arrays,
//! mutated in place by every training worker without synchronization
//! beyond the per-scalar relaxed atomics in [`crate::real::AtomicReal`].

use crate::real::{AtomicReal, Real};

pub struct ParameterStore {
    vocab_size: usize,
    dim: usize,
    w: Vec<AtomicReal>,
    g: Vec<AtomicReal>,
}

impl ParameterStore {
    /// Allocate `W` and `G` for `vocab_size` words and `dim`-dimensional
    /// vectors (excluding the bias column). `W` starts zeroed; `G` starts
    /// at 1.0 everywhere so the first effective AdaGrad step size equals
    /// the configured learning rate.
    pub fn allocate(vocab_size: usize, dim: usize) -> Self {
        let len = 2 * vocab_size * (dim + 1);
        let mut w = Vec::with_capacity(len);
        w.resize_with(len, || AtomicReal::new(0.0));
        let mut g = Vec::with_capacity(len);
        g.resize_with(len, || AtomicReal::new(1.0));
        ParameterStore {
            vocab_size,
            dim,
            w,
            g,
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Row width: `dim` vector components plus one bias column.
    pub fn row_width(&self) -> usize {
        self.dim + 1
    }

    pub fn total_len(&self) -> usize {
        2 * self.vocab_size * self.row_width()
    }

    /// Flat offset of the focal-vector row for 1-based vocabulary id `id`.
    pub fn focal_row_offset(&self, id: u32) -> usize {
        (id as usize - 1) * self.row_width()
    }

    /// Flat offset of the context-vector row for 1-based vocabulary id `id`.
    pub fn context_row_offset(&self, id: u32) -> usize {
        (self.vocab_size + id as usize - 1) * self.row_width()
    }

    #[inline]
    pub fn w_load(&self, idx: usize) -> Real {
        self.w[idx].load()
    }

    #[inline]
    pub fn w_store(&self, idx: usize, v: Real) {
        self.w[idx].store(v)
    }

    #[inline]
    pub fn g_load(&self, idx: usize) -> Real {
        self.g[idx].load()
    }

    #[inline]
    pub fn g_store(&self, idx: usize, v: Real) {
        self.g[idx].store(v)
    }

    /// Apply one AdaGrad step at flat index `idx`: descend `W` by
    /// `eta * grad / sqrt(G)`, then accumulate `(eta * grad)^2` into `G`.
    #[inline]
    pub fn adagrad_update(&self, idx: usize, grad: Real, eta: Real) {
        let g_old = self.g_load(idx);
        let w_old = self.w_load(idx);
        let delta = eta * grad;
        self.w_store(idx, w_old - delta / g_old.sqrt());
        self.g_store(idx, g_old + delta * delta);
    }

    /// Snapshot the whole `W` buffer into a plain `Vec`, e.g. for binary
    /// export or a bit-exact round-trip check.
    pub fn w_snapshot(&self) -> Vec<Real> {
        self.w.iter().map(AtomicReal::load).collect()
    }

    pub fn g_snapshot(&self) -> Vec<Real> {
        self.g.iter().map(AtomicReal::load).collect()
    }

    /// Overwrite the entire `W` buffer, e.g. when loading an init file.
    /// Panics if `data.len() != self.total_len()`.
    pub fn w_bulk_store(&self, data: &[Real]) {
        assert_eq!(data.len(), self.total_len());
        for (slot, v) in self.w.iter().zip(data) {
            slot.store(*v);
        }
    }

    pub fn g_fill(&self, v: Real) {
        for slot in &self.g {
            slot.store(v);
        }
    }
}
