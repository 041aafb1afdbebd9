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

//! The scalar type used throughout the trainer, chosen at build time, plus
//! the handful of pure numeric kernels the cost/gradient computation relies
//! on.

use std::sync::atomic::Ordering;

#[cfg(not(feature = "f64"))]
mod width {
    use std::sync::atomic::AtomicU32;

    pub type Real = f32;
    pub type Bits = u32;
    pub type AtomicBits = AtomicU32;

    pub fn to_bits(v: Real) -> Bits {
        v.to_bits()
    }

    pub fn from_bits(b: Bits) -> Real {
        Real::from_bits(b)
    }

    pub fn to_le_bytes(v: Real) -> [u8; 4] {
        v.to_le_bytes()
    }

    pub fn from_le_bytes(b: [u8; 4]) -> Real {
        Real::from_le_bytes(b)
    }
}

#[cfg(feature = "f64")]
mod width {
    use std::sync::atomic::AtomicU64;

    pub type Real = f64;
    pub type Bits = u64;
    pub type AtomicBits = AtomicU64;

    pub fn to_bits(v: Real) -> Bits {
        v.to_bits()
    }

    pub fn from_bits(b: Bits) -> Real {
        Real::from_bits(b)
    }

    pub fn to_le_bytes(v: Real) -> [u8; 8] {
        v.to_le_bytes()
    }

    pub fn from_le_bytes(b: [u8; 8]) -> Real {
        Real::from_le_bytes(b)
    }
}

pub use width::Real;

/// Byte width of `Real` on disk, used to compute record sizes and file
/// offsets for the co-occurrence stream and the init/export files.
pub const REAL_SIZE: usize = std::mem::size_of::<Real>();

pub fn real_to_le_bytes(v: Real) -> Vec<u8> {
    width::to_le_bytes(v).to_vec()
}

pub fn real_from_le_bytes(bytes: &[u8]) -> Real {
    let mut buf = [0u8; REAL_SIZE];
    buf.copy_from_slice(bytes);
    width::from_le_bytes(buf)
}

/// A single scalar of `W` or `G`, stored so concurrent workers can mutate it
/// without tearing a word-sized store. HOGWILD tolerates the resulting
/// read/write races between threads; what it cannot tolerate is a torn
/// write splitting one scalar across two partial stores, which relaxed
/// atomic load/store rules out.
pub struct AtomicReal(width::AtomicBits);

impl AtomicReal {
    pub fn new(v: Real) -> Self {
        AtomicReal(width::AtomicBits::new(width::to_bits(v)))
    }

    #[inline]
    pub fn load(&self) -> Real {
        width::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, v: Real) {
        self.0.store(width::to_bits(v), Ordering::Relaxed)
    }
}

/// Plain inner product over `n` contiguous elements.
pub fn dot(a: &[Real], b: &[Real]) -> Real {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).fold(0.0, |acc, (x, y)| acc + x * y)
}

/// The GloVe weighting function: caps large co-occurrence counts at 1,
/// below the cap scales as `(x / x_max)^alpha`.
pub fn weight(x: Real, x_max: Real, alpha: Real) -> Real {
    if x >= x_max { 1.0 } else { (x / x_max).powf(alpha) }
}

const PHI_ALPHA: Real = 0.5;

/// Reciprocal forcing cost `phi(v, p, k)`. Continuous at `v*p == 0.5`.
pub fn phi(v: Real, p: Real, k: Real) -> Real {
    let x = v * p;
    let e = std::f64::consts::E as Real;
    if x < 0.5 {
        k * PHI_ALPHA * (-x / PHI_ALPHA).exp()
    } else {
        (k / e) * PHI_ALPHA * PHI_ALPHA / x
    }
}

/// Derivative of `phi` with respect to `v`.
///
/// Note: this does *not* multiply through by the polarity `p`, even though
/// `phi` itself depends on `v * p`. That asymmetry is present in the
/// reference implementation this crate reproduces and is preserved here
/// byte-for-byte rather than "corrected".
pub fn phi_prime(v: Real, p: Real, k: Real) -> Real {
    let x = v * p;
    let e = std::f64::consts::E as Real;
    if x < 0.5 {
        -k * (-x / PHI_ALPHA).exp()
    } else {
        -(k / e) * PHI_ALPHA * PHI_ALPHA / (x * x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_product_matches_manual_sum() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        assert_eq!(dot(&a, &b), 32.0);
    }

    #[test]
    fn weight_boundary_behaviors() {
        assert_eq!(weight(100.0, 100.0, 0.75), 1.0);
        assert_eq!(weight(0.0, 100.0, 0.75), 0.0);
        assert_eq!(weight(200.0, 100.0, 0.75), 1.0);
    }

    #[test]
    fn phi_is_continuous_at_the_branch_join() {
        for p in [1.0 as Real, -1.0] {
            let k = 1.0;
            // v chosen so that v * p == 0.5 exactly
            let v = 0.5 * p;
            let lo = k * PHI_ALPHA * (-((v * p) / PHI_ALPHA)).exp();
            let hi = {
                let e = std::f64::consts::E as Real;
                (k / e) * PHI_ALPHA * PHI_ALPHA / (v * p)
            };
            assert!((lo - hi).abs() < 1e-6);
            let phi_v = phi(v, p, k);
            assert!((phi_v - lo).abs() < 1e-6 || (phi_v - hi).abs() < 1e-6);
        }
    }

    #[test]
    fn phi_prime_derivative_is_not_scaled_by_polarity() {
        // With p == -1 and v == 0 (x == 0 < 0.5), phi_prime should still be
        // negative, i.e. it is not multiplied through by p.
        let d = phi_prime(0.0, -1.0, 1.0);
        assert!(d < 0.0);
    }
}
