// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Float helpers for `no_std` builds.
//!
//! `f64::sqrt` lives in `std`, not `core`; this trait dispatches to `libm` instead.

#[cfg(all(not(feature = "std"), not(feature = "libm")))]
compile_error!("protomark_core requires either the `std` or `libm` feature");

pub(crate) trait FloatExt {
    fn sqrt(self) -> Self;
}

#[cfg(all(not(feature = "std"), feature = "libm"))]
impl FloatExt for f64 {
    #[inline]
    fn sqrt(self) -> Self {
        libm::sqrt(self)
    }
}
