// tests/common/mod.rs

//! Shared helpers for the integration tests: the quantum Fourier transform
//! built from public gates, and float comparisons on amplitudes.

#![allow(dead_code)]

use qstate::{catalog, Amplitude, Gate, QStateResult, Register};

/// Quantum Fourier transform over `register`, value bit 0 least significant.
pub fn qft(register: &mut Register) -> QStateResult<()> {
    let n = register.len();
    for i in (0..n).rev() {
        catalog::H.apply_to(&[&register[i]])?;
        for j in (0..i).rev() {
            // Target first, control last.
            let rotation = Gate::r((i - j + 1) as u32).controlled();
            rotation.apply_to(&[&register[i], &register[j]])?;
        }
    }
    register.reverse();
    Ok(())
}

/// Exact inverse of [`qft`]: the same gates inverted, in reverse order.
pub fn inverse_qft(register: &mut Register) -> QStateResult<()> {
    register.reverse();
    let n = register.len();
    for i in 0..n {
        for j in 0..i {
            let rotation = Gate::r((i - j + 1) as u32).inverse().controlled();
            rotation.apply_to(&[&register[i], &register[j]])?;
        }
        catalog::H.apply_to(&[&register[i]])?;
    }
    Ok(())
}

/// True when the rectangular forms of `a` and `b` lie within `tolerance`.
pub fn close(a: &Amplitude, b: &Amplitude, tolerance: f64) -> bool {
    (a.to_rectangular() - b.to_rectangular()).norm() < tolerance
}

/// Component-wise [`close`] over two vectors of equal length.
pub fn all_close(a: &[Amplitude], b: &[Amplitude], tolerance: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| close(x, y, tolerance))
}
