// src/qubits/mod.rs

//! User-facing qubit handles.
//!
//! A [`Qubit`] is a cheap, clonable handle; clones refer to the same qubit.
//! A [`Register`] is an ordered list of handles read and written as an
//! unsigned integer, position 0 being the least significant bit.

mod qubit;
mod register;

pub use qubit::Qubit;
pub use register::Register;
