//! The fixed catalog of standard gates.
//!
//! Every gate is built on first use and shared for the life of the process.

use super::Gate;
use crate::core::Amplitude;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, FRAC_PI_4};
use std::sync::LazyLock;

const O: Amplitude = Amplitude::ZERO;
const I: Amplitude = Amplitude::ONE;

/// Hadamard: maps |0⟩ and |1⟩ to the two equal superpositions.
pub static H: LazyLock<Gate> = LazyLock::new(|| {
    let h = Amplitude::real(FRAC_1_SQRT_2);
    Gate::from_square(vec![vec![h, h], vec![h, Amplitude::real(-FRAC_1_SQRT_2)]])
});

/// Pauli-X, the quantum NOT.
pub static X: LazyLock<Gate> = LazyLock::new(|| Gate::from_square(vec![vec![O, I], vec![I, O]]));

/// Pauli-Y, a π rotation about the Y axis.
pub static Y: LazyLock<Gate> = LazyLock::new(|| {
    Gate::from_square(vec![
        vec![O, Amplitude::new(-1.0, FRAC_PI_2)],
        vec![Amplitude::new(1.0, FRAC_PI_2), O],
    ])
});

/// Pauli-Z, a π phase shift. Identical to `Gate::r(1)`.
pub static Z: LazyLock<Gate> = LazyLock::new(|| Gate::r(1));

/// SWAP: exchanges the states of its two operands.
pub static SWAP: LazyLock<Gate> = LazyLock::new(|| {
    Gate::from_square(vec![
        vec![I, O, O, O],
        vec![O, O, I, O],
        vec![O, I, O, O],
        vec![O, O, O, I],
    ])
});

/// √SWAP: applied twice it is a SWAP.
pub static SQRT_SWAP: LazyLock<Gate> = LazyLock::new(|| {
    let plus = Amplitude::new(FRAC_1_SQRT_2, FRAC_PI_4);
    let minus = Amplitude::new(FRAC_1_SQRT_2, -FRAC_PI_4);
    Gate::from_square(vec![
        vec![I, O, O, O],
        vec![O, plus, minus, O],
        vec![O, minus, plus, O],
        vec![O, O, O, I],
    ])
});

/// Controlled-NOT: flips the first operand when the second (the control) is |1⟩.
pub static CNOT: LazyLock<Gate> = LazyLock::new(|| X.controlled());

/// √NOT: applied twice it is a Pauli-X.
pub static SQRT_NOT: LazyLock<Gate> = LazyLock::new(|| {
    let plus = Amplitude::new(FRAC_1_SQRT_2, FRAC_PI_4);
    let minus = Amplitude::new(FRAC_1_SQRT_2, -FRAC_PI_4);
    Gate::from_square(vec![vec![plus, minus], vec![minus, plus]])
});

/// Every catalog gate with its conventional name.
pub fn all() -> [(&'static str, &'static Gate); 8] {
    [
        ("H", &H),
        ("X", &X),
        ("Y", &Y),
        ("Z", &Z),
        ("SWAP", &SWAP),
        ("SQRT_SWAP", &SQRT_SWAP),
        ("CNOT", &CNOT),
        ("SQRT_NOT", &SQRT_NOT),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::QStateResult;

    fn squared(gate: &Gate, input: &[Amplitude]) -> QStateResult<Vec<Amplitude>> {
        gate.transform(&gate.transform(input)?)
    }

    fn close(a: &[Amplitude], b: &[Amplitude]) -> bool {
        a.iter()
            .zip(b)
            .all(|(x, y)| (x.to_rectangular() - y.to_rectangular()).norm_sqr() < 1e-20)
    }

    #[test]
    fn test_sqrt_not_squares_to_x() -> QStateResult<()> {
        let input = [Amplitude::ONE, O];
        assert!(close(&squared(&SQRT_NOT, &input)?, &[O, I]));
        Ok(())
    }

    #[test]
    fn test_sqrt_swap_squares_to_swap() -> QStateResult<()> {
        let input = [O, I, O, O];
        assert!(close(&squared(&SQRT_SWAP, &input)?, &SWAP.transform(&input)?));
        Ok(())
    }

    #[test]
    fn test_y_maps_zero_to_i_one() -> QStateResult<()> {
        let out = Y.transform(&[I, O])?;
        assert!(close(&out, &[O, Amplitude::new(1.0, FRAC_PI_2)]));
        Ok(())
    }

    #[test]
    fn test_catalog_sizes() {
        for (name, gate) in all() {
            let expected = if name.contains("SWAP") || name == "CNOT" { 2 } else { 1 };
            assert_eq!(gate.size(), expected, "{}", name);
        }
    }
}
