//! Bit plumbing for basis-state indices. Position 0 is the least significant bit.

/// Value of bit `position` of `state`.
#[inline]
pub(crate) fn bit(state: usize, position: usize) -> bool {
    (state >> position) & 1 == 1
}

/// Inserts `value` at `position`, shifting the higher bits up by one.
#[inline]
pub(crate) fn insert_bit(state: usize, position: usize, value: bool) -> usize {
    let low = state & ((1 << position) - 1);
    let high = (state >> position) << (position + 1);
    low | high | ((value as usize) << position)
}

/// Spreads the low bits of `value` onto `positions`: bit `j` of `value`
/// lands on bit `positions[j]` of the result.
pub(crate) fn deposit(value: usize, positions: &[usize]) -> usize {
    positions
        .iter()
        .enumerate()
        .filter(|&(j, _)| bit(value, j))
        .fold(0, |acc, (_, &position)| acc | (1 << position))
}

/// Builds an integer whose bit `i` is `predicate(i)` for `i < length`.
/// Bits past the 64th are dropped.
pub(crate) fn build_int(length: usize, predicate: impl Fn(usize) -> bool) -> u64 {
    (0..length.min(u64::BITS as usize))
        .filter(|&i| predicate(i))
        .fold(0u64, |acc, i| acc | (1u64 << i))
}

/// Renders the low `length` bits of `state`, most significant first.
pub(crate) fn to_bit_string(state: usize, length: usize) -> String {
    (0..length)
        .rev()
        .map(|i| if bit(state, i) { '1' } else { '0' })
        .collect()
}
