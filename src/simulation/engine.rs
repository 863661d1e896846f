// src/simulation/engine.rs

//! Entanglement groups and the protocol that keeps qubits linked to them.
//!
//! Every qubit belongs to exactly one group at any time. A group owns a
//! `2^n` amplitude vector over its `n` members; member `i` is bit `i` of the
//! vector index. Gates merge the groups of their operands (tensor product),
//! transform the merged vector, then try to factor it back into independent
//! groups. Measurement collapses a group and moves every measured qubit into
//! a fresh single-qubit group.
//!
//! Locking rules:
//! * a qubit's link is only rewritten while holding the lock of the group it
//!   leaves and the lock of the group it joins;
//! * new groups are locked before any qubit is linked to them;
//! * two existing groups are only locked together under `MERGE_LOCK`, in
//!   address order;
//! * a reader locks the group it observed and re-checks the link, retrying if
//!   the qubit moved in between.

use super::{config, random_unit, GroupSnapshot, MeasurementOutcome};
use crate::core::bits::{bit, deposit, insert_bit};
use crate::core::constants::tolerance::EPSILON;
use crate::core::{Amplitude, QStateError, QStateResult, QubitId};
use crate::operations::Gate;
use crate::validation;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

pub(crate) type SharedGroup = Arc<Mutex<EntanglementGroup>>;

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(0);

/// Serializes merges so that at most one thread ever holds two group locks.
static MERGE_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Shared state behind a [`Qubit`](crate::Qubit) handle.
pub(crate) struct QubitCore {
    id: QubitId,
    link: RwLock<Link>,
}

struct Link {
    group: SharedGroup,
    position: usize,
}

impl QubitCore {
    /// A qubit in its own group, prepared in the basis state `|value⟩`.
    pub(crate) fn new(value: bool) -> Arc<Self> {
        let id = QubitId::fresh();
        Arc::new_cyclic(|handle| {
            let group = EntanglementGroup::basis(Member { id, handle: handle.clone() }, value);
            QubitCore {
                id,
                link: RwLock::new(Link {
                    group: Arc::new(Mutex::new(group)),
                    position: 0,
                }),
            }
        })
    }

    pub(crate) fn id(&self) -> QubitId {
        self.id
    }

    fn group(&self) -> SharedGroup {
        Arc::clone(&self.link.read().group)
    }

    fn position(&self) -> usize {
        self.link.read().position
    }

    fn belongs_to(&self, group: &SharedGroup) -> bool {
        Arc::ptr_eq(&self.link.read().group, group)
    }

    fn relink(&self, group: &SharedGroup, position: usize) {
        let mut link = self.link.write();
        link.group = Arc::clone(group);
        link.position = position;
    }
}

/// A group member. The handle is weak so a dropped qubit does not keep its
/// group alive through a reference cycle; its dimension is measured out the
/// next time a gate runs on the group.
#[derive(Clone)]
struct Member {
    id: QubitId,
    handle: Weak<QubitCore>,
}

/// A set of qubits sharing one amplitude vector.
pub(crate) struct EntanglementGroup {
    id: u64,
    members: Vec<Member>,
    amplitudes: Vec<Amplitude>,
}

impl EntanglementGroup {
    fn from_parts(members: Vec<Member>, amplitudes: Vec<Amplitude>) -> Self {
        debug_assert_eq!(amplitudes.len(), 1 << members.len());
        Self {
            id: NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed),
            members,
            amplitudes,
        }
    }

    fn basis(member: Member, value: bool) -> Self {
        let amplitudes = if value {
            vec![Amplitude::ZERO, Amplitude::ONE]
        } else {
            vec![Amplitude::ONE, Amplitude::ZERO]
        };
        Self::from_parts(vec![member], amplitudes)
    }

    fn qubit_count(&self) -> usize {
        self.members.len()
    }

    /// Tensor product. `first`'s members keep the low bits.
    fn tensor(first: &Self, second: &Self) -> Self {
        let amplitudes = second
            .amplitudes
            .iter()
            .flat_map(|high| first.amplitudes.iter().map(move |low| *low * *high))
            .collect();
        let members = first.members.iter().chain(&second.members).cloned().collect();
        Self::from_parts(members, amplitudes)
    }

    /// Applies `gate` with operand `i` mapped to local position `positions[i]`.
    fn transform(&mut self, gate: &Gate, positions: &[usize]) -> QStateResult<()> {
        if positions.len() != gate.size() {
            return Err(QStateError::OperandCountMismatch {
                expected: gate.size(),
                actual: positions.len(),
            });
        }
        // Operands take the low bits of the iteration order, everything else
        // follows in position order.
        let order: Vec<usize> = positions
            .iter()
            .copied()
            .chain((0..self.qubit_count()).filter(|p| !positions.contains(p)))
            .collect();

        let block = gate.dimension();
        let mut indices = vec![0usize; block];
        let mut input = vec![Amplitude::ZERO; block];
        for base in (0..self.amplitudes.len()).step_by(block) {
            for (offset, index) in indices.iter_mut().enumerate() {
                *index = deposit(base + offset, &order);
            }
            for (slot, &index) in input.iter_mut().zip(&indices) {
                *slot = self.amplitudes[index];
            }
            let output = gate.transform(&input)?;
            for (value, &index) in output.into_iter().zip(&indices) {
                self.amplitudes[index] = value;
            }
        }
        Ok(())
    }

    /// Σ|a|² over every index whose bits match `fixed`. Contradictory
    /// requirements on one position give zero; no requirements give one.
    fn probability_of(&self, fixed: &[(usize, bool)]) -> f64 {
        let mut mask = 0usize;
        let mut value = 0usize;
        for &(position, wanted) in fixed {
            let flag = 1 << position;
            if mask & flag != 0 && (value & flag != 0) != wanted {
                return 0.0;
            }
            mask |= flag;
            if wanted {
                value |= flag;
            }
        }
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(index, _)| index & mask == value)
            .map(|(_, amplitude)| amplitude.absolute_square())
            .sum()
    }

    /// Picks a basis index with probability |a|² given `uniform` in `[0, 1)`.
    ///
    /// Falls back to the last non-negligible index when rounding leaves the
    /// cumulative sum short of `uniform`.
    fn draw(&self, uniform: f64) -> usize {
        let mut cumulative = 0.0;
        let mut fallback = 0;
        for (index, amplitude) in self.amplitudes.iter().enumerate() {
            if amplitude.is_negligible() {
                continue;
            }
            fallback = index;
            cumulative += amplitude.absolute_square();
            if cumulative > uniform {
                return index;
            }
        }
        fallback
    }

    /// The renormalized state of the unmeasured members once the qubits at
    /// `measured` have taken the bits they have in `outcome`. `None` when no
    /// member is left.
    fn reduce(&self, outcome: usize, measured: &[usize]) -> Option<Self> {
        let remaining: Vec<usize> = (0..self.qubit_count())
            .filter(|p| !measured.contains(p))
            .collect();
        if remaining.is_empty() {
            return None;
        }
        let fixed: Vec<(usize, bool)> = measured.iter().map(|&p| (p, bit(outcome, p))).collect();
        let fixed_bits = fixed
            .iter()
            .filter(|(_, value)| *value)
            .fold(0usize, |acc, (p, _)| acc | (1 << p));
        let probability = self.probability_of(&fixed);
        let scale = if probability > 0.0 { probability.sqrt().recip() } else { 1.0 };

        let amplitudes = (0..1usize << remaining.len())
            .map(|local| self.amplitudes[fixed_bits | deposit(local, &remaining)] * scale)
            .collect();
        let members = remaining.iter().map(|&p| self.members[p].clone()).collect();
        Some(Self::from_parts(members, amplitudes))
    }

    /// Pairwise test: positions `i1 < i2` are entangled unless
    /// `a[s]·a[s|b1|b2] = a[s|b1]·a[s|b2]` for every setting `s` of the others.
    fn entangled_pair(&self, i1: usize, i2: usize) -> bool {
        let (b1, b2) = (1 << i1, 1 << i2);
        let a = &self.amplitudes;
        (0..1usize << (self.qubit_count() - 2)).any(|x| {
            let s = insert_bit(insert_bit(x, i1, false), i2, false);
            a[s] * a[s | b1 | b2] != a[s | b1] * a[s | b2]
        })
    }

    /// Connected components of the pairwise entanglement relation, each
    /// sorted, ordered by their lowest position.
    fn pairwise_components(&self) -> Vec<Vec<usize>> {
        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        let n = self.qubit_count();
        let mut parent: Vec<usize> = (0..n).collect();
        for i1 in 0..n {
            for i2 in i1 + 1..n {
                let (r1, r2) = (find(&mut parent, i1), find(&mut parent, i2));
                if r1 != r2 && self.entangled_pair(i1, i2) {
                    parent[r2] = r1;
                }
            }
        }

        let mut components: Vec<(usize, Vec<usize>)> = Vec::new();
        for position in 0..n {
            let root = find(&mut parent, position);
            match components.iter_mut().find(|(r, _)| *r == root) {
                Some((_, members)) => members.push(position),
                None => components.push((root, vec![position])),
            }
        }
        components.into_iter().map(|(_, members)| members).collect()
    }

    /// Exact check that the state factors as `|part⟩ ⊗ |rest⟩`.
    ///
    /// Viewing the vector as a matrix `M[p][r]`, the state is a product iff
    /// the matrix has rank one, i.e. `M[p][r]·M[p0][r0] = M[p][r0]·M[p0][r]`
    /// for a pivot `(p0, r0)` of largest magnitude.
    fn is_separable(&self, part: &[usize]) -> bool {
        let part_mask = part.iter().fold(0usize, |acc, p| acc | (1 << p));
        let Some((pivot, pivot_amplitude)) = self
            .amplitudes
            .iter()
            .copied()
            .enumerate()
            .max_by(|(_, x), (_, y)| x.magnitude().total_cmp(&y.magnitude()))
        else {
            return true;
        };
        self.amplitudes.iter().enumerate().all(|(index, amplitude)| {
            let same_part = (index & part_mask) | (pivot & !part_mask);
            let same_rest = (pivot & part_mask) | (index & !part_mask);
            *amplitude * pivot_amplitude == self.amplitudes[same_part] * self.amplitudes[same_rest]
        })
    }

    /// Groups of positions that can live in independent groups.
    ///
    /// Pairwise independence does not imply independence (GHZ states pass
    /// every pairwise test), so each candidate is confirmed exactly and the
    /// unconfirmed ones are kept together.
    fn partitions(&self) -> Vec<Vec<usize>> {
        let candidates = self.pairwise_components();
        if candidates.len() < 2 {
            return candidates;
        }
        let (mut confirmed, rejected): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(|part| self.is_separable(part));
        if !rejected.is_empty() {
            let mut merged = rejected.concat();
            merged.sort_unstable();
            confirmed.push(merged);
        }
        confirmed.sort_by_key(|part| part[0]);
        confirmed
    }

    /// Builds one group per partition. Every factor but the last is given a
    /// zero phase on its first significant amplitude; the last one carries
    /// the global phase.
    fn factor(&self, partitions: &[Vec<usize>]) -> Option<Vec<Self>> {
        let last = partitions.len().checked_sub(1)?;
        partitions
            .iter()
            .enumerate()
            .map(|(k, part)| {
                let others: Vec<usize> = (0..self.qubit_count())
                    .filter(|p| !part.contains(p))
                    .collect();
                let (raw, probability) = (0..1usize << others.len())
                    .map(|assignment| {
                        let base = deposit(assignment, &others);
                        let raw: Vec<Amplitude> = (0..1usize << part.len())
                            .map(|local| self.amplitudes[base | deposit(local, part)])
                            .collect();
                        let probability: f64 = raw.iter().map(Amplitude::absolute_square).sum();
                        (raw, probability)
                    })
                    .find(|(_, probability)| *probability > EPSILON)?;

                let scale = probability.sqrt().recip();
                let reference = if k == last {
                    0.0
                } else {
                    raw.iter().find(|a| !a.is_negligible()).map_or(0.0, Amplitude::phase)
                };
                let amplitudes = raw.iter().map(|a| a.scale(scale).rotate(-reference)).collect();
                let members = part.iter().map(|&p| self.members[p].clone()).collect();
                Some(Self::from_parts(members, amplitudes))
            })
            .collect()
    }

    /// Empties a group whose members have all been relinked elsewhere.
    fn retire(&mut self) {
        self.members.clear();
        self.amplitudes = vec![Amplitude::ONE];
    }

    fn snapshot(&self) -> GroupSnapshot {
        GroupSnapshot::new(
            self.members.iter().map(|m| m.id).collect(),
            self.amplitudes.clone(),
        )
    }
}

/// Runs `f` with the lock of the group `qubit` currently belongs to.
fn with_current_group<T>(
    qubit: &QubitCore,
    f: impl FnOnce(&SharedGroup, &mut EntanglementGroup) -> T,
) -> T {
    loop {
        let group = qubit.group();
        let mut state = group.lock();
        if qubit.belongs_to(&group) {
            return f(&group, &mut state);
        }
        trace!(qubit = %qubit.id, "qubit moved while locking its group, retrying");
    }
}

/// Wraps a new group and links its members to it.
fn publish(group: EntanglementGroup) -> SharedGroup {
    let shared = Arc::new(Mutex::new(group));
    {
        let state = shared.lock();
        for (position, member) in state.members.iter().enumerate() {
            if let Some(qubit) = member.handle.upgrade() {
                qubit.relink(&shared, position);
            }
        }
    }
    shared
}

fn lock_pair<'a>(
    a: &'a SharedGroup,
    b: &'a SharedGroup,
) -> (MutexGuard<'a, EntanglementGroup>, MutexGuard<'a, EntanglementGroup>) {
    if Arc::as_ptr(a) < Arc::as_ptr(b) {
        let first = a.lock();
        let second = b.lock();
        (first, second)
    } else {
        let second = b.lock();
        let first = a.lock();
        (first, second)
    }
}

/// Groups currently holding `qubits`, each listed once, with their sizes.
///
/// Only merges grow a group, so under `MERGE_LOCK` the total is an upper
/// bound on the size of the group the qubits will end up in.
fn current_groups(qubits: &[Arc<QubitCore>]) -> Vec<(SharedGroup, usize)> {
    loop {
        let mut groups: Vec<(SharedGroup, usize)> = Vec::with_capacity(qubits.len());
        for qubit in qubits {
            let (group, size) =
                with_current_group(qubit, |group, state| (Arc::clone(group), state.qubit_count()));
            if !groups.iter().any(|(known, _)| Arc::ptr_eq(known, &group)) {
                groups.push((group, size));
            }
        }
        // A group is retired before any of its qubits is counted elsewhere.
        if qubits
            .iter()
            .all(|q| groups.iter().any(|(group, _)| q.belongs_to(group)))
        {
            return groups;
        }
        trace!("operands moved while sizing their groups, retrying");
    }
}

/// Merges the groups of `a` and `b` if they differ. Caller holds `MERGE_LOCK`.
fn merge_pair(a: &QubitCore, b: &QubitCore) {
    loop {
        let first = a.group();
        let second = b.group();
        if Arc::ptr_eq(&first, &second) {
            return;
        }
        let (mut low, mut high) = lock_pair(&first, &second);
        if !a.belongs_to(&first) || !b.belongs_to(&second) {
            continue;
        }
        let merged = EntanglementGroup::tensor(&low, &high);
        debug!(
            low = low.id,
            high = high.id,
            merged = merged.id,
            qubits = merged.qubit_count(),
            "merging groups"
        );
        publish(merged);
        low.retire();
        high.retire();
        return;
    }
}

/// Puts every operand into one group. Nothing is merged when the combined
/// group would exceed the configured size limit.
fn entangle(operands: &[Arc<QubitCore>]) -> QStateResult<()> {
    let _serial = MERGE_LOCK.lock();
    let groups = current_groups(operands);
    if groups.len() < 2 {
        return Ok(());
    }
    let qubits: usize = groups.iter().map(|(_, size)| size).sum();
    let max = config().max_group_qubits;
    if qubits > max {
        warn!(qubits, max, "refusing to merge groups past the size limit");
        return Err(QStateError::CapacityExceeded { qubits, max });
    }
    if let Some((anchor, rest)) = operands.split_first() {
        for other in rest {
            merge_pair(anchor, other);
        }
    }
    Ok(())
}

/// Applies `gate` to `operands`, which must be distinct and match the gate size.
pub(crate) fn apply_gate(gate: &Gate, operands: &[Arc<QubitCore>]) -> QStateResult<()> {
    let Some((anchor, rest)) = operands.split_first() else {
        return Ok(());
    };
    let auto_split = config().auto_split;
    loop {
        entangle(operands)?;
        let applied = with_current_group(anchor, |group, state| {
            // A concurrent split may have separated the operands again.
            if !rest.iter().all(|q| q.belongs_to(group)) {
                return None;
            }
            let positions: Vec<usize> = operands.iter().map(|q| q.position()).collect();
            Some(apply_locked(gate, state, &positions, auto_split))
        });
        match applied {
            Some(result) => return result,
            None => trace!("operands separated before the gate ran, retrying"),
        }
    }
}

fn apply_locked(
    gate: &Gate,
    state: &mut EntanglementGroup,
    positions: &[usize],
    auto_split: bool,
) -> QStateResult<()> {
    state.transform(gate, positions)?;
    trace!(group = state.id, qubits = state.qubit_count(), "gate applied");
    if let Err(err) = validation::check_normalization(&state.amplitudes, None) {
        warn!(group = state.id, %err, "state drifted after gate application");
    }
    if !release_dropped(state, auto_split) && auto_split {
        split(state);
    }
    Ok(())
}

/// Measures out members whose qubit handles have all been dropped, which
/// leaves the live members with the same statistics as tracing them out.
/// Returns true when `state` was replaced.
fn release_dropped(state: &mut EntanglementGroup, auto_split: bool) -> bool {
    let dropped: Vec<usize> = state
        .members
        .iter()
        .enumerate()
        .filter(|(_, member)| member.handle.strong_count() == 0)
        .map(|(position, _)| position)
        .collect();
    if dropped.is_empty() {
        return false;
    }
    let index = state.draw(random_unit());
    debug!(group = state.id, dropped = dropped.len(), "releasing dropped qubits");
    if let Some(mut rest) = state.reduce(index, &dropped) {
        if auto_split {
            split(&mut rest);
        }
        if rest.qubit_count() > 0 {
            publish(rest);
        }
    }
    state.retire();
    true
}

/// Replaces a locked group by its independent factors, if it has any.
fn split(state: &mut EntanglementGroup) {
    if state.qubit_count() < 2 {
        return;
    }
    let partitions = state.partitions();
    if partitions.len() < 2 {
        return;
    }
    let Some(factors) = state.factor(&partitions) else {
        return;
    };
    debug!(group = state.id, parts = factors.len(), "splitting group");
    for factor in factors {
        publish(factor);
    }
    state.retire();
}

fn unique<'a>(qubits: &[&'a Arc<QubitCore>]) -> Vec<&'a Arc<QubitCore>> {
    let mut seen = HashSet::with_capacity(qubits.len());
    qubits.iter().copied().filter(|q| seen.insert(q.id)).collect()
}

/// Measures `qubits` jointly: one draw per group, then collapse.
pub(crate) fn measure(qubits: &[&Arc<QubitCore>]) -> MeasurementOutcome {
    observe(qubits, true)
}

/// Draws outcomes like [`measure`] but leaves every group untouched.
pub(crate) fn sample(qubits: &[&Arc<QubitCore>]) -> MeasurementOutcome {
    observe(qubits, false)
}

fn observe(qubits: &[&Arc<QubitCore>], collapse: bool) -> MeasurementOutcome {
    let mut outcome = MeasurementOutcome::new();
    let mut pending = unique(qubits);
    while let Some(&anchor) = pending.first() {
        let drawn: Vec<(QubitId, bool)> = with_current_group(anchor, |group, state| {
            let requested: Vec<(&Arc<QubitCore>, usize)> = pending
                .iter()
                .filter(|q| q.belongs_to(group))
                .map(|q| (*q, q.position()))
                .collect();
            let index = state.draw(random_unit());
            trace!(group = state.id, index, collapse, "drew basis state");
            let drawn: Vec<(QubitId, bool)> =
                requested.iter().map(|(q, p)| (q.id, bit(index, *p))).collect();
            if collapse {
                collapse_locked(state, index, &requested);
            }
            drawn
        });
        for (id, value) in drawn {
            outcome.record(id, value);
        }
        pending.retain(|q| !outcome.contains(q.id));
    }
    outcome
}

fn collapse_locked(state: &mut EntanglementGroup, index: usize, measured: &[(&Arc<QubitCore>, usize)]) {
    let positions: Vec<usize> = measured.iter().map(|(_, p)| *p).collect();
    if let Some(rest) = state.reduce(index, &positions) {
        publish(rest);
    }
    for (qubit, position) in measured {
        let member = Member { id: qubit.id, handle: Arc::downgrade(qubit) };
        publish(EntanglementGroup::basis(member, bit(index, *position)));
    }
    debug!(group = state.id, measured = measured.len(), "collapsed group");
    state.retire();
}

/// Joint probability of an assignment: the product over the groups involved.
pub(crate) fn probability(assignment: &[(&Arc<QubitCore>, bool)]) -> f64 {
    let mut pending: Vec<(&Arc<QubitCore>, bool)> = assignment.to_vec();
    let mut total = 1.0;
    while let Some(&(anchor, _)) = pending.first() {
        let (probability, covered) = with_current_group(anchor, |group, state| {
            let (covered, fixed): (Vec<QubitId>, Vec<(usize, bool)>) = pending
                .iter()
                .filter(|(q, _)| q.belongs_to(group))
                .map(|(q, value)| (q.id, (q.position(), *value)))
                .unzip();
            (state.probability_of(&fixed), covered)
        });
        total *= probability;
        pending.retain(|(q, _)| !covered.contains(&q.id));
    }
    total
}

/// Copy of the group `qubit` belongs to.
pub(crate) fn snapshot(qubit: &QubitCore) -> GroupSnapshot {
    with_current_group(qubit, |_, state| state.snapshot())
}

/// Number of qubits in `qubit`'s group.
pub(crate) fn group_size(qubit: &QubitCore) -> usize {
    with_current_group(qubit, |_, state| state.qubit_count())
}

/// Local position of `qubit` within its group.
pub(crate) fn position(qubit: &QubitCore) -> usize {
    with_current_group(qubit, |_, _| qubit.position())
}

/// True if `a` and `b` currently share a group.
pub(crate) fn same_group(a: &QubitCore, b: &QubitCore) -> bool {
    Arc::ptr_eq(&a.group(), &b.group())
}
