//! Per-comparison bookkeeping: the work stack, the visited-pairs cycle guard
//! and the differences found so far.

use std::{any::TypeId, collections::HashSet};

use crate::{difference::Difference, introspection::Introspect, location::FieldLocation};

/// Identity of a value: its data address paired with its runtime type, so that a
/// struct and its first field (same address) are never confused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    address: usize,
    type_id: TypeId,
}

impl Identity {
    pub fn of(value: &dyn Introspect) -> Identity {
        Identity {
            address: value as *const dyn Introspect as *const () as usize,
            type_id: value.type_key().id(),
        }
    }
}

/// (actual, expected) identity pair.
pub type PairKey = (Identity, Identity);

/// Pairs of values currently being compared along the active path.
#[derive(Debug, Default)]
pub struct VisitedPairs {
    active: HashSet<PairKey>,
}

impl VisitedPairs {
    /// Returns `false` if the pair is already active, i.e. a cycle was closed.
    pub fn enter(&mut self, pair: PairKey) -> bool {
        self.active.insert(pair)
    }

    pub fn leave(&mut self, pair: &PairKey) {
        self.active.remove(pair);
    }

    pub fn is_active(&self, pair: &PairKey) -> bool {
        self.active.contains(pair)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// A pair of values to compare at a given location.
#[derive(Clone)]
pub struct DualValue<'a> {
    pub location: FieldLocation,
    pub actual: &'a dyn Introspect,
    pub expected: &'a dyn Introspect,
    /// Set once an enclosing value is of a compared type.
    pub within_compared_type: bool,
}

impl<'a> DualValue<'a> {
    pub fn new(
        location: FieldLocation,
        actual: &'a dyn Introspect,
        expected: &'a dyn Introspect,
    ) -> DualValue<'a> {
        DualValue {
            location,
            actual,
            expected,
            within_compared_type: false,
        }
    }
}

pub(crate) enum Task<'a> {
    Compare(DualValue<'a>),
    /// Exit marker popped once every child of the pair has been processed.
    Leave(PairKey),
}

/// State of one comparison run.
///
/// A trial state only records whether a mismatch happened. It is used to match
/// elements of unordered collections, where difference details are discarded.
pub struct ComparisonState<'v, 'a> {
    visited: &'v mut VisitedPairs,
    stack: Vec<Task<'a>>,
    differences: Vec<Difference>,
    trial: bool,
    mismatched: bool,
    within_compared_type: bool,
    reporting: bool,
}

impl<'v, 'a> ComparisonState<'v, 'a> {
    pub fn new(visited: &'v mut VisitedPairs) -> ComparisonState<'v, 'a> {
        ComparisonState {
            visited,
            stack: Vec::new(),
            differences: Vec::new(),
            trial: false,
            mismatched: false,
            within_compared_type: false,
            reporting: true,
        }
    }

    /// Starts a nested trial run sharing this run's active pairs.
    pub fn trial(&mut self) -> ComparisonState<'_, 'a> {
        ComparisonState {
            visited: &mut *self.visited,
            stack: Vec::new(),
            differences: Vec::new(),
            trial: true,
            mismatched: false,
            within_compared_type: self.within_compared_type,
            reporting: self.reporting,
        }
    }

    pub fn is_trial(&self) -> bool {
        self.trial
    }

    /// Scopes the pair about to be compared: whether it lies inside a value of a
    /// compared type, and whether its differences are kept. Pairs pushed from now on
    /// inherit the first flag.
    pub fn focus(&mut self, within_compared_type: bool, reporting: bool) {
        self.within_compared_type = within_compared_type;
        self.reporting = reporting;
    }

    fn scoped(&self, mut dual: DualValue<'a>) -> Task<'a> {
        dual.within_compared_type |= self.within_compared_type;
        Task::Compare(dual)
    }

    pub fn push(&mut self, dual: DualValue<'a>) {
        let task = self.scoped(dual);
        self.stack.push(task);
    }

    /// Schedules children so that they are popped in the given order.
    pub fn push_children(&mut self, children: Vec<DualValue<'a>>) {
        for dual in children.into_iter().rev() {
            let task = self.scoped(dual);
            self.stack.push(task);
        }
    }

    pub(crate) fn pop(&mut self) -> Option<Task<'a>> {
        self.stack.pop()
    }

    /// Marks the pair active until everything pushed after this call is processed.
    /// Returns `false` when the pair is already active.
    pub fn enter(&mut self, pair: PairKey) -> bool {
        if !self.visited.enter(pair) {
            return false;
        }
        self.stack.push(Task::Leave(pair));
        true
    }

    pub fn leave(&mut self, pair: &PairKey) {
        self.visited.leave(pair);
    }

    /// Records a difference. The difference is only built when it is kept.
    pub fn record(&mut self, difference: impl FnOnce() -> Difference) {
        if !self.reporting {
            return;
        }
        self.mismatched = true;
        if !self.trial {
            self.differences.push(difference());
        }
    }

    pub fn has_mismatch(&self) -> bool {
        self.mismatched
    }

    pub fn take_differences(&mut self) -> Vec<Difference> {
        std::mem::take(&mut self.differences)
    }
}

impl Drop for ComparisonState<'_, '_> {
    // An abandoned run still leaves every pair it entered.
    fn drop(&mut self) {
        while let Some(task) = self.stack.pop() {
            if let Task::Leave(pair) = task {
                self.visited.leave(&pair);
            }
        }
    }
}
