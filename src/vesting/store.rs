// Keyed schedule records plus the committed aggregates.
//
// committed_total and committed_by are mutated in the same call as the
// per-schedule fields, so a reader at any quiescent point observes
//
//   committed_total == sum(committed_by) == sum of unreleased principal
//                      over Initialized schedules
//
// No iteration over the full set is exposed; per-beneficiary iteration is
// bounded by that beneficiary's counter.

use indexmap::IndexMap;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::crypto::{Address, Hash};

use super::schedule::{schedule_id, Schedule, ScheduleParams, ScheduleStatus};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleStore {
    schedules: IndexMap<Hash, Schedule>,
    /// Monotonic per-beneficiary schedule count; never decremented
    counters: IndexMap<Address, u64>,
    /// Virtual total supply: unreleased principal across live schedules
    committed_total: U256,
    /// Virtual balance per beneficiary
    committed_by: IndexMap<Address, U256>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&self, id: &Hash) -> Option<&Schedule> {
        self.schedules.get(id)
    }

    pub fn schedule_by_index(&self, beneficiary: &Address, index: u64) -> Option<&Schedule> {
        self.schedules.get(&schedule_id(beneficiary, index))
    }

    pub fn schedule_count(&self, beneficiary: &Address) -> u64 {
        self.counters.get(beneficiary).copied().unwrap_or(0)
    }

    pub fn committed_total(&self) -> U256 {
        self.committed_total
    }

    pub fn committed_of(&self, beneficiary: &Address) -> U256 {
        self.committed_by
            .get(beneficiary)
            .copied()
            .unwrap_or_default()
    }

    /// Install a validated schedule, assign the next index, credit the
    /// aggregates. Returns the new schedule's identifier.
    pub fn insert(&mut self, beneficiary: Address, params: &ScheduleParams) -> Hash {
        let counter = self.counters.entry(beneficiary).or_insert(0);
        let index = *counter;
        *counter += 1;

        let id = schedule_id(&beneficiary, index);
        self.schedules.insert(id, Schedule::new(beneficiary, params));

        self.committed_total = self.committed_total.saturating_add(params.amount);
        let balance = self.committed_by.entry(beneficiary).or_default();
        *balance = balance.saturating_add(params.amount);

        id
    }

    /// Book a release: bump the schedule's released figure and debit both
    /// aggregates. The caller has already bounded `amount` by the releasable
    /// figure.
    pub fn record_release(&mut self, id: &Hash, amount: U256) {
        let Some(schedule) = self.schedules.get_mut(id) else {
            return;
        };
        schedule.released = schedule.released.saturating_add(amount);
        let beneficiary = schedule.beneficiary;

        self.committed_total = self.committed_total.saturating_sub(amount);
        if let Some(balance) = self.committed_by.get_mut(&beneficiary) {
            *balance = balance.saturating_sub(amount);
        }
    }

    /// Mark a schedule revoked and return its unreleased principal to the
    /// free pool. Returns the amount debited.
    pub fn record_revoke(&mut self, id: &Hash) -> U256 {
        let Some(schedule) = self.schedules.get_mut(id) else {
            return U256::zero();
        };
        let unreleased = schedule.unreleased();
        schedule.status = ScheduleStatus::Revoked;
        let beneficiary = schedule.beneficiary;

        self.committed_total = self.committed_total.saturating_sub(unreleased);
        if let Some(balance) = self.committed_by.get_mut(&beneficiary) {
            *balance = balance.saturating_sub(unreleased);
        }

        unreleased
    }

    /// Iterate the beneficiary's slots in index order. Bounded by the
    /// beneficiary's counter; revoked slots are included.
    pub fn schedules_of<'a>(
        &'a self,
        beneficiary: &'a Address,
    ) -> impl Iterator<Item = (Hash, &'a Schedule)> + 'a {
        (0..self.schedule_count(beneficiary)).filter_map(move |index| {
            let id = schedule_id(beneficiary, index);
            self.schedules.get(&id).map(|schedule| (id, schedule))
        })
    }

    /// Aggregate coherence check used by tests and debug assertions
    pub fn aggregates_consistent(&self) -> bool {
        let per_beneficiary: U256 = self
            .committed_by
            .values()
            .fold(U256::zero(), |acc, v| acc.saturating_add(*v));
        let per_schedule: U256 = self
            .schedules
            .values()
            .filter(|s| !s.is_revoked())
            .fold(U256::zero(), |acc, s| acc.saturating_add(s.unreleased()));
        self.committed_total == per_beneficiary && self.committed_total == per_schedule
    }
}
