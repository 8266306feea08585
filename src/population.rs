//! The closed cohort and its aggregate counts.
//!
//! [`Population`] owns both the per-individual records and the [`StateCounts`] derived from
//! them, and is the only place where either is mutated. The counts follow a non-quarantined
//! individual's disease stage; an isolated individual is counted in
//! [`Compartment::Quarantined`] only, even though its private stage keeps advancing.
use crate::disease::{Compartment, DiseaseState, StateCounts};
use crate::log::trace;

/// Number of members of the cohort.
pub const POPULATION_SIZE: usize = 50;

/// Outcome of the most recent positive test of an individual.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TestResult {
    #[default]
    None,
    PcrPositive,
    AntigenPositive,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Individual {
    pub(crate) state: DiseaseState,
    pub(crate) quarantined: bool,
    pub(crate) quarantine_days: u32,
    pub(crate) test_result: TestResult,
    pub(crate) waiting_result: bool,
    pub(crate) waiting_days: u32,
}

impl Individual {
    const SUSCEPTIBLE: Individual = Individual {
        state: DiseaseState::S,
        quarantined: false,
        quarantine_days: 0,
        test_result: TestResult::None,
        waiting_result: false,
        waiting_days: 0,
    };

    #[must_use]
    pub fn state(&self) -> DiseaseState {
        self.state
    }

    #[must_use]
    pub fn is_quarantined(&self) -> bool {
        self.quarantined
    }

    /// Days spent in isolation.
    #[must_use]
    pub fn quarantine_days(&self) -> u32 {
        self.quarantine_days
    }

    #[must_use]
    pub fn test_result(&self) -> TestResult {
        self.test_result
    }

    /// Whether a PCR result is pending.
    #[must_use]
    pub fn is_waiting_result(&self) -> bool {
        self.waiting_result
    }

    /// Days since the pending test was administered.
    #[must_use]
    pub fn waiting_days(&self) -> u32 {
        self.waiting_days
    }

    /// The compartment this individual is counted in.
    #[must_use]
    pub fn compartment(&self) -> Compartment {
        if self.quarantined {
            Compartment::Quarantined
        } else {
            self.state.into()
        }
    }

    pub(crate) fn clear_waiting(&mut self) {
        self.waiting_result = false;
        self.waiting_days = 0;
    }
}

#[derive(Clone, Debug)]
pub struct Population {
    individuals: [Individual; POPULATION_SIZE],
    counts: StateCounts,
}

impl Default for Population {
    fn default() -> Self {
        Self::new()
    }
}

impl Population {
    /// A fully susceptible population.
    #[must_use]
    pub fn new() -> Self {
        Population {
            individuals: [Individual::SUSCEPTIBLE; POPULATION_SIZE],
            counts: StateCounts::all_susceptible(POPULATION_SIZE),
        }
    }

    /// Resets everybody to susceptible, not isolated and not waiting for a result.
    pub fn initialize(&mut self) {
        self.individuals = [Individual::SUSCEPTIBLE; POPULATION_SIZE];
        self.counts = StateCounts::all_susceptible(POPULATION_SIZE);
    }

    /// Introduces the index case: individual `index` becomes exposed.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or the individual is not susceptible.
    pub fn seed_index(&mut self, index: usize) {
        let individual = &mut self.individuals[index];
        assert_eq!(
            individual.state,
            DiseaseState::S,
            "only a susceptible individual can be seeded"
        );
        individual.state = DiseaseState::E;
        self.counts.transfer(Compartment::S, Compartment::E);
    }

    #[must_use]
    pub fn counts(&self) -> &StateCounts {
        &self.counts
    }

    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub(crate) fn individual_mut(&mut self, index: usize) -> &mut Individual {
        &mut self.individuals[index]
    }

    /// Moves individual `index` to `next`. The counts follow only while the individual is not
    /// isolated.
    pub(crate) fn progress(&mut self, index: usize, next: DiseaseState) {
        let individual = &mut self.individuals[index];
        let previous = individual.state;
        debug_assert_eq!(previous.next(next == DiseaseState::Is), Some(next));
        individual.state = next;
        if !individual.quarantined {
            self.counts.transfer(previous.into(), next.into());
        }
    }

    /// Isolates individual `index`, moving it from its stage's bucket to `Quarantined`.
    pub(crate) fn isolate(&mut self, index: usize) {
        let individual = &mut self.individuals[index];
        debug_assert!(!individual.quarantined, "individual {index} is already isolated");
        individual.quarantined = true;
        let state = individual.state;
        self.counts.transfer(state.into(), Compartment::Quarantined);
        trace!("isolated individual {index} in state {state}");
    }

    /// Start-of-day bookkeeping: pending results and isolations age by one day.
    pub fn advance_clocks(&mut self) {
        for individual in &mut self.individuals {
            if individual.waiting_result {
                individual.waiting_days += 1;
            }
            if individual.quarantined {
                individual.quarantine_days += 1;
            }
        }
    }

    /// Recomputes the counts from the individual records; used to check they agree.
    #[must_use]
    pub fn recount(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for individual in &self.individuals {
            counts.add(individual.compartment());
        }
        counts
    }

    /// A population in which every individual is in `state` and nobody is isolated.
    #[cfg(test)]
    pub(crate) fn uniform(state: DiseaseState) -> Self {
        let mut population = Population::new();
        for individual in &mut population.individuals {
            individual.state = state;
        }
        population.counts = population.recount();
        population
    }
}
