//! Disease stages and the aggregate per-compartment counts.
//!
//! An individual moves strictly forward through the pipeline
//! `S -> E -> P1 -> P2 -> {Is | Ia} -> R`. The aggregate [`StateCounts`] track one extra
//! compartment, `Quarantined`, which absorbs individuals once they are isolated: from then on
//! the individual's private stage keeps advancing but is no longer reflected in the counts.
use std::ops::Index;

use strum::{Display, EnumCount, EnumIter, IntoEnumIterator};

/// The disease stage of a single individual.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum DiseaseState {
    /// Susceptible
    S,
    /// Exposed, not yet infectious
    E,
    /// Early pre-symptomatic
    P1,
    /// Late pre-symptomatic
    P2,
    /// Symptomatic infectious
    Is,
    /// Asymptomatic infectious
    Ia,
    /// Recovered
    R,
}

impl DiseaseState {
    /// The stage that follows this one, or `None` for the terminal `R`.
    ///
    /// `symptomatic` selects the branch out of `P2` and is ignored for every other stage.
    #[must_use]
    pub fn next(self, symptomatic: bool) -> Option<DiseaseState> {
        match self {
            DiseaseState::S => Some(DiseaseState::E),
            DiseaseState::E => Some(DiseaseState::P1),
            DiseaseState::P1 => Some(DiseaseState::P2),
            DiseaseState::P2 if symptomatic => Some(DiseaseState::Is),
            DiseaseState::P2 => Some(DiseaseState::Ia),
            DiseaseState::Is | DiseaseState::Ia => Some(DiseaseState::R),
            DiseaseState::R => None,
        }
    }

    /// Position in the pipeline. `Is` and `Ia` share a position.
    #[must_use]
    pub fn stage(self) -> u8 {
        match self {
            DiseaseState::S => 0,
            DiseaseState::E => 1,
            DiseaseState::P1 => 2,
            DiseaseState::P2 => 3,
            DiseaseState::Is | DiseaseState::Ia => 4,
            DiseaseState::R => 5,
        }
    }

    /// Whether an individual in this stage exerts infection pressure.
    #[must_use]
    pub fn is_infectious(self) -> bool {
        matches!(
            self,
            DiseaseState::P1 | DiseaseState::P2 | DiseaseState::Is | DiseaseState::Ia
        )
    }

    /// Whether this stage still belongs to an ongoing infection.
    #[must_use]
    pub fn is_infected(self) -> bool {
        self == DiseaseState::E || self.is_infectious()
    }
}

/// The buckets of the aggregate counts: one per disease stage plus `Quarantined`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
pub enum Compartment {
    S,
    E,
    P1,
    P2,
    Is,
    Ia,
    R,
    Quarantined,
}

impl From<DiseaseState> for Compartment {
    fn from(state: DiseaseState) -> Self {
        match state {
            DiseaseState::S => Compartment::S,
            DiseaseState::E => Compartment::E,
            DiseaseState::P1 => Compartment::P1,
            DiseaseState::P2 => Compartment::P2,
            DiseaseState::Is => Compartment::Is,
            DiseaseState::Ia => Compartment::Ia,
            DiseaseState::R => Compartment::R,
        }
    }
}

/// Number of individuals per [`Compartment`]. The buckets always sum to the population size.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct StateCounts {
    counts: [usize; Compartment::COUNT],
}

impl StateCounts {
    /// Counts for a population in which everybody is susceptible.
    #[must_use]
    pub fn all_susceptible(size: usize) -> Self {
        let mut counts = StateCounts::default();
        counts.counts[Compartment::S as usize] = size;
        counts
    }

    #[must_use]
    pub fn get(&self, compartment: Compartment) -> usize {
        self.counts[compartment as usize]
    }

    /// Moves one individual from `from` to `to`.
    pub(crate) fn transfer(&mut self, from: Compartment, to: Compartment) {
        debug_assert!(
            self.counts[from as usize] > 0,
            "no individual left in {from} to move to {to}"
        );
        self.counts[from as usize] -= 1;
        self.counts[to as usize] += 1;
    }

    pub(crate) fn add(&mut self, compartment: Compartment) {
        self.counts[compartment as usize] += 1;
    }

    /// Sum over all buckets.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Non-quarantined individuals that exert infection pressure: `P1 + P2 + Is + Ia`.
    #[must_use]
    pub fn infectious(&self) -> usize {
        DiseaseState::iter()
            .filter(|state| state.is_infectious())
            .map(|state| self.get(state.into()))
            .sum()
    }

    /// Non-quarantined individuals with an ongoing infection: `E + P1 + P2 + Is + Ia`.
    #[must_use]
    pub fn infected(&self) -> usize {
        self.get(Compartment::E) + self.infectious()
    }

    #[must_use]
    pub fn quarantined(&self) -> usize {
        self.get(Compartment::Quarantined)
    }
}

impl Index<Compartment> for StateCounts {
    type Output = usize;

    fn index(&self, compartment: Compartment) -> &usize {
        &self.counts[compartment as usize]
    }
}
