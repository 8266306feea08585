//! Detection of cases: the daily symptom check, antigen tests and PCR tests.
//!
//! Only individuals that are not yet isolated take part in any of these operations. A positive
//! antigen test or a zero-read-time PCR test isolates the individual on the spot. A delayed PCR
//! test only records the result; the individual is isolated when the result is disclosed, see
//! [`disclose_pcr_results`].
use serde::{Deserialize, Serialize};

use crate::disease::DiseaseState;
use crate::error::SimError;
use crate::population::{Population, TestResult};
use crate::random::RandomSource;
use crate::log::trace;

/// Probability that a test flags an individual, by disease stage.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SensitivityTable {
    pub s: f64,
    pub e: f64,
    pub p1: f64,
    pub p2: f64,
    pub is: f64,
    pub ia: f64,
    pub r: f64,
}

impl Default for SensitivityTable {
    fn default() -> Self {
        SensitivityTable::PCR
    }
}

impl SensitivityTable {
    /// PCR sensitivity: undetectable while susceptible, exposed or recovered.
    pub const PCR: SensitivityTable = SensitivityTable {
        s: 0.0,
        e: 0.0,
        p1: 0.33,
        p2: 0.62,
        is: 0.8,
        ia: 0.8,
        r: 0.0,
    };

    #[must_use]
    pub fn get(&self, state: DiseaseState) -> f64 {
        match state {
            DiseaseState::S => self.s,
            DiseaseState::E => self.e,
            DiseaseState::P1 => self.p1,
            DiseaseState::P2 => self.p2,
            DiseaseState::Is => self.is,
            DiseaseState::Ia => self.ia,
            DiseaseState::R => self.r,
        }
    }

    /// Every entry multiplied by `factor`; antigen tests are modelled as a fraction of PCR.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        SensitivityTable {
            s: self.s * factor,
            e: self.e * factor,
            p1: self.p1 * factor,
            p2: self.p2 * factor,
            is: self.is * factor,
            ia: self.ia * factor,
            r: self.r * factor,
        }
    }

    /// # Errors
    ///
    /// Returns `SimError::InvalidParameter` if an entry lies outside [0, 1].
    pub fn validate(&self) -> Result<(), SimError> {
        for (name, p) in [
            ("s", self.s),
            ("e", self.e),
            ("p1", self.p1),
            ("p2", self.p2),
            ("is", self.is),
            ("ia", self.ia),
            ("r", self.r),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::InvalidParameter(format!(
                    "sensitivity for {name} must lie in [0, 1], got {p}"
                )));
            }
        }
        Ok(())
    }
}

/// When a pending PCR result is looked at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisclosureRule {
    /// On the day the result has been pending for exactly this many days.
    AfterReadTime(u32),
    /// On every day; a test taken today is disclosed tomorrow.
    EveryDay,
}

impl DisclosureRule {
    #[must_use]
    pub fn is_due(self, waiting_days: u32) -> bool {
        match self {
            DisclosureRule::AfterReadTime(read_time) => waiting_days == read_time,
            DisclosureRule::EveryDay => true,
        }
    }
}

/// Isolates every non-isolated symptomatic individual. Draws nothing.
pub fn symptom_check(population: &mut Population) {
    for index in 0..population.len() {
        let individual = population.individuals()[index];
        if individual.is_quarantined() || individual.state() != DiseaseState::Is {
            continue;
        }
        trace!("individual {index} isolated on symptoms");
        population.isolate(index);
        population.individual_mut(index).clear_waiting();
    }
}

/// Draws one value per non-isolated individual with positive sensitivity and returns whether it
/// tested positive.
fn draw_result(
    population: &Population,
    index: usize,
    sensitivity: &SensitivityTable,
    rng: &mut impl RandomSource,
) -> Option<bool> {
    let individual = &population.individuals()[index];
    if individual.is_quarantined() {
        return None;
    }
    let p = sensitivity.get(individual.state());
    if p > 0.0 {
        Some(rng.next_uniform() < p)
    } else {
        Some(false)
    }
}

/// Antigen test with zero read time: positives are isolated immediately.
pub fn antigen_test(
    population: &mut Population,
    sensitivity: &SensitivityTable,
    rng: &mut impl RandomSource,
) {
    immediate_test(population, sensitivity, TestResult::AntigenPositive, rng);
}

/// PCR test whose result is available the same day: positives are isolated immediately.
pub fn pcr_test_zero_read_time(
    population: &mut Population,
    sensitivity: &SensitivityTable,
    rng: &mut impl RandomSource,
) {
    immediate_test(population, sensitivity, TestResult::PcrPositive, rng);
}

fn immediate_test(
    population: &mut Population,
    sensitivity: &SensitivityTable,
    positive: TestResult,
    rng: &mut impl RandomSource,
) {
    for index in 0..population.len() {
        if draw_result(population, index, sensitivity, rng) == Some(true) {
            population.individual_mut(index).test_result = positive;
            trace!("individual {index} isolated after {positive:?} test");
            population.isolate(index);
        }
    }
}

/// PCR test with delayed read time. Positives are only recorded. Every tested individual starts
/// waiting for its result, which restarts the wait of anybody already waiting.
pub fn pcr_test(
    population: &mut Population,
    sensitivity: &SensitivityTable,
    rng: &mut impl RandomSource,
) {
    for index in 0..population.len() {
        let Some(positive) = draw_result(population, index, sensitivity, rng) else {
            continue;
        };
        let individual = population.individual_mut(index);
        if positive {
            individual.test_result = TestResult::PcrPositive;
        }
        individual.waiting_result = true;
        individual.waiting_days = 0;
    }
}

/// Looks at the pending PCR results that are due under `rule`. PCR positives are isolated, and
/// every disclosed individual stops waiting.
pub fn disclose_pcr_results(population: &mut Population, rule: DisclosureRule) {
    for index in 0..population.len() {
        let individual = population.individuals()[index];
        if individual.is_quarantined()
            || !individual.is_waiting_result()
            || !rule.is_due(individual.waiting_days())
        {
            continue;
        }
        if individual.test_result() == TestResult::PcrPositive {
            trace!(
                "individual {index} isolated on PCR result after {} days",
                individual.waiting_days()
            );
            population.isolate(index);
            population.individual_mut(index).quarantine_days = 0;
        }
        population.individual_mut(index).clear_waiting();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::disease::Compartment;
    use crate::population::POPULATION_SIZE;
    use crate::random::{ReplaySource, SimRng};
    use approx::assert_relative_eq;

    #[test]
    fn scaled_table_keeps_zeros() {
        let antigen = SensitivityTable::PCR.scaled(0.5);
        assert_eq!(antigen.s, 0.0);
        assert_eq!(antigen.e, 0.0);
        assert_eq!(antigen.r, 0.0);
        assert_relative_eq!(antigen.p2, 0.31);
        assert_relative_eq!(antigen.is, 0.4);
    }

    #[test]
    fn symptom_check_isolates_only_symptomatic() {
        let mut population = Population::new();
        population.seed_index(0);
        population.progress(0, DiseaseState::P1);
        population.progress(0, DiseaseState::P2);
        population.progress(0, DiseaseState::Is);
        population.seed_index(1);
        population.progress(1, DiseaseState::P1);
        population.progress(1, DiseaseState::P2);
        population.progress(1, DiseaseState::Ia);
        population.individual_mut(0).waiting_result = true;
        population.individual_mut(0).waiting_days = 2;

        symptom_check(&mut population);

        let symptomatic = &population.individuals()[0];
        assert!(symptomatic.is_quarantined());
        assert!(!symptomatic.is_waiting_result());
        assert_eq!(symptomatic.waiting_days(), 0);
        assert!(!population.individuals()[1].is_quarantined());
        assert_eq!(population.counts()[Compartment::Is], 0);
        assert_eq!(population.counts().quarantined(), 1);
    }

    #[test]
    fn tests_draw_only_for_detectable_states() {
        // Everybody susceptible: nothing to detect, nothing drawn.
        let mut population = Population::new();
        let mut rng = ReplaySource::constant(0.01);
        antigen_test(&mut population, &SensitivityTable::PCR, &mut rng);
        pcr_test(&mut population, &SensitivityTable::PCR, &mut rng);
        pcr_test_zero_read_time(&mut population, &SensitivityTable::PCR, &mut rng);
        assert_eq!(rng.calls(), 0);
        assert_eq!(population.counts().quarantined(), 0);
    }

    #[test]
    fn isolated_individuals_are_skipped() {
        let mut population = Population::uniform(DiseaseState::P2);
        population.isolate(0);
        let mut rng = ReplaySource::constant(0.99);
        antigen_test(&mut population, &SensitivityTable::PCR, &mut rng);
        assert_eq!(rng.calls(), POPULATION_SIZE - 1);
        pcr_test(&mut population, &SensitivityTable::PCR, &mut rng);
        assert!(!population.individuals()[0].is_waiting_result());
        assert!(population.individuals()[1].is_waiting_result());
    }

    #[test]
    fn antigen_positive_isolates_immediately() {
        let mut population = Population::uniform(DiseaseState::Ia);
        let antigen = SensitivityTable::PCR.scaled(0.5);
        // 0.3 < 0.4 positive, 0.5 negative, alternating.
        let mut rng = ReplaySource::new(vec![0.3, 0.5]);
        antigen_test(&mut population, &antigen, &mut rng);
        assert_eq!(population.counts().quarantined(), POPULATION_SIZE / 2);
        assert_eq!(population.counts()[Compartment::Ia], POPULATION_SIZE / 2);
        let first = &population.individuals()[0];
        assert!(first.is_quarantined());
        assert_eq!(first.test_result(), TestResult::AntigenPositive);
        assert!(!population.individuals()[1].is_quarantined());
    }

    #[test]
    fn zero_read_time_pcr_bypasses_waiting() {
        let mut population = Population::uniform(DiseaseState::P1);
        let mut rng = ReplaySource::constant(0.1);
        pcr_test_zero_read_time(&mut population, &SensitivityTable::PCR, &mut rng);
        assert_eq!(population.counts().quarantined(), POPULATION_SIZE);
        assert!(population
            .individuals()
            .iter()
            .all(|i| i.test_result() == TestResult::PcrPositive && !i.is_waiting_result()));
    }

    #[test]
    fn delayed_pcr_records_without_isolating() {
        let mut population = Population::uniform(DiseaseState::P2);
        let mut rng = ReplaySource::new(vec![0.1, 0.9]);
        pcr_test(&mut population, &SensitivityTable::PCR, &mut rng);
        assert_eq!(population.counts().quarantined(), 0);
        assert_eq!(population.individuals()[0].test_result(), TestResult::PcrPositive);
        assert_eq!(population.individuals()[1].test_result(), TestResult::None);
        assert!(population
            .individuals()
            .iter()
            .all(|i| i.is_waiting_result() && i.waiting_days() == 0));
    }

    #[test]
    fn disclosure_waits_for_read_time() {
        let rule = DisclosureRule::AfterReadTime(3);
        let mut population = Population::uniform(DiseaseState::P2);
        let mut rng = ReplaySource::new(vec![0.1, 0.9]);
        pcr_test(&mut population, &SensitivityTable::PCR, &mut rng);

        for day in 1..=2 {
            population.advance_clocks();
            disclose_pcr_results(&mut population, rule);
            let first = &population.individuals()[0];
            assert!(!first.is_quarantined(), "isolated early on day {day}");
            assert!(first.is_waiting_result());
            assert_eq!(first.waiting_days(), day);
        }

        population.advance_clocks();
        disclose_pcr_results(&mut population, rule);
        let first = &population.individuals()[0];
        assert!(first.is_quarantined());
        assert_eq!(first.quarantine_days(), 0);
        assert!(!first.is_waiting_result());
        let second = &population.individuals()[1];
        assert!(!second.is_quarantined());
        assert!(!second.is_waiting_result());
        assert_eq!(population.counts().quarantined(), POPULATION_SIZE / 2);
        assert_eq!(population.recount(), *population.counts());
    }

    #[test]
    fn every_day_disclosure_fires_next_day() {
        let mut population = Population::uniform(DiseaseState::Is);
        let mut rng = ReplaySource::constant(0.5);
        pcr_test(&mut population, &SensitivityTable::PCR, &mut rng);
        population.advance_clocks();
        disclose_pcr_results(&mut population, DisclosureRule::EveryDay);
        assert_eq!(population.counts().quarantined(), POPULATION_SIZE);
    }

    #[test]
    fn retest_restarts_the_wait() {
        let rule = DisclosureRule::AfterReadTime(3);
        let mut population = Population::uniform(DiseaseState::P2);
        let mut rng = ReplaySource::constant(0.1);
        pcr_test(&mut population, &SensitivityTable::PCR, &mut rng);
        population.advance_clocks();
        population.advance_clocks();
        pcr_test(&mut population, &SensitivityTable::PCR, &mut rng);
        population.advance_clocks();
        disclose_pcr_results(&mut population, rule);
        assert_eq!(population.counts().quarantined(), 0);
        assert!(population.individuals().iter().all(|i| i.waiting_days() == 1));
    }

    fn positive_rate(state: DiseaseState, sensitivity: &SensitivityTable, rounds: usize) -> f64 {
        let mut rng = SimRng::seed_from(2024);
        let mut positives = 0;
        for _ in 0..rounds {
            let mut population = Population::uniform(state);
            antigen_test(&mut population, sensitivity, &mut rng);
            positives += population.counts().quarantined();
        }
        positives as f64 / (rounds * POPULATION_SIZE) as f64
    }

    #[test]
    fn detection_rate_converges_to_sensitivity() {
        let antigen = SensitivityTable::PCR.scaled(0.7);
        for state in [
            DiseaseState::P1,
            DiseaseState::P2,
            DiseaseState::Is,
            DiseaseState::Ia,
        ] {
            let rate = positive_rate(state, &antigen, 2000);
            assert_relative_eq!(rate, antigen.get(state), max_relative = 0.03);
        }
        assert_eq!(positive_rate(DiseaseState::E, &antigen, 10), 0.0);
        assert_eq!(positive_rate(DiseaseState::R, &antigen, 10), 0.0);
    }

    #[test]
    fn invalid_sensitivity_rejected() {
        let table = SensitivityTable {
            p1: -0.1,
            ..SensitivityTable::PCR
        };
        assert!(table.validate().is_err());
        assert!(SensitivityTable::PCR.validate().is_ok());
    }
}
