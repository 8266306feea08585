//! Repetitions and scenarios.
//!
//! A repetition starts from a fresh cohort with one exposed individual on a random weekday and
//! runs day by day for at most `max_weeks` weeks. Each day:
//!
//! 1. pending results and isolations age by one day,
//! 2. symptomatic individuals are isolated,
//! 3. due PCR results are disclosed, if the scenario uses delayed PCR,
//! 4. the day's test runs, see [`scheduled_test`],
//! 5. on Saturdays the non-isolated infectious individuals are counted,
//! 6. the disease advances by one day.
//!
//! The repetition ceases as soon as no non-isolated individual is exposed or infectious. At the
//! end of every week, a rise of the quarantined count by more than the threshold flags a mass
//! infection event.
use crate::log::{debug, info};

use crate::aggregate::{ScenarioSummary, ScenarioTally};
use crate::disease::Compartment;
use crate::error::SimError;
use crate::infection::advance_one_day;
use crate::parameters::{Parameters, TransitionRates};
use crate::population::{Population, POPULATION_SIZE};
use crate::random::RandomSource;
use crate::scenario::{scheduled_test, ScenarioConfig, Study, TestAction, TestDay, Weekday};
use crate::testing::{
    antigen_test, disclose_pcr_results, pcr_test, pcr_test_zero_read_time, symptom_check,
    SensitivityTable,
};

/// Where a repetition stands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RepetitionStatus {
    Running,
    /// No infection left; holds the zero-based day on which this was detected.
    Ceased(u32),
    /// Ran for the full number of weeks without ceasing.
    Completed,
}

/// What a finished repetition contributes to its scenario.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RepetitionOutcome {
    /// Everybody who left the susceptible state, the index case included.
    pub infected: usize,
    /// Day of cessation, or the number of simulated days if the repetition never ceased.
    pub days_to_cessation: u32,
    pub ceased: bool,
    pub mass_infection: bool,
    /// Non-isolated infectious individuals summed over the Saturday snapshots.
    pub snapshot_infectious: u64,
    pub snapshots: u64,
}

/// One scenario with its parameters resolved into rates and sensitivities.
#[derive(Clone, Debug)]
pub struct Model {
    study: Study,
    scenario: ScenarioConfig,
    rates: TransitionRates,
    sub_steps: u32,
    max_weeks: u32,
    mass_infection_threshold: usize,
    pcr_sensitivity: SensitivityTable,
    antigen_sensitivity: SensitivityTable,
}

impl Model {
    #[must_use]
    pub fn new(study: Study, scenario: ScenarioConfig, parameters: &Parameters) -> Self {
        let antigen_sensitivity = parameters.pcr_sensitivity.scaled(scenario.antigen_scale);
        Model {
            study,
            scenario,
            rates: parameters.transition_rates(),
            sub_steps: parameters.sub_steps,
            max_weeks: parameters.max_weeks,
            mass_infection_threshold: parameters.mass_infection_threshold,
            pcr_sensitivity: parameters.pcr_sensitivity,
            antigen_sensitivity,
        }
    }

    #[must_use]
    pub fn scenario(&self) -> &ScenarioConfig {
        &self.scenario
    }

    /// Resets the cohort and draws the starting weekday and bi-weekly PCR parity.
    pub fn start_repetition(&self, rng: &mut impl RandomSource) -> Repetition<'_> {
        Repetition::new(self, rng)
    }

    pub fn run_repetition(&self, rng: &mut impl RandomSource) -> RepetitionOutcome {
        let mut repetition = self.start_repetition(rng);
        while repetition.step_day(rng) == RepetitionStatus::Running {}
        repetition.outcome()
    }

    /// Runs `repetitions` independent repetitions drawing from the shared stream `rng`.
    pub fn run(&self, repetitions: u32, rng: &mut impl RandomSource) -> ScenarioSummary {
        info!(
            "starting {} scenario {} ({}) with {} repetitions",
            self.study, self.scenario.index, self.scenario.description, repetitions
        );
        let mut tally = ScenarioTally::default();
        for repetition in 0..repetitions {
            let outcome = self.run_repetition(rng);
            debug!(
                "repetition {repetition}: infected={} days={} ceased={} mass_infection={}",
                outcome.infected,
                outcome.days_to_cessation,
                outcome.ceased,
                outcome.mass_infection
            );
            tally.record(&outcome);
        }
        let summary = tally.summarize(self.study, &self.scenario);
        info!(
            "finished {} scenario {}: mean infected {}, mass infection probability {}",
            self.study,
            self.scenario.index,
            summary.mean_infected,
            summary.mass_infection_probability
        );
        summary
    }

    fn perform(&self, test: TestAction, population: &mut Population, rng: &mut impl RandomSource) {
        match test {
            TestAction::None => {}
            TestAction::Antigen => antigen_test(population, &self.antigen_sensitivity, rng),
            TestAction::Pcr => pcr_test(population, &self.pcr_sensitivity, rng),
            TestAction::PcrZeroReadTime => {
                pcr_test_zero_read_time(population, &self.pcr_sensitivity, rng);
            }
        }
    }
}

/// A repetition in progress, advanced one day at a time with [`Repetition::step_day`].
#[derive(Clone, Debug)]
pub struct Repetition<'a> {
    model: &'a Model,
    population: Population,
    first_weekday: u32,
    pcr_week_parity: u32,
    week: u32,
    day_of_week: u32,
    escalated: bool,
    escalated_days: u32,
    quarantined_at_week_start: usize,
    mass_infection: bool,
    snapshot_infectious: u64,
    snapshots: u64,
    status: RepetitionStatus,
}

impl<'a> Repetition<'a> {
    fn new(model: &'a Model, rng: &mut impl RandomSource) -> Self {
        let mut population = Population::new();
        population.initialize();
        let first_weekday = rng.next_below(7) as u32;
        let pcr_week_parity = rng.next_below(2) as u32;
        population.seed_index(0);

        Repetition {
            model,
            population,
            first_weekday,
            pcr_week_parity,
            week: 0,
            day_of_week: 0,
            escalated: false,
            escalated_days: 0,
            quarantined_at_week_start: 0,
            mass_infection: false,
            snapshot_infectious: 0,
            snapshots: 0,
            status: RepetitionStatus::Running,
        }
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[must_use]
    pub fn status(&self) -> RepetitionStatus {
        self.status
    }

    /// The weekday of the first simulated day.
    #[must_use]
    pub fn first_weekday(&self) -> Weekday {
        Weekday::from_day(self.first_weekday)
    }

    /// Days simulated so far.
    #[must_use]
    pub fn elapsed_days(&self) -> u32 {
        self.week * 7 + self.day_of_week
    }

    /// Whether testing has escalated after a first isolation.
    #[must_use]
    pub fn is_escalated(&self) -> bool {
        self.escalated
    }

    #[must_use]
    pub fn mass_infection(&self) -> bool {
        self.mass_infection
    }

    /// Simulates one day. Does nothing once the repetition has finished.
    pub fn step_day(&mut self, rng: &mut impl RandomSource) -> RepetitionStatus {
        if self.status != RepetitionStatus::Running {
            return self.status;
        }
        let model = self.model;
        let weekday = Weekday::from_day(self.first_weekday + self.day_of_week);

        self.population.advance_clocks();
        symptom_check(&mut self.population);
        if let Some(rule) = model.scenario.disclosure {
            disclose_pcr_results(&mut self.population, rule);
        }

        let test = scheduled_test(
            &model.scenario,
            &TestDay {
                weekday,
                week: self.week,
                pcr_week_parity: self.pcr_week_parity,
                escalated: self.escalated,
                escalated_days: self.escalated_days,
            },
        );
        model.perform(test, &mut self.population, rng);
        if self.escalated && model.scenario.escalation.is_some() {
            self.escalated_days += 1;
        }
        // The quarantined count never decreases, so escalation is permanent.
        if self.population.counts().quarantined() > 0 {
            self.escalated = true;
        }

        if weekday == Weekday::Saturday {
            self.snapshots += 1;
            self.snapshot_infectious += self.population.counts().infectious() as u64;
        }

        advance_one_day(&mut self.population, &model.rates, model.sub_steps, rng);

        let today = self.elapsed_days();
        self.day_of_week += 1;
        if self.population.counts().infected() == 0 {
            if model.scenario.mass_check_on_final_week {
                self.check_mass_infection();
            }
            self.status = RepetitionStatus::Ceased(today);
        } else if self.day_of_week == 7 {
            self.check_mass_infection();
            self.week += 1;
            self.day_of_week = 0;
            if self.week == model.max_weeks {
                self.status = RepetitionStatus::Completed;
            }
        }
        self.status
    }

    fn check_mass_infection(&mut self) {
        if self.mass_infection {
            return;
        }
        let quarantined = self.population.counts().quarantined();
        if quarantined - self.quarantined_at_week_start > self.model.mass_infection_threshold {
            self.mass_infection = true;
        }
        self.quarantined_at_week_start = quarantined;
    }

    /// The contribution of this repetition. Meaningful once it has finished.
    #[must_use]
    pub fn outcome(&self) -> RepetitionOutcome {
        let (days_to_cessation, ceased) = match self.status {
            RepetitionStatus::Ceased(day) => (day, true),
            RepetitionStatus::Running | RepetitionStatus::Completed => {
                (self.model.max_weeks * 7, false)
            }
        };
        RepetitionOutcome {
            infected: POPULATION_SIZE - self.population.counts()[Compartment::S],
            days_to_cessation,
            ceased,
            mass_infection: self.mass_infection,
            snapshot_infectious: self.snapshot_infectious,
            snapshots: self.snapshots,
        }
    }
}

/// Runs every scenario of `study` in order on one shared random stream, handing each summary to
/// `on_summary` as soon as it is available.
///
/// # Errors
///
/// Returns the first error returned by `on_summary`.
pub fn run_study<F>(
    study: Study,
    parameters: &Parameters,
    rng: &mut impl RandomSource,
    mut on_summary: F,
) -> Result<(), SimError>
where
    F: FnMut(ScenarioSummary) -> Result<(), SimError>,
{
    for scenario in study.scenarios(parameters) {
        let model = Model::new(study, scenario, parameters);
        on_summary(model.run(parameters.repetitions, rng))?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::random::{ReplaySource, SimRng};

    fn parameters(max_weeks: u32) -> Parameters {
        Parameters {
            max_weeks,
            ..Parameters::default()
        }
    }

    fn model(study: Study, index: usize, parameters: &Parameters) -> Model {
        let scenario = study.scenarios(parameters)[index].clone();
        Model::new(study, scenario, parameters)
    }

    #[test]
    fn repetition_starts_with_single_exposed() {
        let parameters = Parameters::default();
        let model = model(Study::Regular, 0, &parameters);
        let mut rng = SimRng::seed_from(3);
        let repetition = model.start_repetition(&mut rng);
        let counts = repetition.population().counts();
        assert_eq!(counts[Compartment::E], 1);
        assert_eq!(counts[Compartment::S], POPULATION_SIZE - 1);
        assert_eq!(counts.quarantined(), 0);
        assert_eq!(repetition.status(), RepetitionStatus::Running);
        assert_eq!(repetition.elapsed_days(), 0);
    }

    #[test]
    fn counts_stay_consistent_every_day() {
        let parameters = Parameters::default();
        for (study, index) in [(Study::Regular, 1), (Study::Regular, 3), (Study::Additional, 4)] {
            let model = model(study, index, &parameters);
            let mut rng = SimRng::seed_from(11);
            for _ in 0..20 {
                let mut repetition = model.start_repetition(&mut rng);
                let mut quarantined = 0;
                while repetition.step_day(&mut rng) == RepetitionStatus::Running {
                    let counts = *repetition.population().counts();
                    assert_eq!(counts.total(), POPULATION_SIZE);
                    assert_eq!(counts, repetition.population().recount());
                    assert!(counts.quarantined() >= quarantined);
                    quarantined = counts.quarantined();
                }
                assert!(repetition.elapsed_days() <= parameters.max_days());
            }
        }
    }

    #[test]
    fn no_transmission_infects_only_index_case() {
        let parameters = Parameters {
            r0: 0.0,
            ..Parameters::default()
        };
        let model = model(Study::Regular, 0, &parameters);
        let mut rng = SimRng::seed_from(5);
        for _ in 0..50 {
            let outcome = model.run_repetition(&mut rng);
            assert_eq!(outcome.infected, 1);
            assert!(outcome.ceased);
            assert!(!outcome.mass_infection);
        }
    }

    #[test]
    fn no_transmission_ceases_within_one_course_of_disease() {
        // Expected course without isolation: 3 exposed, 1 + 1 pre-symptomatic, 7 infectious.
        let parameters = Parameters {
            r0: 0.0,
            ..Parameters::default()
        };
        let course = parameters.exposed_period
            + 2.0 * parameters.presymptomatic_stage_period
            + parameters.infectious_period;
        let summary = model(Study::Regular, 0, &parameters).run(3000, &mut SimRng::seed_from(5));
        assert_eq!(summary.mean_infected, 1.0);
        assert_eq!(summary.mass_infection_probability, 0.0);
        assert!(
            summary.mean_days_to_cessation <= course,
            "mean days to cessation {} exceeds {course}",
            summary.mean_days_to_cessation
        );
        // The exposed and pre-symptomatic stages alone last five days on average.
        assert!(summary.mean_days_to_cessation >= 4.0);
    }

    #[test]
    fn same_seed_same_summary() {
        let parameters = Parameters::default();
        let model = model(Study::Regular, 4, &parameters);
        let first = model.run(200, &mut SimRng::seed_from(42));
        let second = model.run(200, &mut SimRng::seed_from(42));
        assert_eq!(first, second);
        assert_eq!(first.repetitions, 200);
        assert!(first.mean_infected >= 1.0);
        assert!(first.mean_infected <= POPULATION_SIZE as f64);
    }

    #[test]
    fn stalled_repetition_reports_full_length() {
        // No draw ever falls below a transition probability, so the index case stays exposed.
        let parameters = parameters(2);
        let model = model(Study::Regular, 0, &parameters);
        let mut rng = ReplaySource::constant(0.999);
        let outcome = model.run_repetition(&mut rng);
        assert_eq!(
            outcome,
            RepetitionOutcome {
                infected: 1,
                days_to_cessation: 14,
                ceased: false,
                mass_infection: false,
                snapshot_infectious: 0,
                snapshots: 2,
            }
        );
    }

    #[test]
    fn starting_weekday_and_parity_are_drawn() {
        let parameters = Parameters::default();
        let model = model(Study::Regular, 1, &parameters);
        let mut rng = ReplaySource::constant(0.999);
        let repetition = model.start_repetition(&mut rng);
        assert_eq!(repetition.first_weekday(), Weekday::Friday);
        assert_eq!(rng.calls(), 2);
    }

    #[test]
    fn isolations_within_a_week_flag_mass_infection() {
        for (isolated, expected) in [(4, false), (5, true)] {
            let parameters = parameters(2);
            let model = model(Study::Regular, 0, &parameters);
            let mut rng = ReplaySource::constant(0.999);
            let mut repetition = model.start_repetition(&mut rng);
            for index in 1..=isolated {
                repetition.population.isolate(index);
            }
            for _ in 0..7 {
                repetition.step_day(&mut rng);
            }
            assert_eq!(repetition.mass_infection(), expected);
        }
    }

    #[test]
    fn isolation_escalates_testing() {
        let parameters = Parameters::default();
        let model = model(Study::Additional, 1, &parameters);
        let mut rng = ReplaySource::constant(0.999);
        let mut repetition = model.start_repetition(&mut rng);
        repetition.step_day(&mut rng);
        assert!(!repetition.is_escalated());

        repetition.population.isolate(1);
        repetition.step_day(&mut rng);
        assert!(repetition.is_escalated());
        assert_eq!(repetition.escalated_days, 0);
        repetition.step_day(&mut rng);
        repetition.step_day(&mut rng);
        assert_eq!(repetition.escalated_days, 2);
    }

    #[test]
    fn finished_repetition_does_not_advance() {
        let parameters = parameters(1);
        let model = model(Study::Regular, 0, &parameters);
        let mut rng = ReplaySource::constant(0.999);
        let mut repetition = model.start_repetition(&mut rng);
        while repetition.step_day(&mut rng) == RepetitionStatus::Running {}
        assert_eq!(repetition.status(), RepetitionStatus::Completed);
        let calls = rng.calls();
        assert_eq!(repetition.step_day(&mut rng), RepetitionStatus::Completed);
        assert_eq!(rng.calls(), calls);
        assert_eq!(repetition.elapsed_days(), 7);
    }

    #[test]
    fn study_reports_every_scenario_in_order() {
        let parameters = Parameters {
            repetitions: 3,
            ..Parameters::default()
        };
        let mut seen = Vec::new();
        run_study(Study::Additional, &parameters, &mut SimRng::seed_from(1), |summary| {
            seen.push(summary.scenario);
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn study_stops_on_first_error() {
        let parameters = Parameters {
            repetitions: 1,
            ..Parameters::default()
        };
        let mut calls = 0;
        let result = run_study(Study::Regular, &parameters, &mut SimRng::seed_from(1), |_| {
            calls += 1;
            Err(SimError::ReportError("closed".to_string()))
        });
        assert!(matches!(result, Err(SimError::ReportError(_))));
        assert_eq!(calls, 1);
    }
}
