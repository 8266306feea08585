//! Scenario-level statistics accumulated over repetitions.
use serde::Serialize;

use crate::driver::RepetitionOutcome;
use crate::numeric::{format_general, ratio};
use crate::scenario::{ScenarioConfig, Study};

/// The columns printed for each scenario.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// `meanInfected meanMassInfectionProbability`
    Brief,
    /// `meanInfected meanDaysToCessation meanWeeklySnapshotInfected meanMassInfectionProbability`
    Detailed,
}

impl From<Study> for OutputFormat {
    fn from(study: Study) -> Self {
        match study {
            Study::Regular => OutputFormat::Detailed,
            Study::Additional => OutputFormat::Brief,
        }
    }
}

/// Running sums over the repetitions of one scenario.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ScenarioTally {
    repetitions: u64,
    infected: u64,
    days_to_cessation: u64,
    mass_infections: u64,
    snapshot_infectious: u64,
    snapshots: u64,
}

impl ScenarioTally {
    pub fn record(&mut self, outcome: &RepetitionOutcome) {
        self.repetitions += 1;
        self.infected += outcome.infected as u64;
        self.days_to_cessation += u64::from(outcome.days_to_cessation);
        self.mass_infections += u64::from(outcome.mass_infection);
        self.snapshot_infectious += outcome.snapshot_infectious;
        self.snapshots += outcome.snapshots;
    }

    #[must_use]
    pub fn repetitions(&self) -> u64 {
        self.repetitions
    }

    #[must_use]
    pub fn summarize(&self, study: Study, scenario: &ScenarioConfig) -> ScenarioSummary {
        ScenarioSummary {
            study,
            scenario: scenario.index,
            description: scenario.description.to_string(),
            repetitions: self.repetitions,
            mean_infected: ratio(self.infected, self.repetitions),
            mean_days_to_cessation: ratio(self.days_to_cessation, self.repetitions),
            mean_weekly_snapshot_infected: ratio(self.snapshot_infectious, self.snapshots),
            mass_infection_probability: ratio(self.mass_infections, self.repetitions),
        }
    }
}

/// The result record of one scenario.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub study: Study,
    pub scenario: usize,
    pub description: String,
    pub repetitions: u64,
    pub mean_infected: f64,
    /// Repetitions that never ceased contribute the length of a repetition in days.
    pub mean_days_to_cessation: f64,
    /// Mean number of non-isolated infectious individuals on Saturdays, over all repetitions.
    pub mean_weekly_snapshot_infected: f64,
    pub mass_infection_probability: f64,
}

impl ScenarioSummary {
    /// The space separated output line of this scenario.
    #[must_use]
    pub fn format_line(&self, format: OutputFormat) -> String {
        let columns: Vec<f64> = match format {
            OutputFormat::Brief => vec![self.mean_infected, self.mass_infection_probability],
            OutputFormat::Detailed => vec![
                self.mean_infected,
                self.mean_days_to_cessation,
                self.mean_weekly_snapshot_infected,
                self.mass_infection_probability,
            ],
        };
        columns
            .into_iter()
            .map(format_general)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parameters::Parameters;

    fn outcome(infected: usize, days: u32, mass: bool, snapshots: (u64, u64)) -> RepetitionOutcome {
        RepetitionOutcome {
            infected,
            days_to_cessation: days,
            ceased: true,
            mass_infection: mass,
            snapshot_infectious: snapshots.0,
            snapshots: snapshots.1,
        }
    }

    #[test]
    fn means_over_repetitions() {
        let scenario = &Study::Regular.scenarios(&Parameters::default())[0];
        let mut tally = ScenarioTally::default();
        tally.record(&outcome(1, 10, false, (0, 2)));
        tally.record(&outcome(4, 20, true, (3, 1)));
        tally.record(&outcome(1, 15, false, (0, 1)));
        tally.record(&outcome(2, 3, false, (1, 0)));
        let summary = tally.summarize(Study::Regular, scenario);

        assert_eq!(summary.repetitions, 4);
        assert_eq!(summary.mean_infected, 2.0);
        assert_eq!(summary.mean_days_to_cessation, 12.0);
        assert_eq!(summary.mean_weekly_snapshot_infected, 1.0);
        assert_eq!(summary.mass_infection_probability, 0.25);
        assert_eq!(summary.format_line(OutputFormat::Detailed), "2 12 1 0.25");
        assert_eq!(summary.format_line(OutputFormat::Brief), "2 0.25");
    }

    #[test]
    fn empty_tally_summarizes_to_zero() {
        let scenario = &Study::Additional.scenarios(&Parameters::default())[2];
        let summary = ScenarioTally::default().summarize(Study::Additional, scenario);
        assert_eq!(summary.scenario, 2);
        assert_eq!(summary.format_line(OutputFormat::Brief), "0 0");
    }

    #[test]
    fn study_selects_format() {
        assert_eq!(OutputFormat::from(Study::Regular), OutputFormat::Detailed);
        assert_eq!(OutputFormat::from(Study::Additional), OutputFormat::Brief);
    }
}
