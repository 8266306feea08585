//! Model constants and the per-sub-step transition probabilities derived from them.
//!
//! Every constant of the study lives in [`Parameters`]. The defaults are the values used by the
//! two studies in [`crate::scenario::Study`]; a JSON file can override any subset of them.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SimError;
use crate::population::POPULATION_SIZE;
use crate::scenario::Study;
use crate::testing::SensitivityTable;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    /// Basic reproduction number.
    pub r0: f64,
    /// Mean days spent exposed before becoming infectious.
    pub exposed_period: f64,
    /// Mean days spent in each of the two pre-symptomatic stages.
    pub presymptomatic_stage_period: f64,
    /// Mean days spent infectious after the pre-symptomatic stages.
    pub infectious_period: f64,
    /// Probability that a case develops symptoms (eta).
    pub symptomatic_fraction: f64,
    /// Number of sub-steps a simulated day is divided into.
    pub sub_steps: u32,
    /// Length of a repetition in weeks.
    pub max_weeks: u32,
    /// Repetitions per scenario.
    pub repetitions: u32,
    /// A week with more new isolations than this is a mass infection event.
    pub mass_infection_threshold: usize,
    /// Days between a delayed PCR test and the disclosure of its result.
    pub pcr_read_time: u32,
    /// PCR sensitivity by disease stage. Antigen sensitivities are scaled from it.
    pub pcr_sensitivity: SensitivityTable,
    /// Seed of the random stream shared by the whole run.
    pub seed: u64,
}

/// Per-sub-step transition probabilities.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TransitionRates {
    /// Infection probability per infectious individual.
    pub beta: f64,
    /// E -> P1
    pub sigma: f64,
    /// P1 -> P2 and P2 -> Is/Ia
    pub rho: f64,
    /// Is/Ia -> R
    pub gamma: f64,
    /// Probability that P2 branches to Is.
    pub eta: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            r0: 5.0,
            exposed_period: 3.0,
            presymptomatic_stage_period: 1.0,
            infectious_period: 7.0,
            symptomatic_fraction: 0.54,
            sub_steps: 100,
            max_weeks: 38,
            repetitions: 10_000,
            mass_infection_threshold: 4,
            pcr_read_time: 3,
            pcr_sensitivity: SensitivityTable::PCR,
            seed: 1,
        }
    }
}

impl Parameters {
    /// The defaults of `study`. The additional-testing study models a variant with a one day
    /// exposed period.
    #[must_use]
    pub fn for_study(study: Study) -> Self {
        match study {
            Study::Regular => Parameters::default(),
            Study::Additional => Parameters {
                exposed_period: 1.0,
                ..Parameters::default()
            },
        }
    }

    /// Loads parameters from a JSON file. Fields missing from the file keep the defaults of
    /// `study`.
    ///
    /// # Errors
    ///
    /// Returns a `SimError` if the file can't be read, isn't valid JSON, names an unknown field
    /// or holds invalid values.
    pub fn load(path: &Path, study: Study) -> Result<Self, SimError> {
        let contents = fs::read_to_string(path)?;
        let overrides: Value = serde_json::from_str(&contents)?;
        Self::with_overrides(study, overrides)
    }

    /// Applies the fields of a JSON object on top of the defaults of `study`.
    ///
    /// # Errors
    ///
    /// Returns a `SimError` if `overrides` is not an object, names an unknown field or produces
    /// invalid parameters.
    pub fn with_overrides(study: Study, overrides: Value) -> Result<Self, SimError> {
        let Value::Object(overrides) = overrides else {
            return Err(SimError::InvalidParameter(
                "parameter overrides must be a JSON object".to_string(),
            ));
        };
        let mut merged = serde_json::to_value(Parameters::for_study(study))?;
        if let Value::Object(fields) = &mut merged {
            for (key, value) in overrides {
                merge_value(fields.entry(key).or_insert(Value::Null), value);
            }
        }
        let parameters: Parameters = serde_json::from_value(merged)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Number of simulated days in a repetition that never ceases.
    #[must_use]
    pub fn max_days(&self) -> u32 {
        self.max_weeks * 7
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<(), SimError> {
        fn invalid(message: String) -> Result<(), SimError> {
            Err(SimError::InvalidParameter(message))
        }

        if !(self.r0.is_finite() && self.r0 >= 0.0) {
            return invalid(format!("r0 must be finite and non-negative, got {}", self.r0));
        }
        for (name, period) in [
            ("exposed_period", self.exposed_period),
            ("presymptomatic_stage_period", self.presymptomatic_stage_period),
            ("infectious_period", self.infectious_period),
        ] {
            if !(period.is_finite() && period > 0.0) {
                return invalid(format!("{name} must be positive, got {period}"));
            }
        }
        if !(0.0..=1.0).contains(&self.symptomatic_fraction) {
            return invalid(format!(
                "symptomatic_fraction must lie in [0, 1], got {}",
                self.symptomatic_fraction
            ));
        }
        if self.sub_steps == 0 {
            return invalid("sub_steps must be positive".to_string());
        }
        if self.max_weeks == 0 {
            return invalid("max_weeks must be positive".to_string());
        }
        if self.repetitions == 0 {
            return invalid("repetitions must be positive".to_string());
        }
        self.pcr_sensitivity.validate()?;

        let rates = self.transition_rates();
        let force_at_full_pressure = rates.beta * POPULATION_SIZE as f64;
        for (name, p) in [
            ("sigma", rates.sigma),
            ("rho", rates.rho),
            ("gamma", rates.gamma),
            ("beta * population", force_at_full_pressure),
        ] {
            if p > 1.0 {
                return invalid(format!(
                    "{name} per sub-step is {p}, increase sub_steps or lengthen the periods"
                ));
            }
        }
        Ok(())
    }

    /// Converts the mean durations into per-sub-step probabilities.
    ///
    /// Transmission is frequency dependent: `beta` spreads `r0` over the whole infectious
    /// period (both pre-symptomatic stages plus the infectious period) and the cohort.
    #[must_use]
    pub fn transition_rates(&self) -> TransitionRates {
        let delta = 1.0 / f64::from(self.sub_steps);
        let total_infectious_period =
            2.0 * self.presymptomatic_stage_period + self.infectious_period;
        TransitionRates {
            beta: delta * self.r0 / total_infectious_period / POPULATION_SIZE as f64,
            sigma: delta / self.exposed_period,
            rho: delta / self.presymptomatic_stage_period,
            gamma: delta / self.infectious_period,
            eta: self.symptomatic_fraction,
        }
    }
}

fn merge_value(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                merge_value(target.entry(key).or_insert(Value::Null), value);
            }
        }
        (target, source) => *target = source,
    }
}
