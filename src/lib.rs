//! A stochastic model of testing and quarantine policies in a closed cohort.
//!
//! A cohort of [`POPULATION_SIZE`](population::POPULATION_SIZE) people shares a room every day.
//! One exposed individual enters and the infection spreads through a staged SEIR model
//! (susceptible, exposed, two pre-symptomatic stages, symptomatic or asymptomatic infectious,
//! recovered), advanced in small sub-steps of a day. Every day, symptomatic individuals are
//! isolated and, depending on the scenario, the cohort is tested by PCR or antigen tests whose
//! sensitivity depends on the stage of disease. Isolated individuals stop transmitting.
//!
//! Each scenario is repeated many times, and the repetitions are summarized by
//! * the mean number of infected individuals,
//! * the mean number of days until no infection is left,
//! * the mean number of infectious individuals seen on Saturdays,
//! * the probability that more than a handful of people were isolated within one week.
//!
//! The crate is organized as:
//! * [`disease`] and [`population`]: the states and the cohort,
//! * [`infection`]: the daily stochastic update,
//! * [`testing`] and [`scenario`]: tests and the policies that schedule them,
//! * [`driver`] and [`aggregate`]: repetitions, scenarios and their statistics,
//! * [`parameters`], [`runner`] and [`report`]: configuration, command line and CSV output.
pub mod aggregate;
pub mod disease;
pub mod driver;
pub mod error;
pub mod infection;
pub mod log;
mod macros;
pub mod numeric;
pub mod parameters;
pub mod population;
pub mod random;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod testing;

pub use driver::{run_study, Model, Repetition, RepetitionOutcome, RepetitionStatus};
pub use error::SimError;
pub use parameters::Parameters;
pub use runner::{run_with_args, BaseArgs};
pub use scenario::Study;
