//! Daily disease progression.
//!
//! A day is divided into `sub_steps` sub-steps. In each sub-step the force of infection is
//! taken from the current counts and every individual, in order, draws one uniform value that
//! decides whether it moves to its next stage. Leaving `P2` spends a second draw to choose
//! between the symptomatic and the asymptomatic branch. The number and order of draws is fixed
//! so that a seeded run is reproducible.
use crate::disease::DiseaseState;
use crate::parameters::TransitionRates;
use crate::population::Population;
use crate::random::RandomSource;

/// Advances every individual, isolated or not, by one day.
pub fn advance_one_day(
    population: &mut Population,
    rates: &TransitionRates,
    sub_steps: u32,
    rng: &mut impl RandomSource,
) {
    for _ in 0..sub_steps {
        advance_sub_step(population, rates, rng);
    }
}

fn advance_sub_step(
    population: &mut Population,
    rates: &TransitionRates,
    rng: &mut impl RandomSource,
) {
    // Isolated carriers are counted as quarantined and exert no pressure.
    let force_of_infection = rates.beta * population.counts().infectious() as f64;

    for index in 0..population.len() {
        let state = population.individuals()[index].state();
        let draw = rng.next_uniform();
        let threshold = match state {
            DiseaseState::S => force_of_infection,
            DiseaseState::E => rates.sigma,
            DiseaseState::P1 | DiseaseState::P2 => rates.rho,
            DiseaseState::Is | DiseaseState::Ia => rates.gamma,
            DiseaseState::R => continue,
        };
        if draw >= threshold {
            continue;
        }
        let symptomatic = state == DiseaseState::P2 && rng.next_uniform() < rates.eta;
        if let Some(next) = state.next(symptomatic) {
            population.progress(index, next);
        }
    }
}
