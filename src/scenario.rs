//! Testing policies and the two studies that compare them.
//!
//! A [`ScenarioConfig`] describes one policy: which test runs on which day of the week, how an
//! outbreak escalates testing once the first case has been isolated, how sensitive the antigen
//! test is relative to PCR and when delayed PCR results are disclosed. Which test runs on a given
//! day is decided by the pure function [`scheduled_test`].
use clap::ValueEnum;
use serde::Serialize;
use strum::Display;

use crate::parameters::Parameters;
use crate::testing::DisclosureRule;

/// The day of the week. A repetition starts on a random weekday.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum Weekday {
    Saturday,
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    const ALL: [Weekday; 7] = [
        Weekday::Saturday,
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    /// Day `day` counted from a Saturday.
    #[must_use]
    pub fn from_day(day: u32) -> Self {
        Self::ALL[(day % 7) as usize]
    }
}

/// The test performed on a day, if any.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum TestAction {
    None,
    Antigen,
    /// PCR whose result is disclosed later.
    Pcr,
    /// PCR whose result is available immediately.
    PcrZeroReadTime,
}

/// The testing routine before any case has been isolated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RoutineTesting {
    /// Symptom checks only.
    None,
    /// PCR on Fridays of every other week. The weeks are chosen per repetition.
    BiweeklyPcr,
    /// PCR every Friday.
    WeeklyPcr,
    /// Antigen tests on Tuesdays and Fridays.
    TwiceWeeklyAntigen,
}

/// Testing after the first isolation. Once escalated, a repetition never returns to its
/// routine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Escalation {
    pub test: TestAction,
    /// Test on every other escalated day instead of daily.
    pub every_other_day: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioConfig {
    /// Position of the scenario in its study.
    pub index: usize,
    pub description: &'static str,
    pub routine: RoutineTesting,
    pub escalation: Option<Escalation>,
    /// Antigen sensitivity as a fraction of PCR sensitivity.
    pub antigen_scale: f64,
    /// Disclosure of delayed PCR results, run daily after the symptom check.
    pub disclosure: Option<DisclosureRule>,
    /// Whether the weekly mass-infection check also covers the week in which the outbreak
    /// ceased.
    pub mass_check_on_final_week: bool,
}

/// Everything [`scheduled_test`] needs to know about a day.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TestDay {
    pub weekday: Weekday,
    /// Week of the repetition, from 0.
    pub week: u32,
    /// Parity of the weeks in which bi-weekly PCR runs.
    pub pcr_week_parity: u32,
    /// Whether a case has been isolated in an earlier day of this repetition.
    pub escalated: bool,
    /// Escalated days before this one.
    pub escalated_days: u32,
}

/// The test `scenario` performs on `day`.
#[must_use]
pub fn scheduled_test(scenario: &ScenarioConfig, day: &TestDay) -> TestAction {
    if let (true, Some(escalation)) = (day.escalated, scenario.escalation) {
        return if escalation.every_other_day && day.escalated_days % 2 != 0 {
            TestAction::None
        } else {
            escalation.test
        };
    }

    match scenario.routine {
        RoutineTesting::None => TestAction::None,
        RoutineTesting::BiweeklyPcr
            if day.weekday == Weekday::Friday && day.week % 2 == day.pcr_week_parity =>
        {
            TestAction::Pcr
        }
        RoutineTesting::WeeklyPcr if day.weekday == Weekday::Friday => TestAction::Pcr,
        RoutineTesting::TwiceWeeklyAntigen
            if matches!(day.weekday, Weekday::Tuesday | Weekday::Friday) =>
        {
            TestAction::Antigen
        }
        _ => TestAction::None,
    }
}

/// The two studies. Each evaluates six scenarios.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, ValueEnum, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Study {
    /// Routine testing cadences compared against symptom checks alone.
    #[default]
    Regular,
    /// Twice-weekly antigen routine with different escalations after the first isolation.
    Additional,
}

impl Study {
    /// The scenarios of this study, in output order.
    #[must_use]
    pub fn scenarios(self, parameters: &Parameters) -> Vec<ScenarioConfig> {
        match self {
            Study::Regular => regular_scenarios(parameters),
            Study::Additional => additional_scenarios(),
        }
    }
}

fn regular_scenarios(parameters: &Parameters) -> Vec<ScenarioConfig> {
    let base = ScenarioConfig {
        index: 0,
        description: "daily symptom check only",
        routine: RoutineTesting::None,
        escalation: None,
        antigen_scale: 0.70,
        disclosure: Some(DisclosureRule::AfterReadTime(parameters.pcr_read_time)),
        mass_check_on_final_week: true,
    };
    vec![
        base.clone(),
        ScenarioConfig {
            index: 1,
            description: "bi-weekly PCR",
            routine: RoutineTesting::BiweeklyPcr,
            ..base.clone()
        },
        ScenarioConfig {
            index: 2,
            description: "weekly PCR",
            routine: RoutineTesting::WeeklyPcr,
            ..base.clone()
        },
        ScenarioConfig {
            index: 3,
            description: "twice-weekly antigen, 35% relative sensitivity",
            routine: RoutineTesting::TwiceWeeklyAntigen,
            antigen_scale: 0.35,
            ..base.clone()
        },
        ScenarioConfig {
            index: 4,
            description: "twice-weekly antigen, 50% relative sensitivity",
            routine: RoutineTesting::TwiceWeeklyAntigen,
            antigen_scale: 0.5,
            ..base.clone()
        },
        ScenarioConfig {
            index: 5,
            description: "twice-weekly antigen, 70% relative sensitivity",
            routine: RoutineTesting::TwiceWeeklyAntigen,
            ..base
        },
    ]
}

fn additional_scenarios() -> Vec<ScenarioConfig> {
    let escalations = [
        ("daily antigen", TestAction::Antigen, false),
        ("daily PCR, one day read time", TestAction::Pcr, false),
        ("daily PCR, zero read time", TestAction::PcrZeroReadTime, false),
        ("antigen every other day", TestAction::Antigen, true),
        ("PCR every other day, one day read time", TestAction::Pcr, true),
        ("PCR every other day, zero read time", TestAction::PcrZeroReadTime, true),
    ];
    escalations
        .into_iter()
        .enumerate()
        .map(|(index, (description, test, every_other_day))| ScenarioConfig {
            index,
            description,
            routine: RoutineTesting::TwiceWeeklyAntigen,
            escalation: Some(Escalation {
                test,
                every_other_day,
            }),
            antigen_scale: 0.5,
            // Delayed results are read the next day.
            disclosure: (test == TestAction::Pcr).then_some(DisclosureRule::EveryDay),
            mass_check_on_final_week: false,
        })
        .collect()
}
