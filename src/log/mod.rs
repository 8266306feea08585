//! The `log` module configures the crate's diagnostic logging. Logging is strictly separate from
//! the simulation results: the result lines are written to standard output by the runner, while
//! log messages go to standard error so that they never interleave with the results.
//!
//! This module (re)exports the five logging macros: `error!`, `warn!`, `info!`, `debug!` and
//! `trace!` where `error!` represents the highest-priority log messages and `trace!` the lowest.
//!
//! Logging is _disabled_ by default. It can be enabled by passing the command line option
//! `--log-level <level>`, or programmatically:
//!
//!  - `enable_logging()`: turns on all log messages
//!  - `disable_logging()`: turns off all log messages
//!  - `set_log_level(level: LevelFilter)`: enables only log messages with priority at least `level`
//!
//! Per-module filtering of messages can be configured using `set_module_filter()` /
//! `set_module_filters()` and `remove_module_filter()`:
//!
//! ```rust
//! use cohort_quarantine::log::{set_module_filter, set_log_level, LevelFilter};
//!
//! pub fn setup_logging() {
//!     // Enable `info` log messages globally.
//!     set_log_level(LevelFilter::Info);
//!     // Show every isolation event.
//!     set_module_filter("cohort_quarantine::testing", LevelFilter::Trace);
//! }
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

#[cfg(feature = "logging")]
use log4rs::Handle;
use std::sync::LazyLock;
use std::sync::{Mutex, MutexGuard};

// Logging disabled
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

/// A global instance of the logging configuration.
static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// Different log level filters can be applied to the log messages emitted from different modules
/// according to the module path (e.g. `"cohort_quarantine::driver"`).
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    /// The module path this configuration applies to
    module: String,
    /// The maximum log level for this module path
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// Holds logging configuration: the filter levels of modules and a handle to the global logger.
///
/// Because loggers are globally installed, only one instance of this struct should exist. The
/// public API are free functions which fetch the singleton and call the appropriate member
/// function.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// The level filter for modules without an explicitly set filter. A global filter level of
    /// `LevelFilter::Off` disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_configurations: FxHashMap<String, ModuleLogConfiguration>,

    #[cfg(feature = "logging")]
    /// Handle to the `log4rs` logger.
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations: FxHashMap::default(),

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    pub(in crate::log) fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the configuration was mutated, false otherwise.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                let module_config = entry.get_mut();
                if module_config.level == level {
                    return false;
                }
                module_config.level = level;
            }

            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
            }
        }
        true
    }

    pub(in crate::log) fn set_module_filter(&mut self, module: &str, level: LevelFilter) {
        if self.insert_module_filter(module, level) {
            self.set_config();
        }
    }

    pub(in crate::log) fn set_module_filters<S: AsRef<str>>(
        &mut self,
        module_filters: &[(S, LevelFilter)],
    ) {
        let mut mutated: bool = false;
        for (module, level) in module_filters {
            mutated |= self.insert_module_filter(module.as_ref(), *level);
        }
        if mutated {
            self.set_config();
        }
    }

    pub(in crate::log) fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

// The public API

/// Enables the logger with no global level filter / full logging. Equivalent to
/// `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Disables logging completely. Equivalent to `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the global log level. A global filter level of `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    let mut log_configuration = get_log_configuration();
    log_configuration.set_log_level(level);
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    let mut log_configuration = get_log_configuration();
    log_configuration.set_module_filter(module_path, level_filter);
}

/// Removes a module-specific level filter for the given module path. The global level filter will
/// apply to the module.
pub fn remove_module_filter(module_path: &str) {
    let mut log_configuration = get_log_configuration();
    log_configuration.remove_module_filter(module_path);
}

/// Sets the level filters for a set of modules. Use this instead of `set_module_filter()` to set
/// filters in bulk.
pub fn set_module_filters<S: AsRef<str>>(module_filters: &[(S, LevelFilter)]) {
    let mut log_configuration = get_log_configuration();
    log_configuration.set_module_filters(module_filters);
}

/// Fetches a mutable reference to the global `LogConfiguration`.
fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}
