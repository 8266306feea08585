use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

use crate::aggregate::OutputFormat;
use crate::driver::run_study;
use crate::error::SimError;
use crate::log::{info, set_log_level, set_module_filters, LevelFilter};
use crate::parameters::Parameters;
use crate::random::SimRng;
use crate::report::SummaryReport;
use crate::scenario::Study;
use clap::{Args, Command, FromArgMatches as _};

/// Command line arguments of the simulation
#[derive(Args, Debug, Default)]
pub struct BaseArgs {
    /// Which study to run
    #[arg(long, value_enum, default_value_t = Study::Regular)]
    pub study: Study,

    /// Random seed, overriding the configured one
    #[arg(short, long)]
    pub random_seed: Option<u64>,

    /// Number of repetitions per scenario, overriding the configured one
    #[arg(short = 'n', long)]
    pub repetitions: Option<u32>,

    /// Optional path for a JSON parameter file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Optional directory for the CSV summary report
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Enable logging at a level (`info`), or per module (`info,cohort_quarantine::testing=trace`)
    #[arg(long)]
    pub log_level: Option<String>,
}

fn create_cli() -> Command {
    let cli = Command::new("cohort-quarantine")
        .about("Simulates testing and quarantine policies in a cohort of 50 people");
    BaseArgs::augment_args(cli)
}

/// Runs the simulation with arguments from the command line, printing one line per scenario
/// to standard output.
///
/// # Errors
/// Returns an error if argument parsing, configuration or report writing fails
#[allow(clippy::missing_errors_doc)]
pub fn run_with_args() -> Result<(), Box<dyn std::error::Error>> {
    let matches = create_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    let stdout = io::stdout();
    run_with_args_internal(args, &mut stdout.lock())?;
    Ok(())
}

/// Resolves the parameters the arguments describe: the defaults of the study, then the config
/// file, then the command line overrides.
///
/// # Errors
/// Returns a `SimError` if the config file can't be loaded or the result is invalid
pub fn resolve_parameters(args: &BaseArgs) -> Result<Parameters, SimError> {
    let mut parameters = match &args.config {
        Some(path) => {
            info!("loading parameters from {}", path.display());
            Parameters::load(path, args.study)?
        }
        None => Parameters::for_study(args.study),
    };
    if let Some(seed) = args.random_seed {
        parameters.seed = seed;
    }
    if let Some(repetitions) = args.repetitions {
        parameters.repetitions = repetitions;
    }
    parameters.validate()?;
    Ok(parameters)
}

/// Applies a `--log-level` value: a comma separated list of global levels and `module=level`
/// filters.
///
/// # Errors
/// Returns `SimError::InvalidParameter` if a level can't be parsed
pub fn configure_logging(directives: &str) -> Result<(), SimError> {
    let parse = |level: &str| {
        LevelFilter::from_str(level.trim())
            .map_err(|_| SimError::InvalidParameter(format!("unknown log level '{level}'")))
    };
    let mut modules = Vec::new();
    for directive in directives.split(',').filter(|d| !d.trim().is_empty()) {
        match directive.split_once('=') {
            Some((module, level)) => modules.push((module.trim().to_string(), parse(level)?)),
            None => set_log_level(parse(directive)?),
        }
    }
    if !modules.is_empty() {
        set_module_filters(&modules);
    }
    Ok(())
}

/// Runs the study `args` selects and writes its result lines to `out`.
///
/// # Errors
/// Returns a `SimError` if configuration, writing to `out` or report writing fails
pub fn run_with_args_internal(args: BaseArgs, out: &mut impl Write) -> Result<(), SimError> {
    if let Some(directives) = &args.log_level {
        configure_logging(directives)?;
    }
    let parameters = resolve_parameters(&args)?;

    let mut report = match &args.output_dir {
        Some(dir) => Some(SummaryReport::create(dir)?),
        None => None,
    };

    let mut rng = SimRng::seed_from(parameters.seed);
    let format = OutputFormat::from(args.study);
    info!(
        "running the {} study with seed {} and {} repetitions per scenario",
        args.study, parameters.seed, parameters.repetitions
    );
    run_study(args.study, &parameters, &mut rng, |summary| {
        writeln!(out, "{}", summary.format_line(format))?;
        if let Some(report) = report.as_mut() {
            report.send(&summary)?;
        }
        Ok(())
    })?;
    out.flush()?;
    Ok(())
}
