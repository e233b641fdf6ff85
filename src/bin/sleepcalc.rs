//! Sleep Calc CLI - Command-line interface for the Sleep Calc calculators
//!
//! Commands:
//! - sleep: Bedtimes or wake times in whole sleep cycles
//! - caffeine: Remaining caffeine and bedtime advice
//! - jetlag: Day-by-day jet lag adjustment plan
//! - config: Print the effective configuration

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use sleep_calc::api::{CaffeineReport, CaffeineRequest, IntakeRequest, JetLagRequest, SleepReport, SleepRequest};
use sleep_calc::caffeine::CaffeineSource;
use sleep_calc::types::{CycleDirection, JetLagPlan, ScheduleTime, TravelDirection};
use sleep_calc::{CalcError, Calculator, CalculatorConfig, TimeZoneOffset, WallClock, VERSION};

/// Sleep Calc - sleep cycle, caffeine and jet lag calculators
#[derive(Parser)]
#[command(name = "sleepcalc")]
#[command(version = VERSION)]
#[command(about = "Sleep cycle, caffeine and jet lag calculators", long_about = None)]
struct Cli {
    /// Configuration file (JSON) overriding the default constants
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (text on a terminal, JSON otherwise)
    #[arg(long, global = true)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bedtimes for a wake time, or wake times for a bedtime
    #[command(group(ArgGroup::new("anchor").required(true).args(["wake", "bedtime", "now"])))]
    Sleep {
        /// Time you need to wake up (HH:MM or h:mm AM/PM)
        #[arg(long)]
        wake: Option<String>,

        /// Time you plan to go to bed
        #[arg(long)]
        bedtime: Option<String>,

        /// Go to bed now
        #[arg(long)]
        now: bool,

        /// Age in years, for age-based recommendations
        #[arg(long)]
        age: Option<f64>,
    },

    /// Remaining caffeine and when it is safe to sleep
    Caffeine {
        /// Dose as MG@HH:MM, e.g. 95@09:00 (repeatable)
        #[arg(long = "intake")]
        intakes: Vec<String>,

        /// Preset dose as NAME@HH:MM, e.g. espresso@14:00 (repeatable)
        #[arg(long = "preset")]
        presets: Vec<String>,

        /// Time to evaluate the remaining caffeine at
        #[arg(long)]
        at: String,
    },

    /// Jet lag adjustment plan
    Jetlag {
        /// Origin UTC offset, e.g. -5, UTC-5 or +05:30
        #[arg(long, allow_hyphen_values = true)]
        from: String,

        /// Destination UTC offset
        #[arg(long, allow_hyphen_values = true)]
        to: String,

        /// Departure date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Departure time (HH:MM)
        #[arg(long)]
        time: String,

        /// Arrival date (defaults to the day after departure)
        #[arg(long)]
        arrival_date: Option<String>,

        /// Arrival time
        #[arg(long)]
        arrival_time: Option<String>,
    },

    /// Print the effective configuration as JSON
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable table
    Text,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliErrorReport::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;
    let calculator = Calculator::with_config(config)?;
    let format = cli.format.unwrap_or_else(|| {
        if atty::is(atty::Stream::Stdout) {
            OutputFormat::Text
        } else {
            OutputFormat::Json
        }
    });

    match cli.command {
        Commands::Sleep { wake, bedtime, now, age } => cmd_sleep(&calculator, wake, bedtime, now, age, format),
        Commands::Caffeine { intakes, presets, at } => cmd_caffeine(&calculator, &intakes, &presets, at, format),
        Commands::Jetlag {
            from,
            to,
            date,
            time,
            arrival_date,
            arrival_time,
        } => {
            let request = JetLagRequest {
                from_offset: TimeZoneOffset::parse(&from)?,
                to_offset: TimeZoneOffset::parse(&to)?,
                departure_date: date,
                departure_time: time,
                arrival_date,
                arrival_time,
            };
            let plan = calculator.jet_lag_plan(&request)?;
            emit(&plan, format, render_plan)
        }
        Commands::Config => {
            println!("{}", calculator.config().to_json()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<CalculatorConfig, CliError> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            tracing::info!(path = %path.display(), "loaded configuration");
            Ok(CalculatorConfig::from_json(&json)?)
        }
        None => Ok(CalculatorConfig::default()),
    }
}

fn cmd_sleep(
    calculator: &Calculator,
    wake: Option<String>,
    bedtime: Option<String>,
    now: bool,
    age: Option<f64>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let report = if now {
        let current = WallClock::from(chrono::Local::now().time());
        calculator.sleep_now(current, age)
    } else {
        let (anchor, direction) = match (wake, bedtime) {
            (Some(wake), _) => (wake, CycleDirection::FromWake),
            (None, Some(bedtime)) => (bedtime, CycleDirection::FromBed),
            (None, None) => return Err(CliError::Usage("one of --wake, --bedtime or --now is required".into())),
        };
        calculator.sleep_options(&SleepRequest {
            anchor,
            direction,
            age_years: age,
        })?
    };

    emit(&report, format, render_sleep)
}

fn cmd_caffeine(
    calculator: &Calculator,
    intakes: &[String],
    presets: &[String],
    at: String,
    format: OutputFormat,
) -> Result<(), CliError> {
    let mut requests = Vec::with_capacity(intakes.len() + presets.len());

    for raw in intakes {
        let (amount, time) = split_dose(raw)?;
        let amount_mg: f64 = amount
            .trim()
            .parse()
            .map_err(|_| CliError::Usage(format!("invalid dose amount in '{}'", raw)))?;
        requests.push(IntakeRequest {
            amount_mg,
            time: time.to_string(),
        });
    }

    for raw in presets {
        let (name, time) = split_dose(raw)?;
        let source: CaffeineSource = name.parse()?;
        requests.push(IntakeRequest {
            amount_mg: source.amount_mg(),
            time: time.to_string(),
        });
    }

    let report = calculator.caffeine_report(&CaffeineRequest {
        intakes: requests,
        query_time: at,
    })?;

    emit(&report, format, render_caffeine)
}

fn split_dose(raw: &str) -> Result<(&str, &str), CliError> {
    raw.split_once('@')
        .ok_or_else(|| CliError::Usage(format!("expected AMOUNT@HH:MM, got '{}'", raw)))
}

// Output

fn emit<T: Serialize>(value: &T, format: OutputFormat, render: fn(&T) -> String) -> Result<(), CliError> {
    let output = match format {
        OutputFormat::Text => render(value),
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    };
    println!("{}", output);
    Ok(())
}

fn render_sleep(report: &SleepReport) -> String {
    let mut out = match report.direction {
        CycleDirection::FromWake => format!("To wake up at {}, go to bed at:\n", report.anchor.format_12h()),
        CycleDirection::FromBed => format!("Going to bed at {}, wake up at:\n", report.anchor.format_12h()),
    };

    for option in &report.options {
        let marker = if option.is_recommended_for_age { "*" } else { " " };
        out.push_str(&format!(
            "{} {:>8}  {:>2} cycles  {:>4.1} h  {}\n",
            marker,
            option.target_time.format_12h(),
            option.cycles,
            option.total_sleep_hours,
            option.rating.as_str()
        ));
    }

    if let Some(band) = &report.age_recommendation {
        out.push_str(&format!(
            "\n* recommended for {}: {}-{} hours ({}-{} cycles)\n",
            band.age_group_label, band.min_hours, band.max_hours, band.min_cycles, band.max_cycles
        ));
    }
    out
}

fn render_caffeine(report: &CaffeineReport) -> String {
    let mut out = format!(
        "Caffeine at {}: {} mg (of {} mg taken)\n",
        report.query_time.format_12h(),
        report.remaining_mg,
        report.total_intake_mg
    );
    out.push_str(&format!(
        "Below the sleep threshold at {} ({:.1} h from now)\n",
        report.sleep_safe_at.format_12h(),
        report.hours_until_sleep_safe
    ));

    if let Some(last) = report.last_intake_time {
        out.push_str(&format!("\nBedtime after last dose ({}):\n", last.format_12h()));
        for option in &report.bedtime_options {
            out.push_str(&format!(
                "  +{:>4.1} h  {:>8}  {:>4} mg  {}\n",
                option.wait_hours,
                option.bedtime.format_12h(),
                option.remaining_mg,
                option.quality.as_str()
            ));
        }
    }
    out
}

fn render_plan(plan: &JetLagPlan) -> String {
    let mut out = format!(
        "{} hours {} ({} jet lag), {} preparation days, {} recovery days\n\n",
        plan.hours_diff,
        match plan.direction {
            TravelDirection::Eastward => "east",
            TravelDirection::Westward => "west",
        },
        plan.severity.as_str(),
        plan.preparation_days,
        plan.recovery_days
    );

    let show = |t: &ScheduleTime| match t {
        ScheduleTime::At(time) => time.format_12h(),
        ScheduleTime::InTransit => "in transit".to_string(),
    };

    for day in &plan.days {
        out.push_str(&format!(
            "{}  {:<24} bed {:>10}  wake {:>10}\n    {}\n    {}\n",
            day.date,
            day.label,
            show(&day.bedtime),
            show(&day.waketime),
            day.light_exposure_guidance,
            day.notes
        ));
    }
    out
}

// Error types

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Calc(CalcError),
    Json(serde_json::Error),
    Usage(String),
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<CalcError> for CliError {
    fn from(e: CalcError) -> Self {
        CliError::Calc(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliErrorReport {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CliError> for CliErrorReport {
    fn from(e: CliError) -> Self {
        match e {
            CliError::Io(e) => CliErrorReport {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CliError::Calc(e) => {
                let (code, hint) = match &e {
                    CalcError::InvalidFormat(_) => ("INVALID_TIME", "Use HH:MM or h:mm AM/PM"),
                    CalcError::InvalidDate(_) => ("INVALID_DATE", "Use YYYY-MM-DD"),
                    CalcError::InvalidOffset(_) => ("INVALID_OFFSET", "Use an offset like -5, UTC+1 or +05:30"),
                    CalcError::InvalidAmount(_) => ("INVALID_AMOUNT", "Doses must be non-negative milligrams"),
                    CalcError::InvalidSource(_) => ("INVALID_SOURCE", "Known presets: coffee, espresso, black_tea, green_tea, cola, energy_drink, dark_chocolate"),
                    CalcError::InvalidConfig(_) => ("INVALID_CONFIG", "Run 'sleepcalc config' to see the defaults"),
                    CalcError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                };
                CliErrorReport {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            CliError::Json(e) => CliErrorReport {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CliError::Usage(msg) => CliErrorReport {
                code: "USAGE_ERROR".to_string(),
                message: msg,
                hint: Some("Run with --help for usage".to_string()),
            },
        }
    }
}
