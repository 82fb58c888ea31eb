use std::env;
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::time::Instant;

use anyhow::Error;
use clap::{value_t, values_t, App, AppSettings, Arg};
use env_logger::{fmt, Builder, Target};
use log::{error, info};
use log::{Level, LevelFilter, Record};

use flprep::config::{PreprocessorConfig, PreprocessorConfigUpdate};
use flprep::{Outcome, Preprocessor};

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            error!("{}", err);
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn init_logging() {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    // The formula may be written to stdout.
    let mut builder = Builder::new();
    builder
        .target(Target::Stderr)
        .format(format)
        .filter(None, LevelFilter::Info);

    if let Ok(ref env_var) = env::var("FLPREP_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();
}

fn banner() {
    info!("This is flprep {}", env!("FLPREP_VERSION"));
    info!(
        "  {} build - {}",
        env!("FLPREP_PROFILE"),
        env!("FLPREP_RUSTC_VERSION")
    );
}

fn main_with_err() -> Result<i32, Error> {
    let start = Instant::now();

    let matches = App::new("flprep")
        .version(env!("FLPREP_VERSION"))
        .about("Failed literal preprocessor for DIMACS CNF formulas")
        .setting(AppSettings::DisableHelpSubcommand)
        .arg_from_usage("[threads] -p [THREADS] 'Number of threads used for propagation'")
        .arg_from_usage("[INPUT] 'The input file to use (stdin if omitted or -)'")
        .arg_from_usage("[OUTPUT] 'The output file to use (stdout if omitted or -)'")
        .arg_from_usage("[config-file] --config=[FILE] 'Read parameters from configuration file'")
        .arg(
            Arg::from_usage("[config-option] -C --config-option")
                .value_name("OPTION>=<VALUE")
                .help(
                    "Specify a single config option, see 'flprep -C help' for a list of options.",
                )
                .multiple(true)
                .number_of_values(1),
        )
        .get_matches();

    let config_options = values_t!(matches, "config-option", String).unwrap_or_default();

    if config_options.iter().any(|option| option == "help") {
        print!("{}", PreprocessorConfig::help());
        return Ok(0);
    }

    init_logging();
    banner();

    let mut config_update = PreprocessorConfigUpdate::new();

    if let Some(config_path) = matches.value_of("config-file") {
        let mut config_contents = String::new();
        fs::File::open(config_path)?.read_to_string(&mut config_contents)?;

        config_update.merge(toml::from_str(&config_contents)?);
    }

    if matches.is_present("threads") {
        config_update.merge(PreprocessorConfigUpdate {
            threads: Some(value_t!(matches, "threads", usize)?),
            ..PreprocessorConfigUpdate::default()
        });
    }

    for config_option in config_options {
        config_update.merge(toml::from_str(&config_option)?);
    }

    let mut preprocessor = Preprocessor::new();

    preprocessor.config(&config_update)?;

    let stdin = io::stdin();

    let mut locked_stdin;
    let mut opened_file;

    let input = match matches.value_of("INPUT") {
        Some(path) if path != "-" => {
            info!("Reading file '{}'", path);
            opened_file = fs::File::open(path)?;
            &mut opened_file as &mut dyn Read
        }
        _ => {
            info!("Reading from stdin");
            locked_stdin = stdin.lock();
            &mut locked_stdin as &mut dyn Read
        }
    };

    preprocessor.load_dimacs(input)?;

    let outcome = preprocessor.preprocess()?;

    let stats = preprocessor.stats();
    let seconds = start.elapsed().as_secs_f64();
    info!(
        "{} units, {} rounds, {} decisions, {} propagations",
        stats.units, stats.rounds, stats.decisions, stats.propagations
    );
    info!("{} failed literals", stats.failed_literals);
    info!(
        "{:.1} million propagations per second",
        if seconds > 0.0 {
            stats.propagations as f64 / 1e6 / seconds
        } else {
            0.0
        }
    );

    if let Some(unsat) = outcome.unsat {
        info!("inconsistent ({})", unsat);
    }

    match matches.value_of("OUTPUT") {
        Some(path) if path != "-" => {
            info!("Writing file '{}'", path);
            write_output(&outcome, fs::File::create(path)?)?;
        }
        _ => {
            let stdout = io::stdout();
            write_output(&outcome, stdout.lock())?;
        }
    }

    Ok(0)
}

fn write_output(outcome: &Outcome, target: impl Write) -> io::Result<()> {
    let mut target = BufWriter::new(target);
    outcome.write_dimacs(&mut target)?;
    target.flush()
}
