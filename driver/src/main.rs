#[macro_use]
extern crate clap;

use clap::Arg;
use driver::{InteractiveSource, QueueSource};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("SOURCE")
                .help("Source program to compile")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("PATH")
                .help("Write the textual instruction dump to PATH"),
        )
        .arg(
            Arg::with_name("run")
                .short("r")
                .long("run")
                .help("Execute the compiled program"),
        )
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .takes_value(true)
                .value_name("PATH")
                .help("Newline-separated integers to feed SCAN, in order"),
        )
        .arg(
            Arg::with_name("interactive")
                .long("interactive")
                .requires("run")
                .help("Prompt on stdin for SCAN once --input is exhausted"),
        )
        .arg(
            Arg::with_name("stats")
                .short("s")
                .long("stats")
                .help("Print instruction count and step statistics"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .multiple(true)
                .conflicts_with("log_verbose")
                .help("Lower ambient log verbosity (repeatable)"),
        )
        .arg(
            Arg::with_name("log_verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .conflicts_with("quiet")
                .help("Raise ambient log verbosity (repeatable, independent of --stats)"),
        )
        .get_matches();

    init_logging(
        matches.occurrences_of("log_verbose") as i64 - matches.occurrences_of("quiet") as i64,
    );

    match run_cli(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbosity: i64) {
    let level = match verbosity {
        i64::MIN..=-2 => log::LevelFilter::Error,
        -1 => log::LevelFilter::Warn,
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn run_cli(matches: &clap::ArgMatches) -> Result<(), driver::DriverError> {
    let source_path = PathBuf::from(matches.value_of("SOURCE").unwrap());
    let compiled = driver::compile_file(&source_path)?;

    if let Some(output_path) = matches.value_of("output") {
        std::fs::write(output_path, compiler::dump_text(&compiled.code))
            .map_err(|source| driver::DriverError::Io {
                path: PathBuf::from(output_path),
                source,
            })?;
    }

    if matches.is_present("run") {
        let input_values = match matches.value_of("input") {
            Some(path) => driver::read_input_file(&PathBuf::from(path))?,
            None => Vec::new(),
        };

        let outcome = if matches.is_present("interactive") {
            driver::run(&compiled.code, &mut InteractiveSource::new(input_values))
        } else {
            driver::run(&compiled.code, &mut QueueSource::new(input_values))
        };

        for value in &outcome.output {
            println!("{}", value);
        }

        if matches.is_present("stats") {
            eprintln!(
                "instructions executed: {}, steps: {}",
                outcome.instructions_executed, outcome.steps
            );
        }
    }

    Ok(())
}
