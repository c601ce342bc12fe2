//! # rf_fault_checker
//!
//! Part of the wfb_tools crate family.
//!
//! Checks recent C100 RF fault events in the wfbrowser and reports on them, either by
//! email or on stdout.
//!
//! ## Use
//!
//! ```bash
//! rf_fault_checker --alert a@jlab.org,b@jlab.org trigger -f 5 -c cavity
//! rf_fault_checker summary -s "2024-01-01 08:00"
//! rf_fault_checker new ./checker.yml
//! rf_fault_checker --config ./checker.yml summary
//! ```
//!
//! Without `--alert` the report is printed to stdout and no report images are fetched.
use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};
use time::{PrimitiveDateTime, UtcOffset};

use libwfb_tools::checker::{CheckKind, Checker};
use libwfb_tools::config::Config;
use libwfb_tools::logging::init_logger;
use libwfb_tools::notify::Notifier;
use libwfb_tools::time_range::{local_offset, parse_datetime};

fn time_arg(name: &'static str, short: char, help: &'static str) -> Arg {
    Arg::new(name)
        .short(short)
        .long(name)
        .value_parser(parse_datetime)
        .help(help)
}

fn window(matches: &ArgMatches) -> (Option<PrimitiveDateTime>, Option<PrimitiveDateTime>) {
    (
        matches.get_one::<PrimitiveDateTime>("start-time").copied(),
        matches.get_one::<PrimitiveDateTime>("end-time").copied(),
    )
}

fn run(matches: &ArgMatches, offset: UtcOffset) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(("new", sub)) = matches.subcommand() {
        let path = PathBuf::from(sub.get_one::<String>("path").ok_or("a path is required")?);
        spdlog::info!("Making a template config at {}...", path.display());
        Config::default().write_config_file(&path)?;
        spdlog::info!("Done.");
        return Ok(());
    }

    let config = match matches.get_one::<String>("config") {
        Some(path) => {
            let path = PathBuf::from(path);
            spdlog::info!("Loading config from {}...", path.display());
            Config::read_config_file(&path)?
        }
        None => Config::default(),
    };
    let notifier = Notifier::from_alert(
        matches.get_one::<String>("alert").map(|a| a.as_str()),
        &config,
    )?;
    let checker = Checker::new(&config, offset);

    match matches.subcommand() {
        Some(("summary", sub)) => {
            let (start, end) = window(sub);
            checker.run_summary(start, end, &notifier)?;
        }
        Some(("trigger", sub)) => {
            let (start, end) = window(sub);
            let threshold = *sub
                .get_one::<u32>("fault-threshold")
                .ok_or("a fault threshold is required")?;
            let check: CheckKind = sub
                .get_one::<String>("check")
                .ok_or("a check is required")?
                .parse()?;
            checker.run_trigger(check, threshold, start, end, &notifier)?;
        }
        _ => (),
    }
    Ok(())
}

fn main() {
    // Read before anything else gets a chance to spawn a thread
    let offset = local_offset();

    let matches = Command::new("rf_fault_checker")
        .about("Checks the wfbrowser for RF fault patterns and reports them")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("alert")
                .short('a')
                .long("alert")
                .global(true)
                .help("Comma separated email addresses to send the report to. Prints to stdout if absent"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("Path to a YAML configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug messages"),
        )
        .subcommand(
            Command::new("summary")
                .about("Report on all faults of the last two days")
                .arg(time_arg("start-time", 's', "Start of the window"))
                .arg(time_arg("end-time", 'e', "End of the window")),
        )
        .subcommand(
            Command::new("trigger")
                .about("Alert when a group of faults reaches a threshold")
                .arg(
                    Arg::new("fault-threshold")
                        .short('f')
                        .long("fault-threshold")
                        .required(true)
                        .value_parser(clap::value_parser!(u32))
                        .help("Minimum number of faults in a group to report it"),
                )
                .arg(
                    Arg::new("check")
                        .short('c')
                        .long("check")
                        .required(true)
                        .value_parser(["fault", "cavity", "zone", "linac"])
                        .help("How faults are grouped"),
                )
                .arg(time_arg("start-time", 's', "Start of the window"))
                .arg(time_arg("end-time", 'e', "End of the window")),
        )
        .subcommand(
            Command::new("new")
                .about("Make a template configuration yaml file")
                .arg(Arg::new("path").required(true).help("Path to the file")),
        )
        .get_matches();

    if let Err(e) = init_logger(matches.get_flag("verbose")) {
        eprintln!("Could not create logger: {e}");
        std::process::exit(1);
    }

    if let Err(e) = run(&matches, offset) {
        spdlog::error!("{e}");
        std::process::exit(1);
    }
}
