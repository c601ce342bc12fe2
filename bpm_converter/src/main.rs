//! # bpm_converter
//!
//! Part of the wfb_tools crate family.
//!
//! Converts a tree of BPM capture files into the layout and format read by the waveform
//! browser.
//!
//! ## Use
//!
//! ```bash
//! bpm_converter -d /path/to/captures -o /path/to/converted
//! ```
//!
//! The input directory holds one subdirectory per BPM location. The output directory must
//! not exist yet.
use clap::{Arg, ArgAction, Command};
use indicatif::ProgressBar;
use std::path::PathBuf;

use libwfb_tools::conversion_plan::{convert_file, ConversionPlan};
use libwfb_tools::error::ConverterError;
use libwfb_tools::logging::init_logger;

fn convert(input_dir: PathBuf, output_dir: PathBuf) -> Result<(), ConverterError> {
    spdlog::info!(
        "Planning conversion of {} into {}...",
        input_dir.display(),
        output_dir.display()
    );
    let plan = ConversionPlan::new(&input_dir, &output_dir)?;
    spdlog::info!(
        "Found {} capture files totaling {}",
        plan.jobs().len(),
        human_bytes::human_bytes(plan.get_total_data_size() as f64)
    );
    plan.create_output_dir()?;

    let pb = ProgressBar::new(plan.jobs().len() as u64);
    for job in plan.jobs() {
        let lines = convert_file(job)?;
        spdlog::debug!("{} -> {} ({lines} data lines)", job.src.display(), job.dst.display());
        pb.inc(1);
    }
    pb.finish();
    Ok(())
}

fn main() {
    let matches = Command::new("bpm_converter")
        .about("Convert BPM capture files for the waveform browser")
        .arg_required_else_help(true)
        .arg(
            Arg::new("dir")
                .short('d')
                .long("dir")
                .required(true)
                .help("Directory holding one subdirectory of capture files per location"),
        )
        .arg(
            Arg::new("out-dir")
                .short('o')
                .long("out-dir")
                .required(true)
                .help("Directory to write the converted tree to. Must not exist"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log every converted file"),
        )
        .get_matches();

    if let Err(e) = init_logger(matches.get_flag("verbose")) {
        eprintln!("Could not create logger: {e}");
        std::process::exit(1);
    }

    let (input_dir, output_dir) = match (
        matches.get_one::<String>("dir"),
        matches.get_one::<String>("out-dir"),
    ) {
        (Some(d), Some(o)) => (PathBuf::from(d), PathBuf::from(o)),
        _ => {
            spdlog::error!("Both --dir and --out-dir are required");
            std::process::exit(1);
        }
    };

    match convert(input_dir, output_dir) {
        Ok(()) => spdlog::info!("Done."),
        Err(e) => {
            spdlog::error!("Conversion failed with error: {e}");
            std::process::exit(1);
        }
    }
}
