//! # random_labeler
//!
//! Part of the wfb_tools crate family.
//!
//! Development utility that gives every unlabeled RF event on a wfbrowser server a
//! random cavity and fault-type label, so the label reports have something to show.
//! Never point it at production.
//!
//! ## Use
//!
//! ```bash
//! random_labeler -u http://localhost:8080 --model-name my_random_labeler
//! ```
use clap::{Arg, ArgAction, Command};

use libwfb_tools::client::WfbClient;
use libwfb_tools::constants::DEFAULT_MODEL_NAME;
use libwfb_tools::labeler::RandomLabeler;
use libwfb_tools::logging::init_logger;

fn main() {
    let matches = Command::new("random_labeler")
        .about("Post random labels for unlabeled RF events")
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .default_value("http://localhost:8080")
                .help("Base URL of the wfbrowser server"),
        )
        .arg(
            Arg::new("model-name")
                .long("model-name")
                .default_value(DEFAULT_MODEL_NAME)
                .help("Model name recorded with each label"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log debug messages"),
        )
        .get_matches();

    if let Err(e) = init_logger(matches.get_flag("verbose")) {
        eprintln!("Could not create logger: {e}");
        std::process::exit(1);
    }

    let url = matches
        .get_one::<String>("url")
        .map(|u| u.as_str())
        .unwrap_or("http://localhost:8080");
    let model_name = matches
        .get_one::<String>("model-name")
        .map(|m| m.as_str())
        .unwrap_or(DEFAULT_MODEL_NAME);

    let client = WfbClient::new(url, url);
    let mut labeler = RandomLabeler::new(model_name, rand::thread_rng());
    match labeler.label_events(&client) {
        Ok(summary) => spdlog::info!(
            "Labeled {} events ({} rejected posts), skipped {}",
            summary.labeled,
            summary.rejected_posts,
            summary.skipped
        ),
        Err(e) => {
            spdlog::error!("Labeling failed with error: {e}");
            std::process::exit(1);
        }
    }
}
