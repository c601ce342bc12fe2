//! # wfb_tools
//!
//! wfb_tools is a small family of command line utilities around the CEBAF waveform
//! browser (wfbrowser), written in Rust. The `libwfb_tools` library holds all of the
//! logic; each tool is a thin CLI over it.
//!
//! - `rf_fault_checker`: pulls recent RF fault events from the wfbrowser web service,
//! aggregates their model-assigned fault and cavity labels, and reports counts that
//! cross a threshold by email (with label summary images attached) or on stdout.
//! - `bpm_converter`: rewrites a tree of BPM capture files into the directory layout
//! and column format the waveform browser reads.
//! - `random_labeler`: a test utility that posts random cavity and fault-type labels for
//! every unlabeled RF event on a development server.
//!
//! ## Installation
//!
//! Build and install a tool with `cargo install --path ./rf_fault_checker` (or
//! `./bpm_converter`, `./random_labeler`) from the top level repository. The binaries
//! land in the cargo install location, typically `~/.cargo/bin/`.
//!
//! ## Configuration
//!
//! rf_fault_checker reads an optional YAML configuration file. Running
//! `rf_fault_checker new <path>` writes a template holding the defaults:
//!
//! ```yml
//! data_server: accweb.acc.jlab.org
//! report_server: accweb.acc.jlab.org
//! smtp_server: localhost
//! from_address: wfbrowser@jlab.org
//! email_css: '...'
//! linac_zones:
//!   0L:
//!   - 0L04
//!   1L:
//!   - 1L07
//!   - 1L22
//!   ...
//! summary_zones:
//! - 0L04
//! - 1L07
//! ...
//! ```
//!
//! - `data_server`: host of the wfbrowser event service
//! - `report_server`: host of the label summary report and the screenshot service
//! - `smtp_server`: the relay used for alert email
//! - `linac_zones`: the zones shown in the report image of a linac check
//! - `summary_zones`: the zones shown in the report image of the daily summary
//!
//! ## Checks
//!
//! A trigger check counts events over a lookback window (one hour for `linac`, one day
//! otherwise) grouped by:
//!
//! - `fault`: zone, cavity and fault type
//! - `cavity`: zone and cavity
//! - `zone`: zone
//! - `linac`: linac
//!
//! Groups at or above the threshold are reported. The summary check covers the last two
//! days and always reports.
//!
//! ## Logging
//!
//! All tools log to stderr; stdout only ever carries a report.
pub mod aggregate;
pub mod capture_file;
pub mod checker;
pub mod client;
pub mod config;
pub mod constants;
pub mod conversion_plan;
pub mod error;
pub mod event;
pub mod labeler;
pub mod logging;
pub mod notify;
pub mod report;
pub mod time_range;
