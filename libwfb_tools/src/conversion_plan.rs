use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use super::capture_file::{convert_capture, CaptureName};
use super::error::ConverterError;

/// One capture file to convert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub src: PathBuf,
    pub dst: PathBuf,
    pub size: u64,
}

/// ConversionPlan maps a tree of BPM capture files onto the converted layout.
///
/// The input root holds one directory per location, each containing capture files.
/// All file names are validated up front so a bad name fails the run before anything
/// is written.
#[derive(Debug)]
pub struct ConversionPlan {
    output_dir: PathBuf,
    file_stack: Vec<ConversionJob>,
    total_data_size_bytes: u64,
}

impl ConversionPlan {
    /// Scan `input_dir` and plan the conversion into `output_dir`.
    ///
    /// Fails if the output directory already exists or the input is not a directory.
    pub fn new(input_dir: &Path, output_dir: &Path) -> Result<Self, ConverterError> {
        if output_dir.exists() {
            return Err(ConverterError::OutputExists(output_dir.to_path_buf()));
        }
        if !input_dir.is_dir() {
            return Err(ConverterError::DirNotFound(input_dir.to_path_buf()));
        }

        let mut stack: Vec<ConversionJob> = Vec::new();
        let mut total_size: u64 = 0;
        for location_dir in Self::get_sorted_entries(input_dir)? {
            if !location_dir.is_dir() {
                spdlog::warn!("Skipping {:?}: not a location directory", location_dir);
                continue;
            }
            let location = file_name(&location_dir);
            for path in Self::get_sorted_entries(&location_dir)? {
                if !path.is_file() {
                    continue;
                }
                let name: CaptureName = file_name(&path).parse()?;
                let size = path.metadata()?.len();
                stack.push(ConversionJob {
                    dst: output_dir.join(name.converted_path(&location)),
                    src: path,
                    size,
                });
                total_size += size;
            }
        }

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            file_stack: stack,
            total_data_size_bytes: total_size,
        })
    }

    fn get_sorted_entries(parent_path: &Path) -> Result<Vec<PathBuf>, ConverterError> {
        let mut entries: Vec<PathBuf> = Vec::new();
        for item in parent_path.read_dir()? {
            entries.push(item?.path());
        }
        entries.sort();
        Ok(entries)
    }

    /// Create the output root. Done once the whole input has been validated.
    pub fn create_output_dir(&self) -> Result<(), ConverterError> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Get total size of the files to convert.
    pub fn get_total_data_size(&self) -> u64 {
        self.total_data_size_bytes
    }

    /// Get source, destination, size for each file, in conversion order.
    pub fn jobs(&self) -> &[ConversionJob] {
        &self.file_stack
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Convert one capture file, creating the destination directories as needed.
/// Returns the number of data lines written.
pub fn convert_file(job: &ConversionJob) -> Result<usize, ConverterError> {
    if let Some(parent) = job.dst.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let reader = BufReader::new(File::open(&job.src)?);
    let writer = BufWriter::new(File::create(&job.dst)?);
    convert_capture(reader, writer)
}
