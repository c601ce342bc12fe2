use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use super::constants::{CONVERTED_ROOT_NAME, SECONDS_PER_TIME_UNIT};
use super::error::ConverterError;

const BEAM_CURRENT_PREFIX: &str = "Beam Current";
const DELTA_T_PREFIX: &str = "deltaT";
const COLUMN_HEADER_MARKER: &str = "WireSum";
const BEAM_CURRENT_TOKEN: usize = 5;

/// The name of a BPM capture file: `<classification>_<yyyymmdd>_<hhmmss.f>.<ext>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureName {
    pub classification: String,
    /// Formatted as `yyyy_mm_dd`
    pub date: String,
    pub time: String,
    pub ext: String,
}

impl FromStr for CaptureName {
    type Err = ConverterError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad_name = || ConverterError::BadFileName(s.to_string());

        let tokens: Vec<&str> = s.split('_').collect();
        if tokens.len() != 3 || tokens[0].is_empty() {
            return Err(bad_name());
        }
        let date = tokens[1];
        if date.len() != 8 || !date.chars().all(|c| c.is_ascii_digit()) {
            return Err(bad_name());
        }
        let time_ext: Vec<&str> = tokens[2].split('.').collect();
        if time_ext.len() != 3 || time_ext.iter().any(|t| t.is_empty()) {
            return Err(bad_name());
        }

        Ok(Self {
            classification: tokens[0].to_lowercase(),
            date: format!("{}_{}_{}", &date[0..4], &date[4..6], &date[6..8]),
            time: format!("{}.{}", time_ext[0], time_ext[1]),
            ext: time_ext[2].to_string(),
        })
    }
}

impl CaptureName {
    /// Where the converted file lands, relative to the output root:
    /// `cebaf/<classification>/<yyyy_mm_dd>/<time>/<location>.<yyyy_mm_dd>_<time>.<ext>`
    pub fn converted_path(&self, location: &str) -> PathBuf {
        PathBuf::from(CONVERTED_ROOT_NAME)
            .join(&self.classification)
            .join(&self.date)
            .join(&self.time)
            .join(format!("{location}.{}_{}.{}", self.date, self.time, self.ext))
    }
}

/// Rewrite a capture file into the viewer format.
///
/// Header metadata becomes `#` comment lines, the column header line gains a `Time`
/// column, and every data line is prefixed with its elapsed time in milliseconds
/// (`index * deltaT`). Returns the number of data lines written.
pub fn convert_capture<R: BufRead, W: Write>(
    mut reader: R,
    mut writer: W,
) -> Result<usize, ConverterError> {
    let mut delta_t: Option<f64> = None;
    let mut count: usize = 0;
    let mut total: usize = 0;
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }

        if line.starts_with(BEAM_CURRENT_PREFIX) {
            let tokens: Vec<&str> = line.trim().split(' ').collect();
            let current = tokens
                .get(BEAM_CURRENT_TOKEN)
                .ok_or_else(|| ConverterError::BadHeaderLine(line.trim().to_string()))?;
            writeln!(writer, "# BeamCurent_uA={current} @ -1.0e1(1.0e1)")?;
        } else if line.starts_with(DELTA_T_PREFIX) {
            let tokens: Vec<&str> = line.trim().split('\t').collect();
            let raw = tokens
                .get(1)
                .ok_or_else(|| ConverterError::BadHeaderLine(line.trim().to_string()))?;
            let seconds: f64 = raw
                .parse()
                .map_err(|e| ConverterError::BadDeltaT(raw.to_string(), e))?;
            writeln!(writer, "# deltaT={raw} @ -1.0e1(1.0e1)")?;
            delta_t = Some(seconds / SECONDS_PER_TIME_UNIT);
            count = 0;
        } else if line.contains(COLUMN_HEADER_MARKER) {
            write!(writer, "Time\t{line}")?;
        } else {
            let delta = delta_t.ok_or(ConverterError::DeltaTNotDefined)?;
            write!(writer, "{:.4}\t{line}", delta * count as f64)?;
            count += 1;
            total += 1;
        }
    }
    writer.flush()?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(input: &str) -> Result<String, ConverterError> {
        let mut out: Vec<u8> = Vec::new();
        convert_capture(input.as_bytes(), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_time_column() {
        let input = "deltaT\t2.5\nX\tY\tWireSum\n1\t2\t3\n4\t5\t6\n7\t8\t9\n";
        let output = convert(input).unwrap();
        assert_eq!(
            output,
            "# deltaT=2.5 @ -1.0e1(1.0e1)\n\
             Time\tX\tY\tWireSum\n\
             0.0000\t1\t2\t3\n\
             2500.0000\t4\t5\t6\n\
             5000.0000\t7\t8\t9\n"
        );
    }

    #[test]
    fn test_beam_current_header() {
        let input = "Beam Current in uA is 12.5\ndeltaT\t0.001\nWireSum\n1\n";
        let output = convert(input).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "# BeamCurent_uA=12.5 @ -1.0e1(1.0e1)");
        assert_eq!(lines[1], "# deltaT=0.001 @ -1.0e1(1.0e1)");
        assert_eq!(lines[2], "Time\tWireSum");
        assert_eq!(lines[3], "0.0000\t1");
    }

    #[test]
    fn test_data_before_delta_t() {
        let result = convert("X\tWireSum\n1\t2\ndeltaT\t2.5\n");
        assert!(matches!(result, Err(ConverterError::DeltaTNotDefined)));
        assert_eq!(
            ConverterError::DeltaTNotDefined.to_string(),
            "deltaT not defined in header."
        );
    }

    #[test]
    fn test_bad_delta_t() {
        assert!(matches!(
            convert("deltaT\tfast\n"),
            Err(ConverterError::BadDeltaT(_, _))
        ));
        assert!(matches!(
            convert("deltaT\n"),
            Err(ConverterError::BadHeaderLine(_))
        ));
    }

    #[test]
    fn test_last_line_without_newline() {
        let output = convert("deltaT\t1\nWireSum\n1\n2").unwrap();
        assert!(output.ends_with("0.0000\t1\n1000.0000\t2"));
    }

    #[test]
    fn test_capture_name() {
        let name: CaptureName = "FSD_20230415_101530.2.txt".parse().unwrap();
        assert_eq!(name.classification, "fsd");
        assert_eq!(name.date, "2023_04_15");
        assert_eq!(name.time, "101530.2");
        assert_eq!(name.ext, "txt");
        assert_eq!(
            name.converted_path("IPM1L02"),
            PathBuf::from("cebaf/fsd/2023_04_15/101530.2/IPM1L02.2023_04_15_101530.2.txt")
        );
    }

    #[test]
    fn test_bad_capture_names() {
        for bad in [
            "FSD_20230415.txt",
            "FSD_2023041_101530.2.txt",
            "FSD_20230415_101530.txt",
            "FSD_extra_20230415_101530.2.txt",
            "_20230415_101530.2.txt",
        ] {
            assert!(matches!(
                bad.parse::<CaptureName>(),
                Err(ConverterError::BadFileName(_))
            ));
        }
    }
}
