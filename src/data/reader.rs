//! Reading patient data from text files
//!
//! Each non-blank, non-comment line holds one reading:
//!
//! ```text
//! # patientId,timestamp,label,value
//! 1,1700000000000,SystolicPressure,120
//! 1,1700000005000,Saturation,97%
//! 1,1700000010000,Alert,triggered
//! ```
//!
//! Lines written as `patientId,value,label,timestamp` are accepted as well.

use super::InMemoryDataSource;
use crate::domain::{PatientId, Reading, Timestamp, VitalType};
use crate::error::{DataError, DomainError};
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSIONS: [&str; 2] = ["txt", "csv"];

/// Outcome of a read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSummary {
    pub files: usize,
    pub readings: usize,
    pub skipped: usize,
}

/// Reads `.txt`/`.csv` files from a file or directory tree
#[derive(Debug, Clone)]
pub struct FileDataReader {
    path: PathBuf,
}

impl FileDataReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Input path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every data file into `target`
    ///
    /// Malformed lines are logged and skipped; a missing input path or an
    /// unreadable directory is an error.
    pub fn read_into(&self, target: &InMemoryDataSource) -> Result<ReadSummary, DataError> {
        if !self.path.exists() {
            return Err(DataError::InputNotFound(self.path.display().to_string()));
        }

        let files = if self.path.is_dir() {
            let mut files = Vec::new();
            collect_files(&self.path, &mut files)?;
            files.sort();
            files
        } else {
            vec![self.path.clone()]
        };

        let mut summary = ReadSummary::default();
        for file in &files {
            match self.read_file(file, target) {
                Ok((readings, skipped)) => {
                    summary.files += 1;
                    summary.readings += readings;
                    summary.skipped += skipped;
                }
                Err(e) => log::warn!("Error reading file {}: {}", file.display(), e),
            }
        }

        log::info!(
            "Read {} reading(s) from {} file(s), {} line(s) skipped",
            summary.readings,
            summary.files,
            summary.skipped
        );
        Ok(summary)
    }

    fn read_file(
        &self,
        file: &Path,
        target: &InMemoryDataSource,
    ) -> Result<(usize, usize), DataError> {
        let contents = fs::read_to_string(file)?;
        let name = file.display().to_string();
        let (mut readings, mut skipped) = (0, 0);

        for (idx, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_line(line) {
                Ok(reading) => {
                    target.add_reading(reading);
                    readings += 1;
                }
                Err(message) => {
                    let err = DataError::MalformedLine {
                        file: name.clone(),
                        line: idx + 1,
                        message,
                    };
                    log::warn!("{}", err);
                    skipped += 1;
                }
            }
        }
        Ok((readings, skipped))
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), DataError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        {
            out.push(path);
        }
    }
    Ok(())
}

/// Parse one data line into a validated reading
pub fn parse_line(line: &str) -> Result<Reading, String> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 4 {
        return Err(format!("expected 4 fields, found {}", parts.len()));
    }

    let patient_id: PatientId = parts[0]
        .parse()
        .map_err(|_| format!("invalid patient id '{}'", parts[0]))?;
    let vital_type: VitalType = parts[2].parse().map_err(|e: DomainError| e.to_string())?;

    // patientId,timestamp,label,value with patientId,value,label,timestamp as fallback
    let (value, timestamp) = match (parse_timestamp(parts[1]), parse_value(parts[3])) {
        (Some(ts), Some(value)) => (value, ts),
        _ => match (parse_value(parts[1]), parse_timestamp(parts[3])) {
            (Some(value), Some(ts)) => (value, ts),
            _ => return Err(format!("cannot interpret '{}' and '{}'", parts[1], parts[3])),
        },
    };

    Reading::try_new(patient_id, vital_type, value, timestamp).map_err(|e| e.to_string())
}

fn parse_timestamp(field: &str) -> Option<Timestamp> {
    field.parse().ok()
}

fn parse_value(field: &str) -> Option<f64> {
    match field.to_ascii_lowercase().as_str() {
        "triggered" => Some(1.0),
        "resolved" => Some(0.0),
        other => other.trim_end_matches('%').trim().parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PatientDataSource;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_line_standard_format() {
        let reading = parse_line("1,1000,SystolicPressure,120").unwrap();
        assert_eq!(
            reading,
            Reading::new(1, VitalType::SystolicPressure, 120.0, 1000)
        );
    }

    #[test]
    fn test_parse_line_aliases() {
        let sat = parse_line("2, 5000, Saturation, 97%").unwrap();
        assert_eq!(sat.vital_type, VitalType::BloodSaturation);
        assert_eq!(sat.value, 97.0);

        let alert = parse_line("2,6000,Alert,triggered").unwrap();
        assert_eq!(alert.vital_type, VitalType::ManualTrigger);
        assert_eq!(alert.value, 1.0);

        let resolved = parse_line("2,7000,Alert,resolved").unwrap();
        assert_eq!(resolved.value, 0.0);
    }

    #[test]
    fn test_parse_line_fallback_format() {
        let reading = parse_line("3,75.5,HeartRate,2000").unwrap();
        assert_eq!(reading.value, 75.5);
        assert_eq!(reading.timestamp, 2000);
    }

    #[test]
    fn test_parse_line_rejects_garbage() {
        assert!(parse_line("invalid data format").is_err());
        assert!(parse_line("x,1000,HeartRate,70").is_err());
        assert!(parse_line("1,1000,Temperature,37").is_err());
        assert!(parse_line("0,1000,HeartRate,70").is_err());
        assert!(parse_line("1,abc,HeartRate,def").is_err());
    }

    #[test]
    fn test_read_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("patient1.csv"),
            "# header\n1,1000,SystolicPressure,120\n\n1,2000,HeartRate,75\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("nested").join("patient2.txt"),
            "2,1000,ECG,0.5\nnot a reading\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.md"), "1,1000,HeartRate,70\n").unwrap();

        let source = InMemoryDataSource::new();
        let summary = FileDataReader::new(dir.path()).read_into(&source).unwrap();

        assert_eq!(
            summary,
            ReadSummary {
                files: 2,
                readings: 3,
                skipped: 1
            }
        );
        assert_eq!(source.patients(), vec![1, 2]);
        assert_eq!(source.readings_for(1).len(), 2);
    }

    #[test]
    fn test_read_single_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.txt");
        fs::write(&file, "5,1000,HeartRate,80").unwrap();

        let source = InMemoryDataSource::new();
        let summary = FileDataReader::new(&file).read_into(&source).unwrap();
        assert_eq!(summary.readings, 1);
        assert_eq!(source.patients(), vec![5]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let source = InMemoryDataSource::new();
        let summary = FileDataReader::new(dir.path()).read_into(&source).unwrap();
        assert_eq!(summary, ReadSummary::default());
        assert!(source.is_empty());
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let result = FileDataReader::new(dir.path().join("nonexistent"))
            .read_into(&InMemoryDataSource::new());
        assert!(matches!(result, Err(DataError::InputNotFound(_))));
    }
}
