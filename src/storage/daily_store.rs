use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::errors::{CollectorError, Result};
use crate::models::stats::DailyRecord;
use crate::models::ticker::Ticker;

/// Only the ticker is needed to know a line was already collected
#[derive(Deserialize)]
struct RecordedLine {
    ticker: Ticker,
}

/// Append-only line-delimited JSON files, one per collection date
pub struct DailyOutputStore {
    data_dir: PathBuf,
}

impl DailyOutputStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `<data_dir>/<YYYY-MM-DD>.json`
    pub fn path_for(&self, date: &NaiveDate) -> PathBuf {
        self.data_dir.join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    /// Tickers already present in the file for `date`.
    ///
    /// A missing file is an empty set. Lines that are not a JSON object with
    /// a string `ticker` are skipped with a warning so one corrupt line never
    /// blocks resumption; a file that cannot be read at all is an error.
    pub fn already_recorded(&self, date: &NaiveDate) -> Result<HashSet<Ticker>> {
        let path = self.path_for(date);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No output file yet at {}", path.display());
                return Ok(HashSet::new());
            }
            Err(source) => return Err(CollectorError::StorageRead { path, source }),
        };

        let text = String::from_utf8_lossy(&bytes);
        let mut recorded = HashSet::new();
        let mut malformed = 0usize;

        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RecordedLine>(line) {
                Ok(entry) => {
                    recorded.insert(entry.ticker);
                }
                Err(e) => {
                    malformed += 1;
                    warn!("Skipping malformed line {} in {}: {}", idx + 1, path.display(), e);
                }
            }
        }

        if !recorded.is_empty() {
            info!("{} tickers already recorded at {}", recorded.len(), path.display());
        }
        if malformed > 0 {
            warn!("{} malformed lines ignored in {}", malformed, path.display());
        }
        Ok(recorded)
    }

    /// Append `record` as one JSON line to the file for `date`, creating the
    /// file and its directory on first write.
    pub fn append(&self, date: &NaiveDate, record: &DailyRecord) -> Result<()> {
        let path = self.path_for(date);
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let write_err = |source| CollectorError::StorageWrite {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.data_dir).map_err(write_err)?;

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(write_err)?;

        // A crash mid-write can leave the last line unterminated; start on a fresh line.
        if !ends_with_newline(&mut file).map_err(write_err)? {
            line.insert(0, '\n');
        }

        file.write_all(line.as_bytes()).map_err(write_err)?;
        debug!("Appended {} to {}", record.ticker, path.display());
        Ok(())
    }
}

/// True for an empty file or one whose last byte is `\n`
fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stats::Stats;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    fn record(symbol: &str) -> DailyRecord {
        let mut stats = Stats::default();
        stats.market_cap = Some(1.0e9);
        DailyRecord::new(Ticker::parse(symbol).unwrap(), date(), stats)
    }

    fn tickers(symbols: &[&str]) -> HashSet<Ticker> {
        symbols.iter().filter_map(|s| Ticker::parse(s)).collect()
    }

    #[test]
    fn path_is_derived_from_date() {
        let store = DailyOutputStore::new("data");
        assert_eq!(store.path_for(&date()), PathBuf::from("data/2024-01-05.json"));
    }

    #[test]
    fn missing_file_means_nothing_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let store = DailyOutputStore::new(dir.path().join("data"));
        assert!(store.already_recorded(&date()).unwrap().is_empty());
    }

    #[test]
    fn append_creates_directory_and_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = DailyOutputStore::new(dir.path().join("nested").join("data"));

        store.append(&date(), &record("AAA")).unwrap();
        store.append(&date(), &record("BBB")).unwrap();

        let text = fs::read_to_string(store.path_for(&date())).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(text.ends_with('\n'));

        let first: DailyRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, record("AAA"));
    }

    #[test]
    fn recorded_set_ignores_append_order() {
        let dir = tempfile::tempdir().unwrap();
        let forward = DailyOutputStore::new(dir.path().join("forward"));
        let backward = DailyOutputStore::new(dir.path().join("backward"));

        for symbol in ["AAA", "BBB", "CCC"] {
            forward.append(&date(), &record(symbol)).unwrap();
        }
        for symbol in ["CCC", "BBB", "AAA"] {
            backward.append(&date(), &record(symbol)).unwrap();
        }

        let expected = tickers(&["AAA", "BBB", "CCC"]);
        assert_eq!(forward.already_recorded(&date()).unwrap(), expected);
        assert_eq!(backward.already_recorded(&date()).unwrap(), expected);
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = DailyOutputStore::new(dir.path());
        let path = store.path_for(&date());
        fs::write(
            &path,
            "{\"ticker\":\"AAA\",\"market_cap\":1.0}\n\
             not json at all\n\
             {\"market_cap\":2.0}\n\
             \n\
             {\"ticker\":\"CCC\"}\n",
        )
        .unwrap();

        assert_eq!(store.already_recorded(&date()).unwrap(), tickers(&["AAA", "CCC"]));
    }

    #[test]
    fn append_after_torn_line_starts_a_new_line() {
        let dir = tempfile::tempdir().unwrap();
        let store = DailyOutputStore::new(dir.path());
        let path = store.path_for(&date());
        fs::write(&path, "{\"ticker\":\"AAA\"}\n{\"ticker\":\"BB").unwrap();

        store.append(&date(), &record("CCC")).unwrap();

        assert_eq!(store.already_recorded(&date()).unwrap(), tickers(&["AAA", "CCC"]));
    }

    #[test]
    fn unreadable_output_path_is_storage_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DailyOutputStore::new(dir.path());
        // A directory where the file should be cannot be read as a file.
        fs::create_dir_all(store.path_for(&date())).unwrap();

        let err = store.already_recorded(&date()).unwrap_err();
        assert!(matches!(err, CollectorError::StorageRead { .. }));
    }

    #[test]
    fn unwritable_data_dir_is_storage_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("data");
        fs::write(&blocker, "a file, not a directory").unwrap();
        let store = DailyOutputStore::new(&blocker);

        let err = store.append(&date(), &record("AAA")).unwrap_err();
        assert!(matches!(err, CollectorError::StorageWrite { .. }));
    }
}
