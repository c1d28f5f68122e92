use chrono::{Local, NaiveDate};
use env_logger::{Builder, Env, Target};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::errors::{CollectorError, Result};

/// `<logs_dir>/<YYYY-MM-DD>.log`
pub fn log_path(logs_dir: &Path, date: &NaiveDate) -> PathBuf {
    logs_dir.join(format!("{}.log", date.format("%Y-%m-%d")))
}

/// Writes every log line to stderr and to the day's log file
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // stderr is best effort, the file is the record of the run
        let _ = io::stderr().write_all(buf);
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = io::stderr().flush();
        self.file.flush()
    }
}

/// Install the global logger. `RUST_LOG` overrides the default `info` filter.
pub fn init(logs_dir: &Path, date: &NaiveDate) -> Result<PathBuf> {
    let path = log_path(logs_dir, date);
    let open_err = |source| CollectorError::StorageWrite {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(logs_dir).map_err(open_err)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(open_err)?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{}|{}|{}|{}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(TeeWriter { file })))
        .try_init()
        .map_err(|e| CollectorError::Config(format!("Logger already initialized: {}", e)))?;

    Ok(path)
}
