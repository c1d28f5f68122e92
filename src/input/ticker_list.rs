use log::info;
use std::fs;
use std::path::Path;

use crate::errors::{CollectorError, Result};
use crate::models::ticker::{Ticker, Watchlist};

/// Read the watchlist from a line-delimited file.
///
/// Each non-blank line is one ticker, in file order. Duplicates are kept;
/// collapsing them is the runner's decision.
pub fn read_watchlist(path: &Path) -> Result<Watchlist> {
    let text = fs::read_to_string(path).map_err(|source| CollectorError::Input {
        path: path.to_path_buf(),
        source,
    })?;

    let watchlist = parse_watchlist(&text);
    info!("Using {} tickers found in {}", watchlist.len(), path.display());
    Ok(watchlist)
}

pub fn parse_watchlist(text: &str) -> Watchlist {
    // Editors on Windows may prefix the file with a byte-order mark.
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.lines().filter_map(Ticker::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(watchlist: &Watchlist) -> Vec<&str> {
        watchlist.iter().map(|t| t.as_str()).collect()
    }

    #[test]
    fn skips_blank_lines_and_keeps_order() {
        let watchlist = parse_watchlist("X\n\n  LOL  \r\n\t\nGM\nX\n");
        assert_eq!(symbols(&watchlist), vec!["X", "LOL", "GM", "X"]);
    }

    #[test]
    fn leading_byte_order_mark_is_ignored() {
        let watchlist = parse_watchlist("\u{feff}AAA\r\nBBB\r\n");
        assert_eq!(symbols(&watchlist), vec!["AAA", "BBB"]);
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickers.txt");
        fs::write(&path, "AAA\nBBB\n").unwrap();

        let watchlist = read_watchlist(&path).unwrap();
        assert_eq!(symbols(&watchlist), vec!["AAA", "BBB"]);
    }

    #[test]
    fn empty_file_gives_empty_watchlist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickers.txt");
        fs::write(&path, "\n\n").unwrap();

        assert!(read_watchlist(&path).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_watchlist(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, CollectorError::Input { .. }));
    }
}
