use anyhow::{ensure, Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::types::{FieldSet, MatchRecord};

const FILENAME_SUFFIX: &str = "_match_history.csv";

/// Derive the export filename from a player identifier, e.g.
/// `IronManFan#1234` becomes `IronManFan_1234_match_history.csv`.
pub fn output_filename(player_id: &str) -> String {
    let sanitized: String = player_id
        .trim()
        .chars()
        .map(|c| match c {
            '#' | '/' | '\\' | ':' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    format!("{sanitized}{FILENAME_SUFFIX}")
}

/// Write `records` as a delimited table with a header row.
pub fn write_records<W: Write>(
    writer: W,
    records: &[MatchRecord],
    field_set: FieldSet,
    delimiter: u8,
) -> Result<()> {
    let columns = field_set.columns();
    let mut table = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    table.write_record(columns.iter().map(|column| column.header()))?;
    for record in records {
        table.write_record(columns.iter().map(|column| {
            record
                .get(*column)
                .map(|cell| cell.to_string())
                .unwrap_or_default()
        }))?;
    }
    table.flush()?;
    Ok(())
}

/// Persist the match history to `path`. An empty history is rejected so that
/// a failed fetch never leaves a header-only file behind.
pub fn write_match_history(
    path: &Path,
    records: &[MatchRecord],
    field_set: FieldSet,
    delimiter: u8,
) -> Result<()> {
    ensure!(!records.is_empty(), "refusing to export an empty match history");

    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_records(file, records, field_set, delimiter)
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), rows = records.len(), "match history saved");
    Ok(())
}

/// Parse a single-byte delimiter such as `,`, `;` or `\t`.
pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "\\t" | "tab" => Ok(b'\t'),
        other => {
            let bytes = other.as_bytes();
            if bytes.len() == 1 {
                Ok(bytes[0])
            } else {
                Err(format!("delimiter must be a single ASCII character, got {other:?}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<MatchRecord> {
        vec![
            MatchRecord::from_value(&json!({
                "matchId": "m1",
                "outcome": "Victory",
                "mapName": "Tokyo",
                "heroPlayed": "Spider-Man",
                "durationSeconds": 420
            })),
            MatchRecord::from_value(&json!({
                "matchId": "m2",
                "outcome": "Defeat",
                "mapName": "Yggsgard, Royal Palace",
                "kills": 12
            })),
        ]
    }

    #[test]
    fn filename_replaces_separators() {
        assert_eq!(
            output_filename("IronManFan#1234"),
            "IronManFan_1234_match_history.csv"
        );
        assert_eq!(output_filename("a/b c"), "a_b_c_match_history.csv");
    }

    #[test]
    fn basic_export_has_five_columns() {
        let mut out = Vec::new();
        write_records(&mut out, &sample(), FieldSet::Basic, b',').unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "match_id,outcome,map_name,hero_played,duration_seconds"
        );
        assert_eq!(lines[1], "m1,Victory,Tokyo,Spider-Man,420");
        assert_eq!(lines[2], "m2,Defeat,\"Yggsgard, Royal Palace\",,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn extended_export_leaves_unknown_cells_empty() {
        let mut out = Vec::new();
        write_records(&mut out, &sample()[..1], FieldSet::Extended, b';').unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0].split(';').count(), 14);
        assert_eq!(lines[1], "m1;Victory;Tokyo;Spider-Man;420;;;;;;;;;");
    }

    #[test]
    fn writes_file_and_rejects_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(output_filename("Player#1"));

        assert!(write_match_history(&path, &[], FieldSet::Basic, b',').is_err());
        assert!(!path.exists());

        write_match_history(&path, &sample(), FieldSet::Basic, b',').unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 3);
    }

    #[test]
    fn delimiter_parsing() {
        assert_eq!(parse_delimiter(","), Ok(b','));
        assert_eq!(parse_delimiter("\\t"), Ok(b'\t'));
        assert!(parse_delimiter(",,").is_err());
    }
}
