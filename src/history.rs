//! Historical weather and phenology record reader.
//!
//! Expects a CSV with `Fecha,Tmax,Tmin,Fenologia_Observada` headers
//! (`date,tmax,tmin,phenology` also accepted), one row per day.

use std::io::{self, Read};
use std::path::Path;

use crate::error::{CoreError, CoreResult};
use crate::models::{HistoricalRecord, PhenologyEvent};
use crate::phenology::parse_label;

// ---

/// Load the record from `path`. A missing file is an empty record.
pub fn load(path: &Path) -> CoreResult<Vec<HistoricalRecord>> {
    // ---
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!("Historical record {} not found, using empty series", path.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(CoreError::data(format!(
                "cannot open {}: {}",
                path.display(),
                e
            )))
        }
    };

    let records = from_reader(file)?;
    tracing::info!("Loaded {} historical rows from {}", records.len(), path.display());
    Ok(records)
}

/// Headers that must be present, each with its accepted aliases.
const REQUIRED_COLUMNS: &[(&str, &str)] =
    &[("Fecha", "date"), ("Tmax", "tmax"), ("Tmin", "tmin")];

/// Parse CSV rows from any reader.
///
/// Rows that cannot be parsed (a blank or non-numeric temperature, a bad
/// date) are logged and skipped. Missing headers or an unreadable stream
/// fail the whole record.
pub fn from_reader<R: Read>(reader: R) -> CoreResult<Vec<HistoricalRecord>> {
    // ---
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| CoreError::data(format!("cannot read historical headers: {}", e)))?
        .clone();
    for (name, alias) in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *name || h == *alias) {
            return Err(CoreError::data(format!(
                "historical record is missing the {} column",
                name
            )));
        }
    }

    let mut records = Vec::new();
    for (i, row) in csv_reader.deserialize::<HistoricalRecord>().enumerate() {
        match row {
            Ok(record) => records.push(record),
            Err(e) if e.is_io_error() => {
                return Err(CoreError::data(format!("cannot read historical record: {}", e)));
            }
            Err(e) => {
                tracing::warn!("Skipping historical row {}: {}", i + 1, e);
                continue;
            }
        }
    }
    Ok(records)
}

/// Observed events in the record, skipping labels with no known stage.
pub fn observed_events(records: &[HistoricalRecord]) -> Vec<PhenologyEvent> {
    // ---
    records
        .iter()
        .filter_map(|r| {
            let label = r.phenology.as_deref()?;
            match parse_label(label) {
                Some(kind) => Some(PhenologyEvent {
                    observed_date: r.date,
                    kind,
                }),
                None => {
                    if !label.trim().is_empty() {
                        tracing::debug!("Skipping unrecognised phenology label {:?} on {}", label, r.date);
                    }
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::PhenologyKind;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
Fecha,Tmax,Tmin,Fenologia_Observada
2024-08-01,24.5,11.0,
2024-08-02,26.0,12.5,Brotación
2024-08-03,25.0,12.0,Envero
2024-08-04,27.5,13.0,Floración
";

    #[test]
    fn test_parse_rows_and_blank_labels() {
        // ---
        let records = from_reader(SAMPLE.as_bytes()).unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());
        assert_eq!(records[0].tmax, 24.5);
        assert_eq!(records[0].phenology, None);
        assert_eq!(records[1].phenology.as_deref(), Some("Brotación"));
    }

    #[test]
    fn test_english_headers_accepted() {
        // ---
        let csv = "date,tmax,tmin,phenology\n2024-09-10,30,15,bloom\n";
        let records = from_reader(csv.as_bytes()).unwrap();
        assert_eq!(observed_events(&records)[0].kind, PhenologyKind::Bloom);
    }

    #[test]
    fn test_observed_events_skip_unknown_labels() {
        // ---
        let records = from_reader(SAMPLE.as_bytes()).unwrap();
        let events = observed_events(&records);

        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![PhenologyKind::Budbreak, PhenologyKind::Bloom]);
    }

    #[test]
    fn test_blank_temperature_row_is_skipped() {
        // ---
        let csv = "\
Fecha,Tmax,Tmin,Fenologia_Observada
2024-08-01,24.0,11.0,
2024-08-02,,12.0,
2024-08-03,26.0,12.0,Brotación
";
        let records = from_reader(csv.as_bytes()).unwrap();

        let dates: Vec<_> = records.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-08-01", "2024-08-03"]);
        let events = observed_events(&records);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, PhenologyKind::Budbreak);
    }

    #[test]
    fn test_non_numeric_row_is_skipped() {
        // ---
        let csv = "Fecha,Tmax,Tmin,Fenologia_Observada\n2024-08-01,hot,11.0,\n2024-08-02,25,12,\n";
        let records = from_reader(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tmax, 25.0);
    }

    #[test]
    fn test_missing_header_is_data_error() {
        // ---
        let csv = "Fecha,Tmax,Fenologia_Observada\n2024-08-01,24.0,\n";
        assert!(matches!(from_reader(csv.as_bytes()), Err(CoreError::Data(_))));
    }

    #[test]
    fn test_missing_file_is_empty_series() {
        // ---
        let records = load(Path::new("/nonexistent/datos_historicos.csv")).unwrap();
        assert!(records.is_empty());
    }
}
