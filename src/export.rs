use std::{fmt::Display, io};

use chrono::{NaiveDate, TimeZone};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use itertools::Itertools;

use crate::{
    constants::EXPORT_SETTINGS,
    domain::{self, Category, Entry},
    error::{CounterError, CounterResult, StorageError},
    time,
};

pub struct Exporter<'a, Tz> {
    tz: &'a Tz,
}

impl<'a, Tz> Exporter<'a, Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn new(tz: &'a Tz) -> Self {
        Self { tz }
    }

    pub fn export(&self, entries: &[Entry], categories: &[Category]) -> CounterResult<String> {
        if entries.is_empty() {
            return Err(CounterError::EmptyExport);
        }

        let category_map = domain::category_map(categories);
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer
            .write_record(EXPORT_SETTINGS.header)
            .map_err(StorageError::from)?;

        for entry in entries.iter().sorted_by_key(|e| e.timestamp) {
            let display =
                time::format_timestamp(entry.timestamp, self.tz, EXPORT_SETTINGS.timestamp_format);
            let name = domain::resolve_category_name(&category_map, &entry.category_id);
            writer
                .write_record([display.as_str(), name, entry.category_id.as_str()])
                .map_err(StorageError::from)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| StorageError::Io(io::Error::new(e.error().kind(), e.error().to_string())))?;
        let mut body = String::from_utf8(bytes)
            .map_err(|e| StorageError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        if body.ends_with('\n') {
            body.pop();
        }

        let mut document = String::with_capacity(body.len() + 3);
        document.push(EXPORT_SETTINGS.bom);
        document.push_str(&body);
        Ok(document)
    }
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("{}{}.csv", EXPORT_SETTINGS.file_prefix, date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};

    use super::*;
    use crate::domain::{CategoryId, Color, EntryId};

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> i64 {
        jst()
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Utc)
            .timestamp_millis()
    }

    fn entry(id: &str, category: &str, timestamp: i64) -> Entry {
        Entry {
            id: EntryId::new(id),
            category_id: CategoryId::new(category),
            timestamp,
        }
    }

    #[test]
    fn test_empty_export_fails() {
        let tz = jst();
        let result = Exporter::new(&tz).export(&[], &[]);
        assert!(matches!(result, Err(CounterError::EmptyExport)));
    }

    #[test]
    fn test_embedded_comma_stays_quoted() {
        let tz = jst();
        let categories = vec![Category {
            id: CategoryId::new("c1"),
            name: "A,B".to_string(),
            color: Color::Green,
            order: 0,
        }];
        let entries = vec![entry("e1", "c1", ts(2026, 4, 1, 9, 30))];

        let csv = Exporter::new(&tz).export(&entries, &categories).unwrap();

        assert_eq!(
            csv,
            "\u{FEFF}\"timestamp_display\",\"category_name\",\"category_id\"\n\
             \"2026/04/01 09:30\",\"A,B\",\"c1\""
        );
    }

    #[test]
    fn test_rows_sorted_and_orphans_marked() {
        let tz = jst();
        let categories = vec![Category {
            id: CategoryId::new("c1"),
            name: "予約".to_string(),
            color: Color::Blue,
            order: 0,
        }];
        let entries = vec![
            entry("e2", "gone", ts(2026, 4, 2, 8, 0)),
            entry("e1", "c1", ts(2026, 4, 1, 17, 45)),
        ];

        let csv = Exporter::new(&tz).export(&entries, &categories).unwrap();
        let lines: Vec<&str> = csv.trim_start_matches('\u{FEFF}').lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "\"2026/04/01 17:45\",\"予約\",\"c1\"");
        assert_eq!(lines[2], "\"2026/04/02 08:00\",\"(削除済み)\",\"gone\"");
    }

    #[test]
    fn test_embedded_quotes_are_doubled() {
        let tz = jst();
        let categories = vec![Category {
            id: CategoryId::new("c1"),
            name: "say \"hi\"".to_string(),
            color: Color::Green,
            order: 0,
        }];
        let entries = vec![entry("e1", "c1", ts(2026, 4, 1, 9, 0))];

        let csv = Exporter::new(&tz).export(&entries, &categories).unwrap();
        assert!(csv.ends_with("\"say \"\"hi\"\"\",\"c1\""));
    }

    #[test]
    fn test_export_is_deterministic() {
        let tz = jst();
        let entries = vec![
            entry("e1", "c1", ts(2026, 4, 1, 9, 0)),
            entry("e2", "c1", ts(2026, 4, 1, 9, 0)),
        ];

        let first = Exporter::new(&tz).export(&entries, &[]).unwrap();
        let second = Exporter::new(&tz).export(&entries, &[]).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 6).unwrap();
        assert_eq!(export_file_name(date), "front_counter_20261006.csv");
    }
}
