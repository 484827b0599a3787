//! Headerless CSV import for the ingredient and tag catalogs.

use std::mem;

use anyhow::{bail, Result};

use crate::error::AppResult;
use crate::storage::Database;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Start,
    Unquoted,
    Quoted,
    Closed,
}

/// Parses headerless CSV into records tagged with the line they start on.
/// Double-quoted fields may contain commas, line breaks and escaped `""`
/// quotes. Blank lines are skipped.
pub fn parse_csv(input: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut state = Field::Start;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match (state, c) {
            (Field::Quoted, '"') => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    state = Field::Closed;
                }
            }
            (Field::Quoted, c) => {
                if c == '\n' {
                    line += 1;
                }
                field.push(c);
            }
            (Field::Start, '"') => state = Field::Quoted,
            (_, ',') => {
                record.push(mem::take(&mut field));
                state = Field::Start;
            }
            (_, '\r') if chars.peek() == Some(&'\n') => {}
            (_, '\n') => {
                record.push(mem::take(&mut field));
                push_record(&mut records, mem::take(&mut record), record_line);
                line += 1;
                record_line = line;
                state = Field::Start;
            }
            (Field::Closed, c) => bail!("line {line}: unexpected {c:?} after closing quote"),
            (_, c) => {
                field.push(c);
                state = Field::Unquoted;
            }
        }
    }

    if state == Field::Quoted {
        bail!("line {record_line}: unterminated quoted field");
    }
    record.push(field);
    push_record(&mut records, record, record_line);
    Ok(records)
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, record: Vec<String>, line: usize) {
    let blank = matches!(record.as_slice(), [only] if only.trim().is_empty());
    if !blank {
        records.push((line, record));
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub rows: usize,
    pub added: usize,
}

fn records<const N: usize>(input: &str) -> Result<Vec<[String; N]>> {
    parse_csv(input)?
        .into_iter()
        .map(|(line, fields)| match <[String; N]>::try_from(fields) {
            Ok(record) => Ok(record),
            Err(fields) => bail!("line {line}: expected {N} fields, found {}", fields.len()),
        })
        .collect()
}

/// Rows are `name,measurement_unit`.
pub fn import_ingredients(db: &mut Database, input: &str) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    for [name, unit] in records::<2>(input)? {
        let (_, added) = db.get_or_create_ingredient(&name, &unit).map_err(anyhow::Error::from)?;
        report.rows += 1;
        report.added += usize::from(added);
    }
    Ok(report)
}

/// Rows are `name,color,slug`.
pub fn import_tags(db: &mut Database, input: &str) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    for [name, color, slug] in records::<3>(input)? {
        let (_, added) = db.get_or_create_tag(&name, &color, &slug).map_err(anyhow::Error::from)?;
        report.rows += 1;
        report.added += usize::from(added);
    }
    Ok(report)
}

/// Adapter for running an import inside [`crate::storage::Storage::transaction`].
pub fn within<T>(result: Result<T>) -> AppResult<T> {
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(input: &str) -> Vec<Vec<String>> {
        parse_csv(input)
            .unwrap()
            .into_iter()
            .map(|(_, record)| record)
            .collect()
    }

    #[test]
    fn splits_plain_and_quoted_fields() {
        assert_eq!(fields("salt,g"), vec![vec!["salt", "g"]]);
        assert_eq!(fields(r#""salt, sea",g"#), vec![vec!["salt, sea", "g"]]);
        assert_eq!(
            fields(r#""say ""cheese""",pcs"#),
            vec![vec![r#"say "cheese""#, "pcs"]]
        );
        assert_eq!(fields("a,,b"), vec![vec!["a", "", "b"]]);
        assert!(parse_csv(r#""open,g"#).is_err());
    }

    #[test]
    fn quoted_fields_span_lines() {
        let records = parse_csv("\"two\nlines\",g\r\nsalt,g\n").unwrap();
        assert_eq!(
            records,
            vec![
                (1, vec!["two\nlines".to_string(), "g".to_string()]),
                (3, vec!["salt".to_string(), "g".to_string()]),
            ]
        );
    }

    #[test]
    fn rejects_text_after_closing_quote() {
        let err = parse_csv("salt,g\n\"a\"b,g\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(parse_csv("\"a\" ,g").is_err());
    }

    #[test]
    fn imports_ingredients_idempotently() {
        let mut db = Database::default();
        let csv = "salt,g\nsugar,g\r\n\n\"flour, rye\",kg\n";

        let first = import_ingredients(&mut db, csv).unwrap();
        assert_eq!(first, ImportReport { rows: 3, added: 3 });

        let second = import_ingredients(&mut db, csv).unwrap();
        assert_eq!(second, ImportReport { rows: 3, added: 0 });
        assert_eq!(db.ingredients.len(), 3);
        assert!(db.ingredients.iter().any(|i| i.name == "flour, rye"));
    }

    #[test]
    fn rejects_wrong_arity() {
        let mut db = Database::default();
        let err = import_tags(&mut db, "Breakfast,#E26C2D\n").unwrap_err();
        assert!(err.to_string().contains("expected 3 fields"));
        assert!(db.tags.is_empty());
    }

    #[test]
    fn imports_tags() {
        let mut db = Database::default();
        let report = import_tags(
            &mut db,
            "Breakfast,#E26C2D,breakfast\nLunch,#49B64E,lunch\nDinner,#8775D2,dinner\n",
        )
        .unwrap();
        assert_eq!(report.added, 3);
        assert_eq!(db.tag_ids_for_slugs(&["lunch".into()]).len(), 1);
    }
}
