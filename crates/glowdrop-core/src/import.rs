//! Parsers for catalog bulk-import payloads.
//!
//! Both formats are newline-delimited with blank lines skipped. Parsing
//! validates the whole payload before anything is returned, so a caller never
//! sees a partial batch.

use std::collections::HashSet;

use thiserror::Error;

use crate::geo::{Area, AreaKind};
use crate::vendors::Vendor;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct ImportError {
    /// 1-based line number in the submitted payload.
    pub line: usize,
    pub reason: String,
}

impl ImportError {
    pub(crate) fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// One parsed area line, remembered with its source line for error reporting
/// when the batch is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaRecord {
    pub line: usize,
    pub area: Area,
}

fn non_blank_lines(payload: &str) -> impl Iterator<Item = (usize, &str)> {
    payload
        .lines()
        .enumerate()
        .map(|(idx, raw)| (idx + 1, raw.trim()))
        .filter(|(_, line)| !line.is_empty())
}

/// Parse `id,city,areaDisplayName,areaKind,pipeDelimitedPostalCodes` lines.
///
/// # Errors
///
/// Returns the first [`ImportError`] encountered.
pub fn parse_area_records(payload: &str) -> Result<Vec<AreaRecord>, ImportError> {
    let mut records = Vec::new();
    let mut seen_ids = HashSet::new();

    for (line_no, line) in non_blank_lines(payload) {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [id, city, display_name, kind, codes] = fields.as_slice() else {
            return Err(ImportError::new(
                line_no,
                format!("expected 5 comma-separated fields, found {}", fields.len()),
            ));
        };

        for (name, value) in [("id", id), ("city", city), ("display name", display_name)] {
            if value.is_empty() {
                return Err(ImportError::new(
                    line_no,
                    format!("{name} must be non-empty"),
                ));
            }
        }

        let kind: AreaKind = kind.parse().map_err(|e| ImportError::new(line_no, e))?;

        let mut member_codes: Vec<String> = Vec::new();
        for code in codes.split('|').map(str::trim).filter(|c| !c.is_empty()) {
            if !crate::is_valid_postal_code(code) {
                return Err(ImportError::new(
                    line_no,
                    format!("invalid postal code '{code}'"),
                ));
            }
            if member_codes.iter().any(|c| c == code) {
                return Err(ImportError::new(
                    line_no,
                    format!("postal code {code} listed twice"),
                ));
            }
            member_codes.push(code.to_string());
        }
        if member_codes.is_empty() {
            return Err(ImportError::new(line_no, "area has no postal codes"));
        }

        if !seen_ids.insert((*id).to_string()) {
            return Err(ImportError::new(
                line_no,
                format!("area id '{id}' appears more than once in this import"),
            ));
        }

        records.push(AreaRecord {
            line: line_no,
            area: Area {
                id: (*id).to_string(),
                city: (*city).to_string(),
                display_name: (*display_name).to_string(),
                kind,
                member_codes,
            },
        });
    }

    Ok(records)
}

/// Parse one JSON-encoded [`Vendor`] per line.
///
/// # Errors
///
/// Returns the first [`ImportError`] encountered: malformed JSON, an invalid
/// field, or a vendor id repeated within the payload.
pub fn parse_vendor_records(payload: &str) -> Result<Vec<Vendor>, ImportError> {
    let mut vendors = Vec::new();
    let mut seen_ids = HashSet::new();

    for (line_no, line) in non_blank_lines(payload) {
        let vendor: Vendor = serde_json::from_str(line)
            .map_err(|e| ImportError::new(line_no, format!("invalid vendor record: {e}")))?;
        vendor
            .validate()
            .map_err(|reason| ImportError::new(line_no, reason))?;
        if !seen_ids.insert(vendor.id.clone()) {
            return Err(ImportError::new(
                line_no,
                format!(
                    "vendor id '{}' appears more than once in this import",
                    vendor.id
                ),
            ));
        }
        vendors.push(vendor);
    }

    Ok(vendors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_area_line() {
        let records =
            parse_area_records("a1,Houston,Third Ward,NEIGHBORHOOD,77004|77021\n").expect("parse");
        assert_eq!(records.len(), 1);
        let area = &records[0].area;
        assert_eq!(area.id, "a1");
        assert_eq!(area.display_name, "Third Ward");
        assert_eq!(area.kind, AreaKind::Neighborhood);
        assert_eq!(area.member_codes, vec!["77004", "77021"]);
    }

    #[test]
    fn skips_blank_lines_and_keeps_line_numbers() {
        let payload = "\n a1,Houston,Third Ward,NEIGHBORHOOD,77004 \n\n\na2,Houston,Pearland,SUBURB,77584\n";
        let records = parse_area_records(payload).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[1].line, 5);
    }

    #[test]
    fn reports_first_error_with_line_number() {
        let payload = "a1,Houston,Third Ward,NEIGHBORHOOD,77004\na2,Houston,Bad,CITY,77021\na3,,x,REGION,77002";
        let err = parse_area_records(payload).unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.reason.contains("unknown area kind"));
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = parse_area_records("a1,Houston,Third Ward,NEIGHBORHOOD").unwrap_err();
        assert_eq!(err.line, 1);
        let message = err.to_string();
        assert!(message.contains("expected 5 comma-separated fields, found 4"));
    }

    #[test]
    fn rejects_invalid_and_duplicate_codes() {
        let err = parse_area_records("a1,Houston,X,REGION,77004|ABCDE").unwrap_err();
        assert!(err.reason.contains("invalid postal code 'ABCDE'"));
        let err = parse_area_records("a1,Houston,X,REGION,77004|77004").unwrap_err();
        assert!(err.reason.contains("listed twice"));
        let err = parse_area_records("a1,Houston,X,REGION,").unwrap_err();
        assert!(err.reason.contains("no postal codes"));
    }

    #[test]
    fn rejects_repeated_area_id() {
        let payload = "a1,Houston,X,REGION,77004\na1,Houston,Y,REGION,77021";
        let err = parse_area_records(payload).unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn parses_vendor_json_lines() {
        let payload = concat!(
            r#"{"id":"v1","name":"Crowned Beauty","address":"1 Almeda","postal_code":"77004","latitude":29.72,"longitude":-95.36,"pricing_tier":"PREMIUM","velocity_minutes":8}"#,
            "\n\n",
            r#"{"id":"v2","name":"Glow","address":"2 Main","postal_code":"77021","latitude":29.69,"longitude":-95.35}"#,
        );
        let vendors = parse_vendor_records(payload).expect("parse");
        assert_eq!(vendors.len(), 2);
        assert_eq!(vendors[0].velocity_minutes, Some(8));
    }

    #[test]
    fn vendor_parse_errors_carry_line_number() {
        let payload = concat!(
            r#"{"id":"v1","name":"A","address":"1","postal_code":"77004","latitude":29.7,"longitude":-95.3}"#,
            "\n",
            r#"{"id":"v2","name":"B","address":"2","postal_code":"77004","latitude":29.7,"longitude":-95.3,"rating_average":9.0}"#,
        );
        let err = parse_vendor_records(payload).unwrap_err();
        assert_eq!(err.line, 2);

        let err = parse_vendor_records("{not json").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.reason.starts_with("invalid vendor record"));
    }
}
