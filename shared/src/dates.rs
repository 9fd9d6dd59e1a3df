//! Evaluation date parsing and ordering
//!
//! Evaluation dates are typed as `DD/MM/YYYY` on the field sheets. Ordering
//! never fails: a date that does not parse keeps its position and the
//! anomaly is logged.

use std::cmp::Ordering;

use chrono::NaiveDate;
use thiserror::Error;

/// Field-sheet date format
pub const EVALUATION_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid evaluation date '{value}', expected DD/MM/YYYY")]
pub struct DateParseError {
    pub value: String,
}

/// Parse a `DD/MM/YYYY` evaluation date
pub fn parse_evaluation_date(value: &str) -> Result<NaiveDate, DateParseError> {
    NaiveDate::parse_from_str(value.trim(), EVALUATION_DATE_FORMAT).map_err(|_| DateParseError {
        value: value.to_string(),
    })
}

fn parse_logged(value: &str) -> Option<NaiveDate> {
    match parse_evaluation_date(value) {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::warn!("{}; leaving it in place", e);
            None
        }
    }
}

/// Most recent first; `Equal` when either side does not parse
pub fn compare_dates_desc(a: &str, b: &str) -> Ordering {
    match (parse_logged(a), parse_logged(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        _ => Ordering::Equal,
    }
}

/// Sort items by their evaluation date, most recent first.
///
/// Items whose date parses are reordered among the positions they occupy;
/// items with an unparseable date stay exactly where they were. The sort is
/// stable.
pub fn sort_by_date_desc<T, F>(items: &mut Vec<T>, date_of: F)
where
    F: Fn(&T) -> &str,
{
    let taken = std::mem::take(items);
    let mut slots = Vec::new();
    let mut dated = Vec::new();
    let mut placed: Vec<Option<T>> = Vec::with_capacity(taken.len());

    for (index, item) in taken.into_iter().enumerate() {
        match parse_logged(date_of(&item)) {
            Some(date) => {
                slots.push(index);
                dated.push((date, item));
                placed.push(None);
            }
            None => placed.push(Some(item)),
        }
    }

    dated.sort_by(|a, b| b.0.cmp(&a.0));
    for (slot, (_, item)) in slots.into_iter().zip(dated) {
        placed[slot] = Some(item);
    }

    *items = placed.into_iter().flatten().collect();
}

/// Sort date strings, most recent first
pub fn sort_dates_desc(dates: &mut Vec<String>) {
    sort_by_date_desc(dates, |d| d.as_str());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_date() {
        let date = parse_evaluation_date("01/03/2024").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_parse_rejects_other_formats() {
        assert!(parse_evaluation_date("2024-03-01").is_err());
        assert!(parse_evaluation_date("31/02/2024").is_err());
        assert!(parse_evaluation_date("").is_err());
    }

    #[test]
    fn test_compare_unparseable_is_equal() {
        assert_eq!(compare_dates_desc("bad", "01/03/2024"), Ordering::Equal);
        assert_eq!(
            compare_dates_desc("01/03/2024", "15/01/2024"),
            Ordering::Less
        );
    }

    #[test]
    fn test_unparseable_dates_keep_their_slot() {
        let mut dates = vec![
            "15/01/2024".to_string(),
            "sin fecha".to_string(),
            "01/03/2024".to_string(),
        ];
        sort_dates_desc(&mut dates);
        assert_eq!(dates, vec!["01/03/2024", "sin fecha", "15/01/2024"]);
    }
}
