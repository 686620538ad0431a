//! Inbound location request and batch validation

use crate::{PlannerError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One (place, travel window) tuple of a weather lookup batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRequest {
    /// Free-text place name, also the destination key
    pub place_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Item shape before validation; every field optional so problems can be reported together
#[derive(Debug, Deserialize)]
struct RawLocationRequest {
    place_name: Option<Value>,
    start_date: Option<Value>,
    end_date: Option<Value>,
}

impl LocationRequest {
    #[must_use]
    pub fn new(place_name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            place_name: place_name.into(),
            start_date,
            end_date,
        }
    }

    /// Parse and validate a JSON request body into an ordered batch.
    ///
    /// The whole batch is rejected if any item is malformed; the error lists
    /// every problem found, prefixed with the item index.
    pub fn parse_batch(body: &[u8]) -> Result<Vec<LocationRequest>> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| PlannerError::validation(format!("Malformed JSON body: {e}")))?;

        let Value::Array(items) = value else {
            return Err(PlannerError::validation(
                "Expected a list of items but got a single value",
            ));
        };

        let mut requests = Vec::with_capacity(items.len());
        let mut problems = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            match Self::from_item(item) {
                Ok(request) => requests.push(request),
                Err(item_problems) => problems.extend(
                    item_problems
                        .into_iter()
                        .map(|problem| format!("item {index}: {problem}")),
                ),
            }
        }

        if problems.is_empty() {
            Ok(requests)
        } else {
            Err(PlannerError::validation(problems.join("; ")))
        }
    }

    fn from_item(item: Value) -> std::result::Result<Self, Vec<String>> {
        let raw: RawLocationRequest = serde_json::from_value(item)
            .map_err(|_| vec!["expected an object with place_name, start_date and end_date".to_string()])?;

        let mut problems = Vec::new();

        let place_name = match raw.place_name {
            Some(Value::String(name)) if !name.trim().is_empty() => {
                Some(name.trim().to_string())
            }
            Some(Value::String(_)) => {
                problems.push("place_name must not be blank".to_string());
                None
            }
            Some(_) => {
                problems.push("place_name must be a string".to_string());
                None
            }
            None => {
                problems.push("place_name is required".to_string());
                None
            }
        };
        let start_date = parse_date_field("start_date", raw.start_date, &mut problems);
        let end_date = parse_date_field("end_date", raw.end_date, &mut problems);

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                problems.push(format!(
                    "start_date {start} must not be after end_date {end}"
                ));
            }
        }

        match (place_name, start_date, end_date) {
            (Some(place_name), Some(start_date), Some(end_date)) if problems.is_empty() => {
                Ok(Self {
                    place_name,
                    start_date,
                    end_date,
                })
            }
            _ => Err(problems),
        }
    }
}

fn parse_date_field(
    field: &str,
    value: Option<Value>,
    problems: &mut Vec<String>,
) -> Option<NaiveDate> {
    match value {
        Some(Value::String(text)) => match NaiveDate::parse_from_str(text.trim(), DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                problems.push(format!("{field} '{text}' is not a date in YYYY-MM-DD format"));
                None
            }
        },
        Some(_) => {
            problems.push(format!("{field} must be a string"));
            None
        }
        None => {
            problems.push(format!("{field} is required"));
            None
        }
    }
}
