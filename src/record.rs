// Flat table records and their tagged field values

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A single cell value from the remote table.
///
/// The remote store has no schema we can rely on, so values are classified
/// by their JSON shape when they arrive. Converting back to JSON always yields
/// the value that was received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FieldValue {
    Text(String),
    Number(Number),
    /// ISO 8601 date or date-time, kept verbatim
    Date(String),
    Tags(Vec<String>),
    Bool(bool),
    /// Attachments, linked records, nested objects, null
    Other(Value),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn int(n: i64) -> Self {
        FieldValue::Number(Number::from(n))
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::Tags(tags.into_iter().map(Into::into).collect())
    }

    /// Read a string typed on the command line or in a form.
    ///
    /// Input stays a string unless `like` (the value currently in the field)
    /// says otherwise: a number field takes a number, a checkbox field takes
    /// `true`/`false` and a tag field takes a comma list. Input that does not
    /// fit the field's kind is sent as typed.
    pub fn coerce_input(raw: &str, like: Option<&FieldValue>) -> Self {
        match like {
            Some(FieldValue::Number(_)) => {
                if let Ok(n) = raw.trim().parse::<i64>() {
                    return FieldValue::int(n);
                }
                if let Some(n) = raw.trim().parse::<f64>().ok().and_then(Number::from_f64) {
                    return FieldValue::Number(n);
                }
            }
            Some(FieldValue::Bool(_)) => match raw.trim() {
                "true" => return FieldValue::Bool(true),
                "false" => return FieldValue::Bool(false),
                _ => {}
            },
            Some(FieldValue::Tags(_)) => {
                let inner = raw
                    .trim()
                    .strip_prefix('[')
                    .and_then(|s| s.strip_suffix(']'))
                    .unwrap_or(raw);
                return FieldValue::Tags(
                    inner
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect(),
                );
            }
            _ => {}
        }
        FieldValue::from(Value::String(raw.to_string()))
    }

    /// String form used for searching and plain rendering.
    ///
    /// Returns `None` for JSON null, which never matches a search.
    pub fn search_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) | FieldValue::Date(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Tags(tags) => Some(tags.join(",")),
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Other(Value::Null) => None,
            FieldValue::Other(v) => Some(v.to_string()),
        }
    }

    /// The value as an instant, if it holds a parseable date.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(s) | FieldValue::Text(s) => parse_date(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Date(s) => Some(s),
            _ => None,
        }
    }
}

/// Parse the date formats the remote table emits.
///
/// A bare `YYYY-MM-DD` date is taken as midnight UTC.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.and_utc())
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => {
                if parse_date(&s).is_some() {
                    FieldValue::Date(s)
                } else {
                    FieldValue::Text(s)
                }
            }
            Value::Number(n) => FieldValue::Number(n),
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Array(items) if items.iter().all(Value::is_string) => FieldValue::Tags(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            other => FieldValue::Other(other),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Text(s) | FieldValue::Date(s) => Value::String(s),
            FieldValue::Number(n) => Value::Number(n),
            FieldValue::Tags(tags) => Value::Array(tags.into_iter().map(Value::String).collect()),
            FieldValue::Bool(b) => Value::Bool(b),
            FieldValue::Other(v) => v,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.search_text() {
            Some(s) => write!(f, "{}", s),
            None => Ok(()),
        }
    }
}

/// Field name to value mapping, ordered for stable rendering
pub type Fields = BTreeMap<String, FieldValue>;

/// Convert a field mapping into the JSON object the remote API expects
pub fn fields_to_json(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), Value::from(value.clone())))
        .collect()
}

/// A record exactly as the remote table returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

/// A normalized record: the identifier plus the remote fields, flattened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Fields::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Text of a field, if it holds text or a date
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str)
    }

    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }

    /// Every searchable string of this record, identifier first
    pub fn search_texts(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.id.clone()).chain(self.fields.values().filter_map(FieldValue::search_text))
    }
}

impl From<RemoteRecord> for Record {
    fn from(remote: RemoteRecord) -> Self {
        Self {
            id: remote.id,
            fields: remote.fields,
        }
    }
}

/// Normalize a list response into flat records.
///
/// Fails if the payload is not an array or an element lacks an identifier.
pub fn normalize(payload: Value) -> Result<Vec<Record>, crate::error::FetchError> {
    let Value::Array(items) = payload else {
        return Err(crate::error::FetchError::NotAnArray);
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<RemoteRecord>(item)
                .map(Record::from)
                .map_err(|e| crate::error::FetchError::Decode(e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_value_classification() {
        assert_eq!(FieldValue::from(json!("Taslak")), FieldValue::text("Taslak"));
        assert_eq!(FieldValue::from(json!("2024-01-01")), FieldValue::Date("2024-01-01".to_string()));
        assert_eq!(
            FieldValue::from(json!("2024-01-01T10:30:00.000Z")),
            FieldValue::Date("2024-01-01T10:30:00.000Z".to_string())
        );
        assert_eq!(FieldValue::from(json!(42)), FieldValue::int(42));
        assert_eq!(FieldValue::from(json!(["a", "b"])), FieldValue::tags(["a", "b"]));
        assert_eq!(FieldValue::from(json!(true)), FieldValue::Bool(true));
        assert_eq!(
            FieldValue::from(json!([{"url": "x"}])),
            FieldValue::Other(json!([{"url": "x"}]))
        );
    }

    #[test]
    fn test_field_value_json_preserves_input() {
        let raw = json!({"t": "2024-03-05", "n": 1.5, "tags": [], "o": {"k": 1}});
        let fields: Fields = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&fields).unwrap(), raw);
    }

    #[test]
    fn test_search_text() {
        assert_eq!(FieldValue::tags(["ai", "energy"]).search_text().unwrap(), "ai,energy");
        assert_eq!(FieldValue::int(0).search_text().unwrap(), "0");
        assert_eq!(FieldValue::Bool(false).search_text().unwrap(), "false");
        assert!(FieldValue::Other(Value::Null).search_text().is_none());
    }

    #[test]
    fn test_parse_date() {
        let midnight = parse_date("2024-01-10").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2024-01-10T00:00:00+00:00");
        assert!(parse_date("2024-01-10T12:00:00+03:00").is_some());
        assert!(parse_date("2024-01-10T12:00").is_some());
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_coerce_input_keeps_text() {
        let title = FieldValue::text("Enerji");
        assert_eq!(FieldValue::coerce_input("2024", Some(&title)), FieldValue::text("2024"));
        assert_eq!(FieldValue::coerce_input("007", None), FieldValue::text("007"));
        assert_eq!(FieldValue::coerce_input("true", None), FieldValue::text("true"));
        assert_eq!(FieldValue::coerce_input("[a, b]", Some(&title)), FieldValue::text("[a, b]"));
        assert_eq!(
            FieldValue::coerce_input("2024-02-01", None),
            FieldValue::Date("2024-02-01".to_string())
        );
        assert_eq!(Value::from(FieldValue::coerce_input("2024", None)), json!("2024"));
    }

    #[test]
    fn test_coerce_input_follows_field_kind() {
        let count = FieldValue::int(3);
        assert_eq!(FieldValue::coerce_input("12", Some(&count)), FieldValue::int(12));
        assert_eq!(Value::from(FieldValue::coerce_input("1.5", Some(&count))), json!(1.5));
        assert_eq!(FieldValue::coerce_input("many", Some(&count)), FieldValue::text("many"));

        let flag = FieldValue::Bool(false);
        assert_eq!(FieldValue::coerce_input("true", Some(&flag)), FieldValue::Bool(true));
        assert_eq!(FieldValue::coerce_input("yes", Some(&flag)), FieldValue::text("yes"));

        let tags = FieldValue::tags(["ai"]);
        assert_eq!(FieldValue::coerce_input("a, b,,c", Some(&tags)), FieldValue::tags(["a", "b", "c"]));
        assert_eq!(FieldValue::coerce_input("[x,y]", Some(&tags)), FieldValue::tags(["x", "y"]));
        assert_eq!(FieldValue::coerce_input("", Some(&tags)), FieldValue::Tags(Vec::new()));
    }

    #[test]
    fn test_normalize_flattens_records() {
        let payload = json!([
            {"id": "r1", "createdTime": "2024-01-01T00:00:00.000Z", "fields": {"Durum": "Taslak"}},
            {"id": "r2", "fields": {}},
        ]);

        let records = normalize(payload).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "r1");
        assert_eq!(records[0].get_str("Durum"), Some("Taslak"));
        assert!(records[1].fields.is_empty());

        let flat = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(flat, json!({"id": "r1", "Durum": "Taslak"}));
    }

    #[test]
    fn test_normalize_rejects_non_array() {
        let err = normalize(json!({"error": "API error"})).unwrap_err();
        assert!(matches!(err, crate::error::FetchError::NotAnArray));
    }

    #[test]
    fn test_normalize_rejects_missing_id() {
        let err = normalize(json!([{"fields": {}}])).unwrap_err();
        assert!(matches!(err, crate::error::FetchError::Decode(_)));
    }
}
