use chrono::{NaiveDate, NaiveDateTime};

/// Timestamp layout used by the IBGE API and the saved profile file
pub const WIRE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp layout shown to the user
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

const UNAVAILABLE: &str = "date unavailable";

/// Parse a timestamp with the given pattern. Blank or malformed input yields `None`.
pub fn parse_timestamp(raw: &str, pattern: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match NaiveDateTime::parse_from_str(raw, pattern) {
        Ok(ts) => Some(ts),
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "Unparseable timestamp, treating as missing");
            None
        }
    }
}

pub fn format_timestamp(ts: &NaiveDateTime, pattern: &str) -> String {
    ts.format(pattern).to_string()
}

/// Format an optional timestamp for display, with a fallback for missing dates
pub fn display_timestamp(ts: Option<&NaiveDateTime>) -> String {
    ts.map(|t| format_timestamp(t, DISPLAY_FORMAT))
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

/// The API expects `YYYYMMDD` for the `de`/`ate` parameters
pub fn to_api_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string().replace('-', "")
}

/// Serde adapter for `Option<NaiveDateTime>` in [`WIRE_FORMAT`].
///
/// Absent, null, blank or unparseable values deserialize to `None`;
/// `None` serializes to JSON `null`.
pub mod opt_wire_timestamp {
    use super::{format_timestamp, parse_timestamp, WIRE_FORMAT};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&format_timestamp(ts, WIRE_FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(|s| parse_timestamp(s, WIRE_FORMAT)))
    }
}
