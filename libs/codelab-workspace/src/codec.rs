//! Input/Output Codec
//!
//! The execution backend has no structured multi-argument protocol. A case's
//! input travels as its field values joined by ` | ` in declared order, and
//! comes back the same way.
//!
//! **Rules:**
//! - `encode` never includes the output field
//! - `decode` trims every segment
//! - missing trailing fields decode to empty strings
//! - a single-field problem never splits, so `|` inside the value survives
//! - surplus segments fold back into the last field

pub const FIELD_DELIMITER: &str = " | ";

const SPLIT_CHAR: char = '|';

/// Join input values in declared order
pub fn encode<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|value| value.as_ref())
        .collect::<Vec<_>>()
        .join(FIELD_DELIMITER)
}

/// Split a raw input string into exactly `field_count` values. Never fails.
pub fn decode(raw: &str, field_count: usize) -> Vec<String> {
    match field_count {
        0 => Vec::new(),
        1 => vec![raw.trim().to_string()],
        _ => {
            let segments: Vec<&str> = raw.split(SPLIT_CHAR).map(str::trim).collect();

            let mut values: Vec<String> = segments
                .iter()
                .take(field_count - 1)
                .map(|segment| segment.to_string())
                .collect();

            let rest = segments.iter().skip(field_count - 1).copied().collect::<Vec<_>>();
            if !rest.is_empty() {
                values.push(rest.join(FIELD_DELIMITER));
            }

            values.resize(field_count, String::new());
            values
        }
    }
}
