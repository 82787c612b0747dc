//! Line parsing and validation
//!
//! [`parse_line`] is a pure function from one raw text line to either a
//! [`ClientRecord`] or a [`RejectReason`]. Checks run in a fixed order so a
//! line with several problems always reports the same reason.
//!
//! Expected field order: name | surname | national id | status | admission
//! date | politically exposed | obligated subject. The two trailing boolean
//! fields may be empty or omitted.

use chrono::NaiveDate;

use crate::record::{truncate_chars, ClientRecord, RejectReason, MAX_FULL_NAME_CHARS};

/// Field separator in the input file
pub const FIELD_DELIMITER: char = '|';

/// Mandatory leading fields: name, surname, national id, status, admission date
pub const MIN_FIELDS: usize = 5;

const DATE_FORMAT: &str = "%Y-%m-%d";

const REQUIRED_FIELD_NAMES: [&str; MIN_FIELDS] =
    ["name", "surname", "national id", "status", "admission date"];

/// Full-name validation policy
///
/// Only one observed variant of the legacy loader enforced the strict shape
/// check, so it is a toggle rather than a fixed rule. `Strict` additionally
/// requires the full name to be 2-4 words of alphabetic characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamePolicy {
    #[default]
    Lenient,
    Strict,
}

/// Parse and validate one input line
///
/// Pure and deterministic: no I/O, no state, same input gives a structurally
/// equal result every time.
pub fn parse_line(raw: &str, policy: NamePolicy) -> Result<ClientRecord, RejectReason> {
    let fields: Vec<&str> = raw.split(FIELD_DELIMITER).collect();
    if fields.len() < MIN_FIELDS {
        return Err(RejectReason::InsufficientFields {
            found: fields.len(),
        });
    }

    for (value, name) in fields.iter().zip(REQUIRED_FIELD_NAMES) {
        if value.trim().is_empty() {
            return Err(RejectReason::MissingRequiredField(name));
        }
    }

    let name = fields[0].trim();
    let surname = fields[1].trim();
    let id_field = fields[2].trim();
    let status = fields[3].trim();
    let date_field = fields[4].trim();

    let national_id: i64 = id_field
        .parse()
        .map_err(|_| RejectReason::InvalidId(id_field.to_string()))?;

    let admission_date = NaiveDate::parse_from_str(date_field, DATE_FORMAT)
        .map_err(|_| RejectReason::InvalidDate(date_field.to_string()))?;

    // The strict check sees the untruncated name: truncation must not hide a
    // bad character or change the word count.
    let joined = format!("{} {}", name, surname);
    if policy == NamePolicy::Strict && !is_valid_full_name(&joined) {
        return Err(RejectReason::InvalidName);
    }
    let full_name = truncate_chars(&joined, MAX_FULL_NAME_CHARS).to_string();

    let is_politically_exposed = fields.get(5).is_some_and(|v| is_true(v));

    // Empty or absent means unknown, not false.
    let is_obligated_subject = match fields.get(6).map(|v| v.trim()) {
        None | Some("") => None,
        Some(value) => Some(is_true(value)),
    };

    Ok(ClientRecord {
        full_name,
        national_id,
        status: status.to_string(),
        admission_date,
        is_politically_exposed,
        is_obligated_subject,
    })
}

/// Case-insensitive boolean: exactly "true" is true, anything else is false
fn is_true(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Strict policy shape check: alphabetic characters and spaces, 2-4 words
fn is_valid_full_name(full_name: &str) -> bool {
    let shape_ok = full_name.chars().all(|c| c.is_alphabetic() || c == ' ');
    let words = full_name.split_whitespace().count();
    shape_ok && (2..=4).contains(&words)
}
