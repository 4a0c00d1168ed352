//! Record → Userpilot `identify` payload mapping.
//!
//! Every metadata value is sent as text. JSON strings go through verbatim;
//! anything else takes the form existing Userpilot profiles already hold:
//! `True`, `None`, `['crm', 'chat']`, `{'y': 2020}`.

use serde_json::Value;
use userpilot_types::{IdentifyMetadata, IdentifyPayload};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("record is missing required field '{field}'")]
    MissingField { field: &'static str },
}

/// Textual form of a record value. Only strings at the top level are
/// left unquoted.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => {
            let mut out = String::new();
            write_repr(&mut out, other);
            out
        }
    }
}

fn write_repr(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => out.push_str(&number_text(n)),
        Value::String(s) => write_quoted(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_repr(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_quoted(out, key);
                out.push_str(": ");
                write_repr(out, item);
            }
            out.push('}');
        }
    }
}

/// Integers keep every digit; anything with a fraction or exponent is a
/// float and prints as its shortest round-trip form (`1.0`, `1e+16`).
fn number_text(n: &serde_json::Number) -> String {
    let literal = n.to_string();
    if !literal.contains(['.', 'e', 'E']) {
        return literal;
    }
    let Some(f) = n.as_f64() else {
        return literal;
    };
    if f.is_infinite() {
        return if f > 0.0 { "inf".into() } else { "-inf".into() };
    }
    let shortest = format!("{f:?}");
    match shortest.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => shortest,
    }
}

/// Single quotes unless the text holds a `'` and no `"`.
fn write_quoted(out: &mut String, s: &str) {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

/// Build the `identify` body for one validated record.
///
/// A record that is not a JSON object has no fields and fails on
/// `organization_id`.
///
/// # Errors
///
/// Returns [`TransformError::MissingField`] for the first absent source
/// field. A field present with value `null` is not missing.
pub fn to_identify_payload(record: &Value) -> Result<IdentifyPayload, TransformError> {
    let field = |name: &'static str| {
        record
            .get(name)
            .map(text)
            .ok_or(TransformError::MissingField { field: name })
    };

    let user_id = field("organization_id")?;
    let first_name = field("first_name")?;
    let last_name = field("last_name")?;

    Ok(IdentifyPayload {
        user_id,
        metadata: IdentifyMetadata {
            name: format!("{first_name} {last_name}"),
            first_name,
            last_name,
            orga_creation_date: field("orga_creation_date")?,
            is_email_campaign_validated: field("is_email_campaign_validated")?,
            is_transactional_email_validated: field("is_transactional_email_validated")?,
            is_profile_completed: field("is_profile_completed")?,
            enabled_internal_apps: field("enabled_internal_apps")?,
            is_bot: field("is_bot")?,
            is_receive_newsletter: field("is_receive_newsletter")?,
        },
    })
}
