//! CSV serialisation of the displayed table.

use std::borrow::Cow;

/// Quote a field if it contains a delimiter, quote, or line break.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Append one record terminated by `\n`.
pub fn push_record<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(field.as_ref()));
    }
    out.push('\n');
}

/// Header row followed by one line per data row.
pub fn to_csv<H: AsRef<str>, S: AsRef<str>>(headers: &[H], rows: &[Vec<S>]) -> String {
    let mut out = String::new();
    push_record(&mut out, headers);
    for row in rows {
        push_record(&mut out, row);
    }
    out
}
