use std::fmt::Write as _;
use std::io;

use crate::metadata::Fields;

const LEADING_KEYS: [&str; 6] = ["title", "slug", "date", "modified", "category", "tags"];
// after the leading keys, in mapping order
const TRAILING_KEYS: [&str; 2] = ["authors", "summary"];

fn title_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn single_line(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders `fields` as canonical `Key: Value` lines followed by one blank line.
///
/// Multi-valued fields are expected to be joined by the caller already.
/// Values are trimmed and line breaks inside them become single spaces, so a
/// value with leading whitespace does not read back unchanged.
/// Unrecognized keys and empty values are left out; nothing to emit gives `""`.
pub fn format(fields: &Fields) -> String {
    let leading = LEADING_KEYS
        .iter()
        .filter_map(|key| fields.get_key_value(*key));
    let trailing = fields
        .iter()
        .filter(|(key, _)| TRAILING_KEYS.contains(&key.as_str()));

    let mut res = String::new();
    for (key, value) in leading.chain(trailing) {
        let value = single_line(value);
        if value.is_empty() {
            continue;
        }
        let _ = writeln!(res, "{}: {}", title_case(key), value);
    }
    if !res.is_empty() {
        res.push('\n');
    }

    res
}

/// Writes the new header block above `existing`, which is kept as is,
/// header block included.
pub fn prepend<W: io::Write + ?Sized>(
    fields: &Fields,
    existing: &str,
    sink: &mut W,
) -> io::Result<()> {
    sink.write_all(format(fields).as_bytes())?;
    sink.write_all(existing.as_bytes())
}

pub fn overwrite<W: io::Write + ?Sized>(
    fields: &Fields,
    parsed_body: &str,
    sink: &mut W,
) -> io::Result<()> {
    sink.write_all(format(fields).as_bytes())?;
    sink.write_all(parsed_body.as_bytes())
}
