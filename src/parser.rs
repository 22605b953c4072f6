use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::metadata::{Fields, HeaderBlock};

const FENCE: &str = "---";

fn header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // exactly one space after the colon keeps `http://host` out
    PATTERN.get_or_init(|| Regex::new(r"^([A-Za-z]+): (\S.*)$").unwrap())
}

fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

pub(crate) fn header_line(line: &str) -> Option<(&str, &str)> {
    let caps = header_pattern().captures(strip_line_ending(line))?;
    let key = caps.get(1)?.as_str();
    let value = caps.get(2)?.as_str().trim_end();
    Some((key, value))
}

fn insert_field(fields: &mut Fields, key: &str, value: &str) {
    let mut key = key.to_lowercase();
    if key == "author" {
        key = "authors".to_string();
    }
    fields
        .entry(key)
        .and_modify(|existing| {
            existing.push_str("; ");
            existing.push_str(value);
        })
        .or_insert_with(|| value.to_string());
}

// `None` when the first line is no fence or the fence is never closed
fn parse_fenced(lines: &[&str]) -> Option<HeaderBlock> {
    if strip_line_ending(lines.first()?) != FENCE {
        return None;
    }
    let close = lines
        .iter()
        .skip(1)
        .position(|line| strip_line_ending(line) == FENCE)?
        + 1;

    let mut fields = Fields::new();
    for line in &lines[1..close] {
        let Some((key, value)) = header_line(line) else {
            debug!("Header region ends inside fence at {:?}", line);
            break;
        };
        insert_field(&mut fields, key, value);
    }

    Some(HeaderBlock {
        fields,
        body: lines[close + 1..].concat(),
        exists: true,
    })
}

fn parse_unfenced(lines: &[&str]) -> HeaderBlock {
    let mut fields = Fields::new();
    let mut consumed = 0;
    for line in lines {
        let Some((key, value)) = header_line(line) else {
            break;
        };
        insert_field(&mut fields, key, value);
        consumed += 1;
    }
    // one blank separator line belongs to the header block
    if consumed > 0 && lines.get(consumed).is_some_and(|line| is_blank(line)) {
        consumed += 1;
    }

    HeaderBlock {
        fields,
        body: lines[consumed..].concat(),
        exists: true,
    }
}

/// Never fails: text that does not start with a header line is all body.
pub fn parse_text(text: &str) -> HeaderBlock {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    parse_fenced(&lines).unwrap_or_else(|| parse_unfenced(&lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn header_line_requires_single_space() {
        assert_eq!(header_line("Title: Hello\n"), Some(("Title", "Hello")));
        assert_eq!(header_line("title: Hello\r\n"), Some(("title", "Hello")));
        assert_eq!(header_line("http://host/path"), None);
        assert_eq!(header_line("Title:  two spaces"), None);
        assert_eq!(header_line("Title:no space"), None);
        assert_eq!(header_line("Title: "), None);
        assert_eq!(header_line("Two words: value"), None);
        assert_eq!(header_line("Key2: value"), None);
    }

    #[test]
    fn text_without_headers_is_all_body() {
        let text = "Just a paragraph.\nTitle: not a header\n";
        let block = parse_text(text);
        assert!(block.fields.is_empty());
        assert_eq!(block.body, text);
    }

    #[test]
    fn leading_blank_line_is_kept_in_body() {
        let text = "\nTitle: late\n";
        let block = parse_text(text);
        assert!(block.fields.is_empty());
        assert_eq!(block.body, text);
    }

    #[test]
    fn url_alone_is_not_a_header() {
        let block = parse_text("http://host/path");
        assert!(block.fields.is_empty());
        assert_eq!(block.body, "http://host/path");
    }

    #[test]
    fn repeated_keys_merge() {
        let block = parse_text("Tags: A\nTags: B\nTags: C\n\n");
        assert_eq!(block.get("tags"), Some("A; B; C"));
        assert_eq!(block.body, "");
    }

    #[test]
    fn author_folds_into_authors() {
        let block = parse_text("Author: Ann\nAuthors: Bob\n\nbody\n");
        assert_eq!(block.fields, fields(&[("authors", "Ann; Bob")]));
        assert_eq!(block.body, "body\n");
    }

    #[test]
    fn only_one_separator_line_is_consumed() {
        let block = parse_text("Title: T\n\n\nbody\n");
        assert_eq!(block.body, "\nbody\n");
    }

    #[test]
    fn separator_is_optional() {
        let block = parse_text("Title: T\nCategory: C\nText right away\n");
        assert_eq!(block.fields, fields(&[("title", "T"), ("category", "C")]));
        assert_eq!(block.body, "Text right away\n");
    }

    #[test]
    fn fenced_headers() {
        let block = parse_text("---\ntitle: Fenced\nslug: fenced\n---\nBody\n");
        assert_eq!(block.fields, fields(&[("title", "Fenced"), ("slug", "fenced")]));
        assert_eq!(block.body, "Body\n");
    }

    #[test]
    fn fenced_headers_stop_at_first_non_header_line() {
        let block = parse_text("---\ntitle: A\n\nslug: b\n---\nBody\n");
        assert_eq!(block.fields, fields(&[("title", "A")]));
        assert_eq!(block.body, "Body\n");

        let block = parse_text("---\ntitle: A\nnot a header\nslug: b\n---\nBody\n");
        assert_eq!(block.fields, fields(&[("title", "A")]));
        assert_eq!(block.body, "Body\n");
    }

    #[test]
    fn unclosed_fence_degrades_to_body() {
        let text = "---\ntitle: Never closed\n";
        let block = parse_text(text);
        assert!(block.fields.is_empty());
        assert_eq!(block.body, text);
    }

    #[test]
    fn crlf_values_are_clean_and_body_verbatim() {
        let block = parse_text("Title: Windows\r\n\r\nline one\r\n");
        assert_eq!(block.get("title"), Some("Windows"));
        assert_eq!(block.body, "line one\r\n");
    }

    #[test]
    fn empty_text() {
        let block = parse_text("");
        assert!(block.fields.is_empty());
        assert_eq!(block.body, "");
        assert!(block.exists);
    }
}
