//! CSV rendering helpers
//!
//! Export files must never contain an unescaped embedded quote or a raw
//! newline inside a field: fields with commas or quotes are quoted with
//! doubled quotes, and newlines/tabs are replaced by spaces before
//! quoting.

/// Escape one field for inclusion in a CSV row.
pub fn escape_field(field: &str) -> String {
    let cleaned: String = field
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            other => other,
        })
        .collect();

    if cleaned.contains(',') || cleaned.contains('"') {
        format!("\"{}\"", cleaned.replace('"', "\"\""))
    } else {
        cleaned
    }
}

/// Render one CSV row from already-stringified fields.
pub fn render_row(fields: &[String]) -> String {
    let mut row = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    row.push('\n');
    row
}

/// Render a complete CSV document from a header and rows.
pub fn render_document(header: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut out = String::new();
    out.push_str(&render_row(
        &header.iter().map(|h| h.to_string()).collect::<Vec<_>>(),
    ));
    for row in rows {
        out.push_str(&render_row(&row));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_field_unchanged() {
        assert_eq!(escape_field("hello"), "hello");
    }

    #[test]
    fn test_comma_forces_quoting() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
    }

    #[test]
    fn test_embedded_quotes_doubled() {
        assert_eq!(escape_field(r#"say "hi""#), r#""say ""hi""""#);
    }

    #[test]
    fn test_newlines_and_tabs_stripped() {
        assert_eq!(escape_field("line1\nline2\tend"), "line1 line2 end");
        assert_eq!(escape_field("crlf\r\nnext"), "crlf  next");
    }

    #[test]
    fn test_no_raw_newline_survives() {
        let nasty = "a\"b,c\nd\te";
        let escaped = escape_field(nasty);
        assert!(!escaped[1..escaped.len() - 1].contains('\n'));
        assert!(!escaped.contains('\t'));
    }

    #[test]
    fn test_render_row() {
        let row = render_row(&["a".to_string(), "b,c".to_string()]);
        assert_eq!(row, "a,\"b,c\"\n");
    }

    #[test]
    fn test_render_document() {
        let doc = render_document(
            &["id", "message"],
            vec![
                vec!["1".to_string(), "ok".to_string()],
                vec!["2".to_string(), "with,comma".to_string()],
            ],
        );
        assert_eq!(doc, "id,message\n1,ok\n2,\"with,comma\"\n");
    }
}
