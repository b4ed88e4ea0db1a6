// Delimited text -> rows of trimmed fields.
// Rows split on '\n', fields on ','. A '"' toggles quoted state and is never emitted,
// so quoted fields may contain commas but not newlines. A row holding an escaped
// quote is unsupported input: it is left out of `rows` and reported in `rejected`.

use crate::error::ParseError;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedRows {
    pub rows: Vec<Vec<String>>,
    pub rejected: Vec<ParseError>,
}

impl ParsedRows {
    /// True when the first line (the header) was rejected.
    pub fn header_rejected(&self) -> bool {
        self.rejected.iter().any(|e| e.row() == 1)
    }
}

pub fn parse_rows(text: &str) -> ParsedRows {
    let mut parsed = ParsedRows::default();
    for (i, line) in text.split('\n').enumerate() {
        match parse_line(line, i + 1) {
            Ok(fields) => parsed.rows.push(fields),
            Err(e) => parsed.rejected.push(e),
        }
    }
    parsed
}

fn parse_line(line: &str, row: usize) -> Result<Vec<String>, ParseError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    return Err(ParseError::EscapedQuote {
                        row,
                        column: fields.len() + 1,
                    });
                }
                in_quotes = !in_quotes;
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_comma_stays_in_field() {
        let parsed = parse_rows(r#"a,"b, c",d"#);
        assert_eq!(parsed.rows, vec![vec!["a", "b, c", "d"]]);
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn carriage_return_is_trimmed() {
        let rows = parse_rows("x,y\r\n1,2\r").rows;
        assert_eq!(rows[0], vec!["x", "y"]);
        assert_eq!(rows[1], vec!["1", "2"]);
    }

    #[test]
    fn empty_quoted_field_is_not_an_escape() {
        let parsed = parse_rows(r#"a,"",b"#);
        assert_eq!(parsed.rows, vec![vec!["a", "", "b"]]);
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn doubled_quote_rejects_only_its_row() {
        let parsed = parse_rows("h1,h2\nx,\"say \"\"hi\"\"\"\ny,z");
        assert_eq!(parsed.rows, vec![vec!["h1", "h2"], vec!["y", "z"]]);
        assert_eq!(parsed.rejected, vec![ParseError::EscapedQuote { row: 2, column: 2 }]);
        assert!(!parsed.header_rejected());
    }

    #[test]
    fn rejected_header_is_reported() {
        let parsed = parse_rows("\"a\"\"b\",c\n1,2");
        assert!(parsed.header_rejected());
        assert_eq!(parsed.rows, vec![vec!["1", "2"]]);
    }
}
