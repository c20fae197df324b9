//! Pipe table conversion.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Converts pipe tables in `text` to HTML tables.
///
/// A table is a `|...|` header row, a separator row made of dashes, colons,
/// pipes and blanks, and at least one `|...|` data row. Candidates with fewer
/// than three non-empty lines are left as they are. A line break that ended
/// the last data row is kept after the table.
///
/// # Arguments
///
/// * `text`: Working text from earlier render stages
///
/// # Returns
///
/// Text with every recognised table replaced by `<table>` markup
pub(crate) fn convert_tables(text: &str) -> String {
    static TABLE: OnceLock<Regex> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        Regex::new(r"(?mR)^\|.+\|\r?\n\|[ \t:|-]+\|\r?\n(?:\|.+\|(?:\r?\n)?)+")
            .expect("valid table pattern")
    });

    table
        .replace_all(text, |caps: &Captures| {
            let block = &caps[0];
            match table_html(block) {
                Some(mut html) => {
                    if block.ends_with("\r\n") {
                        html.push_str("\r\n");
                    } else if block.ends_with('\n') {
                        html.push('\n');
                    }
                    html
                }
                None => block.to_string(),
            }
        })
        .into_owned()
}

fn table_html(block: &str) -> Option<String> {
    let rows: Vec<&str> = block
        .split('\n')
        .map(|row| row.trim_end_matches('\r'))
        .filter(|row| !row.trim().is_empty())
        .collect();

    // Header, separator and at least one data row
    if rows.len() < 3 {
        return None;
    }

    let mut html = String::from("<table class=\"markdown-table\"><thead><tr>");
    for cell in rows[0].split('|').map(str::trim).filter(|c| !c.is_empty()) {
        html.push_str("<th>");
        html.push_str(cell);
        html.push_str("</th>");
    }
    html.push_str("</tr></thead><tbody>");

    for row in rows[2..].iter().filter(|row| row.contains('|')) {
        html.push_str("<tr>");
        for cell in row.split('|').filter(|c| !c.is_empty()) {
            html.push_str("<td>");
            html.push_str(cell.trim());
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");

    Some(html)
}
