use std::{fs, io, path::Path};

use chrono::NaiveDate;

use crate::record::Record;

/// Backslash-escape the braces in a field value.
pub fn escape(value: &str) -> String {
    value.replace('{', "\\{").replace('}', "\\}")
}

/// Render one `@type{key, ...}` entry, without a trailing newline.
///
/// Fields are written in a fixed order and empty ones are left out.
pub fn render_entry(record: &Record) -> String {
    let authors = record.authors.join(" and ");
    let fields = [
        ("title", record.title.as_deref()),
        ("author", Some(authors.as_str())),
        ("year", record.year.as_deref()),
        (record.entry_type.venue_field(), record.venue.as_deref()),
        ("volume", record.volume.as_deref()),
        ("number", record.number.as_deref()),
        ("pages", record.pages.as_deref()),
        ("doi", record.doi.as_deref()),
        ("url", record.url.as_deref()),
    ];

    let body: Vec<String> = fields
        .into_iter()
        .filter_map(|(name, value)| {
            let value = value.filter(|v| !v.is_empty())?;
            Some(format!("  {name} = {{{}}}", escape(value)))
        })
        .collect();

    let mut out = format!("@{}{{{},\n", record.entry_type, record.citekey);
    if !body.is_empty() {
        out.push_str(&body.join(",\n"));
        out.push('\n');
    }
    out.push('}');
    out
}

/// Render the whole file: a dated comment line, then every entry followed by a blank line.
pub fn render(records: &[Record], generated: NaiveDate) -> String {
    let mut out = format!(
        "% Generated by {} on {}\n\n",
        env!("CARGO_PKG_NAME"),
        generated.format("%Y-%m-%d")
    );
    for record in records {
        out.push_str(&render_entry(record));
        out.push_str("\n\n");
    }
    out
}

/// Replace the file at `path` with `contents`.
pub fn write(path: &Path, contents: &str) -> io::Result<()> {
    fs::write(path, contents)
}
