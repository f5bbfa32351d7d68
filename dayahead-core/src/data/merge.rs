//! Stitch per-year CSV bodies into one file.
//!
//! Pure text reduction: no parsing, no validation of the data rows.

use serde::{Deserialize, Serialize};

/// Header written in place of the first body's own header row.
pub const CANONICAL_HEADER: &str =
    "Zeit von [CET/CEST];Zeit bis [CET/CEST];Preis MC Auktion [EUR/MWh];MC Referenzpreis [EUR/MWh]";

/// What to do with the first body's header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMode {
    /// Replace it with the given line.
    Canonical(String),
    /// Keep whatever the first response returned.
    KeepFirst,
}

impl Default for HeaderMode {
    fn default() -> Self {
        HeaderMode::Canonical(CANONICAL_HEADER.to_owned())
    }
}

/// How consecutive years are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStyle {
    /// Append each year's data directly after the previous text. A body
    /// without a trailing newline runs on into the next year's first row.
    #[default]
    Verbatim,
    /// Start each year's data on a new line.
    LineSeparated,
}

/// Merge bodies (in year order) into one CSV text. `None` if there are none.
pub fn merge_csv<S: AsRef<str>>(
    bodies: &[S],
    header: &HeaderMode,
    join: JoinStyle,
) -> Option<String> {
    let (first, rest) = bodies.split_first()?;

    let mut merged = match header {
        HeaderMode::Canonical(line) => replace_header(first.as_ref(), line),
        HeaderMode::KeepFirst => first.as_ref().to_owned(),
    };

    for body in rest {
        let data = strip_header(body.as_ref());
        if join == JoinStyle::LineSeparated && !data.is_empty() && !merged.ends_with('\n') {
            merged.push('\n');
        }
        merged.push_str(data);
    }

    Some(merged)
}

fn replace_header(body: &str, header: &str) -> String {
    match body.split_once('\n') {
        Some((_, data)) => format!("{header}\n{data}"),
        None => header.to_owned(),
    }
}

fn strip_header(body: &str) -> &str {
    body.split_once('\n').map_or("", |(_, data)| data)
}
