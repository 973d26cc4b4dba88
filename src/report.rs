//! Delimited-text encoding of the daily report.

use crate::record::InstanceRecord;

pub const HEADER: [&str; 12] = [
    "identifier",
    "type",
    "state",
    "launch_time",
    "zone",
    "network_id",
    "subnet_id",
    "private_address",
    "public_address",
    "security_groups",
    "key_label",
    "full_tags",
];

const DELIMITER: char = ',';
const QUOTE: char = '"';

pub fn escape_field(field: &str) -> String {
    if field.contains(|c: char| c == DELIMITER || c == QUOTE || c == '\r' || c == '\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn join_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut row = fields
        .iter()
        .map(|field| escape_field(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    row.push('\n');
    row
}

pub fn header_row() -> String {
    join_row(&HEADER[..])
}

pub fn format_row(record: &InstanceRecord) -> String {
    let tags = record
        .tags
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(",");
    let security_groups = record.security_groups.join(";");

    join_row(&[
        record.identifier.as_str(),
        record.instance_type.as_str(),
        record.state.as_str(),
        record.launch_time.as_str(),
        record.zone.as_str(),
        record.network_id.as_str(),
        record.subnet_id.as_str(),
        record.private_address.as_str(),
        record.public_address.as_deref().unwrap_or_default(),
        security_groups.as_str(),
        record.key_label.as_deref().unwrap_or_default(),
        tags.as_str(),
    ])
}

/// Appends `records` to the existing partition content. Prior bytes are kept as-is.
pub fn merge(existing: &str, records: &[InstanceRecord]) -> String {
    let mut merged = String::with_capacity(existing.len() + records.len() * 128);
    if existing.trim().is_empty() {
        merged.push_str(&header_row());
    } else {
        merged.push_str(existing);
        if !existing.ends_with('\n') {
            merged.push('\n');
        }
    }
    for record in records {
        merged.push_str(&format_row(record));
    }
    merged
}

/// Splits delimited text into rows of unescaped fields.
#[cfg(test)]
pub fn parse_rows(content: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                QUOTE if chars.peek() == Some(&QUOTE) => {
                    field.push(QUOTE);
                    chars.next();
                }
                QUOTE => quoted = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            QUOTE => quoted = true,
            DELIMITER => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}
