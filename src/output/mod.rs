//! Printing table descriptors.

pub mod style;

use std::io::Write;

use anyhow::Result;

use crate::extraction::TableDescriptor;
use style::{dim, label, value};

/// Writes all tables as one JSON array on a single line.
pub fn render_json(tables: &[TableDescriptor], out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string(tables)?)?;
    Ok(())
}

/// Writes one table as a JSON object on a single line.
pub fn render_json_table(table: &TableDescriptor, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string(table)?)?;
    Ok(())
}

/// Writes one line per table: its name, then its keys.
///
/// Keys that are empty or carry surrounding whitespace are quoted so they stay visible.
pub fn render_text(tables: &[TableDescriptor], out: &mut dyn Write) -> Result<()> {
    if tables.is_empty() {
        writeln!(out, "{}", dim("no tables found"))?;
        return Ok(());
    }

    let width = tables.iter().map(|t| t.name().len()).max().unwrap_or(0);
    for table in tables {
        // pad before styling, escape codes would throw off the width
        let name = format!("{:<width$}", table.name());
        let keys = table
            .keys()
            .iter()
            .map(|key| format_key(key))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "{}  {}", label(name), keys)?;
    }
    Ok(())
}

fn format_key(key: &str) -> String {
    if key.is_empty() || key.trim() != key {
        format!("{key:?}")
    } else {
        value(key)
    }
}
