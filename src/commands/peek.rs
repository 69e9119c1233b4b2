//! Peek command: the column keys of a single file.

use std::io::{self, Write};

use anyhow::{Result, anyhow};
use tokio_util::sync::CancellationToken;

use crate::{
    PeekCommand,
    discovery::table_name,
    extraction::{TableDescriptor, extract},
    output::{render_json_table, render_text},
    sources::FileSourceFactory,
};

pub async fn run(args: PeekCommand) -> Result<()> {
    let table = peek(&args).await?;

    let mut out = io::stdout();
    if args.read.format.resolves_to_json() {
        render_json_table(&table, &mut out)?;
    } else {
        render_text(std::slice::from_ref(&table), &mut out)?;
    }
    out.flush()?;
    Ok(())
}

pub async fn peek(args: &PeekCommand) -> Result<TableDescriptor> {
    let name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .file
            .file_name()
            .map(|file_name| table_name(file_name).to_string())
            .ok_or_else(|| anyhow!("Cannot derive a table name from '{}'", args.file))?,
    };

    let factory = FileSourceFactory::new(args.file.clone()).with_chunk_size(args.read.chunk_size);
    let table = extract(
        &name,
        &factory,
        &args.read.extract_options(),
        &CancellationToken::new(),
    )
    .await?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ReadArgs, utils::test_helpers::file_helpers::write_csv};
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn peek_args(path: std::path::PathBuf, name: Option<&str>) -> PeekCommand {
        PeekCommand {
            file: Utf8PathBuf::from_path_buf(path).unwrap(),
            name: name.map(str::to_string),
            read: ReadArgs::default(),
        }
    }

    #[tokio::test]
    async fn test_peek_derives_name() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), "orders.2024.csv", b"id,total\n1,9.99\n").unwrap();

        let table = peek(&peek_args(path, None)).await.unwrap();

        assert_eq!(table.name(), "orders");
        assert_eq!(table.keys(), ["id", "total"]);
    }

    #[tokio::test]
    async fn test_peek_with_explicit_name_and_separator() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), "data.tsv", b"a\tb\n").unwrap();

        let mut args = peek_args(path, Some("things"));
        args.read.separator = b'\t';
        let table = peek(&args).await.unwrap();

        assert_eq!(table.name(), "things");
        assert_eq!(table.keys(), ["a", "b"]);
    }

    #[tokio::test]
    async fn test_peek_missing_file() {
        let dir = TempDir::new().unwrap();
        let args = peek_args(dir.path().join("gone.csv"), None);

        let err = peek(&args).await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("table 'gone'"));
        assert!(message.contains("failed to open"));
    }
}
