//! JSON output of tileset documents.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::Result;

use super::TilesetDocument;

/// Serializes a document to compact JSON.
pub fn serialize(document: &TilesetDocument) -> Result<String> {
    Ok(serde_json::to_string(document)?)
}

/// Serializes a document to indented JSON.
pub fn serialize_pretty(document: &TilesetDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Writes a document as indented JSON.
pub fn to_writer<W: Write>(writer: W, document: &TilesetDocument) -> Result<()> {
    serde_json::to_writer_pretty(writer, document)?;
    Ok(())
}

/// Writes a document to `path`, replacing any existing file.
pub fn write_document(path: &Path, document: &TilesetDocument) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    to_writer(&mut writer, document)?;
    writer.flush()?;
    debug!(
        path = %path.display(),
        tiles = document.root.count_tiles(),
        "wrote tileset document"
    );
    Ok(())
}
