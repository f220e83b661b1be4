//! Safe extraction and in-memory inspection.

use std::io::Read as _;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use super::{BLOCK_LEN, MAX_FILE_SIZE, MAX_TOTAL_SIZE};
use crate::error::{ExtractErrorKind, KkError, Result};

/// One raw tar entry inside the decompressed stream.
struct RawEntry<'a> {
    name: String,
    typeflag: u8,
    data: &'a [u8],
}

/// Return the `manifest.yaml` content from an archive without touching
/// disk: decompress in memory and walk the header stream.
pub fn extract_manifest(archive: &[u8]) -> Result<String> {
    let tar = decompress(archive)?;
    let mut offset = 0;
    while let Some(entry) = next_entry(&tar, &mut offset)? {
        let mut parts = entry.name.splitn(2, '/');
        let _skill_dir = parts.next();
        if parts.next() == Some("manifest.yaml") {
            return String::from_utf8(entry.data.to_vec()).map_err(|_| {
                KkError::from(ExtractErrorKind::BadHeader(
                    "manifest.yaml is not valid UTF-8".to_string(),
                ))
            });
        }
    }
    Err(KkError::from(ExtractErrorKind::BadHeader(
        "archive has no manifest.yaml".to_string(),
    )))
}

/// Extract an archive into `target_dir`.
///
/// Defenses, in order: absolute entry names rejected; any `..` component
/// rejected; the skill-name prefix is stripped and the remainder must
/// resolve inside the target directory. Only regular-file entries
/// produce files. On failure the caller removes the partially populated
/// target directory.
pub fn extract(archive: &[u8], target_dir: &Path) -> Result<Vec<PathBuf>> {
    let tar = decompress(archive)?;

    std::fs::create_dir_all(target_dir).map_err(ExtractErrorKind::Io)?;
    let resolved_target = target_dir.canonicalize().map_err(ExtractErrorKind::Io)?;

    let mut written = Vec::new();
    let mut total: u64 = 0;
    let mut offset = 0;
    while let Some(entry) = next_entry(&tar, &mut offset)? {
        let rel = safe_relative_path(&entry.name)?;
        let Some(rel) = rel else {
            // The top-level directory entry itself.
            continue;
        };

        // Regular file is typeflag '0' or NUL; everything else only has
        // its data blocks skipped.
        if entry.typeflag != b'0' && entry.typeflag != 0 {
            continue;
        }

        let size = entry.data.len() as u64;
        if size > MAX_FILE_SIZE {
            return Err(ExtractErrorKind::BadHeader(format!(
                "entry {} exceeds per-file size cap",
                entry.name
            ))
            .into());
        }
        total += size;
        if total > MAX_TOTAL_SIZE {
            return Err(ExtractErrorKind::BadHeader(
                "archive exceeds total size cap".to_string(),
            )
            .into());
        }

        let out_path = resolved_target.join(&rel);
        if !out_path.starts_with(&resolved_target) {
            return Err(ExtractErrorKind::PathTraversal(entry.name.clone()).into());
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(ExtractErrorKind::Io)?;
        }
        std::fs::write(&out_path, entry.data).map_err(ExtractErrorKind::Io)?;
        written.push(rel);
    }
    Ok(written)
}

/// Validate an entry name and strip the skill-name prefix. Returns
/// `None` for the bare top-level directory entry.
fn safe_relative_path(name: &str) -> Result<Option<PathBuf>> {
    if name.starts_with('/') {
        return Err(ExtractErrorKind::PathTraversal(name.to_string()).into());
    }
    let components: Vec<&str> = name.split('/').filter(|c| !c.is_empty()).collect();
    if components.iter().any(|c| *c == "..") {
        return Err(ExtractErrorKind::PathTraversal(name.to_string()).into());
    }
    if components.len() <= 1 {
        return Ok(None);
    }
    let mut rel = PathBuf::new();
    for component in &components[1..] {
        rel.push(component);
    }
    Ok(Some(rel))
}

fn decompress(archive: &[u8]) -> Result<Vec<u8>> {
    let mut tar = Vec::new();
    let mut decoder = GzDecoder::new(archive);
    decoder.read_to_end(&mut tar).map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            KkError::from(ExtractErrorKind::Truncated(err.to_string()))
        } else {
            KkError::from(ExtractErrorKind::BadHeader(format!("gzip: {err}")))
        }
    })?;
    Ok(tar)
}

/// Parse the entry at `*offset`, advancing past its data blocks.
/// Returns `None` at the terminating zero block or end of buffer.
fn next_entry<'a>(tar: &'a [u8], offset: &mut usize) -> Result<Option<RawEntry<'a>>> {
    if *offset + BLOCK_LEN > tar.len() {
        return Ok(None);
    }
    let header = &tar[*offset..*offset + BLOCK_LEN];
    if header.iter().all(|&b| b == 0) {
        return Ok(None);
    }

    let name_field = &header[0..100];
    let name_len = name_field.iter().position(|&b| b == 0).unwrap_or(100);
    let name = std::str::from_utf8(&name_field[..name_len])
        .map_err(|_| ExtractErrorKind::BadHeader("entry name is not valid UTF-8".to_string()))?
        .to_string();

    let size = parse_octal(&header[124..136])
        .ok_or_else(|| ExtractErrorKind::BadHeader(format!("unparseable size for {name}")))?;
    let typeflag = header[156];

    let data_start = *offset + BLOCK_LEN;
    let data_end = data_start
        .checked_add(size as usize)
        .ok_or_else(|| ExtractErrorKind::BadHeader(format!("size overflow for {name}")))?;
    if data_end > tar.len() {
        return Err(ExtractErrorKind::Truncated(name).into());
    }

    let padded = (size as usize).div_ceil(BLOCK_LEN) * BLOCK_LEN;
    *offset = data_start + padded;

    Ok(Some(RawEntry {
        name,
        typeflag,
        data: &tar[data_start..data_end],
    }))
}

fn parse_octal(field: &[u8]) -> Option<u64> {
    let text: String = field
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect();
    let trimmed = text.trim_matches(|c: char| c == ' ');
    if trimmed.is_empty() {
        return Some(0);
    }
    u64::from_str_radix(trimmed, 8).ok()
}
