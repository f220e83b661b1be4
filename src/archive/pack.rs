//! Deterministic archive packing.

use std::io::Write as _;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use super::BLOCK_LEN;
use crate::error::{KkError, Result};

/// Build a gzipped USTAR archive for one skill version.
///
/// Each input file becomes one regular-file entry named
/// `{name}/{basename}`; entries are sorted by basename so identical
/// inputs produce identical bytes. Metadata (mode, owner, mtime) is
/// pinned for the same reason.
pub fn pack(name: &str, files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut sorted: Vec<&(String, Vec<u8>)> = files.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut tar = Vec::new();
    let mut header = [0u8; BLOCK_LEN];
    for (basename, content) in sorted {
        let entry_name = format!("{name}/{basename}");
        if entry_name.len() > 100 {
            return Err(KkError::Invalid(format!(
                "archive entry name exceeds 100 bytes: {entry_name}"
            )));
        }
        write_header(&mut header, entry_name.as_bytes(), content.len() as u64);
        tar.extend_from_slice(&header);
        tar.extend_from_slice(content);
        tar.extend_from_slice(&vec![0u8; pad_len(content.len())]);
    }
    tar.extend_from_slice(&[0u8; BLOCK_LEN]);
    tar.extend_from_slice(&[0u8; BLOCK_LEN]);

    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&tar)?;
    Ok(encoder.finish()?)
}

/// Pack every regular file at the top level of `dir`.
pub fn pack_dir(name: &str, dir: &Path) -> Result<Vec<u8>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let basename = entry
            .file_name()
            .into_string()
            .map_err(|_| KkError::Invalid("file name is not valid UTF-8".to_string()))?;
        files.push((basename, std::fs::read(entry.path())?));
    }
    if files.is_empty() {
        return Err(KkError::Invalid(format!(
            "no files to pack in {}",
            dir.display()
        )));
    }
    pack(name, &files)
}

fn pad_len(size: usize) -> usize {
    (BLOCK_LEN - size % BLOCK_LEN) % BLOCK_LEN
}

fn write_header(buf: &mut [u8; BLOCK_LEN], name: &[u8], size: u64) {
    buf.fill(0);
    buf[..name.len()].copy_from_slice(name);
    buf[100..108].copy_from_slice(b"0000644\0");
    buf[108..116].copy_from_slice(b"0000000\0");
    buf[116..124].copy_from_slice(b"0000000\0");

    let mut size_field = [b'0'; 11];
    let mut v = size;
    for slot in size_field.iter_mut().rev() {
        *slot = b'0' + ((v & 7) as u8);
        v >>= 3;
    }
    buf[124..135].copy_from_slice(&size_field);
    buf[135] = 0;
    buf[136..148].copy_from_slice(b"00000000000\0");
    buf[156] = b'0';
    buf[257..263].copy_from_slice(b"ustar\0");
    buf[263..265].copy_from_slice(b"00");

    // Checksum: unsigned octet sum with the checksum field as spaces,
    // six octal digits, NUL, space.
    for b in &mut buf[148..156] {
        *b = b' ';
    }
    let sum: u32 = buf.iter().map(|&b| u32::from(b)).sum();
    let checksum = format!("{sum:06o}\0 ");
    buf[148..156].copy_from_slice(checksum.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_sorted_by_basename() {
        let files = vec![
            ("zzz.md".to_string(), b"z".to_vec()),
            ("aaa.md".to_string(), b"a".to_vec()),
        ];
        let a = pack("demo", &files).unwrap();
        let reversed: Vec<(String, Vec<u8>)> = files.into_iter().rev().collect();
        let b = pack("demo", &reversed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn header_checksum_is_valid() {
        let mut header = [0u8; BLOCK_LEN];
        write_header(&mut header, b"demo/SKILL.md", 42);

        let mut copy = header;
        for b in &mut copy[148..156] {
            *b = b' ';
        }
        let expected: u32 = copy.iter().map(|&b| u32::from(b)).sum();
        let stored = std::str::from_utf8(&header[148..154]).unwrap();
        assert_eq!(u32::from_str_radix(stored, 8).unwrap(), expected);
        assert_eq!(header[154], 0);
        assert_eq!(header[155], b' ');
    }

    #[test]
    fn rejects_overlong_entry_names() {
        let files = vec![("x".repeat(120), b"data".to_vec())];
        assert!(pack("demo", &files).is_err());
    }
}
