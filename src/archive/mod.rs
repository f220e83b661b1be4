//! Skill archive engine: tar+gzip packing, in-memory inspection, and
//! bounded safe extraction.
//!
//! Archives are gzipped USTAR streams with a single top-level directory
//! equal to the skill name. The tar codec is hand-rolled: library
//! extractors will happily materialize symlinks, hardlinks, and device
//! nodes, none of which a skill archive may contain. Only regular-file
//! entries ever produce files here.

mod extract;
mod pack;

pub use extract::{extract, extract_manifest};
pub use pack::{pack, pack_dir};

/// Tar block length.
pub(crate) const BLOCK_LEN: usize = 512;

/// Per-file cap enforced during extraction.
pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Whole-archive cap enforced during extraction.
pub const MAX_TOTAL_SIZE: u64 = 5 * 1024 * 1024;
