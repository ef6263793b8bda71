//! Read-only inspection of ASDF files for documentation listings.
//!
//! An ASDF file is a `#ASDF <version>` header line, further `#` comment lines
//! (notably `#ASDF_STANDARD <version>`), a YAML tree ending with `...`, and
//! zero or more binary blocks. Each block starts with [`BLOCK_MAGIC`], a
//! big-endian `u16` header size and a header of at least 48 bytes:
//!
//! | field          | size |
//! |----------------|------|
//! | flags          | 4    |
//! | compression    | 4    |
//! | allocated_size | 8    |
//! | used_size      | 8    |
//! | data_size      | 8    |
//! | checksum       | 16   |

use flate2::read::ZlibDecoder;
use log::debug;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{AsdfError, Result};

pub const ASDF_MAGIC: &str = "#ASDF";
pub const ASDF_STANDARD_COMMENT: &str = "#ASDF_STANDARD";
pub const BLOCK_MAGIC: [u8; 4] = [0xd3, b'B', b'L', b'K'];
pub const BLOCK_INDEX_HEADER: &str = "#ASDF BLOCK INDEX";
pub const BLOCK_FLAG_STREAMED: u32 = 0x1;
pub const DEFAULT_STANDARD_VERSION: &str = "1.5.0";

const BLOCK_HEADER_SIZE: usize = 48;
const DATA_PREVIEW_CHARS: usize = 40;
const FLAG_NAMES: [(u32, &str); 1] = [(BLOCK_FLAG_STREAMED, "BLOCK_FLAG_STREAMED")];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub flags: u32,
    /// Compression code (`zlib`, `bzp2`, `lz4`), `None` when uncompressed.
    pub compression: Option<String>,
    pub allocated_size: u64,
    pub used_size: u64,
    pub data_size: u64,
    pub checksum: [u8; 16],
}

impl BlockHeader {
    pub fn is_streamed(&self) -> bool {
        self.flags & BLOCK_FLAG_STREAMED != 0
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    /// Byte offset of the block magic in the file.
    pub offset: u64,
    pub header: BlockHeader,
    /// Stored (possibly compressed) bytes.
    pub data: Vec<u8>,
}

impl Block {
    /// Data as the file's reader would see it: zlib blocks are inflated,
    /// other codecs are returned as stored.
    pub fn decoded_data(&self) -> Vec<u8> {
        if self.header.compression.as_deref() == Some("zlib") {
            let mut decoded = Vec::new();
            if ZlibDecoder::new(self.data.as_slice())
                .read_to_end(&mut decoded)
                .is_ok()
            {
                return decoded;
            }
        }
        self.data.clone()
    }
}

#[derive(Debug, Clone)]
pub struct AsdfFile {
    pub path: PathBuf,
    pub file_version: String,
    pub standard_version: Option<String>,
    /// YAML tree text, from `%YAML` through the `...` end marker.
    pub tree: String,
    pub blocks: Vec<Block>,
}

impl AsdfFile {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(AsdfError::ResourceNotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = std::fs::read(path)?;
        Self::parse(path, &bytes)
    }

    pub fn parse(path: &Path, bytes: &[u8]) -> Result<Self> {
        let mut pos = 0;

        let first = next_line(bytes, &mut pos);
        let file_version = first
            .strip_prefix(ASDF_MAGIC)
            .filter(|rest| rest.starts_with(' '))
            .map(|rest| rest.trim().to_string())
            .ok_or_else(|| AsdfError::invalid_file(path, "missing #ASDF header"))?;

        let mut standard_version = None;
        while pos < bytes.len() && bytes[pos] == b'#' {
            let line = next_line(bytes, &mut pos);
            if let Some(version) = line.strip_prefix(ASDF_STANDARD_COMMENT) {
                standard_version = Some(version.trim().to_string());
            }
        }

        let (tree, tree_end) = read_tree(bytes, pos);
        let blocks = match find_subslice(&bytes[tree_end..], &BLOCK_MAGIC) {
            Some(start) => read_blocks(path, bytes, tree_end + start)?,
            None => Vec::new(),
        };
        debug!(
            "Parsed ASDF file {}: version {}, {} block(s)",
            path.display(),
            file_version,
            blocks.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            file_version,
            standard_version,
            tree,
            blocks,
        })
    }

    /// Header lines and YAML tree, as shown at the top of a listing.
    pub fn tree_listing(&self) -> String {
        let standard = self
            .standard_version
            .as_deref()
            .unwrap_or(DEFAULT_STANDARD_VERSION);
        format!(
            "{} {}\n{} {}\n{}\n",
            ASDF_MAGIC,
            self.file_version,
            ASDF_STANDARD_COMMENT,
            standard,
            self.tree.trim()
        )
    }

    /// Human-readable summary of one block.
    pub fn block_listing(&self, index: usize) -> Option<String> {
        let block = self.blocks.get(index)?;
        let header = &block.header;
        let (allocated, used, data_size) = if header.is_streamed() {
            (0, 0, 0)
        } else {
            (header.allocated_size, header.used_size, header.data_size)
        };

        let mut lines = vec![format!("BLOCK {}:", index)];
        let flags: Vec<&str> = FLAG_NAMES
            .iter()
            .filter(|(flag, _)| header.flags & flag != 0)
            .map(|(_, name)| *name)
            .collect();
        if !flags.is_empty() {
            lines.push(format!("    flags: {}", flags.join(" | ")));
        }
        if let Some(compression) = &header.compression {
            lines.push(format!("    compression: {}", compression));
        }
        lines.push(format!("    allocated_size: {}", allocated));
        lines.push(format!("    used_size: {}", used));
        lines.push(format!("    data_size: {}", data_size));
        lines.push(format!("    data: {}", data_preview(&block.decoded_data())));

        Some(lines.join("\n") + "\n")
    }

    /// Block index listing, present when the last block is not streamed.
    pub fn block_index(&self) -> Option<String> {
        let last = self.blocks.last()?;
        if last.header.is_streamed() {
            return None;
        }
        let mut index = format!("{}\n%YAML 1.1\n---\n", BLOCK_INDEX_HEADER);
        for block in &self.blocks {
            index.push_str(&format!("- {}\n", block.offset));
        }
        index.push_str("...\n");
        Some(index)
    }
}

fn next_line(bytes: &[u8], pos: &mut usize) -> String {
    let start = *pos;
    let end = bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|i| start + i)
        .unwrap_or(bytes.len());
    *pos = (end + 1).min(bytes.len());
    String::from_utf8_lossy(&bytes[start..end])
        .trim_end_matches('\r')
        .to_string()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Returns the tree text and the offset just past it.
fn read_tree(bytes: &[u8], start: usize) -> (String, usize) {
    let rest = &bytes[start..];
    if !(rest.starts_with(b"%YAML") || rest.starts_with(b"---")) {
        return (String::new(), start);
    }

    let end = match find_subslice(rest, b"\n...\n") {
        Some(i) => i + b"\n...\n".len(),
        None if rest.ends_with(b"\n...") => rest.len(),
        None => find_subslice(rest, &BLOCK_MAGIC).unwrap_or(rest.len()),
    };
    let text = String::from_utf8_lossy(&rest[..end]).to_string();
    (text, start + end)
}

fn read_blocks(path: &Path, bytes: &[u8], mut pos: usize) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();

    while bytes[pos..].starts_with(&BLOCK_MAGIC) {
        let offset = pos;
        let header_size = read_u16(path, bytes, pos + 4)? as usize;
        if header_size < BLOCK_HEADER_SIZE {
            return Err(AsdfError::invalid_file(
                path,
                format!("block at {} has a {}-byte header", offset, header_size),
            ));
        }
        let header_start = pos + 6;
        let header = read_block_header(path, bytes, header_start)?;
        let data_start = header_start + header_size;
        if data_start > bytes.len() {
            return Err(AsdfError::invalid_file(path, format!("block at {} is truncated", offset)));
        }

        if header.is_streamed() {
            blocks.push(Block {
                offset: offset as u64,
                data: bytes[data_start..].to_vec(),
                header,
            });
            break;
        }

        let truncated = || AsdfError::invalid_file(path, format!("block at {} is truncated", offset));
        let data_end = block_end(data_start, header.used_size).ok_or_else(truncated)?;
        let next = block_end(data_start, header.allocated_size).ok_or_else(truncated)?;
        if data_end > bytes.len() || next > bytes.len() || data_end > next {
            return Err(truncated());
        }
        blocks.push(Block {
            offset: offset as u64,
            data: bytes[data_start..data_end].to_vec(),
            header,
        });
        pos = next;
    }

    Ok(blocks)
}

/// `start + size`, or `None` when it does not fit in `usize`.
fn block_end(start: usize, size: u64) -> Option<usize> {
    usize::try_from(size).ok().and_then(|size| start.checked_add(size))
}

fn read_block_header(path: &Path, bytes: &[u8], start: usize) -> Result<BlockHeader> {
    let field = |offset: usize, len: usize| -> Result<&[u8]> {
        bytes
            .get(start + offset..start + offset + len)
            .ok_or_else(|| AsdfError::invalid_file(path, "block header is truncated"))
    };

    let compression = field(4, 4)?;
    let compression = if compression.iter().all(|&b| b == 0) {
        None
    } else {
        Some(
            String::from_utf8_lossy(compression)
                .trim_end_matches('\0')
                .to_string(),
        )
    };

    let mut checksum = [0u8; 16];
    checksum.copy_from_slice(field(32, 16)?);

    Ok(BlockHeader {
        flags: u32::from_be_bytes(to_array(field(0, 4)?)),
        compression,
        allocated_size: u64::from_be_bytes(to_array(field(8, 8)?)),
        used_size: u64::from_be_bytes(to_array(field(16, 8)?)),
        data_size: u64::from_be_bytes(to_array(field(24, 8)?)),
        checksum,
    })
}

fn read_u16(path: &Path, bytes: &[u8], pos: usize) -> Result<u16> {
    bytes
        .get(pos..pos + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| AsdfError::invalid_file(path, "block header is truncated"))
}

fn to_array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut array = [0u8; N];
    array.copy_from_slice(slice);
    array
}

fn data_preview(data: &[u8]) -> String {
    let hex: String = data.iter().map(|b| format!("{:02x}", b)).collect();
    if hex.len() > DATA_PREVIEW_CHARS {
        format!("{}...", &hex[..DATA_PREVIEW_CHARS])
    } else {
        hex
    }
}
