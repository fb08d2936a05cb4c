//! PSX Snapshot Format v1 Constants
//!
//! All values are little-endian.

/// Magic bytes: "PSX1"
pub const PSX_MAGIC: [u8; 4] = [0x50, 0x53, 0x58, 0x31];

/// Current format version
pub const PSX_VERSION: u16 = 1;

/// Header size in bytes
pub const HEADER_SIZE: usize = 64;

/// Section directory entry size
pub const SECTION_ENTRY_SIZE: usize = 24;

// =============================================================================
// Header Field Offsets
// =============================================================================

/// Header field byte offsets.
pub mod header {
    /// u8[4] magic = "PSX1"
    pub const MAGIC: usize = 0;
    /// u16 version
    pub const VERSION: usize = 4;
    /// u16 flags
    pub const FLAGS: usize = 6;
    /// u32 headerBytes (always 64)
    pub const HEADER_BYTES: usize = 8;
    /// u32 sectionCount
    pub const SECTION_COUNT: usize = 12;
    /// u32 sectionDirOffset
    pub const SECTION_DIR_OFFSET: usize = 16;
    /// u32 sectionDirBytes
    pub const SECTION_DIR_BYTES: usize = 20;
    /// u64 generatedAt, Unix seconds
    pub const GENERATED_AT: usize = 24;
    /// u32 ruleCount
    pub const RULE_COUNT: usize = 32;
    /// u32 sourceCrc32, CRC32 of the rule list text the snapshot was built from
    pub const SOURCE_CRC32: usize = 36;
    /// u32 snapshotCrc32
    pub const SNAPSHOT_CRC32: usize = 40;
}

bitflags::bitflags! {
    /// Header flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HeaderFlags: u16 {
        /// Snapshot includes CRC32 checksum
        const HAS_CRC32 = 1 << 0;
    }
}

// =============================================================================
// Section Directory Entry Offsets
// =============================================================================

pub mod section_entry {
    /// u16 section id
    pub const ID: usize = 0;
    /// u16 flags
    pub const FLAGS: usize = 2;
    /// u32 file offset
    pub const OFFSET: usize = 4;
    /// u32 byte length
    pub const LENGTH: usize = 8;
    /// u32 uncompressed length (0 if not compressed)
    pub const UNCOMPRESSED_LENGTH: usize = 12;
    /// u32 CRC32 (0 if unused)
    pub const CRC32: usize = 16;
}

// =============================================================================
// Section IDs
// =============================================================================

/// Section type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SectionId {
    /// String pool holding the rule text
    StrPool = 0x0001,
    /// Rule hash table
    RuleSet = 0x0002,
}

impl TryFrom<u16> for SectionId {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(Self::StrPool),
            0x0002 => Ok(Self::RuleSet),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Rule Table Layout
// =============================================================================

/// Rule table header size: capacity, count, seedLo, seedHi, reserved
pub const RULE_TABLE_HEADER_SIZE: usize = 20;

/// Rule table entry size: hash lo, hash hi, string pool offset
pub const RULE_TABLE_ENTRY_SIZE: usize = 12;

pub mod rule_table_header {
    /// u32 capacity, a power of two or 0
    pub const CAPACITY: usize = 0;
    /// u32 occupied slots
    pub const COUNT: usize = 4;
    /// u32 low-half hash seed
    pub const SEED_LO: usize = 8;
    /// u32 high-half hash seed
    pub const SEED_HI: usize = 12;
}

pub mod rule_table_entry {
    pub const HASH_LO: usize = 0;
    pub const HASH_HI: usize = 4;
    pub const STR_OFF: usize = 8;
}

/// Each string pool entry is a u16 length followed by the bytes.
pub const STR_LEN_PREFIX: usize = 2;

/// Rule table load factor.
pub const RULE_TABLE_LOAD_FACTOR: f64 = 0.7;

// =============================================================================
// Helpers
// =============================================================================

/// Align offset to boundary.
#[inline]
pub const fn align_offset(offset: usize, alignment: usize) -> usize {
    (offset + alignment - 1) & !(alignment - 1)
}

/// Power-of-two table capacity for `count` entries.
pub fn table_capacity(count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let target = ((count as f64) / RULE_TABLE_LOAD_FACTOR).ceil() as usize;
    target.next_power_of_two().max(2)
}

/// Validate magic bytes.
#[inline]
pub fn validate_magic(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == PSX_MAGIC
}

/// Read u16 little-endian.
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Read u32 little-endian.
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

/// Read u64 little-endian.
#[inline]
pub fn read_u64_le(data: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}
