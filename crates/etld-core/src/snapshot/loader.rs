//! Zero-copy PSX Snapshot Loader

use std::collections::HashMap;

use crate::hash::{crc32, crc32_update, Hash64, RuleHasher};
use crate::store::RuleStore;
use super::format::*;

/// Error type for snapshot loading.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Invalid magic bytes")]
    InvalidMagic,
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u16),
    #[error("Unexpected header size: {0} bytes")]
    HeaderSize(u32),
    #[error("CRC32 mismatch: stored={stored:#010x}, computed={computed:#010x}")]
    Crc32Mismatch { stored: u32, computed: u32 },
    #[error("Invalid section: {0}")]
    InvalidSection(String),
    #[error("Missing section: {0:?}")]
    MissingSection(SectionId),
    #[error("Data too short")]
    DataTooShort,
}

#[derive(Debug, Clone, Copy)]
struct SectionInfo {
    offset: usize,
    length: usize,
}

/// Zero-copy snapshot view.
#[derive(Debug)]
pub struct Snapshot<'a> {
    data: &'a [u8],
    pub version: u16,
    pub flags: HeaderFlags,
    /// Unix seconds at which the snapshot was built.
    pub generated_at: u64,
    pub rule_count: u32,
    /// CRC32 of the rule list text the snapshot was built from.
    pub source_crc32: u32,
    pub crc32: u32,
    sections: HashMap<SectionId, SectionInfo>,
}

impl<'a> Snapshot<'a> {
    /// Load a snapshot from bytes.
    pub fn load(data: &'a [u8]) -> Result<Self, SnapshotError> {
        if data.len() < HEADER_SIZE {
            return Err(SnapshotError::DataTooShort);
        }

        if !validate_magic(data) {
            return Err(SnapshotError::InvalidMagic);
        }

        let version = read_u16_le(data, header::VERSION);
        if version != PSX_VERSION {
            return Err(SnapshotError::UnsupportedVersion(version));
        }

        let header_bytes = read_u32_le(data, header::HEADER_BYTES);
        if header_bytes as usize != HEADER_SIZE {
            return Err(SnapshotError::HeaderSize(header_bytes));
        }

        let flags = HeaderFlags::from_bits_truncate(read_u16_le(data, header::FLAGS));
        let section_count = read_u32_le(data, header::SECTION_COUNT) as usize;
        let section_dir_offset = read_u32_le(data, header::SECTION_DIR_OFFSET) as usize;
        let generated_at = read_u64_le(data, header::GENERATED_AT);
        let rule_count = read_u32_le(data, header::RULE_COUNT);
        let source_crc32 = read_u32_le(data, header::SOURCE_CRC32);
        let stored_crc = read_u32_le(data, header::SNAPSHOT_CRC32);

        if flags.contains(HeaderFlags::HAS_CRC32) {
            let computed = snapshot_crc32(data);
            if stored_crc != computed {
                return Err(SnapshotError::Crc32Mismatch {
                    stored: stored_crc,
                    computed,
                });
            }
        }

        let mut sections = HashMap::new();
        for i in 0..section_count {
            let entry_offset = section_dir_offset + i * SECTION_ENTRY_SIZE;
            if entry_offset + SECTION_ENTRY_SIZE > data.len() {
                return Err(SnapshotError::InvalidSection(format!(
                    "directory entry {} out of bounds",
                    i
                )));
            }

            let id_raw = read_u16_le(data, entry_offset + section_entry::ID);
            let id = match SectionId::try_from(id_raw) {
                Ok(id) => id,
                Err(_) => {
                    log::debug!("skipping unknown section {:#06x}", id_raw);
                    continue;
                }
            };

            let info = SectionInfo {
                offset: read_u32_le(data, entry_offset + section_entry::OFFSET) as usize,
                length: read_u32_le(data, entry_offset + section_entry::LENGTH) as usize,
            };

            if info.offset.checked_add(info.length).map_or(true, |end| end > data.len()) {
                return Err(SnapshotError::InvalidSection(format!(
                    "{:?} spans {}+{} past end of {} bytes",
                    id,
                    info.offset,
                    info.length,
                    data.len()
                )));
            }

            sections.insert(id, info);
        }

        let snapshot = Self {
            data,
            version,
            flags,
            generated_at,
            rule_count,
            source_crc32,
            crc32: stored_crc,
            sections,
        };

        // Fail at load time rather than on the first lookup.
        let rules = snapshot.rule_set()?;
        if rules.len() != rule_count as usize {
            return Err(SnapshotError::InvalidSection(format!(
                "rule table holds {} rules, header says {}",
                rules.len(),
                rule_count
            )));
        }

        log::debug!(
            "loaded snapshot v{}: {} rules, generated at {}",
            version,
            rule_count,
            generated_at
        );

        Ok(snapshot)
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Total snapshot size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn get_section(&self, id: SectionId) -> Option<&'a [u8]> {
        let info = self.sections.get(&id)?;
        self.data.get(info.offset..info.offset + info.length)
    }

    /// Get the rule set view, usable as a [`RuleStore`].
    pub fn rule_set(&self) -> Result<RuleSetView<'a>, SnapshotError> {
        let table = self
            .get_section(SectionId::RuleSet)
            .ok_or(SnapshotError::MissingSection(SectionId::RuleSet))?;
        let pool = self
            .get_section(SectionId::StrPool)
            .ok_or(SnapshotError::MissingSection(SectionId::StrPool))?;
        RuleSetView::new(table, pool)
    }
}

/// CRC32 over the whole snapshot except the stored checksum field.
pub fn snapshot_crc32(data: &[u8]) -> u32 {
    let crc = crc32(&data[..header::SNAPSHOT_CRC32]);
    crc32_update(crc, &data[header::SNAPSHOT_CRC32 + 4..])
}

// =============================================================================
// Rule Set (hash table over the string pool)
// =============================================================================

/// Zero-copy view into the rule hash table.
#[derive(Debug, Clone, Copy)]
pub struct RuleSetView<'a> {
    table: &'a [u8],
    pool: &'a [u8],
    capacity: usize,
    count: usize,
    hasher: RuleHasher,
}

impl<'a> RuleSetView<'a> {
    fn new(table: &'a [u8], pool: &'a [u8]) -> Result<Self, SnapshotError> {
        if table.len() < RULE_TABLE_HEADER_SIZE {
            return Err(SnapshotError::InvalidSection("rule table header truncated".into()));
        }
        if pool.len() < 4 {
            return Err(SnapshotError::InvalidSection("string pool header truncated".into()));
        }

        let capacity = read_u32_le(table, rule_table_header::CAPACITY) as usize;
        let count = read_u32_le(table, rule_table_header::COUNT) as usize;
        let hasher = RuleHasher::with_seeds(
            read_u32_le(table, rule_table_header::SEED_LO),
            read_u32_le(table, rule_table_header::SEED_HI),
        );

        if capacity != 0 && !capacity.is_power_of_two() {
            return Err(SnapshotError::InvalidSection(format!(
                "rule table capacity {} is not a power of two",
                capacity
            )));
        }
        if count > capacity {
            return Err(SnapshotError::InvalidSection(format!(
                "rule table count {} exceeds capacity {}",
                count, capacity
            )));
        }
        if RULE_TABLE_HEADER_SIZE + capacity * RULE_TABLE_ENTRY_SIZE > table.len() {
            return Err(SnapshotError::InvalidSection("rule table entries truncated".into()));
        }

        let pool_len = read_u32_le(pool, 0) as usize;
        let pool = pool
            .get(4..4 + pool_len)
            .ok_or_else(|| SnapshotError::InvalidSection("string pool truncated".into()))?;

        Ok(Self { table, pool, capacity, count, hasher })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Hasher rebuilt from the seeds in the table header.
    pub fn hasher(&self) -> RuleHasher {
        self.hasher
    }

    /// Look up a rule hash and return the stored rule text if present.
    fn lookup(&self, hash: Hash64, rule: &[u8]) -> Option<&'a str> {
        if self.capacity == 0 {
            return None;
        }

        let mask = self.capacity - 1;
        let mut idx = (hash.lo as usize) & mask;

        for _ in 0..self.capacity {
            let (stored_hash, str_off) = self.entry(idx);

            if stored_hash.is_empty() {
                return None;
            }

            if stored_hash == hash {
                if let Some(stored) = self.pool_str(str_off) {
                    if stored.as_bytes() == rule {
                        return Some(stored);
                    }
                }
            }

            // Linear probing
            idx = (idx + 1) & mask;
        }

        None
    }

    #[inline]
    fn entry(&self, idx: usize) -> (Hash64, usize) {
        let offset = RULE_TABLE_HEADER_SIZE + idx * RULE_TABLE_ENTRY_SIZE;
        (
            Hash64::new(
                read_u32_le(self.table, offset + rule_table_entry::HASH_LO),
                read_u32_le(self.table, offset + rule_table_entry::HASH_HI),
            ),
            read_u32_le(self.table, offset + rule_table_entry::STR_OFF) as usize,
        )
    }

    fn pool_str(&self, offset: usize) -> Option<&'a str> {
        let len_bytes = self.pool.get(offset..offset + STR_LEN_PREFIX)?;
        let len = u16::from_le_bytes([len_bytes[0], len_bytes[1]]) as usize;
        let start = offset + STR_LEN_PREFIX;
        let bytes = self.pool.get(start..start + len)?;
        std::str::from_utf8(bytes).ok()
    }

    /// Iterate over all stored rules, in table order.
    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        (0..self.capacity).filter_map(move |idx| {
            let (hash, str_off) = self.entry(idx);
            if hash.is_empty() {
                None
            } else {
                self.pool_str(str_off)
            }
        })
    }
}

impl RuleStore for RuleSetView<'_> {
    #[inline]
    fn exists(&self, rule: &str) -> bool {
        self.lookup(self.hasher.hash(rule), rule.as_bytes()).is_some()
    }

    fn len(&self) -> usize {
        self.count
    }
}
