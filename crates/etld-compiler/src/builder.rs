use std::collections::HashSet;

use etld_core::hash::{Hash64, RuleHasher};
use etld_core::snapshot::{
    align_offset, header, rule_table_entry, rule_table_header, section_entry, snapshot_crc32, table_capacity,
    HeaderFlags, SectionId, HEADER_SIZE, PSX_MAGIC, PSX_VERSION, RULE_TABLE_ENTRY_SIZE,
    RULE_TABLE_HEADER_SIZE, SECTION_ENTRY_SIZE,
};

use crate::parser::ParsedRule;

/// Values recorded in the snapshot header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Unix seconds stamped as the generation time.
    pub generated_at: u64,
    /// CRC32 of the source list text, used to skip rebuilds of unchanged lists.
    pub source_crc32: u32,
    /// Seeds for the rule table keys, recorded in the table header.
    pub hasher: RuleHasher,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Rule on line {line} is {len} bytes, longer than {max}")]
    RuleTooLong { line: usize, len: usize, max: usize },
    #[error("Snapshot exceeds the 4 GiB format limit")]
    TooLarge,
}

pub fn build_snapshot(rules: &[ParsedRule], options: &BuildOptions) -> Result<Vec<u8>, BuildError> {
    let mut str_pool = StringPool::new();
    let mut seen: HashSet<&str> = HashSet::with_capacity(rules.len());
    let mut entries: Vec<(Hash64, u32)> = Vec::with_capacity(rules.len());

    for rule in rules {
        if !seen.insert(rule.rule.as_str()) {
            continue;
        }
        let offset = str_pool.push(&rule.rule).ok_or(BuildError::RuleTooLong {
            line: rule.line,
            len: rule.rule.len(),
            max: u16::MAX as usize,
        })?;
        entries.push((options.hasher.hash(&rule.rule), offset));
    }

    let rule_count = u32::try_from(entries.len()).map_err(|_| BuildError::TooLarge)?;
    let rule_table = build_rule_table(&entries, options.hasher);
    let str_pool_section = str_pool.build()?;

    let mut sections = vec![
        SectionData::new(SectionId::StrPool, str_pool_section),
        SectionData::new(SectionId::RuleSet, rule_table),
    ];

    let section_count = sections.len();
    let section_dir_offset = HEADER_SIZE;
    let section_dir_bytes = section_count * SECTION_ENTRY_SIZE;
    let mut data_offset = align_offset(section_dir_offset + section_dir_bytes, 4);

    for section in &mut sections {
        section.offset = data_offset;
        data_offset = align_offset(data_offset + section.data.len(), 4);
    }

    let total_size = data_offset;
    if u32::try_from(total_size).is_err() {
        return Err(BuildError::TooLarge);
    }
    let mut buffer = vec![0u8; total_size];

    buffer[0..4].copy_from_slice(&PSX_MAGIC);
    write_u16_le(&mut buffer, header::VERSION, PSX_VERSION);
    write_u16_le(&mut buffer, header::FLAGS, HeaderFlags::HAS_CRC32.bits());
    write_u32_le(&mut buffer, header::HEADER_BYTES, HEADER_SIZE as u32);
    write_u32_le(&mut buffer, header::SECTION_COUNT, section_count as u32);
    write_u32_le(&mut buffer, header::SECTION_DIR_OFFSET, section_dir_offset as u32);
    write_u32_le(&mut buffer, header::SECTION_DIR_BYTES, section_dir_bytes as u32);
    write_u64_le(&mut buffer, header::GENERATED_AT, options.generated_at);
    write_u32_le(&mut buffer, header::RULE_COUNT, rule_count);
    write_u32_le(&mut buffer, header::SOURCE_CRC32, options.source_crc32);

    for (index, section) in sections.iter().enumerate() {
        let entry_offset = section_dir_offset + index * SECTION_ENTRY_SIZE;
        write_u16_le(&mut buffer, entry_offset + section_entry::ID, section.id as u16);
        write_u16_le(&mut buffer, entry_offset + section_entry::FLAGS, 0);
        write_u32_le(&mut buffer, entry_offset + section_entry::OFFSET, section.offset as u32);
        write_u32_le(&mut buffer, entry_offset + section_entry::LENGTH, section.data.len() as u32);
        write_u32_le(&mut buffer, entry_offset + section_entry::UNCOMPRESSED_LENGTH, 0);
        write_u32_le(&mut buffer, entry_offset + section_entry::CRC32, 0);

        let end = section.offset + section.data.len();
        buffer[section.offset..end].copy_from_slice(&section.data);
    }

    let crc = snapshot_crc32(&buffer);
    write_u32_le(&mut buffer, header::SNAPSHOT_CRC32, crc);

    log::debug!(
        "built snapshot: {} rules, {} bytes, crc {:#010x}",
        rule_count,
        buffer.len(),
        crc
    );

    Ok(buffer)
}

struct SectionData {
    id: SectionId,
    data: Vec<u8>,
    offset: usize,
}

impl SectionData {
    fn new(id: SectionId, data: Vec<u8>) -> Self {
        Self { id, data, offset: 0 }
    }
}

/// Length-prefixed rule strings. Offsets point at the u16 length.
struct StringPool {
    data: Vec<u8>,
}

impl StringPool {
    fn new() -> Self {
        Self { data: Vec::new() }
    }

    fn push(&mut self, s: &str) -> Option<u32> {
        let len = u16::try_from(s.len()).ok()?;
        let offset = u32::try_from(self.data.len()).ok()?;
        self.data.extend_from_slice(&len.to_le_bytes());
        self.data.extend_from_slice(s.as_bytes());
        Some(offset)
    }

    fn build(self) -> Result<Vec<u8>, BuildError> {
        let len = u32::try_from(self.data.len()).map_err(|_| BuildError::TooLarge)?;
        let mut buf = Vec::with_capacity(4 + self.data.len());
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(&self.data);
        Ok(buf)
    }
}

fn build_rule_table(entries: &[(Hash64, u32)], hasher: RuleHasher) -> Vec<u8> {
    let count = entries.len();
    let capacity = table_capacity(count);

    let mut buf = vec![0u8; RULE_TABLE_HEADER_SIZE + capacity * RULE_TABLE_ENTRY_SIZE];
    let (seed_lo, seed_hi) = hasher.seeds();
    write_u32_le(&mut buf, rule_table_header::CAPACITY, capacity as u32);
    write_u32_le(&mut buf, rule_table_header::COUNT, count as u32);
    write_u32_le(&mut buf, rule_table_header::SEED_LO, seed_lo);
    write_u32_le(&mut buf, rule_table_header::SEED_HI, seed_hi);

    if capacity == 0 {
        return buf;
    }

    let mask = capacity - 1;

    for (hash, str_offset) in entries {
        let mut idx = (hash.lo as usize) & mask;
        loop {
            let entry_offset = RULE_TABLE_HEADER_SIZE + idx * RULE_TABLE_ENTRY_SIZE;
            let slot = Hash64::new(
                read_u32_le(&buf, entry_offset + rule_table_entry::HASH_LO),
                read_u32_le(&buf, entry_offset + rule_table_entry::HASH_HI),
            );
            if slot.is_empty() {
                write_u32_le(&mut buf, entry_offset + rule_table_entry::HASH_LO, hash.lo);
                write_u32_le(&mut buf, entry_offset + rule_table_entry::HASH_HI, hash.hi);
                write_u32_le(&mut buf, entry_offset + rule_table_entry::STR_OFF, *str_offset);
                break;
            }
            // Capacity stays above count, so a free slot always exists.
            idx = (idx + 1) & mask;
        }
    }

    buf
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn write_u16_le(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn write_u32_le(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn write_u64_le(data: &mut [u8], offset: usize, value: u64) {
    data[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}
