//! Rule hashing and snapshot checksums
//!
//! Rules are keyed by two Murmur3 x86_32 passes with independent seeds. The
//! seed pair is recorded in the rule table header, and a loaded table is always
//! probed with the [`RuleHasher`] rebuilt from those seeds.
//!
//! `(lo=0, hi=0)` marks an empty slot in the rule table; [`RuleHasher::hash`]
//! never returns it.

/// 64-bit rule key stored as two 32-bit halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub struct Hash64 {
    pub lo: u32,
    pub hi: u32,
}

impl Hash64 {
    #[inline]
    pub const fn new(lo: u32, hi: u32) -> Self {
        Self { lo, hi }
    }

    /// Whether this is the empty-slot sentinel.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.lo == 0 && self.hi == 0
    }
}

/// Seeded rule hasher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleHasher {
    seed_lo: u32,
    seed_hi: u32,
}

impl RuleHasher {
    pub const fn with_seeds(seed_lo: u32, seed_hi: u32) -> Self {
        Self { seed_lo, seed_hi }
    }

    /// `(seed_lo, seed_hi)`, in rule table header order.
    pub const fn seeds(&self) -> (u32, u32) {
        (self.seed_lo, self.seed_hi)
    }

    /// Key for a normalized rule. Rules compare byte for byte, so there is no
    /// case folding.
    #[inline]
    pub fn hash(&self, rule: &str) -> Hash64 {
        let bytes = rule.as_bytes();
        let key = Hash64::new(murmur3_32(bytes, self.seed_lo), murmur3_32(bytes, self.seed_hi));
        if key.is_empty() {
            Hash64::new(1, 0)
        } else {
            key
        }
    }
}

impl Default for RuleHasher {
    fn default() -> Self {
        // Golden ratio, Murmur3 finalizer constant.
        Self::with_seeds(0x9e37_79b9, 0x85eb_ca6b)
    }
}

const MURMUR_C1: u32 = 0xcc9e_2d51;
const MURMUR_C2: u32 = 0x1b87_3593;

#[inline]
fn murmur_scramble(k: u32) -> u32 {
    k.wrapping_mul(MURMUR_C1).rotate_left(15).wrapping_mul(MURMUR_C2)
}

#[inline]
fn murmur_fmix(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^ (h >> 16)
}

/// Murmur3 x86_32.
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let mut blocks = data.chunks_exact(4);
    let mut h = blocks.by_ref().fold(seed, |h, block| {
        let k = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        (h ^ murmur_scramble(k))
            .rotate_left(13)
            .wrapping_mul(5)
            .wrapping_add(0xe654_6b64)
    });

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let k = tail.iter().rev().fold(0u32, |k, &b| (k << 8) | u32::from(b));
        h ^= murmur_scramble(k);
    }

    murmur_fmix(h ^ data.len() as u32)
}

const CRC32_POLY: u32 = 0xedb8_8320;

static CRC32_TABLE: [u32; 256] = crc32_table();

const fn crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut bit = 0;
        while bit < 8 {
            c = (c >> 1) ^ (CRC32_POLY & 0u32.wrapping_sub(c & 1));
            bit += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// CRC32 (IEEE 802.3).
pub fn crc32(data: &[u8]) -> u32 {
    crc32_update(0, data)
}

/// Continue a CRC32 over another chunk.
///
/// `crc32_update(crc32(a), b) == crc32(a ++ b)`, which lets the loader skip
/// the stored checksum field without copying the snapshot.
pub fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    !data.iter().fold(!crc, |c, &b| {
        CRC32_TABLE[((c ^ u32::from(b)) & 0xff) as usize] ^ (c >> 8)
    })
}
