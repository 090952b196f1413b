//! TSID Generator
//!
//! Time-sorted identifiers rendered as 13-character Crockford Base32 strings.
//! Used for event, audit entry and execution ids. Subscription ids are
//! caller-supplied integers and never come from here.

use std::sync::atomic::{AtomicU16, Ordering};

use chrono::Utc;
use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U)
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

const ENCODED_LEN: usize = 13;

static COUNTER: AtomicU16 = AtomicU16::new(0);

/// Generator for unique, time-sorted identifiers
pub struct TsidGenerator;

impl TsidGenerator {
    /// Generate a new TSID, e.g. `"0HZXEQ5Y8JY5Z"`.
    ///
    /// Layout (64 bits): 42 bits of unix millis, 10 random bits,
    /// 12 bits of a process-wide counter.
    pub fn generate() -> String {
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let counter = u64::from(COUNTER.fetch_add(1, Ordering::Relaxed)) & 0xFFF;
        let random = rand::thread_rng().gen::<u64>() & 0x3FF;

        let value = ((millis & 0x3FF_FFFF_FFFF) << 22) | (random << 12) | counter;
        encode(value)
    }

    /// Decode a TSID back to its numeric form.
    pub fn to_u64(tsid: &str) -> Option<u64> {
        decode(tsid)
    }

    /// Millisecond timestamp embedded in a TSID.
    pub fn timestamp_millis(tsid: &str) -> Option<u64> {
        decode(tsid).map(|v| v >> 22)
    }
}

fn encode(mut value: u64) -> String {
    let mut out = [b'0'; ENCODED_LEN];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(value & 0x1F) as usize];
        value >>= 5;
    }
    out.iter().map(|&b| b as char).collect()
}

fn decode(s: &str) -> Option<u64> {
    if s.len() != ENCODED_LEN {
        return None;
    }

    s.chars().try_fold(0u64, |acc, c| {
        let c = c.to_ascii_uppercase();
        let digit = ALPHABET.iter().position(|&a| a as char == c)? as u64;
        Some((acc << 5) | digit)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_length() {
        assert_eq!(TsidGenerator::generate().len(), 13);
    }

    #[test]
    fn test_uniqueness() {
        let mut ids = HashSet::new();
        for _ in 0..1000 {
            assert!(ids.insert(TsidGenerator::generate()), "Duplicate TSID generated");
        }
    }

    #[test]
    fn test_decode_roundtrip_and_timestamp() {
        let before = Utc::now().timestamp_millis() as u64;
        let id = TsidGenerator::generate();
        let after = Utc::now().timestamp_millis() as u64;

        let ts = TsidGenerator::timestamp_millis(&id).unwrap();
        assert!(ts >= before && ts <= after);
        assert_eq!(encode(TsidGenerator::to_u64(&id).unwrap()), id);
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(TsidGenerator::to_u64("short").is_none());
        assert!(TsidGenerator::to_u64("0000000000OOO").is_none());
    }
}
