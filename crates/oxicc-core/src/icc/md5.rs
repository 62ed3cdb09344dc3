//! ICC profile ID
//!
//! The profile ID is the MD5 of the whole profile with the flags, rendering
//! intent and profile ID header fields zeroed.

use ::md5::{Digest, Md5};

use super::header::{FLAGS_RANGE, INTENT_RANGE, PROFILE_ID_RANGE};

/// ICC profile ID of serialized profile bytes
///
/// Flags (44..48), rendering intent (64..68) and the ID itself (84..100)
/// hash as zeros. Data shorter than a header hashes as-is.
pub fn profile_id(data: &[u8]) -> [u8; 16] {
    if data.len() < PROFILE_ID_RANGE.end {
        return Md5::digest(data).into();
    }
    let mut md5 = Md5::new();
    let mut pos = 0;
    for range in [FLAGS_RANGE, INTENT_RANGE, PROFILE_ID_RANGE] {
        md5.update(&data[pos..range.start]);
        md5.update(&[0u8; 16][..range.len()]);
        pos = range.end;
    }
    md5.chain_update(&data[pos..]).finalize().into()
}

/// Lowercase hex rendering of a digest
pub fn to_hex(digest: &[u8; 16]) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
