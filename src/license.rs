//! License cache decryption.
//!
//! The Steam client writes the per-user license list to disk XOR-obfuscated
//! with the account-seeded keystream from [`crate::rng`]. Decryption draws
//! exactly one keystream byte per ciphertext byte, in order; the stream is
//! strictly sequential, so the bytes cannot be processed out of order or in
//! parallel.
//!
//! The plaintext ends in a 4-byte trailer that the client never validates;
//! it is dropped before the remaining bytes are handed to an external
//! protobuf decoder. There is no integrity check at this layer: corrupted
//! ciphertext decrypts to corrupted plaintext, and only the downstream
//! message decoder can notice.

use tracing::debug;

use crate::rng::RandomStream;

/// Unverified trailer bytes after the serialized license message
pub const LICENSE_TRAILER_LEN: usize = 4;

/// XOR `data` against the keystream seeded from `account_id`.
///
/// Symmetric: applying it twice with the same id restores the input, so
/// the same call serves to build test fixtures. The 64-bit account id is
/// truncated to 32 bits before seeding, as the client's 32-bit code
/// does. Output length equals input length.
///
/// Every integer is a valid seed and every buffer is valid ciphertext;
/// this operation cannot fail.
#[must_use]
pub fn decrypt(account_id: i64, data: &[u8]) -> Vec<u8> {
    let mut stream = RandomStream::new(account_id as i32);
    let plaintext: Vec<u8> = data.iter().map(|&byte| byte ^ stream.next_byte()).collect();
    debug!(len = plaintext.len(), "applied license keystream");
    plaintext
}

/// Decrypt a license cache file and strip the unverified trailer.
///
/// Returns the serialized license message for an external decoder.
/// Inputs shorter than the trailer decode to an empty message.
#[must_use]
pub fn decrypt_license_cache(account_id: i64, data: &[u8]) -> Vec<u8> {
    let mut plaintext = decrypt(account_id, data);
    plaintext.truncate(plaintext.len().saturating_sub(LICENSE_TRAILER_LEN));
    plaintext
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrypt_is_its_own_inverse() {
        let message = b"licenses: package 1234, package 5678";
        let ciphertext = decrypt(-12345, message);
        assert_ne!(&ciphertext, message);
        assert_eq!(decrypt(-12345, &ciphertext), message);
    }

    #[test]
    fn decrypt_of_empty_buffer_is_empty() {
        assert!(decrypt(-12345, &[]).is_empty());
    }

    #[test]
    fn keystream_is_the_decryption_of_zeros() {
        // 0 XOR k = k, so zero bytes expose the keystream directly
        let keystream = decrypt(-12345, &[0u8; 8]);
        assert_eq!(keystream, b"TOdH.O%E");
        assert!(keystream.iter().all(|&b| (32..=126).contains(&b)));
    }

    #[test]
    fn same_seed_uses_the_same_keystream_prefix() {
        let first = [0x11u8; 32];
        let second = [0xEEu8; 32];
        let a = decrypt(987, &first);
        let b = decrypt(987, &second);
        for i in 0..32 {
            assert_eq!(a[i] ^ first[i], b[i] ^ second[i], "keystream differs at byte {}", i);
        }
    }

    #[test]
    fn different_seeds_use_different_keystreams() {
        let zeros = [0u8; 32];
        assert_ne!(decrypt(1, &zeros), decrypt(2, &zeros));
    }

    #[test]
    fn account_id_is_truncated_to_32_bits() {
        // Ids that agree in their low 32 bits decrypt identically
        let wide = 0x1_2345_6789_i64;
        let narrow = 0x2345_6789_i64;
        let zeros = [0u8; 16];
        assert_eq!(decrypt(wide, &zeros), decrypt(narrow, &zeros));
    }

    #[test]
    fn trailer_is_stripped_from_the_message() {
        let mut plaintext = b"serialized message".to_vec();
        plaintext.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
        let ciphertext = decrypt(-555, &plaintext);

        let message = decrypt_license_cache(-555, &ciphertext);
        assert_eq!(message, b"serialized message");
    }

    #[test]
    fn short_inputs_decode_to_an_empty_message() {
        for len in 0..=LICENSE_TRAILER_LEN {
            assert!(decrypt_license_cache(-555, &vec![0u8; len]).is_empty());
        }
    }
}
