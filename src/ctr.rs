//! AES-CTR keystream application: XORs a block-cipher counter-mode
//! keystream over a buffer in place.
//!
//! RFC 8452 Section 4 fixes the counter as a 32-bit little-endian value in
//! bytes 0..3 of the block; bytes 4..15 (here, the SIV tag-derived seed's
//! upper bytes) are never touched, and the counter wraps modulo 2^32
//! without carrying into byte 4, the counter-wrap edge case exercised by
//! RFC 8452 Appendix C.3.

use aead::generic_array::{
    typenum::{U16, U8},
    GenericArray,
};
use aes::block_cipher_trait::BlockCipher;

use crate::le::{pack_u32, unpack_u32};

/// XORs the AES-CTR keystream seeded by `counter_block` over `buffer` in
/// place, advancing the counter (bytes 0..3 of the block, little-endian,
/// wrapping at 2^32) after each 16-byte (or shorter, for the last span)
/// chunk.
pub(crate) fn apply_keystream<C>(
    cipher: &C,
    mut counter_block: GenericArray<u8, U16>,
    buffer: &mut [u8],
) where
    C: BlockCipher<BlockSize = U16, ParBlocks = U8>,
{
    for chunk in buffer.chunks_mut(16) {
        let mut keystream_block = counter_block.clone();
        cipher.encrypt_block(&mut keystream_block);

        let counter = unpack_u32(&counter_block[..4]).wrapping_add(1);
        counter_block[..4].copy_from_slice(&pack_u32(counter));

        for (byte, ks) in chunk.iter_mut().zip(keystream_block.iter()) {
            *byte ^= ks;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::Aes128;
    use alloc::vec::Vec;

    #[test]
    fn keystream_is_involutory() {
        let key = GenericArray::default();
        let cipher = <Aes128 as BlockCipher>::new(&key);
        let mut seed = GenericArray::<u8, U16>::default();
        seed[15] = 0x80;

        let original: Vec<u8> = (0u8..40).collect();
        let mut buffer = original.clone();

        apply_keystream(&cipher, seed.clone(), &mut buffer);
        assert_ne!(buffer, original);

        apply_keystream(&cipher, seed, &mut buffer);
        assert_eq!(buffer, original);
    }

    #[test]
    fn counter_wraps_without_carrying_into_byte_four() {
        let key = GenericArray::default();
        let cipher = <Aes128 as BlockCipher>::new(&key);

        let mut seed = GenericArray::<u8, U16>::default();
        seed[..4].copy_from_slice(&pack_u32(u32::MAX - 1));
        seed[4] = 0xAB;

        // Three 16-byte blocks forces the 32-bit counter through its wrap
        // point (u32::MAX -> 0) while processing the third block.
        let mut buffer = [0u8; 48];
        apply_keystream(&cipher, seed, &mut buffer);

        // After two wrapping increments from `u32::MAX - 1` the counter for
        // the third block is 0; a buggy implementation that carried the
        // wrap into byte 4 would derive a different (wrong) keystream here.
        let mut third_block_seed = GenericArray::<u8, U16>::default();
        third_block_seed[4] = 0xAB;
        let mut expected_third = third_block_seed.clone();
        cipher.encrypt_block(&mut expected_third);

        assert_eq!(&buffer[32..48], expected_third.as_slice());
    }
}
