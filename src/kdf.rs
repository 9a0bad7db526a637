//! Key-derivation function: turns `(master key, nonce)` into a per-message
//! authentication key and encryption key.
//!
//! From [RFC 8452 Section 4]:
//!
//! > The message-authentication key is 128 bit, and the message-encryption
//! > key is either 128 (for AES-128) or 256 bit (for AES-256). These keys
//! > are generated by encrypting a series of plaintext blocks that contain
//! > a 32-bit, little-endian counter followed by the nonce, and then
//! > discarding the second half of the resulting ciphertext.
//!
//! [RFC 8452 Section 4]: https://tools.ietf.org/html/rfc8452#section-4

use aead::generic_array::{
    typenum::{U12, U16, U8},
    GenericArray,
};
use aes::block_cipher_trait::BlockCipher;
use zeroize::Zeroize;

use crate::le::pack_u32;

/// Derives `authKey` (16 bytes) and `encKey` (`C::KeySize` bytes: 16 for
/// AES-128, 32 for AES-256) from a cipher `key_generating_key` already
/// keyed with the master key, and the 12-byte nonce.
///
/// Runs the counter from 0 continuously across both outputs: counters 0
/// and 1 produce `authKey`, counters 2.. (3 or 5, depending on key size)
/// produce `encKey`, matching RFC 8452's "four blocks... counter values
/// 0, 1, 2, and 3" (AES-128) / "six blocks... counter values 0 through 5"
/// (AES-256) layout.
pub(crate) fn derive_keys<C>(
    key_generating_key: &C,
    nonce: &GenericArray<u8, U12>,
) -> (GenericArray<u8, U16>, GenericArray<u8, C::KeySize>)
where
    C: BlockCipher<BlockSize = U16, ParBlocks = U8>,
{
    let mut auth_key = GenericArray::<u8, U16>::default();
    let mut enc_key = GenericArray::<u8, C::KeySize>::default();
    let mut block = GenericArray::<u8, U16>::default();
    let mut counter = 0u32;

    for derived_key in &mut [auth_key.as_mut_slice(), enc_key.as_mut_slice()] {
        for chunk in derived_key.chunks_mut(8) {
            block[..4].copy_from_slice(&pack_u32(counter));
            block[4..].copy_from_slice(nonce.as_slice());

            key_generating_key.encrypt_block(&mut block);
            chunk.copy_from_slice(&block.as_slice()[..8]);

            counter += 1;
        }
    }

    block.as_mut_slice().zeroize();

    (auth_key, enc_key)
}
