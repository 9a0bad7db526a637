//! [AES-GCM-SIV][1] ([RFC 8452][2]): high-performance
//! [Authenticated Encryption with Associated Data (AEAD)][3] cipher which
//! also provides [nonce reuse misuse resistance][4].
//!
//! This crate implements the cryptographic core of AES-GCM-SIV itself,
//! namely POLYVAL ([`polyval`] module), the counter-mode key-derivation
//! function ([`kdf`] module) and the CTR keystream ([`ctr`] module) that
//! the SIV composition below drives, rather than depending on an external
//! POLYVAL implementation. The AES block cipher remains an external
//! collaborator, supplied by the [`aes`] crate.
//!
//! [1]: https://en.wikipedia.org/wiki/AES-GCM-SIV
//! [2]: https://tools.ietf.org/html/rfc8452
//! [3]: https://en.wikipedia.org/wiki/Authenticated_encryption
//! [4]: https://github.com/miscreant/meta/wiki/Nonce-Reuse-Misuse-Resistance

#![no_std]

extern crate alloc;

mod ctr;
mod kdf;
mod le;
mod polyval;

pub use aead;

use aead::generic_array::{
    typenum::{Unsigned, U0, U12, U16, U8},
    GenericArray,
};
use aead::{Aead, Error, NewAead, Payload};
use aes::{block_cipher_trait::BlockCipher, Aes128, Aes256};
use alloc::vec::Vec;
use core::convert::TryInto;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use self::polyval::Polyval;

/// Maximum length of associated data (from RFC 8452 Section 6)
pub const A_MAX: u64 = 1 << 36;

/// Maximum length of plaintext (from RFC 8452 Section 6)
pub const P_MAX: u64 = 1 << 36;

/// Maximum length of ciphertext (from RFC 8452 Section 6)
pub const C_MAX: u64 = (1 << 36) + 16;

/// Length in bytes of an AES-GCM-SIV nonce.
pub const NONCE_SIZE: usize = 12;

/// Length in bytes of an AES-GCM-SIV authentication tag.
pub const TAG_SIZE: usize = 16;

/// AES-GCM-SIV tags
type Tag = GenericArray<u8, U16>;

/// AES-GCM-SIV with a 128-bit key
pub type Aes128GcmSiv = AesGcmSiv<Aes128>;

/// AES-GCM-SIV with a 256-bit key
pub type Aes256GcmSiv = AesGcmSiv<Aes256>;

/// AES-GCM-SIV: Misuse-Resistant Authenticated Encryption Cipher (RFC 8452)
#[derive(Clone)]
pub struct AesGcmSiv<C: BlockCipher<BlockSize = U16, ParBlocks = U8>> {
    /// Key-generating key: the master key this handle was constructed with.
    key_generating_key: C,
}

impl<C> NewAead for AesGcmSiv<C>
where
    C: BlockCipher<BlockSize = U16, ParBlocks = U8>,
{
    type KeySize = C::KeySize;

    fn new(key: GenericArray<u8, C::KeySize>) -> Self {
        Self {
            key_generating_key: C::new(&key),
        }
    }
}

impl<C> AesGcmSiv<C>
where
    C: BlockCipher<BlockSize = U16, ParBlocks = U8>,
{
    /// Constructs a handle from a raw key, rejecting any length other than
    /// `C::KeySize` (16 bytes for [`Aes128GcmSiv`], 32 for [`Aes256GcmSiv`]).
    pub fn new_from_slice(key: &[u8]) -> Result<Self, Error> {
        if key.len() != C::KeySize::to_usize() {
            return Err(Error);
        }
        Ok(<Self as NewAead>::new(*GenericArray::from_slice(key)))
    }

    /// Seals `plaintext` under `nonce`, authenticating `aad` alongside it.
    ///
    /// Returns `ciphertext ∥ tag`. Fails only if `nonce` is not exactly 12
    /// bytes, or if `plaintext`/`aad` exceed RFC 8452's advisory length
    /// bounds.
    pub fn seal(&self, nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, Error> {
        if nonce.len() != NONCE_SIZE {
            return Err(Error);
        }
        let nonce = GenericArray::<u8, U12>::clone_from_slice(nonce);
        Cipher::new(&self.key_generating_key, &nonce).seal(plaintext, aad)
    }

    /// Opens `ciphertext` (`E ∥ T`) sealed under `nonce`, authenticating
    /// `aad` alongside it.
    ///
    /// Returns `None` (via `Err(Error)`) if `nonce` is not 12 bytes, if
    /// `ciphertext` is shorter than the 16-byte tag, or if the recomputed
    /// tag does not match. These are intentionally indistinguishable to
    /// the caller.
    pub fn open(&self, nonce: &[u8], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>, Error> {
        if nonce.len() != NONCE_SIZE || ciphertext.len() < TAG_SIZE {
            return Err(Error);
        }
        let nonce = GenericArray::<u8, U12>::clone_from_slice(nonce);
        let tag_start = ciphertext.len() - TAG_SIZE;
        let mut buffer = Vec::from(&ciphertext[..tag_start]);
        let tag = *GenericArray::from_slice(&ciphertext[tag_start..]);
        Cipher::new(&self.key_generating_key, &nonce).open(&mut buffer, aad, tag)?;
        Ok(buffer)
    }

    /// Generates a fresh 12-byte nonce from the platform CSPRNG, seals
    /// `plaintext` under it, and returns `N ∥ E ∥ T`.
    ///
    /// The nonce-misuse-resistance this scheme provides is only as strong
    /// as the CSPRNG backing it; callers with a dedicated nonce sequencer
    /// should prefer [`AesGcmSiv::seal`] instead.
    #[cfg(feature = "getrandom")]
    pub fn seal_auto(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, Error> {
        use rand_core::{OsRng, RngCore};

        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let mut out = Vec::with_capacity(NONCE_SIZE + plaintext.len() + TAG_SIZE);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&self.seal(&nonce, plaintext, aad)?);
        Ok(out)
    }

    /// Splits the leading 12 bytes of `input` off as a nonce and delegates
    /// to [`AesGcmSiv::open`].
    ///
    /// Returns authentication failure (not an invalid-argument error) if
    /// `input` is shorter than 12 bytes, matching the source this crate is
    /// patterned on.
    #[cfg(feature = "getrandom")]
    pub fn open_auto(&self, input: &[u8], aad: &[u8]) -> Result<Vec<u8>, Error> {
        if input.len() < NONCE_SIZE {
            return Err(Error);
        }
        let (nonce, ciphertext) = input.split_at(NONCE_SIZE);
        self.open(nonce, ciphertext, aad)
    }
}

impl<C> Aead for AesGcmSiv<C>
where
    C: BlockCipher<BlockSize = U16, ParBlocks = U8>,
{
    type NonceSize = U12;
    type TagSize = U16;
    type CiphertextOverhead = U0;

    fn encrypt<'msg, 'aad>(
        &self,
        nonce: &GenericArray<u8, Self::NonceSize>,
        plaintext: impl Into<Payload<'msg, 'aad>>,
    ) -> Result<Vec<u8>, Error> {
        let payload = plaintext.into();
        self.seal(nonce.as_slice(), payload.msg, payload.aad)
    }

    fn decrypt<'msg, 'aad>(
        &self,
        nonce: &GenericArray<u8, Self::NonceSize>,
        ciphertext: impl Into<Payload<'msg, 'aad>>,
    ) -> Result<Vec<u8>, Error> {
        let payload = ciphertext.into();
        self.open(nonce.as_slice(), payload.msg, payload.aad)
    }
}

/// Per-message SIV state: the scheduled encryption-key cipher, the POLYVAL
/// hasher keyed with `authKey`, and the nonce. Constructed fresh per
/// `seal`/`open` call and dropped (zeroizing `nonce`; `polyval`'s own
/// `Drop` impl wipes the accumulator and hash key) at the end of the call,
/// including on the authentication-failure path in [`Cipher::open`].
struct Cipher<C: BlockCipher<BlockSize = U16, ParBlocks = U8>> {
    /// Encryption cipher, keyed with `encKey`
    enc_cipher: C,

    /// POLYVAL universal hash, keyed with `authKey`
    polyval: Polyval,

    /// Nonce
    nonce: GenericArray<u8, U12>,
}

impl<C> Cipher<C>
where
    C: BlockCipher<BlockSize = U16, ParBlocks = U8>,
{
    /// Initializes AES-GCM-SIV, deriving per-nonce message-authentication
    /// and message-encryption keys from the key-generating key.
    fn new(key_generating_key: &C, nonce: &GenericArray<u8, U12>) -> Self {
        let (mut auth_key, mut enc_key) = kdf::derive_keys(key_generating_key, nonce);

        let cipher = Self {
            enc_cipher: C::new(&enc_key),
            polyval: Polyval::new(auth_key.as_slice().try_into().expect("16-byte authKey")),
            nonce: *nonce,
        };

        auth_key.zeroize();
        enc_key.zeroize();
        cipher
    }

    /// Seals `plaintext` (encrypting it in place and returning the tag),
    /// following RFC 8452's encryption procedure.
    fn seal(mut self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, Error> {
        if plaintext.len() as u64 > P_MAX || aad.len() as u64 > A_MAX {
            return Err(Error);
        }

        let mut buffer = Vec::with_capacity(plaintext.len() + TAG_SIZE);
        buffer.extend_from_slice(plaintext);

        let tag = self.compute_tag(&buffer, aad);
        self.apply_ctr(tag, &mut buffer);
        buffer.extend_from_slice(tag.as_slice());
        Ok(buffer)
    }

    /// Opens `buffer` in place against `tag`, authenticating `aad`
    /// alongside it, following RFC 8452's decryption procedure.
    fn open(mut self, buffer: &mut Vec<u8>, aad: &[u8], tag: Tag) -> Result<(), Error> {
        if buffer.len() as u64 > C_MAX || aad.len() as u64 > A_MAX {
            return Err(Error);
        }

        self.apply_ctr(tag, buffer);
        let expected_tag = self.compute_tag(buffer, aad);

        if expected_tag.ct_eq(&tag).unwrap_u8() == 1 {
            Ok(())
        } else {
            // Re-encrypt the candidate plaintext back into ciphertext so a
            // caller that (incorrectly) inspects `buffer` after a
            // discarded `Err` never observes unauthenticated plaintext.
            self.apply_ctr(tag, buffer);
            Err(Error)
        }
    }

    /// Computes the synthetic SIV tag: feeds AAD, then the message, then
    /// the bit-length block into POLYVAL, masks the digest with the
    /// nonce, clears the top bit, and encrypts it under `encKey`.
    fn compute_tag(&mut self, buffer: &[u8], aad: &[u8]) -> Tag {
        self.polyval.update_padded(aad);
        self.polyval.update_padded(buffer);

        let aad_bits = (aad.len() as u64) * 8;
        let buffer_bits = (buffer.len() as u64) * 8;

        let mut length_block = [0u8; 16];
        length_block[..8].copy_from_slice(&le::pack_u64(aad_bits));
        length_block[8..].copy_from_slice(&le::pack_u64(buffer_bits));
        self.polyval.update_block(&length_block);

        let mut digest = self.polyval.result_reset();

        for (byte, nonce_byte) in digest[..12].iter_mut().zip(self.nonce.iter()) {
            *byte ^= *nonce_byte;
        }
        digest[15] &= 0x7f;

        let mut tag = GenericArray::<u8, U16>::clone_from_slice(&digest[..]);
        self.enc_cipher.encrypt_block(&mut tag);
        tag
    }

    /// Runs AES-CTR over `buffer` in place, seeded from `tag` with the
    /// top bit of its last byte set (`C0`).
    fn apply_ctr(&self, mut seed: Tag, buffer: &mut [u8]) {
        seed[15] |= 0x80;
        ctr::apply_keystream(&self.enc_cipher, seed, buffer);
    }
}

impl<C> Drop for Cipher<C>
where
    C: BlockCipher<BlockSize = U16, ParBlocks = U8>,
{
    fn drop(&mut self) {
        self.nonce.as_mut_slice().zeroize();
    }
}
