//! Little-endian byte packing helpers shared by the KDF, CTR and POLYVAL
//! length-block framing.
//!
//! RFC 8452 represents every multi-byte integer used internally (KDF
//! counters, the CTR counter, the POLYVAL length block) as little-endian,
//! regardless of target endianness. These helpers keep that convention in
//! one place rather than scattering `to_le_bytes`/`from_le_bytes` calls.

/// Packs a `u32` as 4 little-endian bytes.
#[inline]
pub(crate) fn pack_u32(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Unpacks 4 little-endian bytes as a `u32`.
#[inline]
pub(crate) fn unpack_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

/// Packs a `u64` as 8 little-endian bytes.
#[inline]
pub(crate) fn pack_u64(value: u64) -> [u8; 8] {
    value.to_le_bytes()
}

/// Unpacks 8 little-endian bytes as a `u64`.
#[inline]
pub(crate) fn unpack_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}
