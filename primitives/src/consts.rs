pub const BYTES_PER_FIELD_ELEMENT: usize = 32;
/// Number of payload bytes packed into one field element. 31 bytes always
/// stay below the bn254 scalar modulus.
pub const BYTES_PER_SYMBOL: usize = 31;

pub const SIZE_OF_G1_AFFINE_COMPRESSED: usize = 32; // in bytes
pub const SIZE_OF_G2_AFFINE_COMPRESSED: usize = 64; // in bytes
pub const SIZE_OF_G1_AFFINE_UNCOMPRESSED: usize = 64; // X || Y
pub const SIZE_OF_G2_AFFINE_UNCOMPRESSED: usize = 128; // X.A0 || X.A1 || Y.A0 || Y.A1

/// Serialized size of [crate::header::DataStoreHeader].
pub const DATA_STORE_HEADER_SIZE: usize = 164;
pub const DISPERSER_ADDRESS_SIZE: usize = 20;

/// Largest FFT the bn254 scalar field supports (2-adicity of r - 1).
pub const MAX_LOG_FFT_SIZE: u32 = 28;

pub const BASIS_POINTS: u64 = 10_000;
