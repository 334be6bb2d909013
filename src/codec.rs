//! Byte-level helpers shared by the coinbase, merkle and header code. Everything here must
//! match daemon serialization exactly.

use super::*;

static SCRYPT_PARAMS: LazyLock<Result<scrypt::Params, scrypt::errors::InvalidParams>> =
    LazyLock::new(|| scrypt::Params::new(10, 1, 1, 32));

/// Bitcoin compact-size unsigned integer.
pub fn varint(n: u64) -> Vec<u8> {
    match n {
        0..=0xfc => vec![n as u8],
        0xfd..=0xffff => {
            let mut buf = vec![0xfd, 0, 0];
            LittleEndian::write_u16(&mut buf[1..], n as u16);
            buf
        }
        0x1_0000..=0xffff_ffff => {
            let mut buf = vec![0xfe, 0, 0, 0, 0];
            LittleEndian::write_u32(&mut buf[1..], n as u32);
            buf
        }
        _ => {
            let mut buf = vec![0xff, 0, 0, 0, 0, 0, 0, 0, 0];
            LittleEndian::write_u64(&mut buf[1..], n);
            buf
        }
    }
}

pub fn varint_hex(n: u64) -> String {
    hex::encode(varint(n))
}

pub fn le_bytes(n: u64, width: usize) -> Result<Vec<u8>, PoolError> {
    match width {
        4 => {
            let n = u32::try_from(n)
                .map_err(|_| PoolError::encoding(format!("{n} does not fit in 4 bytes")))?;
            Ok(n.to_le_bytes().to_vec())
        }
        8 => Ok(n.to_le_bytes().to_vec()),
        _ => Err(PoolError::encoding(format!(
            "unsupported little-endian width {width}"
        ))),
    }
}

pub fn sha256d(bytes: &[u8]) -> [u8; 32] {
    sha256d::Hash::hash(bytes).to_byte_array()
}

/// Scrypt proof-of-work digest with N=1024, r=1, p=1 using the input as password and salt.
pub fn scrypt_hash(bytes: &[u8]) -> Result<[u8; 32], PoolError> {
    let params = SCRYPT_PARAMS
        .as_ref()
        .map_err(|err| PoolError::encoding(format!("scrypt params: {err}")))?;

    let mut output = [0u8; 32];

    scrypt::scrypt(bytes, bytes, params, &mut output)
        .map_err(|err| PoolError::encoding(format!("scrypt: {err}")))?;

    Ok(output)
}

pub fn reverse_bytes(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().rev().copied().collect()
}

pub fn decode_hex(s: &str) -> Result<Vec<u8>, PoolError> {
    hex::decode(s).map_err(|err| PoolError::encoding(format!("invalid hex `{s}`: {err}")))
}

/// Reverses byte order of a hex string.
pub fn reverse_hex_pairs(s: &str) -> Result<String, PoolError> {
    if s.len() % 2 != 0 {
        return Err(PoolError::encoding(format!(
            "hex string of odd length {}",
            s.len()
        )));
    }

    Ok(hex::encode(reverse_bytes(&decode_hex(s)?)))
}

/// Reverses the order of 4-byte words in a hex string, keeping the bytes inside each word.
/// This is the Stratum wire form of a previous block hash.
pub fn reverse_hex_words(s: &str) -> Result<String, PoolError> {
    if s.len() % 8 != 0 {
        return Err(PoolError::encoding(format!(
            "hex string length {} is not a multiple of 8",
            s.len()
        )));
    }

    let bytes = decode_hex(s)?;

    Ok(bytes.chunks(4).rev().map(hex::encode).collect())
}

/// Drops trailing zero bytes of a little-endian integer, keeping at least one byte.
pub fn trim_insignificant_bytes(bytes: &[u8]) -> Vec<u8> {
    let significant = bytes
        .iter()
        .rposition(|byte| *byte != 0)
        .map(|i| i + 1)
        .unwrap_or(1)
        .min(bytes.len());

    bytes[..significant].to_vec()
}
