// src/abi.rs
//! Minimal Solidity ABI support for the staking and token contracts.
//!
//! Only the shapes the call surface needs are handled: static words
//! (address, uint, bool), dynamic arrays of static words, and arrays of
//! static tuples.

use sha3::{Digest, Keccak256};

use crate::error::AbiError;

const WORD: usize = 32;

/// Selector of the standard `Error(string)` revert payload
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// A 20-byte account or contract address
pub type Address = [u8; 20];

/// Argument to an encoded call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(u128),
}

/// First four bytes of keccak256 over the canonical function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Encode a call as `0x`-prefixed calldata
pub fn encode_call(signature: &str, args: &[Token]) -> String {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(&encode_word(arg));
    }
    format!("0x{}", hex::encode(data))
}

fn encode_word(token: &Token) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    match token {
        Token::Address(addr) => word[12..].copy_from_slice(addr),
        Token::Uint(value) => word[16..].copy_from_slice(&value.to_be_bytes()),
    }
    word
}

/// Parse a `0x`-prefixed 40 hex digit address
pub fn parse_address(address: &str) -> Result<Address, AbiError> {
    let stripped = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| AbiError::InvalidAddress(address.to_string()))?;
    if stripped.len() != 40 {
        return Err(AbiError::InvalidAddress(address.to_string()));
    }
    let bytes = hex::decode(stripped).map_err(|_| AbiError::InvalidAddress(address.to_string()))?;
    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes);
    Ok(out)
}

pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Decode `0x`-prefixed hex (an empty `0x` yields no bytes)
pub fn hex_to_bytes(data: &str) -> Result<Vec<u8>, AbiError> {
    let stripped = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(stripped).map_err(|_| AbiError::InvalidHex(data.to_string()))
}

/// Parse a JSON-RPC quantity such as `"0x279f"`
pub fn parse_quantity(quantity: &str) -> Result<u64, AbiError> {
    let stripped = quantity.strip_prefix("0x").unwrap_or(quantity);
    u64::from_str_radix(stripped, 16).map_err(|_| AbiError::InvalidHex(quantity.to_string()))
}

pub fn format_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

fn word_at(data: &[u8], index: usize) -> Result<&[u8], AbiError> {
    let start = index.checked_mul(WORD).ok_or(AbiError::Overflow)?;
    let end = start.checked_add(WORD).ok_or(AbiError::Overflow)?;
    if data.len() < end {
        return Err(AbiError::TooShort {
            needed: end,
            got: data.len(),
        });
    }
    Ok(&data[start..end])
}

/// Decode the uint256 at word `index`; values above `u128::MAX` are rejected
pub fn decode_uint(data: &[u8], index: usize) -> Result<u128, AbiError> {
    let word = word_at(data, index)?;
    if word[..16].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow);
    }
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(buf))
}

pub fn decode_u64(data: &[u8], index: usize) -> Result<u64, AbiError> {
    let value = decode_uint(data, index)?;
    u64::try_from(value).map_err(|_| AbiError::Overflow)
}

pub fn decode_bool(data: &[u8], index: usize) -> Result<bool, AbiError> {
    match decode_uint(data, index)? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(AbiError::InvalidBool),
    }
}

/// Offsets and lengths come from the node and must fit in memory
fn decode_usize(data: &[u8], index: usize) -> Result<usize, AbiError> {
    usize::try_from(decode_uint(data, index)?).map_err(|_| AbiError::Overflow)
}

/// Bytes `[start, start + len)` of `data`, checked against overflow and truncation
fn byte_range(data: &[u8], start: usize, len: usize) -> Result<&[u8], AbiError> {
    let end = start.checked_add(len).ok_or(AbiError::Overflow)?;
    data.get(start..end).ok_or(AbiError::TooShort {
        needed: end,
        got: data.len(),
    })
}

/// Locate a dynamic array returned as the sole output: (element words, length)
fn dynamic_array(data: &[u8]) -> Result<(&[u8], usize), AbiError> {
    let offset = decode_usize(data, 0)?;
    if offset % WORD != 0 {
        return Err(AbiError::InvalidHex(format!("misaligned array offset {}", offset)));
    }
    let len = decode_usize(data, offset / WORD)?;
    let body_start = offset.checked_add(WORD).ok_or(AbiError::Overflow)?;
    Ok((data.get(body_start..).unwrap_or_default(), len))
}

/// Decode a `uint256[]` return value
pub fn decode_uint_array(data: &[u8]) -> Result<Vec<u128>, AbiError> {
    let (body, len) = dynamic_array(data)?;
    let needed = len.checked_mul(WORD).ok_or(AbiError::Overflow)?;
    let body = byte_range(body, 0, needed)?;
    (0..len).map(|i| decode_uint(body, i)).collect()
}

/// Split an array of static tuples into one slice of words per tuple
pub fn tuple_array_chunks(data: &[u8], tuple_words: usize) -> Result<Vec<&[u8]>, AbiError> {
    let tuple_len = tuple_words.checked_mul(WORD).ok_or(AbiError::Overflow)?;
    if tuple_len == 0 {
        return Ok(Vec::new());
    }
    let (body, len) = dynamic_array(data)?;
    let needed = len.checked_mul(tuple_len).ok_or(AbiError::Overflow)?;
    let body = byte_range(body, 0, needed)?;
    Ok(body.chunks(tuple_len).collect())
}

/// Decode the reason string of an `Error(string)` revert payload
pub fn decode_revert_reason(data: &str) -> Option<String> {
    let bytes = hex_to_bytes(data).ok()?;
    if bytes.len() < 4 || bytes[..4] != ERROR_STRING_SELECTOR {
        return None;
    }
    let payload = &bytes[4..];
    let offset = decode_usize(payload, 0).ok()?;
    let len = decode_usize(payload, offset / WORD).ok()?;
    let start = offset.checked_add(WORD)?;
    let text = byte_range(payload, start, len).ok()?;
    String::from_utf8(text.to_vec()).ok()
}

#[cfg(test)]
pub(crate) fn encode_words(words: &[u128]) -> Vec<u8> {
    words
        .iter()
        .flat_map(|w| encode_word(&Token::Uint(*w)))
        .collect()
}
