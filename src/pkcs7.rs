/// PKCS#7 padding and its validation
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid pkcs7 padding")]
pub struct PaddingError;

/// Pad `bytes` up to the next multiple of `block_size`.
///
/// Padding is always present: block-aligned input gains a whole block of
/// value `block_size`.
pub fn pkcs7_pad(bytes: &[u8], block_size: u8) -> Vec<u8> {
    let n_pad = block_size - (bytes.len() % block_size as usize) as u8;
    let mut out = Vec::with_capacity(bytes.len() + n_pad as usize);
    out.extend_from_slice(bytes);
    (0..n_pad).for_each(|_| out.push(n_pad));
    out
}

pub fn pkcs7_unpad(bytes: &mut Vec<u8>, block_size: u8) -> Result<(), PaddingError> {
    if let Some(n_pad) = is_pkcs7_padded(bytes, block_size) {
        bytes.truncate(bytes.len() - n_pad as usize);
        return Ok(());
    }
    Err(PaddingError)
}

/// Return the padding length if `bytes` ends in well-formed padding.
pub fn is_pkcs7_padded(bytes: &[u8], block_size: u8) -> Option<u8> {
    let n_pad = *bytes.last()?;
    if n_pad == 0 || n_pad > block_size || n_pad as usize > bytes.len() {
        return None;
    }
    let padded = &bytes[(bytes.len() - n_pad as usize)..];
    if padded.iter().all(|&el| el == n_pad) {
        return Some(n_pad);
    }
    None
}

/// Check the padding of the final block of `bytes` without data-dependent
/// branches or early exits.
///
/// Every byte of the final block is examined whatever the padding turns out
/// to be. Input shorter than a block is rejected; its length is public.
pub fn is_pkcs7_padded_constant_time(bytes: &[u8], block_size: u8) -> bool {
    let block_size = block_size as usize;
    if block_size == 0 || bytes.len() < block_size {
        return false;
    }
    let block = &bytes[bytes.len() - block_size..];
    let n_pad = block[block_size - 1];

    let mut mismatch = 0u8;
    for (i, &byte) in block.iter().enumerate() {
        let in_padding = (i + n_pad as usize >= block_size) as u8;
        let differs = ((byte ^ n_pad) != 0) as u8;
        mismatch |= in_padding & differs;
    }
    let out_of_range = ((n_pad == 0) as u8) | ((n_pad as usize > block_size) as u8);
    (mismatch | out_of_range) == 0
}
