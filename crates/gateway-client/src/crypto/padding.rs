//! PKCS#7 block padding.
//!
//! `pad` always appends between 1 and `block_size` bytes, so block-aligned input
//! gains a full extra block. `unpad` checks every pad byte, not just the last.

use common::PaddingFault;

/// Pad `data` to a multiple of `block_size`.
///
/// # Panics
///
/// Panics if `block_size` is 0 or greater than 255.
pub fn pad(data: &[u8], block_size: usize) -> Vec<u8> {
    assert!(
        (1..=255).contains(&block_size),
        "block size must be in 1..=255"
    );
    let pad_len = block_size - (data.len() % block_size);
    let mut out = Vec::with_capacity(data.len() + pad_len);
    out.extend_from_slice(data);
    out.resize(data.len() + pad_len, pad_len as u8);
    out
}

/// Strip and validate PKCS#7 padding, returning the unpadded prefix.
///
/// # Errors
///
/// - [`PaddingFault::Empty`] on empty input
/// - [`PaddingFault::Misaligned`] if the length is not a multiple of `block_size`
/// - [`PaddingFault::InvalidLength`] if the final byte is 0 or exceeds `block_size`
/// - [`PaddingFault::Mismatch`] if any byte of the pad region differs from the final byte
pub fn unpad(data: &[u8], block_size: usize) -> Result<&[u8], PaddingFault> {
    if data.is_empty() {
        return Err(PaddingFault::Empty);
    }
    if block_size == 0 || data.len() % block_size != 0 {
        return Err(PaddingFault::Misaligned {
            len: data.len(),
            block_size,
        });
    }

    let pad_byte = data[data.len() - 1];
    let pad_len = pad_byte as usize;
    if pad_len == 0 || pad_len > block_size {
        return Err(PaddingFault::InvalidLength(pad_byte));
    }

    let start = data.len() - pad_len;
    if let Some(i) = data[start..].iter().position(|&b| b != pad_byte) {
        return Err(PaddingFault::Mismatch(start + i));
    }
    Ok(&data[..start])
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: usize = 16;

    #[test]
    fn pad_unpad_all_lengths_up_to_64() {
        for len in 0..=64usize {
            let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let padded = pad(&data, BLOCK);
            assert_eq!(padded.len() % BLOCK, 0, "len {len}");
            assert!(padded.len() > data.len(), "len {len}");
            assert!(padded.len() - data.len() <= BLOCK, "len {len}");
            assert_eq!(unpad(&padded, BLOCK).unwrap(), data.as_slice(), "len {len}");
        }
    }

    #[test]
    fn aligned_input_gets_full_block() {
        let padded = pad(&[0xAA; 32], BLOCK);
        assert_eq!(padded.len(), 48);
        assert!(padded[32..].iter().all(|&b| b == 16));
    }

    #[test]
    fn empty_input_pads_to_one_block() {
        assert_eq!(pad(&[], BLOCK), vec![16u8; 16]);
    }

    #[test]
    fn unpad_rejects_empty() {
        assert_eq!(unpad(&[], BLOCK), Err(PaddingFault::Empty));
    }

    #[test]
    fn unpad_rejects_misaligned() {
        assert!(matches!(
            unpad(&[1u8; 17], BLOCK),
            Err(PaddingFault::Misaligned { len: 17, .. })
        ));
    }

    #[test]
    fn unpad_rejects_zero_pad_byte() {
        let mut block = [5u8; 16];
        block[15] = 0;
        assert_eq!(unpad(&block, BLOCK), Err(PaddingFault::InvalidLength(0)));
    }

    #[test]
    fn unpad_rejects_oversized_pad_byte() {
        let block = [17u8; 16];
        assert_eq!(unpad(&block, BLOCK), Err(PaddingFault::InvalidLength(17)));
    }

    #[test]
    fn unpad_checks_every_pad_byte() {
        // Corrupt each position of a 6-byte pad region in turn; the first pad
        // byte and the middle ones must be caught, not only the last.
        let padded = pad(b"0123456789", BLOCK);
        assert_eq!(padded[15], 6);
        for pos in 10..15 {
            let mut bad = padded.clone();
            bad[pos] ^= 0x01;
            assert_eq!(unpad(&bad, BLOCK), Err(PaddingFault::Mismatch(pos)));
        }
    }

    #[test]
    fn full_block_of_padding_is_stripped() {
        let data = [16u8; 16];
        assert_eq!(unpad(&data, BLOCK).unwrap(), &[] as &[u8]);
    }
}
