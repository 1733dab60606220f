use crate::error::{Error, Result};

/// parse the producer's variable-length uncompressed-size header.
///
/// returns `(header_len, uncompressed_size)`. the first byte's value is
/// inspected bit-by-bit from `0x80` downward; the first shift is by two
/// (the inspected bit in byte 0 is `0x80` itself), subsequent shifts by one.
/// the header ends at the first byte whose inspected bit is clear.
fn lzf_header_length(raw: &[u8]) -> Result<(usize, u64)> {
    if raw.is_empty() {
        return Err(Error::MalformedLzfHeader("empty input".into()));
    }
    let l = raw[0];
    let csize = raw.len();
    let mut start: usize = 1;
    let mut mask: u16 = 0x80;
    while mask != 0 && csize > start && (u16::from(l) & mask) != 0 {
        mask >>= if mask == 0x80 { 2 } else { 1 };
        start += 1;
    }
    if mask == 0 || csize < start {
        return Err(Error::MalformedLzfHeader(
            "compressed data corrupted (invalid length)".into(),
        ));
    }
    let mut usize_val: u64 = u64::from(l) & (u64::from(mask) - 1);
    for byte in &raw[1..start] {
        usize_val = (usize_val << 6) + u64::from(byte & 0x3f);
    }
    if usize_val == 0 {
        return Err(Error::MalformedLzfHeader(
            "compressed data corrupted (invalid length)".into(),
        ));
    }
    Ok((start, usize_val))
}

/// decode one LZF-framed payload as produced by the external pipeline.
///
/// an empty input decodes to empty output. a payload whose first byte is
/// `0x00` is an uncompressed passthrough (the remaining bytes are the
/// literal content). anything else is a size header followed by raw LZF.
pub fn decode(raw: &[u8]) -> Result<Vec<u8>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if raw[0] == 0x00 {
        return Ok(raw[1..].to_vec());
    }
    let (start, usize_val) = lzf_header_length(raw)?;
    decompress(&raw[start..], usize_val as usize)
}

/// raw LZF decompression (the classic liblzf back-reference format):
/// a control byte below 32 starts a literal run of `ctrl + 1` bytes; a
/// control byte at or above 32 starts a back-reference of length
/// `(ctrl >> 5) + 2` (or `+ 2 + next_byte` when the 3-bit length field is
/// saturated at 7) copied from `output.len() - ((ctrl & 0x1f) << 8) - 1 -
/// next_byte`.
pub fn decompress(input: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len);
    let mut ip = 0usize;
    while ip < input.len() {
        let ctrl = input[ip];
        ip += 1;
        if ctrl < 32 {
            let len = usize::from(ctrl) + 1;
            let end = ip + len;
            if end > input.len() {
                return Err(Error::DecompressError(
                    "literal run exceeds input".to_string(),
                ));
            }
            out.extend_from_slice(&input[ip..end]);
            ip = end;
        } else {
            let mut len = usize::from(ctrl >> 5);
            if len == 7 {
                if ip >= input.len() {
                    return Err(Error::DecompressError(
                        "truncated back-reference length".to_string(),
                    ));
                }
                len += usize::from(input[ip]);
                ip += 1;
            }
            len += 2;
            if ip >= input.len() {
                return Err(Error::DecompressError(
                    "truncated back-reference offset".to_string(),
                ));
            }
            let low = usize::from(input[ip]);
            ip += 1;
            let high = usize::from(ctrl & 0x1f) << 8;
            let back = high + 1 + low;
            if back > out.len() {
                return Err(Error::DecompressError(
                    "back-reference points before start of output".to_string(),
                ));
            }
            let mut ref_pos = out.len() - back;
            for _ in 0..len {
                let byte = out[ref_pos];
                out.push(byte);
                ref_pos += 1;
            }
        }
    }
    if out.len() != expected_len {
        return Err(Error::DecompressError(format!(
            "decompressed {} bytes, expected {}",
            out.len(),
            expected_len
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_decodes_to_empty() {
        assert_eq!(decode(&[]).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn passthrough_marker_strips_first_byte() {
        let raw = [0x00u8, b'h', b'i'];
        assert_eq!(decode(&raw).unwrap(), b"hi".to_vec());
    }

    #[test]
    fn header_length_scenarios() {
        assert_eq!(lzf_header_length(&[0xC4, 0x9B]).unwrap(), (2, 283));
        assert_eq!(lzf_header_length(&[0xE1, 0xAF, 0xA9]).unwrap(), (3, 7145));
    }

    #[test]
    fn header_rejects_empty() {
        assert!(lzf_header_length(&[]).is_err());
    }

    #[test]
    fn literal_only_compression_round_trips() {
        // an all-literal-run LZF stream: ctrl=4 (len 5), 5 literal bytes
        let compressed = [4u8, b'h', b'e', b'l', b'l', b'o'];
        let out = decompress(&compressed, 5).unwrap();
        assert_eq!(out, b"hello".to_vec());
    }

    #[test]
    fn back_reference_repeats_earlier_bytes() {
        // "abcabc": literal "abc" (ctrl=2, 3 bytes), then a back-reference
        // of length 3 at offset 3 back (ctrl = (1<<5)|0 = 0x20, low=2)
        let compressed = [2u8, b'a', b'b', b'c', 0x20, 0x02];
        let out = decompress(&compressed, 6).unwrap();
        assert_eq!(out, b"abcabc".to_vec());
    }
}
