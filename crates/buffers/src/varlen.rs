/// Number of bytes the unsigned LEB128 encoding of `value` occupies.
///
/// Always at least 1; one extra byte per 7 significant bits.
#[inline]
pub fn varlen_size(value: u64) -> usize {
    let mut len = 1;
    let mut val = value;
    while val >= 0x80 {
        val >>= 7;
        len += 1;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_at_seven_bit_boundaries() {
        assert_eq!(varlen_size(0), 1);
        assert_eq!(varlen_size(0x7f), 1);
        assert_eq!(varlen_size(0x80), 2);
        assert_eq!(varlen_size(0x3fff), 2);
        assert_eq!(varlen_size(0x4000), 3);
        assert_eq!(varlen_size(u64::MAX), 10);
    }
}
