/// CRC-8 polynomial used by the packet trailer.
pub const POLYNOMIAL: u8 = 0x9B;

const TABLE: [u8; 256] = build_table(POLYNOMIAL);

const fn build_table(poly: u8) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut curr = i as u8;
        let mut bit = 0;
        while bit < 8 {
            curr = if curr & 0x80 != 0 {
                (curr << 1) ^ poly
            } else {
                curr << 1
            };
            bit += 1;
        }
        table[i] = curr;
        i += 1;
    }
    table
}

/// Table-driven CRC-8 over `data`, initial value zero.
pub fn crc8(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |crc, &b| TABLE[(crc ^ b) as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_zero() {
        assert_eq!(crc8(&[]), 0);
    }

    #[test]
    fn single_byte_is_table_entry() {
        assert_eq!(crc8(&[0x01]), POLYNOMIAL);
        assert_eq!(crc8(&[0x00]), 0);
    }

    #[test]
    fn detects_single_bit_flip() {
        let data = [0x02, 0x00, 0x00, 0x80, 0x3F, 0x00, 0x00, 0x00, 0x40];
        let base = crc8(&data);
        for i in 0..data.len() {
            for bit in 0..8 {
                let mut flipped = data;
                flipped[i] ^= 1 << bit;
                assert_ne!(crc8(&flipped), base);
            }
        }
    }
}
