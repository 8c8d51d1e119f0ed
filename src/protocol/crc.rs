//! Checksums used by XMODEM framing

/// CRC-16/XMODEM (poly 0x1021, init 0)
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// 8-bit additive checksum of plain (non-CRC) XMODEM
pub fn checksum8(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc_check_value() {
        assert_eq!(crc16_xmodem(b"123456789"), 0x31C3);
        assert_eq!(crc16_xmodem(&[]), 0);
    }

    #[test]
    fn checksum_wraps() {
        assert_eq!(checksum8(&[0xFF, 0x02]), 0x01);
    }
}
