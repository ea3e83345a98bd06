//! LSB-first bit writer for hand-assembling DEFLATE streams.

/// Packs values into bytes least-significant bit first, matching the order
/// DEFLATE readers consume them.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_pos: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the low `count` bits of `value`, least significant first.
    pub fn write_bits(&mut self, value: u32, count: u8) {
        for i in 0..count {
            if self.bit_pos == 0 {
                self.bytes.push(0);
            }
            let bit = ((value >> i) & 1) as u8;
            if let Some(last) = self.bytes.last_mut() {
                *last |= bit << self.bit_pos;
            }
            self.bit_pos = (self.bit_pos + 1) % 8;
        }
    }

    /// Write a Huffman code, most significant bit first.
    pub fn write_code(&mut self, code: u16, len: u8) {
        for i in (0..len).rev() {
            self.write_bits(((code >> i) & 1) as u32, 1);
        }
    }

    /// Block header: BFINAL then the two BTYPE bits.
    pub fn write_block_header(&mut self, is_final: bool, btype: u8) {
        self.write_bits(is_final as u32, 1);
        self.write_bits(btype as u32, 2);
    }

    /// Write a literal/length symbol using the fixed Huffman code.
    pub fn write_fixed_symbol(&mut self, symbol: u16) {
        match symbol {
            0..=143 => self.write_code(0x30 + symbol, 8),
            144..=255 => self.write_code(0x190 + (symbol - 144), 9),
            256..=279 => self.write_code(symbol - 256, 7),
            _ => self.write_code(0xC0 + (symbol - 280), 8),
        }
    }

    /// Write a distance symbol using the fixed 5-bit code.
    pub fn write_fixed_distance(&mut self, symbol: u16) {
        self.write_code(symbol, 5);
    }

    /// Pad to a byte boundary with zero bits.
    pub fn align(&mut self) {
        self.bit_pos = 0;
    }

    /// Append whole bytes; the writer must be aligned.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        assert_eq!(self.bit_pos, 0, "write_bytes needs byte alignment");
        self.bytes.extend_from_slice(bytes);
    }

    /// Write a stored block including its LEN/NLEN header.
    pub fn write_stored_block(&mut self, is_final: bool, payload: &[u8]) {
        self.write_block_header(is_final, 0);
        self.align();
        let len = payload.len() as u16;
        self.write_bytes(&len.to_le_bytes());
        self.write_bytes(&(!len).to_le_bytes());
        self.write_bytes(payload);
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Wrap a raw DEFLATE stream in a zlib header and Adler-32 trailer.
pub fn zlib_wrap(deflate: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0x78, 0x9C];
    out.extend_from_slice(deflate);
    out.extend_from_slice(&pnginflate::checksum::adler32(payload).to_be_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_lsb_first() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b1, 1);
        writer.write_bits(0b01, 2);
        assert_eq!(writer.finish(), vec![0b011]);
    }
}
