//! MSB-first bit reader for RBSP syntax elements

pub(crate) struct BitReader<'a> {
    data: &'a [u8],
    byte_pos: usize,
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            bit_pos: 0,
        }
    }

    /// Read n bits (up to 32)
    pub(crate) fn read_bits(&mut self, n: u8) -> Option<u32> {
        let mut result = 0u32;

        for _ in 0..n {
            let byte = *self.data.get(self.byte_pos)?;
            let bit = (byte >> (7 - self.bit_pos)) & 1;
            result = (result << 1) | (bit as u32);

            self.bit_pos += 1;
            if self.bit_pos == 8 {
                self.bit_pos = 0;
                self.byte_pos += 1;
            }
        }

        Some(result)
    }

    pub(crate) fn read_flag(&mut self) -> Option<bool> {
        self.read_bits(1).map(|b| b == 1)
    }

    pub(crate) fn skip_bits(&mut self, n: u8) -> Option<()> {
        self.read_bits(n).map(|_| ())
    }

    /// Read unsigned Exp-Golomb coded value
    pub(crate) fn read_ue(&mut self) -> Option<u32> {
        let mut leading_zeros = 0u8;
        while !self.read_flag()? {
            leading_zeros += 1;
            if leading_zeros > 31 {
                return None;
            }
        }

        if leading_zeros == 0 {
            return Some(0);
        }

        let suffix = self.read_bits(leading_zeros)?;
        Some(((1u64 << leading_zeros) - 1 + suffix as u64) as u32)
    }

    /// Read signed Exp-Golomb coded value
    pub(crate) fn read_se(&mut self) -> Option<i32> {
        let k = self.read_ue()? as i64;
        let value = if k % 2 == 1 { (k + 1) / 2 } else { -(k / 2) };
        Some(value as i32)
    }
}
