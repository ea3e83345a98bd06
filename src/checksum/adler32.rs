//! Adler-32 checksum (RFC 1950) verified against zlib trailers.

const MOD_ADLER: u32 = 65_521;

/// Largest n such that 255*n*(n+1)/2 + (n+1)*(MOD_ADLER-1) <= 2^32-1.
const NMAX: usize = 5552;

/// Calculate the Adler-32 checksum of `data`.
#[inline]
#[must_use]
pub fn adler32(data: &[u8]) -> u32 {
    let mut hasher = Adler32::new();
    hasher.update(data);
    hasher.finalize()
}

/// Incremental Adler-32.
#[derive(Debug, Clone, Copy)]
pub struct Adler32 {
    s1: u32,
    s2: u32,
}

impl Adler32 {
    /// Start a new checksum (initial value 1).
    pub fn new() -> Self {
        Self { s1: 1, s2: 0 }
    }

    /// Feed more bytes.
    ///
    /// The modulo is deferred to NMAX-sized chunk boundaries.
    pub fn update(&mut self, data: &[u8]) {
        for chunk in data.chunks(NMAX) {
            for &b in chunk {
                self.s1 += b as u32;
                self.s2 += self.s1;
            }
            self.s1 %= MOD_ADLER;
            self.s2 %= MOD_ADLER;
        }
    }

    /// Return the checksum of everything fed so far.
    #[inline]
    pub fn finalize(self) -> u32 {
        (self.s2 << 16) | self.s1
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}
