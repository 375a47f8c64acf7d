//! Per-channel gamma correction tables for the bit-plane encoder.
//!
//! The eye's intensity response is non-linear, so the 8-bit linear samples in
//! the frame buffer are mapped through a lookup table before they are sliced
//! into bit-planes. The encoder only requires that each table is monotonic
//! non-decreasing and maps 0 to 0 (an unlit pixel must stay unlit); how the
//! curve is derived is up to the caller. [`GAMMA8`] provides the stock
//! 2.8-exponent curve that works well on typical panels.

/// Stock gamma correction curve with exponent 2.8, `x -> 255 * (x / 255)^2.8`.
pub const GAMMA8: [u8; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, //
    1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, //
    2, 3, 3, 3, 3, 3, 3, 3, 4, 4, 4, 4, 4, 5, 5, 5, //
    5, 6, 6, 6, 6, 7, 7, 7, 7, 8, 8, 8, 9, 9, 9, 10, //
    10, 10, 11, 11, 11, 12, 12, 13, 13, 13, 14, 14, 15, 15, 16, 16, //
    17, 17, 18, 18, 19, 19, 20, 20, 21, 21, 22, 22, 23, 24, 24, 25, //
    25, 26, 27, 27, 28, 29, 29, 30, 31, 32, 32, 33, 34, 35, 35, 36, //
    37, 38, 39, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49, 50, 50, //
    51, 52, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 64, 66, 67, 68, //
    69, 70, 72, 73, 74, 75, 77, 78, 79, 81, 82, 83, 85, 86, 87, 89, //
    90, 92, 93, 95, 96, 98, 99, 101, 102, 104, 105, 107, 109, 110, 112, 114, //
    115, 117, 119, 120, 122, 124, 126, 127, 129, 131, 133, 135, 137, 138, 140, 142, //
    144, 146, 148, 150, 152, 154, 156, 158, 160, 162, 164, 167, 169, 171, 173, 175, //
    177, 180, 182, 184, 186, 189, 191, 193, 196, 198, 200, 203, 205, 208, 210, 213, //
    215, 218, 220, 223, 225, 228, 231, 233, 236, 239, 241, 244, 247, 249, 252, 255,
];

/// Per-channel gamma lookup tables.
///
/// Holds one 256-entry `u8 -> u8` mapping per colour channel, built once
/// before the first encode and read-only afterwards. Construction checks the
/// invariants the encoder relies on: each table must be monotonic
/// non-decreasing and must map 0 to 0.
#[derive(Clone)]
pub struct GammaLut {
    red: [u8; 256],
    green: [u8; 256],
    blue: [u8; 256],
}

const fn check_table(table: &[u8; 256]) {
    assert!(table[0] == 0, "gamma table must map 0 to 0");
    let mut i = 1;
    while i < 256 {
        assert!(
            table[i] >= table[i - 1],
            "gamma table must be monotonic non-decreasing"
        );
        i += 1;
    }
}

const fn identity_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = i as u8;
        i += 1;
    }
    table
}

impl GammaLut {
    /// Create a lookup with a separate curve per channel.
    ///
    /// Panics if any table is not monotonic non-decreasing or does not map
    /// 0 to 0.
    #[must_use]
    pub const fn new(red: [u8; 256], green: [u8; 256], blue: [u8; 256]) -> Self {
        check_table(&red);
        check_table(&green);
        check_table(&blue);
        Self { red, green, blue }
    }

    /// Create a lookup using the same curve for all three channels.
    #[must_use]
    pub const fn uniform(table: [u8; 256]) -> Self {
        Self::new(table, table, table)
    }

    /// Create a pass-through lookup (no correction).
    #[must_use]
    pub const fn identity() -> Self {
        Self::uniform(identity_table())
    }

    /// Correct a red sample.
    #[must_use]
    pub const fn red(&self, sample: u8) -> u8 {
        self.red[sample as usize]
    }

    /// Correct a green sample.
    #[must_use]
    pub const fn green(&self, sample: u8) -> u8 {
        self.green[sample as usize]
    }

    /// Correct a blue sample.
    #[must_use]
    pub const fn blue(&self, sample: u8) -> u8 {
        self.blue[sample as usize]
    }
}

impl Default for GammaLut {
    /// The stock [`GAMMA8`] curve on all three channels.
    fn default() -> Self {
        Self::uniform(GAMMA8)
    }
}
