//! Bit-plane encoder and the packed transfer buffer it fills.
//!
//! The panel's six data pins are strictly on/off, so a frame of RGB888
//! pixels has to be re-sliced before it can be streamed: for every scan row
//! and every bit-plane `p`, one byte per column carries bit `p` of the six
//! gamma-corrected samples that light that column's upper-half and
//! lower-half pixels. The streaming engine then plays the buffer back
//! linearly, one byte per shift clock, while the scan timer holds the
//! output-enable window open for `2^p` weight on each plane.
//!
//! # Buffer layout
//! Bytes are ordered (scan row, bit-plane, column), outer to inner, so a
//! whole column burst for one plane is contiguous and the dimming timer
//! advances exactly once per `COLS` bytes. The byte at logical position
//! `(row, plane, col)` lives at index `(row * BITS + plane) * COLS + col`.
//!
//! # Wiring contract
//! Within each byte, bit 5..0 = upper R, G, B then lower R, G, B. This must
//! match the order the panel's data lines are wired to the streaming
//! engine's port; it is a compile-time contract, not negotiated at runtime.
//! [`Entry`] gives each flag a named accessor so the contract is testable
//! independently of the encoder loop. Bits 6 and 7 are never set.

use bitfield::bitfield;
use embedded_dma::ReadBuffer;
use embedded_graphics::pixelcolor::RgbColor;

use crate::framebuffer::FrameBuffer;
use crate::gamma::GammaLut;

#[allow(missing_docs)] // the field accessors are covered by the layout doc
bitfield! {
    /// One transfer-buffer byte: the on/off state of the six data lines for
    /// a single shift clock.
    ///
    /// `color0` is the upper-half pixel (row `r`), `color1` the lower-half
    /// pixel (row `r + NROWS`) sharing the same address lines.
    ///
    /// The bit layout is as follows:
    /// - Bit 5: Red channel for color0
    /// - Bit 4: Green channel for color0
    /// - Bit 3: Blue channel for color0
    /// - Bit 2: Red channel for color1
    /// - Bit 1: Green channel for color1
    /// - Bit 0: Blue channel for color1
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct Entry(u8);
    impl Debug;
    pub red1, set_red1: 5;
    pub grn1, set_grn1: 4;
    pub blu1, set_blu1: 3;
    pub red2, set_red2: 2;
    pub grn2, set_grn2: 1;
    pub blu2, set_blu2: 0;
}

#[cfg(feature = "defmt")]
impl defmt::Format for Entry {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Entry({=u8:#04x})", self.0);
    }
}

impl Entry {
    /// An all-dark entry.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// The raw byte as it goes out on the data lines.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    fn set_color0(&mut self, r: bool, g: bool, b: bool) {
        self.set_red1(r);
        self.set_grn1(g);
        self.set_blu1(b);
    }

    fn set_color1(&mut self, r: bool, g: bool, b: bool) {
        self.set_red2(r);
        self.set_grn2(g);
        self.set_blu2(b);
    }
}

/// All bit-planes for one scan row: `BITS` column bursts of `COLS` bytes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(C)]
struct ScanRow<const COLS: usize, const BITS: usize> {
    planes: [[Entry; COLS]; BITS],
}

impl<const COLS: usize, const BITS: usize> ScanRow<COLS, BITS> {
    pub const fn new() -> Self {
        Self {
            planes: [[Entry::new(); COLS]; BITS],
        }
    }
}

impl<const COLS: usize, const BITS: usize> Default for ScanRow<COLS, BITS> {
    fn default() -> Self {
        Self::new()
    }
}

/// Packed, bit-plane-ordered buffer streamed to the panel by DMA.
///
/// The byte order is exactly the wire order: scan row outermost, then
/// bit-plane, then column. Two of these make up a
/// [`BufferPair`](crate::swap::BufferPair); the streaming engine ping-pongs
/// between them without software intervention once started.
///
/// # Type Parameters
/// - `COLS`: Number of columns in the panel
/// - `NROWS`: Number of scan rows (half the physical rows)
/// - `BITS`: Number of bits per colour channel (1-8)
#[derive(Clone, Copy)]
#[repr(C)]
#[repr(align(4))]
pub struct TransferBuffer<const COLS: usize, const NROWS: usize, const BITS: usize> {
    rows: [ScanRow<COLS, BITS>; NROWS],
}

impl<const COLS: usize, const NROWS: usize, const BITS: usize> Default
    for TransferBuffer<COLS, NROWS, BITS>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const COLS: usize, const NROWS: usize, const BITS: usize> TransferBuffer<COLS, NROWS, BITS> {
    /// Create a new all-dark transfer buffer.
    #[must_use]
    pub const fn new() -> Self {
        assert!(BITS >= 1 && BITS <= 8);

        Self {
            rows: [ScanRow::new(); NROWS],
        }
    }

    /// Byte length of the buffer, which is also the number of shift clocks
    /// in one full scan of the panel.
    #[must_use]
    pub const fn byte_len() -> usize {
        COLS * NROWS * BITS
    }

    /// Reset every byte to all-dark.
    pub fn clear(&mut self) {
        self.rows = [ScanRow::new(); NROWS];
    }

    /// Read the entry at logical position (scan row, bit-plane, column).
    #[must_use]
    pub const fn entry(&self, row: usize, plane: usize, col: usize) -> Entry {
        self.rows[row].planes[plane][col]
    }

    /// The buffer's bytes in wire order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        let ptr = &self.rows as *const _ as *const u8;
        let len = core::mem::size_of_val(&self.rows);
        unsafe { core::slice::from_raw_parts(ptr, len) }
    }

    /// Populate the whole buffer from a frame.
    ///
    /// For every scan row, bit-plane and column, the upper-half pixel at
    /// row `r` and the lower-half pixel at row `r + NROWS` are gamma
    /// corrected and bit `plane` of each of the six samples becomes one
    /// flag of the output byte. Pure with respect to `frame` and `lut`;
    /// encoding the same frame twice yields byte-identical buffers.
    ///
    /// Panics unless `ROWS == 2 * NROWS`; each byte encodes two physical
    /// rows, so the panel must have exactly twice as many rows as the scan
    /// rate addresses.
    pub fn encode<const ROWS: usize>(&mut self, frame: &FrameBuffer<ROWS, COLS>, lut: &GammaLut) {
        assert!(
            ROWS == 2 * NROWS,
            "panel rows must be twice the scan rate for half-and-half addressing"
        );
        for (r, scan_row) in self.rows.iter_mut().enumerate() {
            for (p, plane) in scan_row.planes.iter_mut().enumerate() {
                let mask = 1u8 << p;
                for (c, entry) in plane.iter_mut().enumerate() {
                    let upper = frame.pixel(c, r);
                    let lower = frame.pixel(c, r + NROWS);
                    let mut e = Entry::new();
                    e.set_color0(
                        lut.red(upper.r()) & mask != 0,
                        lut.green(upper.g()) & mask != 0,
                        lut.blue(upper.b()) & mask != 0,
                    );
                    e.set_color1(
                        lut.red(lower.r()) & mask != 0,
                        lut.green(lower.g()) & mask != 0,
                        lut.blue(lower.b()) & mask != 0,
                    );
                    *entry = e;
                }
            }
        }
    }
}

impl<const COLS: usize, const NROWS: usize, const BITS: usize> core::fmt::Debug
    for TransferBuffer<COLS, NROWS, BITS>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TransferBuffer")
            .field("size", &core::mem::size_of_val(&self.rows))
            .field("scan_rows", &NROWS)
            .field("planes", &BITS)
            .field("cols", &COLS)
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl<const COLS: usize, const NROWS: usize, const BITS: usize> defmt::Format
    for TransferBuffer<COLS, NROWS, BITS>
{
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "TransferBuffer<{}, {}, {}>", COLS, NROWS, BITS);
        defmt::write!(f, " size: {}", core::mem::size_of_val(&self.rows));
    }
}

unsafe impl<const COLS: usize, const NROWS: usize, const BITS: usize> ReadBuffer
    for TransferBuffer<COLS, NROWS, BITS>
{
    type Word = u8;

    unsafe fn read_buffer(&self) -> (*const u8, usize) {
        let ptr = &self.rows as *const _ as *const u8;
        let len = core::mem::size_of_val(&self.rows);
        (ptr, len)
    }
}

unsafe impl<const COLS: usize, const NROWS: usize, const BITS: usize> ReadBuffer
    for &mut TransferBuffer<COLS, NROWS, BITS>
{
    type Word = u8;

    unsafe fn read_buffer(&self) -> (*const u8, usize) {
        let ptr = &self.rows as *const _ as *const u8;
        let len = core::mem::size_of_val(&self.rows);
        (ptr, len)
    }
}
