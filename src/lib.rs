//! Binary code modulation scan engine for HUB75 LED matrix displays.
//!
//! ## How HUB75 LED Displays Work
//!
//! HUB75 RGB LED matrix panels are scanned, time-multiplexed displays that behave like a long
//! daisy-chained shift register rather than a random-access framebuffer.
//!
//! ### Signal names
//! - **R1 G1 B1 / R2 G2 B2** – Serial colour data for the upper and lower halves of the active scan line
//! - **CLK** – Shift-register clock; every rising edge pushes the six colour bits one pixel to the right
//! - **LAT / STB** – Latch; copies the shift-register contents to the LED drivers for the row currently selected by the address lines
//! - **OE** – Output-Enable (active LOW): LEDs are lit while OE is LOW and blanked when it is HIGH
//! - **A B C D (E)** – Row-address select lines (choose which pair of rows is lit)
//!
//! A panel with `ROWS` physical rows is addressed as `ROWS / 2` scan rows: each
//! scan row lights one row in the upper half and its counterpart `ROWS / 2`
//! further down, so the six data pins carry two pixels per clock.
//!
//! ### Brightness and colour depth (Binary Code Modulation)
//! The panel's data pins are strictly on/off, so intermediate brightness is
//! synthesized with **Binary Code Modulation (BCM)**, also known as
//! *Bit-Angle Modulation*: each bit-plane of the gamma-corrected colour data is
//! shifted out separately, and the output-enable window for plane `p` lasts
//! proportionally to its weight `2^p`. Summed over all planes the eye
//! integrates `2^BITS` intensity levels per channel. See
//! [Batsocks – LED dimming using Binary Code Modulation](https://www.batsocks.co.uk/readme/art_bcm_1.htm)
//! for a deeper explanation.
//!
//! ## Engine architecture
//!
//! The engine turns a [`FrameBuffer`](framebuffer::FrameBuffer) of RGB888
//! pixels into an uninterrupted, hardware-paced stream of bit-plane bytes:
//!
//! 1. The [`bitplane`] encoder transforms a frame into a
//!    [`TransferBuffer`](bitplane::TransferBuffer): one byte per
//!    (scan row, bit-plane, column), six colour flags per byte, gamma
//!    corrected through a [`GammaLut`](gamma::GammaLut).
//! 2. The [`swap`] coordinator owns two transfer buffers. A DMA-class
//!    streaming engine ping-pongs between them, one byte per shift clock,
//!    while the render loop refills whichever buffer is not on the wire.
//!    A single atomic busy flag is the only shared state.
//! 3. The [`scan`] state machine runs from the dimming timer's update
//!    interrupt: once per column burst it advances the bit-plane index,
//!    steps the row address every `BITS` bursts, and preloads the
//!    output-enable compare value that realizes the `2^plane` weighting.
//!
//! The hardware itself stays behind four narrow seams: `ReadBuffer` for the
//! streaming engine, [`RowSelect`](scan::RowSelect) for the address lines,
//! [`DimmingTimer`](scan::DimmingTimer) for the output-enable compare
//! register, and [`CompletionSource`](swap::CompletionSource) for the
//! transfer-complete flag. Platform bring-up (clocks, pin mux, timer and DMA
//! register programming) is the caller's job and must finish before the
//! first buffer is handed to the wire.
//!
//! ## Available Feature Flags
//!
//! ### `defmt` Feature
//! Implements `defmt::Format` for the engine types so they can be emitted
//! with the `defmt` logging framework. No functional changes; purely adds
//! trait impls.
#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use embedded_graphics::pixelcolor::Rgb888;

pub mod bitplane;
pub mod framebuffer;
pub mod gamma;
pub mod plasma;
pub mod render;
pub mod scan;
pub mod swap;
pub mod time;

/// Color type used in the frame buffer
pub type Color = Rgb888;

/// Computes the scan rate (number of addressable scan rows) from the panel's
/// physical row count.
///
/// Each scan row lights two physical rows at once (upper and lower half), so
/// a 32-row panel is a 1/16-scan panel.
///
/// # Arguments
///
/// * `rows` - Total number of physical rows in the display
///
/// # Returns
///
/// Number of scan rows addressed by the A–E lines
#[must_use]
pub const fn compute_scan_rate(rows: usize) -> usize {
    rows / 2
}

/// Computes the byte length of one transfer buffer.
///
/// One byte is shifted out per column, per bit-plane, per scan row, so this
/// is also the number of shift-clock cycles in one full scan of the panel.
///
/// # Arguments
///
/// * `cols` - Number of columns in the display
/// * `scan_rate` - Number of scan rows (see [`compute_scan_rate`])
/// * `bits` - Number of bits per colour channel
///
/// # Returns
///
/// Number of bytes in one fully populated transfer buffer
#[must_use]
pub const fn compute_transfer_len(cols: usize, scan_rate: usize, bits: usize) -> usize {
    cols * scan_rate * bits
}
