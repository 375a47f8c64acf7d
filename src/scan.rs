//! Row addressing and per-plane dwell timing: the scan timing state machine.
//!
//! Two timers pace the panel. The shift clock free-runs at the pixel rate
//! and raises one streaming-engine request per cycle, so one byte of the
//! active transfer buffer reaches the data lines per clock. It also runs in
//! master mode, broadcasting an event on every reload. The row-latch and
//! dimming timer is a slave clocked off that event stream: it reloads once
//! per completed column burst and its two compare channels shape the latch
//! pulse and the output-enable window within each burst. Because the slave
//! only advances when the master completes a cycle, the two can never drift
//! apart.
//!
//! The slave's update event, once per burst, is the single tick of the
//! [`ScanState`] machine: advance the bit-plane, step the row address every
//! `BITS` bursts, and preload the output-enable compare value that gives
//! the new plane its `2^plane` dwell. The compare register is
//! double-buffered by the hardware, so a value loaded during burst `n`
//! takes effect atomically at burst `n + 1`, never mid-pulse.
//!
//! The machine has no terminal state; once the platform starts the timers
//! it ticks forever.

use embedded_hal::digital::{OutputPin, PinState};

/// Fixed per-target timer constants, in ticks of the common timer clock.
///
/// With a 64-column panel and `shift_period` 20 the dimming timer reloads
/// every 1280 ticks, which is its `MAX_PERIOD`.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Prescaler applied to both timers' input clock.
    pub prescale: u16,
    /// Timer ticks per shift-clock cycle (50% duty).
    pub shift_period: u16,
    /// Width of the fixed latch pulse at the start of each burst.
    pub latch_width: u16,
}

impl Timing {
    /// Ticks in one full column burst: the dimming timer's reload period.
    #[must_use]
    pub const fn burst_period(&self, cols: usize) -> u16 {
        self.shift_period * cols as u16
    }
}

/// Output-enable weighting for binary code modulation.
///
/// The output-enable channel is active from the compare value to the end of
/// the burst, so plane `p` is lit for `brightness * 2^p` ticks (clamped to
/// the burst period). `brightness` is the single global scale factor.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dimming {
    max_period: u16,
    brightness: u16,
}

impl Dimming {
    /// Create a weighting over a burst of `max_period` ticks.
    ///
    /// Panics if the plane-0 window alone would not fit in the burst.
    #[must_use]
    pub const fn new(max_period: u16, brightness: u16) -> Self {
        assert!(
            brightness <= max_period,
            "brightness must fit within the burst period"
        );
        Self {
            max_period,
            brightness,
        }
    }

    /// The compare value to preload for `plane`:
    /// `max_period - brightness * 2^plane`, saturating at 0.
    #[must_use]
    pub const fn compare(&self, plane: u8) -> u16 {
        let window = (self.brightness as u32) << plane;
        let max = self.max_period as u32;
        let window = if window > max { max } else { window };
        self.max_period - window as u16
    }

    /// How long `plane` is lit, in ticks.
    #[must_use]
    pub const fn on_window(&self, plane: u8) -> u16 {
        self.max_period - self.compare(plane)
    }
}

/// What one tick of the state machine asks of the hardware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickAction {
    /// Row address to drive onto the A–E lines, when a new row begins.
    pub select_row: Option<u8>,
    /// Bit-plane whose compare value must be preloaded for the next burst.
    pub plane: u8,
}

/// Current scan position: which row pair is lit and which bit-plane is on
/// the wire.
///
/// Mutated only from the dimming timer's update interrupt, one
/// [`tick`](Self::tick) per burst. No other component reads or writes it.
///
/// # Type Parameters
/// - `NROWS`: Number of scan rows (half the physical rows)
/// - `BITS`: Number of bits per colour channel
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanState<const NROWS: usize, const BITS: usize> {
    row: u8,
    plane: u8,
}

impl<const NROWS: usize, const BITS: usize> ScanState<NROWS, BITS> {
    /// Start at row 0, plane 0.
    #[must_use]
    pub const fn new() -> Self {
        assert!(NROWS >= 1 && NROWS <= 32);
        assert!(BITS >= 1 && BITS <= 8);

        Self { row: 0, plane: 0 }
    }

    /// The row pair currently addressed.
    #[must_use]
    pub const fn row(&self) -> u8 {
        self.row
    }

    /// The bit-plane currently on the wire.
    #[must_use]
    pub const fn plane(&self) -> u8 {
        self.plane
    }

    /// Advance one burst.
    ///
    /// At the start of a row (plane 0) the current row address is reported
    /// for the address lines and the row index advances, wrapping at
    /// `NROWS`. The plane index then advances, wrapping at `BITS`, and the
    /// returned action names the plane whose compare value must be
    /// preloaded.
    pub fn tick(&mut self) -> TickAction {
        let select_row = if self.plane == 0 {
            let row = self.row;
            self.row = (self.row + 1) % NROWS as u8;
            Some(row)
        } else {
            None
        };
        self.plane = (self.plane + 1) % BITS as u8;
        TickAction {
            select_row,
            plane: self.plane,
        }
    }
}

impl<const NROWS: usize, const BITS: usize> Default for ScanState<NROWS, BITS> {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives the panel's row-address lines.
///
/// Implemented for 4- and 5-tuples of `OutputPin` (the A–D or A–E lines,
/// least significant first), or by the platform over a whole-port write.
pub trait RowSelect {
    /// Error raised by the underlying pins.
    type Error;

    /// Drive the address lines with `row`.
    fn select(&mut self, row: u8) -> Result<(), Self::Error>;
}

impl<E, A, B, C, D> RowSelect for (A, B, C, D)
where
    A: OutputPin<Error = E>,
    B: OutputPin<Error = E>,
    C: OutputPin<Error = E>,
    D: OutputPin<Error = E>,
{
    type Error = E;

    fn select(&mut self, row: u8) -> Result<(), E> {
        self.0.set_state(PinState::from(row & 0b0001 != 0))?;
        self.1.set_state(PinState::from(row & 0b0010 != 0))?;
        self.2.set_state(PinState::from(row & 0b0100 != 0))?;
        self.3.set_state(PinState::from(row & 0b1000 != 0))?;
        Ok(())
    }
}

impl<E, A, B, C, D, F> RowSelect for (A, B, C, D, F)
where
    A: OutputPin<Error = E>,
    B: OutputPin<Error = E>,
    C: OutputPin<Error = E>,
    D: OutputPin<Error = E>,
    F: OutputPin<Error = E>,
{
    type Error = E;

    fn select(&mut self, row: u8) -> Result<(), E> {
        self.0.set_state(PinState::from(row & 0b0_0001 != 0))?;
        self.1.set_state(PinState::from(row & 0b0_0010 != 0))?;
        self.2.set_state(PinState::from(row & 0b0_0100 != 0))?;
        self.3.set_state(PinState::from(row & 0b0_1000 != 0))?;
        self.4.set_state(PinState::from(row & 0b1_0000 != 0))?;
        Ok(())
    }
}

/// Loads the output-enable channel's preloaded compare register.
///
/// The value written during one burst must take effect at the next reload,
/// never mid-pulse; compare preload hardware gives exactly that.
pub trait DimmingTimer {
    /// Preload the compare value for the next burst.
    fn load_compare(&mut self, compare: u16);
}

/// Interrupt-context owner of the scan state and its two hardware seams.
///
/// Construct it at bring-up, call [`preload`](Self::preload) once before
/// the timers start, then hand it to the dimming timer's update interrupt
/// and call [`on_scan_tick`](Self::on_scan_tick) on every event.
pub struct ScanEngine<RS, DT, const NROWS: usize, const BITS: usize> {
    state: ScanState<NROWS, BITS>,
    dimming: Dimming,
    rows: RS,
    oe: DT,
}

impl<RS, DT, const NROWS: usize, const BITS: usize> ScanEngine<RS, DT, NROWS, BITS>
where
    RS: RowSelect,
    DT: DimmingTimer,
{
    /// Bind the state machine to the address lines and dimming channel.
    pub const fn new(rows: RS, oe: DT, dimming: Dimming) -> Self {
        Self {
            state: ScanState::new(),
            dimming,
            rows,
            oe,
        }
    }

    /// Preload the plane-0 compare value before the first burst.
    pub fn preload(&mut self) {
        self.oe.load_compare(self.dimming.compare(0));
    }

    /// Handle one dimming-timer update event.
    ///
    /// Short, non-blocking, run-to-completion; safe to call directly from
    /// the interrupt handler. Pin errors propagate to the caller.
    ///
    /// # Errors
    /// Forwards any error from the row-address pins.
    pub fn on_scan_tick(&mut self) -> Result<(), RS::Error> {
        let action = self.state.tick();
        if let Some(row) = action.select_row {
            self.rows.select(row)?;
        }
        self.oe.load_compare(self.dimming.compare(action.plane));
        Ok(())
    }

    /// The current scan position.
    pub const fn state(&self) -> &ScanState<NROWS, BITS> {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use core::convert::Infallible;
    use std::vec::Vec;

    use super::*;

    const TEST_NROWS: usize = 16;
    const TEST_BITS: usize = 8;

    type TestState = ScanState<TEST_NROWS, TEST_BITS>;

    #[test]
    fn test_burst_period() {
        let timing = Timing {
            prescale: 0,
            shift_period: 20,
            latch_width: 12,
        };
        assert_eq!(timing.burst_period(64), 1280);
        assert_eq!(timing.burst_period(32), 640);
    }

    #[test]
    fn test_compare_formula() {
        let dimming = Dimming::new(1280, 10);
        for plane in 0..8u8 {
            assert_eq!(dimming.compare(plane), 1280 - (10 << plane));
        }
        // plane 7: 10 * 128 = 1280, the full burst
        assert_eq!(dimming.compare(7), 0);
    }

    #[test]
    fn test_on_window_strictly_increases() {
        let dimming = Dimming::new(1280, 10);
        for plane in 1..8u8 {
            assert!(dimming.on_window(plane) > dimming.on_window(plane - 1));
        }
        // each plane doubles the previous dwell
        for plane in 1..8u8 {
            assert_eq!(dimming.on_window(plane), 2 * dimming.on_window(plane - 1));
        }
    }

    #[test]
    fn test_window_clamps_to_burst() {
        let dimming = Dimming::new(1280, 100);
        // 100 << 7 = 12800 would overrun the burst; the window saturates
        assert_eq!(dimming.compare(7), 0);
        assert_eq!(dimming.on_window(7), 1280);
        assert_eq!(dimming.compare(4), 1280 - 1600_u32.min(1280) as u16);
    }

    #[test]
    #[should_panic(expected = "fit within the burst period")]
    fn test_oversized_brightness_is_rejected() {
        let _ = Dimming::new(1280, 1281);
    }

    #[test]
    fn test_plane_cycles_every_tick() {
        let mut state = TestState::new();
        assert_eq!(state.plane(), 0);

        let mut planes = Vec::new();
        for _ in 0..(3 * TEST_BITS) {
            state.tick();
            planes.push(state.plane());
        }
        let expected: Vec<u8> = (0..3 * TEST_BITS as u32)
            .map(|i| ((i + 1) % TEST_BITS as u32) as u8)
            .collect();
        assert_eq!(planes, expected);
    }

    #[test]
    fn test_row_advances_once_per_plane_wrap() {
        let mut state = TestState::new();
        let mut selects = Vec::new();
        for i in 0..(TEST_NROWS * TEST_BITS) {
            let action = state.tick();
            if let Some(row) = action.select_row {
                // a row is only selected on the first burst of a row
                assert_eq!(i % TEST_BITS, 0);
                selects.push(row);
            }
        }
        let expected: Vec<u8> = (0..TEST_NROWS as u8).collect();
        assert_eq!(selects, expected);
    }

    #[test]
    fn test_row_wraps_around() {
        let mut state = TestState::new();
        for _ in 0..(TEST_NROWS * TEST_BITS) {
            state.tick();
        }
        // one full scan later the machine is back at the top
        assert_eq!(state.row(), 0);
        assert_eq!(state.plane(), 0);
        assert_eq!(state.tick().select_row, Some(0));
    }

    #[test]
    fn test_single_bit_depth() {
        let mut state = ScanState::<4, 1>::new();
        for row in 0..8u8 {
            let action = state.tick();
            assert_eq!(action.select_row, Some(row % 4));
            assert_eq!(action.plane, 0);
        }
    }

    #[derive(Default)]
    struct MockPin {
        high: bool,
    }

    impl embedded_hal::digital::ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            Ok(())
        }
    }

    #[test]
    fn test_tuple_row_select() {
        let mut pins = (
            MockPin::default(),
            MockPin::default(),
            MockPin::default(),
            MockPin::default(),
        );
        pins.select(0b1010).unwrap();
        assert!(!pins.0.high);
        assert!(pins.1.high);
        assert!(!pins.2.high);
        assert!(pins.3.high);

        pins.select(0b0101).unwrap();
        assert!(pins.0.high);
        assert!(!pins.1.high);
        assert!(pins.2.high);
        assert!(!pins.3.high);
    }

    #[test]
    fn test_five_pin_row_select() {
        let mut pins = (
            MockPin::default(),
            MockPin::default(),
            MockPin::default(),
            MockPin::default(),
            MockPin::default(),
        );
        pins.select(0b1_0000).unwrap();
        assert!(!pins.0.high);
        assert!(pins.4.high);
    }

    struct RecordingRows {
        selected: Vec<u8>,
    }

    impl RowSelect for RecordingRows {
        type Error = Infallible;

        fn select(&mut self, row: u8) -> Result<(), Infallible> {
            self.selected.push(row);
            Ok(())
        }
    }

    struct RecordingTimer {
        loads: Vec<u16>,
    }

    impl DimmingTimer for RecordingTimer {
        fn load_compare(&mut self, compare: u16) {
            self.loads.push(compare);
        }
    }

    #[test]
    fn test_engine_full_scan() {
        let dimming = Dimming::new(1280, 10);
        let mut engine: ScanEngine<_, _, TEST_NROWS, TEST_BITS> = ScanEngine::new(
            RecordingRows {
                selected: Vec::new(),
            },
            RecordingTimer { loads: Vec::new() },
            dimming,
        );

        engine.preload();
        for _ in 0..(TEST_NROWS * TEST_BITS) {
            engine.on_scan_tick().unwrap();
        }

        // every row selected exactly once, in order
        let expected_rows: Vec<u8> = (0..TEST_NROWS as u8).collect();
        assert_eq!(engine.rows.selected, expected_rows);

        // preload gives plane 0, then each tick loads the next plane's value
        assert_eq!(engine.oe.loads[0], dimming.compare(0));
        for (i, &load) in engine.oe.loads[1..].iter().enumerate() {
            let plane = ((i + 1) % TEST_BITS) as u8;
            assert_eq!(load, dimming.compare(plane));
        }
        assert_eq!(engine.oe.loads.len(), 1 + TEST_NROWS * TEST_BITS);
    }
}
