//! The foreground render loop: repaint, encode, hand off, repeat.
//!
//! One iteration per animation frame:
//!
//! 1. Wait until the previously committed buffer has been fully consumed
//!    (the busy flag is the only backpressure tying the producer to the
//!    hardware's consumption rate).
//! 2. Encode the current frame into the editable transfer buffer.
//! 3. Swap the editable designation to the other physical buffer.
//! 4. Commit — the filled buffer is now in flight.
//! 5. Repaint the frame buffer for the next cycle.
//!
//! If encoding plus repainting ever takes longer than one full scan, the
//! wait in step 1 simply stretches: frames arrive late, never torn. There
//! is no scheduler here; the wait is a spin and the loop never exits.

use crate::bitplane::TransferBuffer;
use crate::framebuffer::{FrameBuffer, Renderer};
use crate::gamma::GammaLut;
use crate::swap::{BufferPair, FrameSync};

/// Composes the frame buffer, encoder, and double-buffer coordinator
/// around the shared busy indicator.
///
/// # Type Parameters
/// - `ROWS`: Total number of physical rows in the panel
/// - `COLS`: Number of columns in the panel
/// - `NROWS`: Number of scan rows (`ROWS / 2`)
/// - `BITS`: Number of bits per colour channel
pub struct RenderLoop<'a, const ROWS: usize, const COLS: usize, const NROWS: usize, const BITS: usize>
{
    frame: FrameBuffer<ROWS, COLS>,
    buffers: BufferPair<TransferBuffer<COLS, NROWS, BITS>>,
    lut: &'a GammaLut,
    sync: &'a FrameSync,
}

impl<'a, const ROWS: usize, const COLS: usize, const NROWS: usize, const BITS: usize>
    RenderLoop<'a, ROWS, COLS, NROWS, BITS>
{
    /// Create a loop with a black frame and two all-dark transfer buffers.
    #[must_use]
    pub const fn new(lut: &'a GammaLut, sync: &'a FrameSync) -> Self {
        Self {
            frame: FrameBuffer::new(),
            buffers: BufferPair::new(TransferBuffer::new(), TransferBuffer::new()),
            lut,
            sync,
        }
    }

    /// Pre-fill both transfer buffers before streaming begins.
    ///
    /// Seeds the frame buffer with a first rendered frame, encodes it into
    /// buffer `A`, repaints, encodes into `B`, and repaints once more so
    /// the first [`step`](Self::step) has fresh content to encode. Must
    /// run before platform bring-up hands the buffers to the streaming
    /// engine; bring-up calls [`FrameSync::commit`] when it starts the
    /// stream on `A`.
    pub fn prime<R: Renderer<ROWS, COLS>>(&mut self, renderer: &mut R) {
        renderer.render(&mut self.frame);
        self.buffers.editable_mut().encode(&self.frame, self.lut);
        self.buffers.swap();
        renderer.render(&mut self.frame);
        self.buffers.editable_mut().encode(&self.frame, self.lut);
        self.buffers.swap();
        renderer.render(&mut self.frame);
    }

    /// Produce one animation frame.
    pub fn step<R: Renderer<ROWS, COLS>>(&mut self, renderer: &mut R) {
        self.sync.wait_idle();
        self.buffers.editable_mut().encode(&self.frame, self.lut);
        self.buffers.swap();
        self.sync.commit();
        renderer.render(&mut self.frame);
    }

    /// Run forever.
    pub fn run<R: Renderer<ROWS, COLS>>(&mut self, renderer: &mut R) -> ! {
        loop {
            self.step(renderer);
        }
    }

    /// The two buffer regions for the streaming engine's ping-pong
    /// registers, in `[A, B]` order.
    ///
    /// # Safety
    /// See [`BufferPair::dma_regions`]. Query only after this loop has
    /// reached its final memory location; moving it afterwards invalidates
    /// the pointers.
    #[must_use]
    pub unsafe fn dma_regions(&self) -> [(*const u8, usize); 2] {
        self.buffers.dma_regions()
    }

    /// The double-buffer coordinator.
    #[must_use]
    pub const fn buffers(&self) -> &BufferPair<TransferBuffer<COLS, NROWS, BITS>> {
        &self.buffers
    }

    /// The frame most recently painted by the renderer.
    #[must_use]
    pub const fn frame(&self) -> &FrameBuffer<ROWS, COLS> {
        &self.frame
    }
}
