//! Frame counted delays.

/// Number of rendered frames to wait before repainting a surface after an overlay mutation.
pub const INVALIDATION_FRAME_DELAY: u32 = 4;

/// Holds actions until a given number of frames has been rendered since each was scheduled.
///
/// Some GL backed surfaces report "loaded" before the GPU actually flushed the pending draw
/// calls. Counting rendered frames guarantees at least that many frame budgets passed between
/// the mutation and the action. The delay does not own a clock: the platform reports every
/// rendered frame with [`FrameDelay::on_frame_rendered`] and runs the actions it returns.
///
/// ```
/// use navbridge::frame_delay::FrameDelay;
///
/// let mut delay = FrameDelay::new(2);
/// delay.schedule("invalidate");
///
/// assert!(delay.on_frame_rendered().is_empty());
/// assert_eq!(delay.on_frame_rendered(), vec!["invalidate"]);
/// assert!(delay.is_idle());
/// ```
#[derive(Debug)]
pub struct FrameDelay<A> {
    delay_in_frames: u32,
    pending: Vec<(u32, A)>,
}

impl<A> FrameDelay<A> {
    /// Creates a delay of `delay_in_frames` frames. A zero delay is treated as one frame.
    pub fn new(delay_in_frames: u32) -> Self {
        Self {
            delay_in_frames: delay_in_frames.max(1),
            pending: Vec::new(),
        }
    }

    /// Schedules an action to become due after the configured number of frames.
    pub fn schedule(&mut self, action: A) {
        self.pending.push((self.delay_in_frames, action));
    }

    /// Counts one rendered frame and returns the actions that became due, in scheduling
    /// order.
    pub fn on_frame_rendered(&mut self) -> Vec<A> {
        let mut due = Vec::new();
        let mut waiting = Vec::with_capacity(self.pending.len());
        for (remaining, action) in self.pending.drain(..) {
            if remaining <= 1 {
                due.push(action);
            } else {
                waiting.push((remaining - 1, action));
            }
        }

        self.pending = waiting;
        due
    }

    /// Returns true if nothing is scheduled.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every scheduled action.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl<A> Default for FrameDelay<A> {
    fn default() -> Self {
        Self::new(INVALIDATION_FRAME_DELAY)
    }
}
