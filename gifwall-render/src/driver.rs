//! Background animation driver.
//!
//! Owns a decode session and a worker thread that advances the
//! animation: decode the upcoming frame, sleep out the remainder of the
//! current frame's delay, swap the decoded frame into the shared slot,
//! and signal observers. Decode cost is deducted from the frame delay so
//! slow decodes do not stretch the animation.
//!
//! `stop` is deterministic: the worker is joined before it returns, so
//! no frame swap fires afterwards.

use gifwall_codec::GifDecoder;
use gifwall_core::{PixelBuffer, SharedPools, StateChannel, Status};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, trace};

struct DriverShared {
    decoder: Mutex<Option<GifDecoder>>,
    /// Single-producer/single-consumer frame handoff.
    slot: Mutex<Option<PixelBuffer>>,
    /// Frame sequence numbers; observers wake on every swap.
    frames: StateChannel<u64>,
    frame_seq: AtomicU64,
    running: AtomicBool,
    pools: SharedPools,
    /// Interruptible sleep between frames.
    sleeper: Mutex<()>,
    wake: Condvar,
}

impl DriverShared {
    /// Sleep up to `duration`, waking early when `running` clears.
    fn sleep_interruptible(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        let mut guard = self.sleeper.lock();
        while self.running.load(Ordering::Acquire) {
            if self.wake.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
    }

    fn swap_frame(&self, frame: PixelBuffer) {
        let old = self.slot.lock().replace(frame);
        if let Some(old) = old {
            self.pools.release_frame(old);
        }
        let seq = self.frame_seq.fetch_add(1, Ordering::AcqRel) + 1;
        self.frames.publish(seq);
    }
}

/// Drives an animated GIF decode session from a worker thread.
pub struct AnimationDriver {
    shared: Arc<DriverShared>,
    worker: Option<JoinHandle<()>>,
    recycled: bool,
    width: u32,
    height: u32,
}

impl AnimationDriver {
    /// Take ownership of a decode session and prime the frame slot with
    /// the first frame.
    pub fn new(mut decoder: GifDecoder) -> Self {
        let pools = decoder.pools().clone();
        let width = decoder.width();
        let height = decoder.height();

        decoder.reset_frame_index();
        decoder.advance();
        let first = decoder.next_frame();

        let frames = StateChannel::new();
        let frame_seq = AtomicU64::new(0);
        if first.is_some() {
            frame_seq.store(1, Ordering::Release);
            frames.publish(1);
        }

        Self {
            shared: Arc::new(DriverShared {
                decoder: Mutex::new(Some(decoder)),
                slot: Mutex::new(first),
                frames,
                frame_seq,
                running: AtomicBool::new(false),
                pools,
                sleeper: Mutex::new(()),
                wake: Condvar::new(),
            }),
            worker: None,
            recycled: false,
            width,
            height,
        }
    }

    /// Content width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Content height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channel of frame sequence numbers, bumped on every swap.
    pub fn frames(&self) -> &StateChannel<u64> {
        &self.shared.frames
    }

    /// Run `f` against the current display frame while it is locked.
    pub fn with_frame<R>(&self, f: impl FnOnce(Option<&PixelBuffer>) -> R) -> R {
        let slot = self.shared.slot.lock();
        f(slot.as_ref())
    }

    /// Number of frames in the animation.
    pub fn frame_count(&self) -> usize {
        self.shared
            .decoder
            .lock()
            .as_ref()
            .map_or(0, GifDecoder::frame_count)
    }

    /// Decode status of the underlying session.
    pub fn status(&self) -> Status {
        self.shared
            .decoder
            .lock()
            .as_ref()
            .map_or(Status::Ok, GifDecoder::status)
    }

    /// Total plays declared by the stream; `None` means forever.
    pub fn total_iteration_count(&self) -> Option<u32> {
        self.shared
            .decoder
            .lock()
            .as_ref()
            .and_then(GifDecoder::total_iteration_count)
    }

    /// True while the worker thread is live.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Start the worker thread. No-op when already running, recycled, or
    /// the animation has fewer than two frames.
    pub fn start(&mut self) {
        if self.recycled || self.is_running() {
            return;
        }
        if self.frame_count() < 2 {
            trace!("static image, nothing to animate");
            return;
        }

        self.shared.running.store(true, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        self.worker = Some(thread::spawn(move || worker_loop(&shared)));
        debug!("animation worker started");
    }

    /// Stop the worker. Any scheduled frame swap is cancelled before
    /// this returns: the thread is joined, not just signalled.
    pub fn stop(&mut self) {
        {
            // Holding the sleeper lock orders the store against the
            // worker's running check, so the notify cannot land between
            // that check and its wait.
            let _guard = self.shared.sleeper.lock();
            self.shared.running.store(false, Ordering::Release);
            self.shared.wake.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("animation worker panicked");
            }
            debug!("animation worker stopped");
        }
    }

    /// Stop and release every buffer this driver holds. Terminal.
    pub fn recycle(&mut self) {
        if self.recycled {
            return;
        }
        self.stop();
        self.recycled = true;
        if let Some(frame) = self.shared.slot.lock().take() {
            self.shared.pools.release_frame(frame);
        }
        if let Some(mut decoder) = self.shared.decoder.lock().take() {
            decoder.clear();
        }
        self.shared.pools.flush();
    }
}

impl Drop for AnimationDriver {
    fn drop(&mut self) {
        self.recycle();
    }
}

fn worker_loop(shared: &DriverShared) {
    while shared.running.load(Ordering::Acquire) {
        let (delay_ms, next) = {
            let mut guard = shared.decoder.lock();
            let Some(decoder) = guard.as_mut() else {
                break;
            };
            let delay_ms = decoder.next_delay();
            let started = Instant::now();
            decoder.advance();
            let next = decoder.next_frame();
            let decode_cost = started.elapsed();

            if next.is_none() {
                debug!(status = ?decoder.status(), "decode produced no frame");
            }

            let delay = Duration::from_millis(u64::from(delay_ms));
            // Deduct the decode cost, clamped to the frame delay.
            (delay.saturating_sub(decode_cost).min(delay), next)
        };

        let Some(next) = next else {
            shared.running.store(false, Ordering::Release);
            break;
        };

        shared.sleep_interruptible(delay_ms);

        if !shared.running.load(Ordering::Acquire) {
            // Stopped mid-sleep: the decoded frame must not surface.
            shared.pools.release_frame(next);
            break;
        }
        shared.swap_frame(next);
    }
}
