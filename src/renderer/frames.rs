//! Frame presentation scheduling
//!
//! A fixed ring of frame slots paces CPU recording against an asynchronous
//! GPU. Each cycle walks the same phases:
//!
//! ```text
//! WaitSlot -> AcquireImage -> Record -> Submit -> Present
//!                  |                                 |
//!                  +----------> Rebuild <------------+
//! ```
//!
//! The slot index advances once per cycle whether or not a frame was shown.
//! A slot's recorder is only reachable through the guard returned by waiting
//! on that slot's completion fence, so a recorder can never be rewritten
//! while the GPU may still be reading it.

use std::time::Duration;

use thiserror::Error;

use super::commands::DrawSequence;

/// Presentation surface dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A minimised window has no drawable area
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend initialisation failed: {0}")]
    Init(String),
    #[error("device fault: {0}")]
    Device(String),
    #[error("surface fault: {0}")]
    Surface(String),
    #[error("out of GPU memory")]
    OutOfMemory,
    #[error("GPU did not signal completion within {0:?}")]
    Timeout(Duration),
    #[error("presentation surface used after release")]
    SurfaceReleased,
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("frame slot pool needs at least one slot")]
    InvalidSlotCount,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result of asking the surface for its next image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire<I> {
    Ready(I),
    /// Surface no longer matches the window and must be rebuilt
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    Presented,
    Stale,
}

/// Signals raised when a submission finishes executing
pub struct SubmitSignals<'a, F, S> {
    /// The slot's completion fence
    pub completion: &'a F,
    /// Gates presentation of the image
    pub render_complete: &'a S,
}

/// Execution queue plus presentation surface
///
/// Fences are CPU-waitable completion signals; semaphores order GPU work
/// (acquire before execute, execute before present).
pub trait FrameBackend {
    type Image;
    type Fence;
    type Semaphore;
    type Recorder;

    fn create_fence(&mut self, signaled: bool) -> Result<Self::Fence, BackendError>;
    fn create_semaphore(&mut self) -> Result<Self::Semaphore, BackendError>;
    fn create_recorder(&mut self) -> Result<Self::Recorder, BackendError>;

    /// Block until `fence` is signaled
    fn wait_fence(&mut self, fence: &Self::Fence) -> Result<(), BackendError>;
    fn reset_fence(&mut self, fence: &Self::Fence) -> Result<(), BackendError>;

    /// Next presentable image; signals `image_acquired` once it is usable
    fn acquire_next_image(
        &mut self,
        image_acquired: &Self::Semaphore,
    ) -> Result<Acquire<Self::Image>, BackendError>;

    fn reset_recorder(&mut self, recorder: &mut Self::Recorder) -> Result<(), BackendError>;
    fn record(
        &mut self,
        recorder: &mut Self::Recorder,
        image: &Self::Image,
        draws: &DrawSequence,
    ) -> Result<(), BackendError>;

    /// Queue the recorded work behind `wait`, raising both signals when done
    fn submit(
        &mut self,
        recorder: &mut Self::Recorder,
        wait: &Self::Semaphore,
        signals: SubmitSignals<'_, Self::Fence, Self::Semaphore>,
    ) -> Result<(), BackendError>;

    fn present(
        &mut self,
        image: Self::Image,
        render_complete: &Self::Semaphore,
    ) -> Result<PresentStatus, BackendError>;

    /// Recreate the surface and anything sized by it
    fn rebuild_surface(&mut self, size: SurfaceSize) -> Result<(), BackendError>;

    fn destroy_recorder(&mut self, recorder: Self::Recorder);
    fn destroy_semaphore(&mut self, semaphore: Self::Semaphore);
    fn destroy_fence(&mut self, fence: Self::Fence);
    fn destroy_surface(&mut self);
}

/// Phases of one frame cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    WaitSlot,
    AcquireImage,
    Record,
    Submit,
    Present,
    Rebuild,
}

/// What a call to [`FrameScheduler::draw_frame`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameReport {
    Presented { slot: usize },
    /// The surface was stale at `phase`; nothing was shown this tick
    Skipped { slot: usize, phase: FramePhase },
    /// Zero-size surface; no slot was touched
    Suspended,
}

struct FrameSlot<B: FrameBackend> {
    completion: B::Fence,
    image_acquired: B::Semaphore,
    render_complete: B::Semaphore,
    recorder: B::Recorder,
}

/// Fixed ring of frame slots
pub struct FrameSlotPool<B: FrameBackend> {
    slots: Vec<FrameSlot<B>>,
    index: usize,
}

impl<B: FrameBackend> FrameSlotPool<B> {
    fn new(backend: &mut B, count: usize) -> Result<Self, BackendError> {
        let mut pool = Self {
            slots: Vec::with_capacity(count),
            index: 0,
        };
        for _ in 0..count {
            match Self::create_slot(backend) {
                Ok(slot) => pool.slots.push(slot),
                Err(err) => {
                    pool.release(backend);
                    return Err(err);
                }
            }
        }
        Ok(pool)
    }

    fn create_slot(backend: &mut B) -> Result<FrameSlot<B>, BackendError> {
        // Signaled so the first wait on each slot returns immediately
        let completion = backend.create_fence(true)?;
        let image_acquired = match backend.create_semaphore() {
            Ok(s) => s,
            Err(err) => {
                backend.destroy_fence(completion);
                return Err(err);
            }
        };
        let render_complete = match backend.create_semaphore() {
            Ok(s) => s,
            Err(err) => {
                backend.destroy_semaphore(image_acquired);
                backend.destroy_fence(completion);
                return Err(err);
            }
        };
        let recorder = match backend.create_recorder() {
            Ok(r) => r,
            Err(err) => {
                backend.destroy_semaphore(render_complete);
                backend.destroy_semaphore(image_acquired);
                backend.destroy_fence(completion);
                return Err(err);
            }
        };
        Ok(FrameSlot {
            completion,
            image_acquired,
            render_complete,
            recorder,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot the next cycle will use
    pub fn index(&self) -> usize {
        self.index
    }

    fn advance(&mut self) {
        self.index = (self.index + 1) % self.slots.len();
    }

    /// WaitSlot: block until the current slot's last submission finished
    fn wait_current(&mut self, backend: &mut B) -> Result<ReadySlot<'_, B>, BackendError> {
        let slot = &mut self.slots[self.index];
        backend.wait_fence(&slot.completion)?;
        Ok(ReadySlot { slot })
    }

    /// Wait on every slot; keeps going past failures and reports the first
    fn drain(&self, backend: &mut B) -> Result<(), BackendError> {
        let mut first_err = None;
        for slot in &self.slots {
            if let Err(err) = backend.wait_fence(&slot.completion) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Destroy every slot in reverse creation order
    fn release(&mut self, backend: &mut B) {
        for slot in self.slots.drain(..).rev() {
            backend.destroy_recorder(slot.recorder);
            backend.destroy_semaphore(slot.render_complete);
            backend.destroy_semaphore(slot.image_acquired);
            backend.destroy_fence(slot.completion);
        }
        self.index = 0;
    }
}

/// A slot whose previous submission is known to be finished
///
/// Only [`FrameSlotPool::wait_current`] produces one, which makes it the only
/// route to the slot's recorder.
struct ReadySlot<'a, B: FrameBackend> {
    slot: &'a mut FrameSlot<B>,
}

impl<B: FrameBackend> ReadySlot<'_, B> {
    fn acquire(&self, backend: &mut B) -> Result<Acquire<B::Image>, BackendError> {
        backend.acquire_next_image(&self.slot.image_acquired)
    }

    fn record(
        &mut self,
        backend: &mut B,
        image: &B::Image,
        draws: &DrawSequence,
    ) -> Result<(), BackendError> {
        backend.reset_recorder(&mut self.slot.recorder)?;
        backend.record(&mut self.slot.recorder, image, draws)
    }

    fn submit(&mut self, backend: &mut B) -> Result<(), BackendError> {
        let slot = &mut *self.slot;
        // Reset only once there is work that will signal it again
        backend.reset_fence(&slot.completion)?;
        backend.submit(
            &mut slot.recorder,
            &slot.image_acquired,
            SubmitSignals {
                completion: &slot.completion,
                render_complete: &slot.render_complete,
            },
        )
    }

    fn present(&self, backend: &mut B, image: B::Image) -> Result<PresentStatus, BackendError> {
        backend.present(image, &self.slot.render_complete)
    }
}

/// How the slot's part of a cycle ended
enum SlotOutcome {
    Presented,
    Stale(FramePhase),
}

/// Drives frame cycles against a backend
///
/// Owns the backend (and through it the presentation surface) along with the
/// slot pool. Dropping the scheduler drains and releases everything.
pub struct FrameScheduler<B: FrameBackend> {
    backend: B,
    pool: FrameSlotPool<B>,
    size: SurfaceSize,
    surface_valid: bool,
    pending_resize: Option<SurfaceSize>,
    released: bool,
}

impl<B: FrameBackend> FrameScheduler<B> {
    /// Take ownership of `backend`, whose surface is configured at `size`
    pub fn new(mut backend: B, slot_count: usize, size: SurfaceSize) -> Result<Self, SchedulerError> {
        if slot_count == 0 {
            backend.destroy_surface();
            return Err(SchedulerError::InvalidSlotCount);
        }
        let pool = match FrameSlotPool::new(&mut backend, slot_count) {
            Ok(pool) => pool,
            Err(err) => {
                backend.destroy_surface();
                return Err(err.into());
            }
        };
        log::info!(
            "Frame scheduler ready: {} slots, surface {}x{}",
            slot_count,
            size.width,
            size.height
        );
        Ok(Self {
            backend,
            pool,
            size,
            surface_valid: !size.is_empty(),
            pending_resize: None,
            released: false,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn slot_index(&self) -> usize {
        self.pool.index()
    }

    pub fn slot_count(&self) -> usize {
        self.pool.len()
    }

    pub fn surface_size(&self) -> SurfaceSize {
        self.size
    }

    pub fn is_surface_valid(&self) -> bool {
        self.surface_valid
    }

    /// Record a window resize; honoured at the next Present
    pub fn notify_resized(&mut self, size: SurfaceSize) {
        log::debug!("Resize pending: {}x{}", size.width, size.height);
        self.pending_resize = Some(size);
    }

    /// Run one frame cycle
    ///
    /// `build` is only called once an image has been acquired, so a stale
    /// surface costs no command building. Staleness is absorbed here and
    /// reported as [`FrameReport::Skipped`]; only backend faults are errors.
    pub fn draw_frame<F>(&mut self, build: F) -> Result<FrameReport, SchedulerError>
    where
        F: FnOnce() -> DrawSequence,
    {
        if self.released {
            return Err(BackendError::SurfaceReleased.into());
        }
        if !self.surface_valid && !self.rebuild()? {
            return Ok(FrameReport::Suspended);
        }

        let slot = self.pool.index();
        log::trace!("slot {slot}: {:?}", FramePhase::WaitSlot);
        let outcome = {
            let mut ready = self.pool.wait_current(&mut self.backend)?;
            Self::run_slot(&mut self.backend, &mut ready, slot, build)?
        };
        self.pool.advance();

        match outcome {
            SlotOutcome::Presented => {
                if self.pending_resize.is_some() {
                    log::trace!("slot {slot}: {:?}", FramePhase::Rebuild);
                    self.rebuild()?;
                }
                Ok(FrameReport::Presented { slot })
            }
            SlotOutcome::Stale(phase) => {
                log::debug!("Surface stale at {phase:?}, skipping present on slot {slot}");
                log::trace!("slot {slot}: {:?}", FramePhase::Rebuild);
                self.rebuild()?;
                Ok(FrameReport::Skipped { slot, phase })
            }
        }
    }

    /// AcquireImage through Present for a slot that has passed WaitSlot
    fn run_slot<F>(
        backend: &mut B,
        ready: &mut ReadySlot<'_, B>,
        slot: usize,
        build: F,
    ) -> Result<SlotOutcome, BackendError>
    where
        F: FnOnce() -> DrawSequence,
    {
        log::trace!("slot {slot}: {:?}", FramePhase::AcquireImage);
        let image = match ready.acquire(backend)? {
            Acquire::Ready(image) => image,
            Acquire::Stale => return Ok(SlotOutcome::Stale(FramePhase::AcquireImage)),
        };

        log::trace!("slot {slot}: {:?}", FramePhase::Record);
        let draws = build();
        ready.record(backend, &image, &draws)?;

        log::trace!("slot {slot}: {:?}", FramePhase::Submit);
        ready.submit(backend)?;

        log::trace!("slot {slot}: {:?}", FramePhase::Present);
        match ready.present(backend, image)? {
            PresentStatus::Presented => Ok(SlotOutcome::Presented),
            PresentStatus::Stale => Ok(SlotOutcome::Stale(FramePhase::Present)),
        }
    }

    /// Rebuild: recreate the surface at the latest known size
    ///
    /// Returns false when the size is empty; the surface then stays invalid
    /// until a non-zero size arrives.
    fn rebuild(&mut self) -> Result<bool, BackendError> {
        if let Some(size) = self.pending_resize.take() {
            self.size = size;
        }
        if self.size.is_empty() {
            if self.surface_valid {
                log::warn!("Surface has zero area, suspending presentation");
            }
            self.surface_valid = false;
            return Ok(false);
        }
        log::debug!("Rebuilding surface at {}x{}", self.size.width, self.size.height);
        self.backend.rebuild_surface(self.size)?;
        self.surface_valid = true;
        Ok(true)
    }

    /// Drain all outstanding submissions, then release slots and surface
    ///
    /// Resources go in reverse acquisition order: slots last-to-first, then
    /// the surface. A fence that never signals is reported, but release still
    /// happens. Calling this twice is a no-op.
    pub fn shutdown(&mut self) -> Result<(), SchedulerError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        log::info!("Draining {} frame slots", self.pool.len());
        let drained = self.pool.drain(&mut self.backend);
        self.pool.release(&mut self.backend);
        self.backend.destroy_surface();
        self.surface_valid = false;
        drained.map_err(SchedulerError::from)
    }
}

impl<B: FrameBackend> Drop for FrameScheduler<B> {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            log::error!("Frame scheduler shutdown failed: {err}");
        }
    }
}
