//! Per-frame loop bridging a particle field to its host runtime.
//!
//! The host (a browser page, or the native preview tool) owns the real frame
//! scheduler and event sources. `FrameHost` is the seam: the loop asks it for
//! frames and listener registrations, and the host calls back into the loop.

use std::time::Duration;

use folio_common::{CanvasSize, FieldId};
use glam::Vec2;
use tracing::debug;

use crate::canvas::Canvas;
use crate::config::{FieldConfig, InteractionMode};
use crate::field::ParticleField;
use crate::performance::{DeviceProfile, Throttle};
use crate::render::RenderStats;

/// Event sources a field can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    /// Window resize.
    Resize,
    /// Pointer movement.
    PointerMove,
    /// Pointer press.
    PointerDown,
    /// Pointer release.
    PointerUp,
    /// Key press (mode toggle).
    KeyPress,
}

/// Handle of a requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Frame scheduler and event registry provided by the host.
pub trait FrameHost {
    /// Asks for one callback on the next display frame.
    fn request_frame(&mut self, field: FieldId) -> FrameHandle;

    /// Cancels a requested frame that has not fired yet.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Starts routing `event` to `field`.
    fn listen(&mut self, field: FieldId, event: HostEvent);

    /// Stops routing `event` to `field`.
    fn unlisten(&mut self, field: FieldId, event: HostEvent);
}

impl<T: FrameHost + ?Sized> FrameHost for &mut T {
    fn request_frame(&mut self, field: FieldId) -> FrameHandle {
        (**self).request_frame(field)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        (**self).cancel_frame(handle);
    }

    fn listen(&mut self, field: FieldId, event: HostEvent) {
        (**self).listen(field, event);
    }

    fn unlisten(&mut self, field: FieldId, event: HostEvent) {
        (**self).unlisten(field, event);
    }
}

/// Lifecycle state of a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Stepping and rendering every frame.
    Running,
    /// Unmounted; frames are ignored.
    Stopped,
}

/// One mounted backdrop: a field, its host, and its listeners.
#[derive(Debug)]
pub struct FieldLoop<H: FrameHost> {
    id: FieldId,
    host: H,
    field: ParticleField,
    state: LoopState,
    pending: Option<FrameHandle>,
    listeners: Vec<HostEvent>,
    pointer: Option<Vec2>,
    pointer_throttle: Option<Throttle>,
    resize_throttle: Option<Throttle>,
}

impl<H: FrameHost> FieldLoop<H> {
    /// Mounts a field on `host`.
    ///
    /// Registers listeners, seeds the pool for `size`, requests the first
    /// frame and enters [`LoopState::Running`].
    pub fn mount(host: H, config: FieldConfig, size: CanvasSize) -> Self {
        Self::mount_field(host, ParticleField::new(config), size)
    }

    /// Mounts a field only if the device should animate.
    ///
    /// Returns `None` for reduced-motion and low-end devices; the page then
    /// keeps its static background.
    pub fn mount_for_device(
        host: H,
        config: FieldConfig,
        size: CanvasSize,
        device: &DeviceProfile,
    ) -> Option<Self> {
        if !device.allows_animation() {
            debug!("Skipping animated backdrop for this device");
            return None;
        }
        Some(Self::mount(host, config, size))
    }

    /// Mounts an already constructed field (e.g. one with a fixed seed).
    pub fn mount_field(mut host: H, mut field: ParticleField, size: CanvasSize) -> Self {
        let id = FieldId::new();
        let config = field.config();

        let mut listeners = vec![HostEvent::Resize, HostEvent::PointerMove];
        if config.wants_press_events() {
            listeners.push(HostEvent::PointerDown);
            listeners.push(HostEvent::PointerUp);
        }
        if config.interaction.is_some_and(|interaction| interaction.togglable) {
            listeners.push(HostEvent::KeyPress);
        }

        let (pointer_throttle, resize_throttle) = config.event_throttle.map_or((None, None), |t| {
            (
                Some(Throttle::from_millis(t.pointer_ms)),
                Some(Throttle::from_millis(t.resize_ms)),
            )
        });

        for event in &listeners {
            host.listen(id, *event);
        }
        field.initialize_from_config(size);
        let pending = Some(host.request_frame(id));

        debug!(
            "Mounted field {} with {} particles and {} listeners",
            id.raw(),
            field.len(),
            listeners.len()
        );

        Self {
            id,
            host,
            field,
            state: LoopState::Running,
            pending,
            listeners,
            pointer: None,
            pointer_throttle,
            resize_throttle,
        }
    }

    /// Frame callback.
    ///
    /// Steps, renders into `canvas` (resizing it to match the field first)
    /// and requests the next frame. Returns false without doing anything once
    /// the loop is stopped.
    pub fn on_frame<C: Canvas + ?Sized>(&mut self, canvas: Option<&mut C>) -> bool {
        self.frame(canvas).is_some()
    }

    /// Same as [`FieldLoop::on_frame`], returning what was drawn.
    pub fn frame<C: Canvas + ?Sized>(&mut self, canvas: Option<&mut C>) -> Option<RenderStats> {
        if self.state == LoopState::Stopped {
            return None;
        }
        self.pending = None;

        self.field.step(self.pointer);
        let stats = match canvas {
            Some(canvas) => {
                let (have, want) = (canvas.size(), self.field.size());
                if (have.pixel_width(), have.pixel_height())
                    != (want.pixel_width(), want.pixel_height())
                {
                    canvas.resize(want);
                }
                self.field.render(Some(canvas))
            },
            None => self.field.render::<C>(None),
        };

        self.pending = Some(self.host.request_frame(self.id));
        Some(stats)
    }

    /// Window resize callback. `now` is the host's monotonic time.
    pub fn on_resize(&mut self, size: CanvasSize, now: Duration) {
        if self.state == LoopState::Stopped {
            return;
        }
        if let Some(throttle) = self.resize_throttle.as_mut() {
            if !throttle.admit(now) {
                return;
            }
        }
        debug!(
            "Field {} resized to {}x{}",
            self.id.raw(),
            size.pixel_width(),
            size.pixel_height()
        );
        self.field.resize(size);
    }

    /// Pointer movement callback.
    pub fn on_pointer_move(&mut self, at: Vec2, now: Duration) {
        if self.state == LoopState::Stopped {
            return;
        }
        if let Some(throttle) = self.pointer_throttle.as_mut() {
            if !throttle.admit(now) {
                return;
            }
        }
        self.pointer = Some(at);
    }

    /// Pointer press callback. Fires the burst, if configured.
    pub fn on_pointer_down(&mut self, at: Vec2) {
        if self.state == LoopState::Stopped {
            return;
        }
        self.pointer = Some(at);
        self.field.set_pressed(true);
        self.field.burst(at);
    }

    /// Pointer release callback.
    pub fn on_pointer_up(&mut self) {
        self.field.set_pressed(false);
    }

    /// Toggles attract/repel if the config allows it.
    pub fn on_toggle_mode(&mut self) -> Option<InteractionMode> {
        let togglable = self
            .field
            .config()
            .interaction
            .is_some_and(|interaction| interaction.togglable);
        if self.state == LoopState::Stopped || !togglable {
            return None;
        }
        Some(self.field.toggle_mode())
    }

    /// Stops the loop and releases everything it registered.
    ///
    /// Safe to call more than once.
    pub fn unmount(&mut self) {
        if self.state == LoopState::Stopped {
            return;
        }
        if let Some(handle) = self.pending.take() {
            self.host.cancel_frame(handle);
        }
        for event in self.listeners.drain(..) {
            self.host.unlisten(self.id, event);
        }
        self.state = LoopState::Stopped;
        debug!("Unmounted field {}", self.id.raw());
    }

    /// Field identifier used with the host.
    #[must_use]
    pub fn id(&self) -> FieldId {
        self.id
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The simulated field.
    #[must_use]
    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    /// Last known pointer position.
    #[must_use]
    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// The host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<H: FrameHost> Drop for FieldLoop<H> {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Host that records requests instead of scheduling anything.
///
/// Drives loops from native code: the preview tool and tests fire frames by
/// hand.
#[derive(Debug, Default)]
pub struct ManualHost {
    next_handle: u64,
    pending: Vec<(FrameHandle, FieldId)>,
    cancelled: Vec<FrameHandle>,
    listeners: Vec<(FieldId, HostEvent)>,
}

impl ManualHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames requested and not yet fired or cancelled.
    #[must_use]
    pub fn pending_frames(&self) -> &[(FrameHandle, FieldId)] {
        &self.pending
    }

    /// Takes the pending frames, as if the display just refreshed.
    pub fn take_frames(&mut self) -> Vec<(FrameHandle, FieldId)> {
        std::mem::take(&mut self.pending)
    }

    /// Frames cancelled so far.
    #[must_use]
    pub fn cancelled(&self) -> &[FrameHandle] {
        &self.cancelled
    }

    /// Active listener registrations.
    #[must_use]
    pub fn listeners(&self) -> &[(FieldId, HostEvent)] {
        &self.listeners
    }

    /// Checks whether `field` listens for `event`.
    #[must_use]
    pub fn is_listening(&self, field: FieldId, event: HostEvent) -> bool {
        self.listeners.contains(&(field, event))
    }
}

impl FrameHost for ManualHost {
    fn request_frame(&mut self, field: FieldId) -> FrameHandle {
        self.next_handle += 1;
        let handle = FrameHandle(self.next_handle);
        self.pending.push((handle, field));
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.pending.len();
        self.pending.retain(|(pending, _)| *pending != handle);
        if self.pending.len() < before {
            self.cancelled.push(handle);
        }
    }

    fn listen(&mut self, field: FieldId, event: HostEvent) {
        if !self.is_listening(field, event) {
            self.listeners.push((field, event));
        }
    }

    fn unlisten(&mut self, field: FieldId, event: HostEvent) {
        self.listeners.retain(|entry| *entry != (field, event));
    }
}
