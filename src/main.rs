//! Luna Lander entry point
//!
//! Opens the window, builds the world and drives the tick loop:
//! sample input, step physics, draw a frame.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use luna_lander::input::InputState;
use luna_lander::renderer::{
    self, BackendError, FrameReport, FrameScheduler, SchedulerError, SurfaceSize, WgpuBackend,
};
use luna_lander::sim::Session;
use luna_lander::{Settings, SettingsError};

/// Fatal startup and runtime failures
#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("event loop: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] OsError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

struct App {
    settings: Settings,
    session: Session,
    input: InputState,
    window: Option<Arc<Window>>,
    scheduler: Option<FrameScheduler<WgpuBackend>>,
    last_frame: Instant,
    /// Set when a fatal backend error ends the run
    failed: bool,
}

impl App {
    fn new(settings: Settings, session: Session) -> Self {
        Self {
            settings,
            session,
            input: InputState::default(),
            window: None,
            scheduler: None,
            last_frame: Instant::now(),
            failed: false,
        }
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let attrs = Window::default_attributes()
            .with_title("Luna Lander")
            .with_inner_size(PhysicalSize::new(
                self.settings.window.width,
                self.settings.window.height,
            ));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let backend = pollster::block_on(WgpuBackend::new(
            Arc::clone(&window),
            self.session.world(),
            &self.settings,
        ))?;

        let size = window.inner_size();
        let scheduler = FrameScheduler::new(
            backend,
            self.settings.frames_in_flight,
            SurfaceSize::new(size.width, size.height),
        )?;

        self.window = Some(window);
        self.scheduler = Some(scheduler);
        self.last_frame = Instant::now();
        Ok(())
    }

    /// One tick: physics, then presentation
    fn tick(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.session.advance(&self.input.sample(), dt);

        let Some(scheduler) = self.scheduler.as_mut() else {
            return;
        };
        let session = &self.session;
        let result = scheduler.draw_frame(|| {
            renderer::build(session.vehicle(), &session.world().terrain)
        });
        match result {
            Ok(FrameReport::Skipped { slot, phase }) => {
                log::debug!("Frame on slot {slot} skipped at {phase:?}");
            }
            Ok(_) => {}
            Err(e) => {
                log::error!("Rendering failed: {e}");
                self.failed = true;
                event_loop.exit();
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(mut scheduler) = self.scheduler.take() {
            if let Err(e) = scheduler.shutdown() {
                log::error!("Shutdown did not drain cleanly: {e}");
                self.failed = true;
            }
        }
        self.window = None;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_graphics(event_loop) {
            log::error!("Graphics initialisation failed: {e}");
            self.failed = true;
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(scheduler) = self.scheduler.as_mut() {
                    scheduler.notify_resized(SurfaceSize::new(size.width, size.height));
                }
            }
            WindowEvent::Focused(false) => self.input.release_all(),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.input
                        .handle_key(key, event.state == ElementState::Pressed);
                    if self.input.quit_requested() {
                        event_loop.exit();
                    }
                }
            }
            WindowEvent::RedrawRequested => self.tick(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

/// Run until the window closes; `Ok(false)` when a fault ended the run
fn run() -> Result<bool, AppError> {
    let settings = Settings::load()?;
    let session = Session::new(&settings)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(settings, session);
    event_loop.run_app(&mut app)?;
    // exiting() normally ran already; this covers loops that end without it
    app.shutdown();
    Ok(!app.failed)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(true) => {
            log::info!("Goodbye");
            ExitCode::SUCCESS
        }
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_keeps_typed_sources() {
        let err = AppError::from(SchedulerError::InvalidSlotCount);
        assert!(matches!(
            err,
            AppError::Scheduler(SchedulerError::InvalidSlotCount)
        ));
        assert!(err.to_string().contains("at least one slot"));

        let err: AppError = BackendError::Init("no suitable adapter".into()).into();
        assert!(matches!(err, AppError::Backend(BackendError::Init(_))));
        assert!(err.to_string().contains("no suitable adapter"));

        let err: AppError = SettingsError::Invalid("frames_in_flight must be at least 1").into();
        assert!(matches!(err, AppError::Settings(_)));
    }
}
