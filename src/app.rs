use crate::config::{self, Config};
use crate::core::input::{self, InputState};
use crate::game::session::Session;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use log::{error, info};
use std::{error::Error, sync::Arc, time::Instant};

/* -------------------- window / stepping constants -------------------- */
const WINDOW_TITLE: &str = "Railbeat";
/// Fixed step used when running without a window.
const HEADLESS_STEP: f32 = 1.0 / 120.0;

/* -------------------- host application -------------------- */
pub struct App {
    window: Option<Arc<Window>>,
    session: Session,
    input_state: InputState,
    autoplay: bool,
    window_width: u32,
    window_height: u32,
    last_frame_time: Instant,
    last_title_update: Instant,
    frame_count: u32,
    last_fps: f32,
}

impl App {
    fn new(config: &Config) -> Self {
        let now = Instant::now();
        Self {
            window: None,
            session: Session::from_config(config),
            input_state: input::init_state(),
            autoplay: config.autoplay,
            window_width: config.window_width,
            window_height: config.window_height,
            last_frame_time: now,
            last_title_update: now,
            frame_count: 0,
            last_fps: 0.0,
        }
    }

    #[inline(always)]
    fn update_title(&mut self, window: &Window, now: Instant) {
        self.frame_count += 1;
        let elapsed = now.duration_since(self.last_title_update).as_secs_f32();
        if elapsed >= 0.1 {
            self.last_fps = self.frame_count as f32 / elapsed;
            self.frame_count = 0;
            self.last_title_update = now;
        }
        window.set_title(&format!(
            "{} - {} | {:.0} FPS",
            WINDOW_TITLE,
            self.session.status_line(),
            self.last_fps
        ));
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn Error>> {
        let window_attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_resizable(true)
            .with_inner_size(PhysicalSize::new(self.window_width, self.window_height));

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        self.window = Some(window);
        self.last_frame_time = Instant::now();
        info!("Starting event loop...");
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init_window(event_loop) {
                error!("Failed to create window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref().cloned() else {
            return;
        };
        if window_id != window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested. Shutting down.");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                input::handle_keyboard_input(&key_event, &mut self.input_state);
                if key_event.state == ElementState::Pressed {
                    match key_event.physical_key {
                        PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
                        PhysicalKey::Code(KeyCode::F1) => {
                            self.autoplay = !self.autoplay;
                            info!("Autoplay {}", if self.autoplay { "ON" } else { "OFF" });
                        }
                        _ => {}
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                // --- Frame timing ---
                let now = Instant::now();
                let delta_time = now.duration_since(self.last_frame_time).as_secs_f32();
                self.last_frame_time = now;

                // --- Simulation step ---
                let input = if self.autoplay {
                    self.session.autoplay_input()
                } else {
                    self.input_state
                };
                self.session.update(delta_time, input);

                // --- Presentation ---
                self.update_title(&window, now);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.session.log_summary();
    }
}

/* -------------------- entry points -------------------- */

/// Steps an autoplayed session at a fixed rate until the chart drains or
/// `seconds` of simulated time pass.
pub fn run_headless(session: &mut Session, seconds: f32) {
    let steps = (seconds.max(0.0) / HEADLESS_STEP).ceil() as u64;
    info!("Running headless for up to {:.1}s.", seconds);
    for _ in 0..steps {
        if session.is_complete() {
            break;
        }
        let input = session.autoplay_input();
        session.update(HEADLESS_STEP, input);
    }
    session.log_summary();
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let config = config::get();

    // --- Headless run: no window, fixed step, autoplay input ---
    if config.headless {
        let mut session = Session::from_config(&config);
        run_headless(&mut session, config.headless_seconds);
        return Ok(());
    }

    // --- Windowed run ---
    let event_loop = EventLoop::new()?;
    let mut app = App::new(&config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
