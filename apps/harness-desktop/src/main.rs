mod wake;

use anyhow::Result;
use clap::Parser;
use harness_bridge::{Bridge, SchedulerState};
use harness_input::dom_key_code;
use harness_kernel::DemoKernel;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wake::RedrawWake;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(
    name = "harness-desktop",
    about = "Drive the demo kernel from window keyboard input and display refresh"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Warn when a single frame takes longer than this many milliseconds
    #[arg(long)]
    frame_budget_ms: Option<u64>,

    /// Seed for the demo kernel's sound cues
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Window title
    #[arg(long, default_value = "Kernel Harness")]
    title: String,
}

/// Frames between window title refreshes.
const TITLE_EVERY: u64 = 60;

struct HarnessApp {
    title: String,
    seed: u64,
    frame_budget: Option<Duration>,
    bridge: Option<Bridge<DemoKernel, RedrawWake>>,
}

impl HarnessApp {
    fn new(cli: &Cli) -> Self {
        Self {
            title: cli.title.clone(),
            seed: cli.seed,
            frame_budget: cli.frame_budget_ms.map(Duration::from_millis),
            bridge: None,
        }
    }

    fn kernel(&self) -> DemoKernel {
        DemoKernel::with_seed(self.seed)
            .with_cue_sink(|cue| tracing::info!(cue = cue.0, "play sound"))
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        let Some(bridge) = &mut self.bridge else {
            return;
        };
        let code = dom_key_code(event.physical_key);
        tracing::trace!(%code, repeat = event.repeat, "host key event");
        // faults are logged by the input capture; the listener stays subscribed
        let _ = match event.state {
            ElementState::Pressed => bridge.on_key_down(code),
            ElementState::Released => bridge.on_key_up(code),
        };
    }

    fn handle_redraw(&mut self) {
        let Some(bridge) = &mut self.bridge else {
            return;
        };
        if !bridge.scheduler_mut().wake_source_mut().take_released() {
            // a redraw the OS asked for, not one the scheduler requested
            return;
        }
        let _ = bridge.on_wake();

        let frames = bridge.scheduler().stats().frames;
        if frames % TITLE_EVERY == 0 {
            if let Some(kernel) = bridge.kernel().inspect() {
                let pacing = bridge.scheduler().pacing();
                bridge.scheduler().wake_source().window().set_title(&format!(
                    "{} | frame {} | {:.1}s | keys held {} | advance avg {:?}",
                    self.title,
                    kernel.frames(),
                    kernel.elapsed().as_secs_f32(),
                    kernel.keys_held().len(),
                    pacing.average(),
                ));
            }
        }
    }
}

impl ApplicationHandler for HarnessApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.bridge.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(512.0, 512.0));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let mut bridge = Bridge::new(self.kernel(), RedrawWake::new(window));
        if let Some(budget) = self.frame_budget {
            bridge = bridge.with_frame_budget(budget);
        }
        if let Err(e) = bridge.start() {
            // the window stays up but static: no frames, no input forwarded
            tracing::error!("kernel did not start: {e}");
        }
        self.bridge = Some(bridge);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(bridge) = &self.bridge {
                    let stats = bridge.kernel().stats();
                    tracing::info!(
                        delivered = stats.delivered,
                        queued = stats.queued,
                        faulted = stats.faulted,
                        "shutting down"
                    );
                }
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event),
            WindowEvent::RedrawRequested => self.handle_redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(bridge) = &mut self.bridge else {
            return;
        };
        if bridge.scheduler().state() != SchedulerState::Armed {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        }
        match bridge.scheduler_mut().wake_source_mut().poll() {
            Some(due) => event_loop.set_control_flow(ControlFlow::WaitUntil(due)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("harness-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = HarnessApp::new(&cli);
    event_loop.run_app(&mut app)?;

    Ok(())
}
