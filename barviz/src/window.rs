use std::{
    num::NonZeroU32,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use barviz_audio::{
    fetcher::{SystemAudioFetcher, SystemAudioFetcherDescriptor},
    CaptureSource, DemoConfig, DemoSource, FrameSource, SampleFrame,
};
use barviz_renderer::{BarRenderer, DrawOutcome, PixmapSurface, RenderConfig, SurfaceError};
use tracing::{debug, error, info, trace, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::Key,
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::{AppConfig, ConfigWatcher};

const BACKGROUND: u32 = 0x00000000;

/// One bar chart of the window.
struct View {
    renderer: BarRenderer,
    surface: PixmapSurface,
    // `Some` if this view draws random frames instead of the microphone
    demo: Option<DemoSource>,
    latest: Option<SampleFrame>,
}

impl View {
    fn new(config: RenderConfig, demo: Option<DemoConfig>) -> Result<Self, SurfaceError> {
        let surface = PixmapSurface::new(config.width, config.height)?;

        Ok(Self {
            renderer: BarRenderer::new(config),
            surface,
            demo: demo.map(DemoSource::new),
            latest: None,
        })
    }

    fn update(&mut self, live: Option<&SampleFrame>, elapsed: Duration) {
        let frame = match self.demo.as_mut() {
            Some(demo) => demo.poll(elapsed),
            None => live.cloned(),
        };

        if let Some(frame) = frame {
            self.latest = Some(frame);
        }
    }

    fn draw(&mut self) {
        match self.renderer.draw(&mut self.surface, self.latest.as_ref()) {
            DrawOutcome::Drawn { bars } => trace!("Drew {} bars", bars),
            DrawOutcome::Skipped(reason) => trace!("Skipped drawing: {:?}", reason),
        }
    }
}

fn create_views(config: &AppConfig, force_demo: bool) -> Result<Vec<View>, SurfaceError> {
    let demo_config = config.capture.demo_config();

    config
        .views
        .iter()
        .map(|view| {
            let demo = (force_demo || view.demo_mode).then(|| demo_config.clone());
            View::new(view.clone(), demo)
        })
        .collect()
}

fn acquire_live(config: &AppConfig, views: &[View]) -> FrameSource<SystemAudioFetcher> {
    if views.iter().all(|view| view.demo.is_some()) {
        debug!("Every view is in demo mode. Not opening an input device.");
        return FrameSource::Inactive;
    }

    let desc = SystemAudioFetcherDescriptor {
        device_name: config.capture.device.clone(),
        ..Default::default()
    };

    FrameSource::from(CaptureSource::acquire(
        desc,
        config.capture.analyser_config(),
    ))
}

// softbuffer errors aren't `Send`
fn softbuffer_error(err: softbuffer::SoftBufferError) -> anyhow::Error {
    anyhow::anyhow!("{}", err)
}

struct State {
    window: Arc<Window>,
    surface: softbuffer::Surface<Arc<Window>, Arc<Window>>,
    // the surface needs the context to stay alive
    _context: softbuffer::Context<Arc<Window>>,
}

impl State {
    fn new(window: Window) -> anyhow::Result<Self> {
        let window = Arc::new(window);

        let context = softbuffer::Context::new(window.clone())
            .map_err(softbuffer_error)
            .context("Create softbuffer context")?;
        let surface = softbuffer::Surface::new(&context, window.clone())
            .map_err(softbuffer_error)
            .context("Create softbuffer surface")?;

        Ok(Self {
            window,
            surface,
            _context: context,
        })
    }

    /// Stacks the views from top to bottom, each one centered horizontally.
    fn render(&mut self, views: &[View]) -> anyhow::Result<()> {
        let size = self.window.inner_size();
        let (Some(width), Some(height)) =
            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return Ok(());
        };

        self.surface.resize(width, height).map_err(softbuffer_error)?;

        let mut buffer = self.surface.buffer_mut().map_err(softbuffer_error)?;
        buffer.fill(BACKGROUND);

        let mut y = 0;
        for view in views {
            let pixmap = view.surface.pixmap();
            let x = size.width.saturating_sub(pixmap.width()) / 2;

            view.surface.blit_onto(&mut buffer, size.width, x, y);
            y += pixmap.height();
        }

        buffer.present().map_err(softbuffer_error)
    }
}

struct Barviz {
    config: AppConfig,
    force_demo: bool,

    live: FrameSource<SystemAudioFetcher>,
    views: Vec<View>,
    state: Option<State>,

    watcher: ConfigWatcher,
    start: Instant,
}

impl Barviz {
    fn new(config: AppConfig, config_path: PathBuf, force_demo: bool) -> anyhow::Result<Self> {
        let views = create_views(&config, force_demo)?;
        let live = acquire_live(&config, &views);

        Ok(Self {
            config,
            force_demo,
            live,
            views,
            state: None,
            watcher: ConfigWatcher::new(config_path),
            start: Instant::now(),
        })
    }

    fn window_size(&self) -> PhysicalSize<u32> {
        let (width, height) = self.config.window_size();
        PhysicalSize::new(width.max(1), height.max(1))
    }

    fn refresh_config(&mut self) {
        let new_config = match self.watcher.reload_if_modified() {
            None => return,
            Some(Ok(config)) => config,
            Some(Err(err)) => {
                error!("{}. Keeping the previous config.", err);
                return;
            }
        };

        let views = match create_views(&new_config, self.force_demo) {
            Ok(views) => views,
            Err(err) => {
                error!("{}. Keeping the previous config.", err);
                return;
            }
        };

        let needs_live = views.iter().any(|view| view.demo.is_none());
        let restart_capture = new_config.capture != self.config.capture
            || needs_live == matches!(self.live, FrameSource::Inactive);

        self.views = views;
        self.config = new_config;

        if restart_capture {
            self.live.stop();
            self.live = acquire_live(&self.config, &self.views);
        }

        if let Some(state) = self.state.as_ref() {
            let _ = state.window.request_inner_size(self.window_size());
        }

        info!("Reloaded config");
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        let elapsed = self.start.elapsed();
        let live_frame = self.live.tick(elapsed);

        for view in self.views.iter_mut() {
            view.update(live_frame.as_ref(), elapsed);
            view.draw();
        }

        if let Some(state) = self.state.as_mut() {
            state.render(&self.views)?;
            state.window.request_redraw();
        }

        Ok(())
    }
}

impl ApplicationHandler for Barviz {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(crate::APP_NAME)
            .with_inner_size(self.window_size());

        let state = event_loop
            .create_window(attributes)
            .context("Create window")
            .and_then(State::new);

        match state {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(err) => {
                error!("{:?}", err);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::RedrawRequested => {
                self.refresh_config();

                if let Err(err) = self.redraw() {
                    warn!("{:?}", err);
                }
            }
            WindowEvent::Resized(_) => {
                if let Some(state) = self.state.as_ref() {
                    state.window.request_redraw();
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.logical_key == Key::Character("q".into()) =>
            {
                event_loop.exit()
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.live.stop();
        self.state = None;
        debug!("Released the input device");
    }
}

pub fn run(config: AppConfig, config_path: PathBuf, force_demo: bool) -> anyhow::Result<()> {
    let mut app = Barviz::new(config, config_path, force_demo)?;
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
