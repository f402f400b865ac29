//! Draws the microphone of the browser as a bar chart onto a `<canvas>`.
//!
//! Only has content when compiled for `wasm32`.
#![cfg(target_arch = "wasm32")]

mod canvas;
mod worklet;

use std::{cell::RefCell, rc::Rc, time::Duration};

use barviz_audio::{
    fetcher::WebAudioFetcher, AnalyserConfig, CaptureSource, DemoConfig, DemoSource,
    FrameSource, SampleFrame,
};
use barviz_renderer::{BarColor, BarRenderer, RenderConfig};
use wasm_bindgen::{prelude::*, JsCast};
use web_sys::HtmlCanvasElement;

pub use canvas::CanvasSurface;
pub use worklet::{Player, Recorder};

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("No window"))
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

struct Visualizer {
    renderer: BarRenderer,
    surface: CanvasSurface,
    source: FrameSource<WebAudioFetcher>,
    // filled by the subscription on `source`
    latest: Rc<RefCell<Option<SampleFrame>>>,
    start_ms: f64,
}

impl Visualizer {
    fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(((now_ms() - self.start_ms) / 1000.).max(0.))
    }

    fn new(
        renderer: BarRenderer,
        surface: CanvasSurface,
        mut source: FrameSource<WebAudioFetcher>,
    ) -> Self {
        let latest = Rc::new(RefCell::new(None));
        {
            let latest = latest.clone();
            source.subscribe(move |frame: &SampleFrame| *latest.borrow_mut() = Some(frame.clone()));
        }

        Self {
            renderer,
            surface,
            source,
            latest,
            start_ms: now_ms(),
        }
    }

    /// Lets the source publish its next frame (if there's one) and redraws.
    fn tick(&mut self) {
        let elapsed = self.elapsed();
        self.source.tick(elapsed);
        self.draw();
    }

    /// Synthesizes the next demo frame and redraws.
    fn demo_tick(&mut self) {
        if let FrameSource::Demo(demo) = &mut self.source {
            demo.next_frame();
        }
        self.draw();
    }

    fn draw(&mut self) {
        let latest = self.latest.borrow();
        self.renderer.draw(&mut self.surface, latest.as_ref());
    }

    fn update_config(&mut self, f: impl FnOnce(&mut RenderConfig)) {
        let mut config = self.renderer.config().clone();
        f(&mut config);

        self.surface.resize(config.width, config.height);
        self.renderer.set_config(config);
        self.draw();
    }
}

/// Handles of everything which is scheduled in the browser.
#[derive(Default)]
struct Schedule {
    stopped: bool,

    animation_frame: Option<i32>,
    on_animation_frame: Option<Closure<dyn FnMut()>>,

    interval: Option<i32>,
    on_interval: Option<Closure<dyn FnMut()>>,
}

impl Schedule {
    fn request_animation_frame(&mut self) -> Result<(), JsValue> {
        if self.stopped {
            return Ok(());
        }

        if let Some(closure) = self.on_animation_frame.as_ref() {
            let handle = window()?.request_animation_frame(closure.as_ref().unchecked_ref())?;
            self.animation_frame = Some(handle);
        }

        Ok(())
    }

    fn cancel(&mut self) {
        self.stopped = true;

        if let Ok(window) = window() {
            if let Some(handle) = self.animation_frame.take() {
                let _ = window.cancel_animation_frame(handle);
            }

            if let Some(handle) = self.interval.take() {
                window.clear_interval_with_handle(handle);
            }
        }

        self.on_animation_frame = None;
        self.on_interval = None;
    }
}

#[wasm_bindgen]
pub struct BarvizApp {
    visualizer: Rc<RefCell<Visualizer>>,
    schedule: Rc<RefCell<Schedule>>,
}

#[wasm_bindgen]
impl BarvizApp {
    /// Starts drawing onto the canvas with the id `canvas_id`.
    ///
    /// With `demo_mode` the bars show random values instead of the microphone.
    #[wasm_bindgen(constructor)]
    pub async fn new(canvas_id: &str, demo_mode: bool) -> Result<BarvizApp, JsValue> {
        let document = window()?.document().ok_or("No document")?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or("Canvas element not found")?
            .dyn_into()
            .map_err(|_| "Element is not a canvas")?;

        let config = RenderConfig {
            demo_mode,
            ..Default::default()
        };

        let surface = CanvasSurface::new(canvas)?;
        surface.resize(config.width, config.height);

        let source = if demo_mode {
            FrameSource::Demo(DemoSource::new(DemoConfig::default()))
        } else {
            FrameSource::from(CaptureSource::acquire(AnalyserConfig::default()).await)
        };

        let app = BarvizApp {
            visualizer: Rc::new(RefCell::new(Visualizer::new(
                BarRenderer::new(config),
                surface,
                source,
            ))),
            schedule: Rc::default(),
        };

        if demo_mode {
            app.start_interval()?;
        } else {
            app.start_animation_loop()?;
        }

        Ok(app)
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.visualizer.borrow_mut().update_config(|config| {
            config.width = width;
            config.height = height;
        });
    }

    pub fn set_bar_width(&self, bar_width: f32) {
        self.visualizer
            .borrow_mut()
            .update_config(|config| config.bar_width = bar_width);
    }

    pub fn set_bar_spacing(&self, bar_spacing: f32) {
        self.visualizer
            .borrow_mut()
            .update_config(|config| config.bar_spacing = bar_spacing);
    }

    /// Accepts every css color, for example `"red"` or `"#3498db"`.
    pub fn set_color(&self, color: &str) -> Result<(), JsValue> {
        let color = BarColor::parse(color).map_err(|err| JsValue::from_str(&err.to_string()))?;

        self.visualizer
            .borrow_mut()
            .update_config(|config| config.color = color);
        Ok(())
    }

    pub fn set_center(&self, center: bool) {
        self.visualizer
            .borrow_mut()
            .update_config(|config| config.center = center);
    }

    pub fn is_demo(&self) -> bool {
        self.visualizer.borrow().source.is_demo()
    }

    /// Stops the microphone and every scheduled redraw. Can be called multiple times.
    pub fn destroy(&self) {
        self.schedule.borrow_mut().cancel();

        let mut visualizer = self.visualizer.borrow_mut();
        visualizer.source.stop();
        visualizer.latest.replace(None);
        visualizer.draw();
    }
}

impl BarvizApp {
    fn start_animation_loop(&self) -> Result<(), JsValue> {
        let visualizer = self.visualizer.clone();
        let schedule = self.schedule.clone();

        let closure = Closure::<dyn FnMut()>::new(move || {
            if schedule.borrow().stopped {
                return;
            }

            visualizer.borrow_mut().tick();

            if let Err(err) = schedule.borrow_mut().request_animation_frame() {
                log::error!("Couldn't request the next animation frame: {:?}", err);
            }
        });

        let mut schedule = self.schedule.borrow_mut();
        schedule.on_animation_frame = Some(closure);
        schedule.request_animation_frame()
    }

    fn start_interval(&self) -> Result<(), JsValue> {
        let interval = match &self.visualizer.borrow().source {
            FrameSource::Demo(demo) => demo.interval(),
            _ => return Ok(()),
        };

        // the first frame shouldn't wait for a whole interval
        self.visualizer.borrow_mut().demo_tick();

        let visualizer = self.visualizer.clone();
        let closure = Closure::<dyn FnMut()>::new(move || visualizer.borrow_mut().demo_tick());

        let handle = window()?.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            interval.as_millis() as i32,
        )?;

        let mut schedule = self.schedule.borrow_mut();
        schedule.interval = Some(handle);
        schedule.on_interval = Some(closure);
        Ok(())
    }
}

impl Drop for BarvizApp {
    fn drop(&mut self) {
        self.destroy();
    }
}
