//! Thin wrappers around the playback and recording audio worklets.
//!
//! The worklet scripts themselves are served by the page. The wrappers only
//! create the nodes and pass messages through their ports.
use std::{cell::RefCell, rc::Rc};

use barviz_audio::{
    worklet::{to_i16, PlaybackMessage},
    SampleRate,
};
use js_sys::{Float32Array, Function, Int16Array, Object, Promise, Reflect};
use wasm_bindgen::{prelude::*, JsCast};
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{
    AudioContext, AudioContextOptions, AudioWorkletNode, AudioWorkletNodeOptions, MediaStream,
    MediaStreamTrack, MessageEvent,
};

const PLAYBACK_PROCESSOR: &str = "playback-worklet";
const PLAYBACK_MODULE: &str = "playback-worklet.js";

const RECORDER_PROCESSOR: &str = "recorder-worklet";
const RECORDER_MODULE: &str = "./record-worklet.js";
const RECORDER_SAMPLE_RATE: SampleRate = 24_000;

async fn load_worklet(
    context: &AudioContext,
    module: &str,
    processor: &str,
    options: Option<&AudioWorkletNodeOptions>,
) -> Result<AudioWorkletNode, JsValue> {
    JsFuture::from(context.audio_worklet()?.add_module(module)?).await?;

    match options {
        Some(options) => AudioWorkletNode::new_with_options(context, processor, options),
        None => AudioWorkletNode::new(context, processor),
    }
}

/// Plays 16 bit PCM buffers through the playback worklet.
#[wasm_bindgen]
#[derive(Default)]
pub struct Player {
    node: Rc<RefCell<Option<AudioWorkletNode>>>,
}

#[wasm_bindgen]
impl Player {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the audio context and the playback node. Does nothing if it's already initialised.
    pub fn init(&self, sample_rate: SampleRate) -> Promise {
        let slot = self.node.clone();

        future_to_promise(async move {
            if slot.borrow().is_some() {
                return Ok(JsValue::UNDEFINED);
            }

            let options = AudioContextOptions::new();
            options.set_sample_rate(sample_rate as f32);
            let context = AudioContext::new_with_context_options(&options)?;

            let node = load_worklet(&context, PLAYBACK_MODULE, PLAYBACK_PROCESSOR, None).await?;
            node.connect_with_audio_node(&context.destination())?;

            *slot.borrow_mut() = Some(node);
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Queues `buffer` for playback. An empty buffer drops everything which is queued.
    pub fn play(&self, buffer: Vec<i16>) -> Result<(), JsValue> {
        self.post(PlaybackMessage::from(Some(buffer)))
    }

    /// Same as [Player::play] but converts the samples to 16 bit first.
    pub fn play_f32(&self, buffer: &[f32]) -> Result<(), JsValue> {
        self.play(to_i16(buffer))
    }

    /// Drops all queued audio.
    pub fn clear(&self) -> Result<(), JsValue> {
        self.post(PlaybackMessage::Clear)
    }
}

impl Player {
    fn post(&self, msg: PlaybackMessage) -> Result<(), JsValue> {
        let node = self.node.borrow();
        let Some(node) = node.as_ref() else {
            return Ok(());
        };

        let value = match msg {
            PlaybackMessage::Enqueue(samples) => {
                JsValue::from(Int16Array::from(samples.as_slice()))
            }
            PlaybackMessage::Clear => JsValue::NULL,
        };

        node.port()?.post_message(&value)
    }
}

#[derive(Default)]
struct RecorderState {
    context: Option<AudioContext>,
    stream: Option<MediaStream>,
    node: Option<AudioWorkletNode>,
    // keeps the message handler of the port alive
    on_message: Option<Closure<dyn FnMut(MessageEvent)>>,
}

impl RecorderState {
    fn stop(&mut self) {
        if let Some(node) = self.node.take() {
            if let Ok(port) = node.port() {
                port.set_onmessage(None);
            }
            let _ = node.disconnect();
        }
        self.on_message = None;

        if let Some(stream) = self.stream.take() {
            for track in stream.get_tracks().iter() {
                if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                    track.stop();
                }
            }
        }

        if let Some(context) = self.context.take() {
            let _ = context.close();
        }
    }
}

/// Streams the raw `f32` buffers of a microphone stream to a callback.
#[wasm_bindgen]
pub struct Recorder {
    on_data: Function,
    state: Rc<RefCell<RecorderState>>,
}

#[wasm_bindgen]
impl Recorder {
    /// `on_data` gets called with the raw `ArrayBuffer` of each buffer the worklet posts.
    #[wasm_bindgen(constructor)]
    pub fn new(on_data: Function) -> Self {
        Self {
            on_data,
            state: Rc::default(),
        }
    }

    /// Starts recording `stream`. Everything gets released again if this fails.
    pub fn start(&self, stream: MediaStream) -> Promise {
        let state = self.state.clone();
        let on_data = self.on_data.clone();

        future_to_promise(async move {
            state.borrow_mut().stream = Some(stream.clone());

            let result = connect(&state, &stream, on_data).await;
            if let Err(err) = &result {
                log::warn!("Couldn't start recording: {:?}", err);
                state.borrow_mut().stop();
            }

            result.map(|_| JsValue::UNDEFINED)
        })
    }

    /// Stops all tracks of the stream and closes the audio context. Can be called multiple times.
    pub fn stop(&self) {
        self.state.borrow_mut().stop();
    }
}

async fn connect(
    state: &RefCell<RecorderState>,
    stream: &MediaStream,
    on_data: Function,
) -> Result<(), JsValue> {
    let options = AudioContextOptions::new();
    options.set_sample_rate(RECORDER_SAMPLE_RATE as f32);
    Reflect::set(&options, &"latencyHint".into(), &"interactive".into())?;
    let context = AudioContext::new_with_context_options(&options)?;
    state.borrow_mut().context = Some(context.clone());

    let source = context.create_media_stream_source(stream)?;

    let node_options = AudioWorkletNodeOptions::new();
    node_options.set_number_of_inputs(1);
    node_options.set_number_of_outputs(1);
    let processor_options = Object::new();
    Reflect::set(
        &processor_options,
        &"sampleRate".into(),
        &JsValue::from(RECORDER_SAMPLE_RATE),
    )?;
    Reflect::set(&node_options, &"processorOptions".into(), &processor_options)?;
    let node = load_worklet(
        &context,
        RECORDER_MODULE,
        RECORDER_PROCESSOR,
        Some(&node_options),
    )
    .await?;
    node.set_channel_count(1);

    let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
        // the worklet posts a Float32Array, the callback gets its raw buffer
        let buffer = Float32Array::new(&event.data()).buffer();
        if let Err(err) = on_data.call1(&JsValue::NULL, &buffer) {
            log::error!("Recorder callback failed: {:?}", err);
        }
    });
    node.port()?
        .set_onmessage(Some(on_message.as_ref().unchecked_ref()));

    source.connect_with_audio_node(&node)?;
    node.connect_with_audio_node(&context.destination())?;

    let mut state = state.borrow_mut();
    state.node = Some(node);
    state.on_message = Some(on_message);
    Ok(())
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.stop();
    }
}
