//! Browser exports for the reaction visualizer.
//!
//! One `VisualizerRunner` lives in thread-local storage. The host calls
//! `reaction_init` once, then `reaction_tick(dt)` every animation frame,
//! reads the header and instances through the pointer accessors, and
//! drains UI events as JSON.

pub mod runner;

pub use runner::VisualizerRunner;

use std::cell::RefCell;

use reaction_engine::{ReactionError, TransportCommand, VisualizerConfig};
use wasm_bindgen::prelude::*;

thread_local! {
    static RUNNER: RefCell<Option<VisualizerRunner>> = const { RefCell::new(None) };
}

/// Run `f` against the runner, or `None` before `reaction_init`.
fn with_runner<R>(f: impl FnOnce(&mut VisualizerRunner) -> R) -> Option<R> {
    RUNNER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        match borrow.as_mut() {
            Some(runner) => Some(f(runner)),
            None => {
                web_sys::console::warn_1(&JsValue::from_str(
                    "reaction visualizer not initialized; call reaction_init() first",
                ));
                None
            }
        }
    })
}

/// Failures become JS exceptions; so does calling before init.
fn settle<T>(result: Option<Result<T, ReactionError>>) -> Result<T, JsValue> {
    match result {
        Some(result) => result.map_err(|e| js_sys::Error::new(&e.to_string()).into()),
        None => Err(js_sys::Error::new("reaction visualizer not initialized").into()),
    }
}

fn command(command: TransportCommand) {
    with_runner(|r| r.push_command(command));
}

#[wasm_bindgen]
pub fn reaction_init(config_json: Option<String>) {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let config = match config_json.as_deref().map(VisualizerConfig::from_json) {
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            log::warn!("bad visualizer config, using defaults: {}", e);
            VisualizerConfig::default()
        }
        None => VisualizerConfig::default(),
    };
    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(VisualizerRunner::new(config));
    });
    log::info!("reaction visualizer: initialized");
}

#[wasm_bindgen]
pub fn reaction_tick(dt: f32) -> f32 {
    with_runner(|r| r.tick(dt)).unwrap_or(0.0)
}

// ---- Generation ----

/// Returns the trimmed prompt to send to the AI backend.
#[wasm_bindgen]
pub fn reaction_begin_generation(prompt: &str) -> Result<String, JsValue> {
    settle(with_runner(|r| r.begin_generation(prompt)))
}

#[wasm_bindgen]
pub fn reaction_finish_generation(response: &str) -> Result<(), JsValue> {
    settle(with_runner(|r| r.finish_generation(response)))
}

#[wasm_bindgen]
pub fn reaction_fail_generation(message: &str) -> Result<(), JsValue> {
    settle(with_runner(|r| r.fail_generation(message)))
}

#[wasm_bindgen]
pub fn reaction_load_plan(text: &str) -> Result<(), JsValue> {
    settle(with_runner(|r| r.load_plan(text)))
}

// ---- Transport ----

#[wasm_bindgen]
pub fn reaction_play() {
    command(TransportCommand::Play);
}

#[wasm_bindgen]
pub fn reaction_pause() {
    command(TransportCommand::Pause);
}

#[wasm_bindgen]
pub fn reaction_restart() {
    command(TransportCommand::Restart);
}

#[wasm_bindgen]
pub fn reaction_seek(progress: f32) {
    command(TransportCommand::Seek(progress));
}

#[wasm_bindgen]
pub fn reaction_set_speed(speed: f32) {
    command(TransportCommand::SetSpeed(speed));
}

#[wasm_bindgen]
pub fn reaction_set_explanation_mode(enabled: bool) {
    command(TransportCommand::SetExplanationMode(enabled));
}

#[wasm_bindgen]
pub fn reaction_continue_explanation() {
    command(TransportCommand::ContinueExplanation);
}

#[wasm_bindgen]
pub fn reaction_stop() {
    with_runner(|r| r.stop());
}

// ---- UI data ----

#[wasm_bindgen]
pub fn drain_events_json() -> String {
    with_runner(|r| r.drain_events_json()).unwrap_or_else(|| "[]".into())
}

#[wasm_bindgen]
pub fn legend_json() -> String {
    with_runner(|r| r.legend_json()).unwrap_or_else(|| "[]".into())
}

#[wasm_bindgen]
pub fn describe_json(node: u32) -> String {
    with_runner(|r| r.describe_json(node)).unwrap_or_else(|| "null".into())
}

#[wasm_bindgen]
pub fn get_progress() -> f32 {
    with_runner(|r| r.progress()).unwrap_or(0.0)
}

#[wasm_bindgen]
pub fn get_state_code() -> f32 {
    with_runner(|r| r.state_code()).unwrap_or(0.0)
}

// ---- Data accessors ----

#[wasm_bindgen]
pub fn get_header_ptr() -> *const f32 {
    with_runner(|r| r.header_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_instances_ptr() -> *const f32 {
    with_runner(|r| r.instances_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_instance_count() -> u32 {
    with_runner(|r| r.instance_count()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_additive_split() -> u32 {
    with_runner(|r| r.additive_split()).unwrap_or(0)
}

// ---- Capacity accessors ----

#[wasm_bindgen]
pub fn get_max_instances() -> u32 {
    with_runner(|r| r.max_instances()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_buffer_total_floats() -> u32 {
    with_runner(|r| r.buffer_total_floats()).unwrap_or(0)
}
