//! Polyphonic subtractive synthesizer engine with an insertable effects chain.
//!
//! The crate splits into a control plane ([`SynthController`]) that validates,
//! clamps and throttles incoming note/parameter/chain edits, and a render plane
//! ([`SynthEngine`]) that runs inside the real-time audio callback. The two
//! halves only talk through bounded channels and an atomic parameter table.

pub mod engine {
  pub mod config;
  pub mod error;
  pub mod messages;
  pub mod params;
  pub mod midi;
  pub mod dsp;
  pub mod voice;
  pub mod allocator;
  pub mod fx;
  pub mod graph;
  pub mod control;
  #[cfg(feature = "device")]
  pub mod audio;
}

pub use engine::config::EngineConfig;
pub use engine::control::{ChainEntry, ParamUpdate, SynthController};
pub use engine::error::EngineError;
pub use engine::graph::SynthEngine;

/// Build a connected controller/engine pair for one session.
///
/// The engine half is meant to be moved into the audio callback; the controller
/// stays on the UI/MIDI thread.
pub fn session(config: EngineConfig) -> (SynthController, SynthEngine) {
  let config = config.sanitized();
  let (msg_tx, msg_rx) = crossbeam_channel::bounded(config.queue_capacity);
  let (status_tx, status_rx) = crossbeam_channel::bounded(config.queue_capacity);
  let params = engine::params::SharedParams::new();
  let engine = SynthEngine::new(&config, params.clone(), msg_rx, status_tx);
  let controller = SynthController::new(&config, params, msg_tx, status_rx);
  log::info!("synth session ready at {} Hz", config.sample_rate);
  (controller, engine)
}
