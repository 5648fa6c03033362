use serde::{Deserialize, Serialize};

/// Session-wide engine settings. Everything here is fixed once the session
/// starts; live sound parameters go through the parameter table instead.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
  pub sample_rate: f32,
  /// Frames per render callback the device is asked for.
  pub block_size: usize,
  /// Minimum spacing between two accepted updates of the same parameter.
  pub param_throttle_ms: f32,
  pub queue_capacity: usize,
  pub max_chain_len: usize,
  /// Cap on control messages applied per block so a burst cannot starve audio.
  pub max_drain_per_block: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      sample_rate: 48_000.0,
      block_size: 128,
      param_throttle_ms: 1.0,
      queue_capacity: 1024,
      max_chain_len: 16,
      max_drain_per_block: 64,
    }
  }
}

impl EngineConfig {
  pub fn with_sample_rate(sample_rate: f32) -> Self {
    Self { sample_rate, ..Self::default() }
  }

  /// Parse a JSON config; missing keys fall back to the defaults.
  pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
    let cfg: Self = serde_json::from_str(text)?;
    Ok(cfg.sanitized())
  }

  /// Pull every field back into a range the engine can run with.
  pub fn sanitized(mut self) -> Self {
    self.sanitize();
    self
  }

  fn sanitize(&mut self) {
    if !self.sample_rate.is_finite() || self.sample_rate < 8_000.0 { self.sample_rate = 48_000.0; }
    self.block_size = self.block_size.clamp(16, 8192);
    self.param_throttle_ms = self.param_throttle_ms.max(0.0);
    self.queue_capacity = self.queue_capacity.max(16);
    self.max_chain_len = self.max_chain_len.clamp(1, 64);
    self.max_drain_per_block = self.max_drain_per_block.max(1);
  }
}
