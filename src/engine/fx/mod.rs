//! Insert effects. Every unit implements [`EffectUnit`]; units are built by id
//! through [`create`] and run in order inside a [`chain::FxChain`].

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::engine::error::EngineError;
use crate::engine::params::ParamSpec;

pub mod autowah;
pub mod bitcrusher;
pub mod chain;
pub mod chorus;
pub mod delay;
pub mod flanger;
pub mod freq_shifter;
pub mod hardclip;
pub mod phaser;
pub mod pitch_shifter;
pub mod reverb;
pub mod tremolo;

/// Static description of an effect kind, serialised for UI collaborators.
#[derive(Debug, Serialize)]
pub struct EffectMetadata {
  pub id: &'static str,
  pub name: &'static str,
  pub parameters: &'static [ParamSpec],
}

impl EffectMetadata {
  pub fn param_index(&self, name: &str) -> Option<usize> {
    self.parameters.iter().position(|p| p.name == name)
  }
}

/// Uniform per-sample contract shared by all insert effects.
pub trait EffectUnit: Send {
  fn metadata(&self) -> &'static EffectMetadata;

  fn process(&mut self, l: f32, r: f32) -> (f32, f32);

  /// Store an already clamped value. Called only through `set_param`.
  #[doc(hidden)]
  fn apply_param(&mut self, index: usize, value: f32);

  /// Set parameter `index` (position in `metadata().parameters`). The value
  /// is clamped to the declared range; out-of-range indices are ignored.
  fn set_param(&mut self, index: usize, value: f32) {
    if let Some(spec) = self.metadata().parameters.get(index) {
      self.apply_param(index, spec.clamp(value));
    }
  }

  /// Clear buffers and phases; parameter values are kept.
  fn reset(&mut self);

  /// Name-based variant of `set_param`. Returns the clamped value applied.
  fn on_parameter_change(&mut self, name: &str, value: f32) -> Result<f32, EngineError> {
    let meta = self.metadata();
    let index = meta.param_index(name).ok_or_else(|| EngineError::UnknownParam(name.to_string()))?;
    let v = meta.parameters[index].clamp(value);
    self.apply_param(index, v);
    Ok(v)
  }
}

/// A unit placed in the chain, with its instance id and bypass flag.
pub struct EffectSlot {
  pub instance: u32,
  enabled: bool,
  unit: Box<dyn EffectUnit>,
}

impl EffectSlot {
  pub fn new(instance: u32, unit: Box<dyn EffectUnit>) -> Self { Self { instance, enabled: true, unit } }

  pub fn effect_id(&self) -> &'static str { self.unit.metadata().id }
  pub fn metadata(&self) -> &'static EffectMetadata { self.unit.metadata() }
  pub fn is_enabled(&self) -> bool { self.enabled }
  pub fn set_enabled(&mut self, enabled: bool) { self.enabled = enabled; }
  #[cfg(test)]
  pub(crate) fn unit_mut(&mut self) -> &mut dyn EffectUnit { self.unit.as_mut() }

  /// Disabled slots pass audio through untouched and do not advance state.
  #[inline]
  pub fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
    if self.enabled { self.unit.process(l, r) } else { (l, r) }
  }

  pub fn set_param(&mut self, index: usize, value: f32) { self.unit.set_param(index, value); }

  pub fn reset(&mut self) { self.unit.reset(); }
}

type Constructor = fn(f32) -> Box<dyn EffectUnit>;

/// Registration order is the order `registry()` reports.
static EFFECTS: [(&EffectMetadata, Constructor); 11] = [
  (&delay::METADATA, |sr| Box::new(delay::Delay::new(sr))),
  (&reverb::METADATA, |sr| Box::new(reverb::Reverb::new(sr))),
  (&chorus::METADATA, |sr| Box::new(chorus::Chorus::new(sr))),
  (&flanger::METADATA, |sr| Box::new(flanger::Flanger::new(sr))),
  (&phaser::METADATA, |sr| Box::new(phaser::Phaser::new(sr))),
  (&tremolo::METADATA, |sr| Box::new(tremolo::Tremolo::new(sr))),
  (&autowah::METADATA, |sr| Box::new(autowah::AutoWah::new(sr))),
  (&bitcrusher::METADATA, |_| Box::new(bitcrusher::BitCrusher::new())),
  (&hardclip::METADATA, |_| Box::new(hardclip::HardClip::new())),
  (&freq_shifter::METADATA, |sr| Box::new(freq_shifter::FreqShifter::new(sr))),
  (&pitch_shifter::METADATA, |sr| Box::new(pitch_shifter::PitchShifter::new(sr))),
];

static FACTORY: Lazy<HashMap<&'static str, Constructor>> =
  Lazy::new(|| EFFECTS.iter().map(|(meta, ctor)| (meta.id, *ctor)).collect());

/// Metadata of every available effect kind.
pub fn registry() -> impl Iterator<Item = &'static EffectMetadata> {
  EFFECTS.iter().map(|(meta, _)| *meta)
}

pub fn lookup(id: &str) -> Option<&'static EffectMetadata> {
  registry().find(|m| m.id == id)
}

/// Build a unit by id. Allocates; call from the control thread.
pub fn create(id: &str, sample_rate: f32, instance: u32) -> Result<EffectSlot, EngineError> {
  let ctor = FACTORY.get(id).ok_or_else(|| EngineError::UnknownEffect(id.to_string()))?;
  Ok(EffectSlot::new(instance, ctor(sample_rate)))
}

pub fn metadata_json() -> String {
  let all: Vec<&EffectMetadata> = registry().collect();
  serde_json::to_string(&all).unwrap_or_else(|_| "[]".to_string())
}

/// Dry/wet crossfade shared by the units.
#[inline]
pub(crate) fn mix(dry: f32, wet: f32, amount: f32) -> f32 { dry + (wet - dry) * amount }
