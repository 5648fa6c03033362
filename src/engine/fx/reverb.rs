use freeverb::Freeverb;

use super::{mix, EffectMetadata, EffectUnit};
use crate::engine::params::ParamSpec;

static PARAMS: [ParamSpec; 4] = [
  ParamSpec::new("room_size", "Room", 0.0, 1.0, 0.5, None),
  ParamSpec::new("damping", "Damping", 0.0, 1.0, 0.5, None),
  ParamSpec::new("width", "Width", 0.0, 1.0, 0.9, None),
  ParamSpec::new("mix", "Mix", 0.0, 1.0, 0.25, None),
];

pub static METADATA: EffectMetadata = EffectMetadata { id: "reverb", name: "Reverb", parameters: &PARAMS };

/// Gentle high-cut on the wet return.
#[derive(Clone, Debug)]
struct OnePoleLp { a: f32, y: f32 }

impl OnePoleLp {
  fn new() -> Self { Self { a: 0.5, y: 0.0 } }
  #[inline] fn set_hf_damp(&mut self, amt: f32) { self.a = 0.9 - 0.6 * amt.clamp(0.0, 1.0); }
  #[inline] fn tick(&mut self, x: f32) -> f32 { self.y += self.a * (x - self.y); self.y }
}

/// Freeverb tank with a one-pole damping filter on the wet signal.
pub struct Reverb {
  sr: f32,
  core: Freeverb,
  lp_l: OnePoleLp,
  lp_r: OnePoleLp,
  room: f32,
  damping: f32,
  width: f32,
  wet: f32,
}

impl Reverb {
  pub fn new(sr: f32) -> Self {
    let mut rv = Self {
      sr,
      core: Freeverb::new(sr as usize),
      lp_l: OnePoleLp::new(),
      lp_r: OnePoleLp::new(),
      room: PARAMS[0].default,
      damping: PARAMS[1].default,
      width: PARAMS[2].default,
      wet: PARAMS[3].default,
    };
    rv.apply();
    rv
  }

  fn apply(&mut self) {
    self.core.set_room_size(self.room as f64);
    self.core.set_dampening(self.damping as f64);
    self.core.set_width(self.width as f64);
    self.core.set_wet(1.0);
    self.core.set_dry(0.0);
    self.lp_l.set_hf_damp(self.damping);
    self.lp_r.set_hf_damp(self.damping);
  }
}

impl EffectUnit for Reverb {
  fn metadata(&self) -> &'static EffectMetadata { &METADATA }

  fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
    let (wl, wr) = self.core.tick((l as f64, r as f64));
    let wl = self.lp_l.tick(wl as f32);
    let wr = self.lp_r.tick(wr as f32);
    (mix(l, wl, self.wet), mix(r, wr, self.wet))
  }

  fn apply_param(&mut self, index: usize, value: f32) {
    match index {
      0 => self.room = value,
      1 => self.damping = value,
      2 => self.width = value,
      3 => { self.wet = value; return; }
      _ => return,
    }
    self.apply();
  }

  /// Freeverb has no clear; rebuild the tank. Only ever called off the
  /// render thread.
  fn reset(&mut self) {
    self.core = Freeverb::new(self.sr as usize);
    self.lp_l = OnePoleLp::new();
    self.lp_r = OnePoleLp::new();
    self.apply();
  }
}
