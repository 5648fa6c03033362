use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Declared range of one named parameter. Shared by the synth parameter table
/// and every effect's metadata so both clamp the same way.
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct ParamSpec {
  pub name: &'static str,
  pub label: &'static str,
  pub min: f32,
  pub max: f32,
  pub default: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub unit: Option<&'static str>,
}

impl ParamSpec {
  pub const fn new(name: &'static str, label: &'static str, min: f32, max: f32, default: f32, unit: Option<&'static str>) -> Self {
    Self { name, label, min, max, default, unit }
  }

  /// NaN collapses to the default so a bad float never reaches DSP state.
  #[inline]
  pub fn clamp(&self, v: f32) -> f32 {
    if v.is_nan() { self.default } else { v.clamp(self.min, self.max) }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum Param {
  Osc1PulseWidth, PwmRate, PwmDepth, Osc1Volume,
  Osc2Waveform, Osc2Coarse, Osc2Fine, Osc2Volume, Osc2Sync,
  Sub1Volume, Sub2Volume, RingVolume, NoiseVolume,
  AmpAttack, AmpDecay, AmpSustain, AmpRelease,
  FilterAttack, FilterDecay, FilterSustain, FilterRelease,
  Cutoff, Resonance, FilterEnvAmount,
  HpCutoff, HpResonance, HpEnvAmount,
  VelocityAmount,
  AftertouchDest1, AftertouchAmount1, AftertouchDest2, AftertouchAmount2,
  AftertouchDest3, AftertouchAmount3, AftertouchDest4, AftertouchAmount4,
  Pan, PanLfoRate, PanLfoDepth,
  PitchBendRange, MasterVolume,
}

pub const PARAM_COUNT: usize = 41;

const HZ: Option<&str> = Some("Hz");
const SEC: Option<&str> = Some("s");

/// Synth parameter table, indexed by `Param as usize`.
pub static PARAMS: [ParamSpec; PARAM_COUNT] = [
  ParamSpec::new("osc1_pulse_width", "Pulse Width", 0.05, 0.95, 0.5, None),
  ParamSpec::new("pwm_rate", "PWM Rate", 0.01, 20.0, 0.8, HZ),
  ParamSpec::new("pwm_depth", "PWM Depth", 0.0, 0.45, 0.0, None),
  ParamSpec::new("osc1_volume", "Osc 1", 0.0, 1.0, 0.8, None),
  ParamSpec::new("osc2_waveform", "Osc 2 Wave", 0.0, 3.0, 0.0, None),
  ParamSpec::new("osc2_coarse", "Osc 2 Coarse", -24.0, 24.0, 0.0, Some("st")),
  ParamSpec::new("osc2_fine", "Osc 2 Fine", -100.0, 100.0, 0.0, Some("cents")),
  ParamSpec::new("osc2_volume", "Osc 2", 0.0, 1.0, 0.0, None),
  ParamSpec::new("osc2_sync", "Sync", 0.0, 1.0, 0.0, None),
  ParamSpec::new("sub1_volume", "Sub 1", 0.0, 1.0, 0.0, None),
  ParamSpec::new("sub2_volume", "Sub 2", 0.0, 1.0, 0.0, None),
  ParamSpec::new("ring_volume", "Ring Mod", 0.0, 1.0, 0.0, None),
  ParamSpec::new("noise_volume", "Noise", 0.0, 1.0, 0.0, None),
  ParamSpec::new("amp_attack", "Attack", 0.0, 10.0, 0.005, SEC),
  ParamSpec::new("amp_decay", "Decay", 0.0, 10.0, 0.3, SEC),
  ParamSpec::new("amp_sustain", "Sustain", 0.0, 1.0, 0.8, None),
  ParamSpec::new("amp_release", "Release", 0.0, 10.0, 0.3, SEC),
  ParamSpec::new("filter_attack", "Filter Attack", 0.0, 10.0, 0.01, SEC),
  ParamSpec::new("filter_decay", "Filter Decay", 0.0, 10.0, 0.4, SEC),
  ParamSpec::new("filter_sustain", "Filter Sustain", 0.0, 1.0, 0.5, None),
  ParamSpec::new("filter_release", "Filter Release", 0.0, 10.0, 0.4, SEC),
  ParamSpec::new("cutoff", "Cutoff", 20.0, 20_000.0, 6_000.0, HZ),
  ParamSpec::new("resonance", "Resonance", 0.0, 0.99, 0.1, None),
  ParamSpec::new("filter_env_amount", "Filter Env", -1.0, 1.0, 0.0, None),
  ParamSpec::new("hp_cutoff", "HP Cutoff", 10.0, 10_000.0, 10.0, HZ),
  ParamSpec::new("hp_resonance", "HP Resonance", 0.0, 0.99, 0.0, None),
  ParamSpec::new("hp_env_amount", "HP Env", -1.0, 1.0, 0.0, None),
  ParamSpec::new("velocity_amount", "Velocity", 0.0, 1.0, 0.7, None),
  ParamSpec::new("aftertouch_dest_1", "AT Dest 1", 0.0, 7.0, 0.0, None),
  ParamSpec::new("aftertouch_amount_1", "AT Amount 1", -1.0, 1.0, 0.0, None),
  ParamSpec::new("aftertouch_dest_2", "AT Dest 2", 0.0, 7.0, 0.0, None),
  ParamSpec::new("aftertouch_amount_2", "AT Amount 2", -1.0, 1.0, 0.0, None),
  ParamSpec::new("aftertouch_dest_3", "AT Dest 3", 0.0, 7.0, 0.0, None),
  ParamSpec::new("aftertouch_amount_3", "AT Amount 3", -1.0, 1.0, 0.0, None),
  ParamSpec::new("aftertouch_dest_4", "AT Dest 4", 0.0, 7.0, 0.0, None),
  ParamSpec::new("aftertouch_amount_4", "AT Amount 4", -1.0, 1.0, 0.0, None),
  ParamSpec::new("pan", "Pan", -1.0, 1.0, 0.0, None),
  ParamSpec::new("pan_lfo_rate", "Pan LFO Rate", 0.01, 20.0, 0.3, HZ),
  ParamSpec::new("pan_lfo_depth", "Pan LFO Depth", 0.0, 1.0, 0.0, None),
  ParamSpec::new("pitch_bend_range", "Bend Range", 0.0, 24.0, 2.0, Some("st")),
  ParamSpec::new("master_volume", "Volume", 0.0, 1.0, 0.7, None),
];

impl Param {
  #[inline]
  pub fn spec(self) -> &'static ParamSpec { &PARAMS[self as usize] }

  pub fn from_name(name: &str) -> Option<Param> {
    PARAMS.iter().position(|p| p.name == name).map(Param::from_index)
  }

  fn from_index(i: usize) -> Param {
    use Param::*;
    const ALL: [Param; PARAM_COUNT] = [
      Osc1PulseWidth, PwmRate, PwmDepth, Osc1Volume,
      Osc2Waveform, Osc2Coarse, Osc2Fine, Osc2Volume, Osc2Sync,
      Sub1Volume, Sub2Volume, RingVolume, NoiseVolume,
      AmpAttack, AmpDecay, AmpSustain, AmpRelease,
      FilterAttack, FilterDecay, FilterSustain, FilterRelease,
      Cutoff, Resonance, FilterEnvAmount,
      HpCutoff, HpResonance, HpEnvAmount,
      VelocityAmount,
      AftertouchDest1, AftertouchAmount1, AftertouchDest2, AftertouchAmount2,
      AftertouchDest3, AftertouchAmount3, AftertouchDest4, AftertouchAmount4,
      Pan, PanLfoRate, PanLfoDepth,
      PitchBendRange, MasterVolume,
    ];
    ALL[i]
  }
}

/// JSON dump of the synth parameter table for UI collaborators.
pub fn param_table_json() -> String {
  serde_json::to_string(&PARAMS[..]).unwrap_or_else(|_| "[]".to_string())
}

/// Lock-free parameter table shared between control and render threads.
/// Values are f32 bit patterns; the render side snapshots once per block.
#[derive(Clone)]
pub struct SharedParams {
  values: Arc<[AtomicU32]>,
}

impl SharedParams {
  pub fn new() -> Self {
    let values: Vec<AtomicU32> = PARAMS.iter().map(|p| AtomicU32::new(p.default.to_bits())).collect();
    Self { values: values.into() }
  }

  #[inline]
  pub fn store(&self, p: Param, v: f32) { self.values[p as usize].store(v.to_bits(), Ordering::Relaxed); }

  #[inline]
  pub fn load(&self, p: Param) -> f32 { f32::from_bits(self.values[p as usize].load(Ordering::Relaxed)) }

  pub fn snapshot(&self, out: &mut [f32; PARAM_COUNT]) {
    for (dst, src) in out.iter_mut().zip(self.values.iter()) {
      *dst = f32::from_bits(src.load(Ordering::Relaxed));
    }
  }
}

impl Default for SharedParams {
  fn default() -> Self { Self::new() }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Osc2Wave { Saw, Pulse, Triangle, Sine }

impl Osc2Wave {
  fn from_value(v: f32) -> Self {
    match v.round() as i32 { 1 => Osc2Wave::Pulse, 2 => Osc2Wave::Triangle, 3 => Osc2Wave::Sine, _ => Osc2Wave::Saw }
  }
}

/// Where one aftertouch slot is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AftertouchDest { None, Cutoff, Amplitude, PulseWidth, Pitch, PwmDepth, PanDepth, HpCutoff }

impl AftertouchDest {
  fn from_value(v: f32) -> Self {
    use AftertouchDest::*;
    match v.round() as i32 { 1 => Cutoff, 2 => Amplitude, 3 => PulseWidth, 4 => Pitch, 5 => PwmDepth, 6 => PanDepth, 7 => HpCutoff, _ => None }
  }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdsrParams { pub attack: f32, pub decay: f32, pub sustain: f32, pub release: f32 }

/// Typed view of one block's parameter snapshot, handed to every voice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SynthParams {
  pub pulse_width: f32,
  pub pwm_rate: f32,
  pub pwm_depth: f32,
  pub osc1_volume: f32,
  pub osc2_wave: Osc2Wave,
  pub osc2_semitones: f32,
  pub osc2_volume: f32,
  pub osc2_sync: bool,
  pub sub1_volume: f32,
  pub sub2_volume: f32,
  pub ring_volume: f32,
  pub noise_volume: f32,
  pub amp_env: AdsrParams,
  pub filter_env: AdsrParams,
  pub cutoff: f32,
  pub resonance: f32,
  pub filter_env_amount: f32,
  pub hp_cutoff: f32,
  pub hp_resonance: f32,
  pub hp_env_amount: f32,
  pub velocity_amount: f32,
  pub aftertouch: [(AftertouchDest, f32); 4],
  pub pan: f32,
  pub pan_lfo_rate: f32,
  pub pan_lfo_depth: f32,
  pub master_volume: f32,
}

impl SynthParams {
  pub fn from_values(v: &[f32; PARAM_COUNT]) -> Self {
    let g = |p: Param| p.spec().clamp(v[p as usize]);
    let at = |d: Param, a: Param| (AftertouchDest::from_value(g(d)), g(a));
    Self {
      pulse_width: g(Param::Osc1PulseWidth),
      pwm_rate: g(Param::PwmRate),
      pwm_depth: g(Param::PwmDepth),
      osc1_volume: g(Param::Osc1Volume),
      osc2_wave: Osc2Wave::from_value(g(Param::Osc2Waveform)),
      osc2_semitones: g(Param::Osc2Coarse).round() + g(Param::Osc2Fine) / 100.0,
      osc2_volume: g(Param::Osc2Volume),
      osc2_sync: g(Param::Osc2Sync) >= 0.5,
      sub1_volume: g(Param::Sub1Volume),
      sub2_volume: g(Param::Sub2Volume),
      ring_volume: g(Param::RingVolume),
      noise_volume: g(Param::NoiseVolume),
      amp_env: AdsrParams { attack: g(Param::AmpAttack), decay: g(Param::AmpDecay), sustain: g(Param::AmpSustain), release: g(Param::AmpRelease) },
      filter_env: AdsrParams { attack: g(Param::FilterAttack), decay: g(Param::FilterDecay), sustain: g(Param::FilterSustain), release: g(Param::FilterRelease) },
      cutoff: g(Param::Cutoff),
      resonance: g(Param::Resonance),
      filter_env_amount: g(Param::FilterEnvAmount),
      hp_cutoff: g(Param::HpCutoff),
      hp_resonance: g(Param::HpResonance),
      hp_env_amount: g(Param::HpEnvAmount),
      velocity_amount: g(Param::VelocityAmount),
      aftertouch: [
        at(Param::AftertouchDest1, Param::AftertouchAmount1),
        at(Param::AftertouchDest2, Param::AftertouchAmount2),
        at(Param::AftertouchDest3, Param::AftertouchAmount3),
        at(Param::AftertouchDest4, Param::AftertouchAmount4),
      ],
      pan: g(Param::Pan),
      pan_lfo_rate: g(Param::PanLfoRate),
      pan_lfo_depth: g(Param::PanLfoDepth),
      master_volume: g(Param::MasterVolume),
    }
  }

  pub fn defaults() -> Self {
    let mut v = [0.0; PARAM_COUNT];
    for (dst, spec) in v.iter_mut().zip(PARAMS.iter()) { *dst = spec.default; }
    Self::from_values(&v)
  }

  /// Sum of aftertouch contributions routed to `dest`, already scaled by the
  /// current pressure.
  #[inline]
  pub fn aftertouch_to(&self, dest: AftertouchDest, pressure: f32) -> f32 {
    let mut sum = 0.0;
    for &(d, amt) in self.aftertouch.iter() {
      if d == dest { sum += amt * pressure; }
    }
    sum
  }
}

impl Default for SynthParams {
  fn default() -> Self { Self::defaults() }
}
