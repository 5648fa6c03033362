use crate::engine::dsp::envelope::{Adsr, Stage};
use crate::engine::dsp::filter::{FilterBank, FilterKind};
use crate::engine::dsp::oscillator::{pulse, saw, sine, triangle, Lfo, Phasor};
use crate::engine::dsp::util::{equal_power_pan, midi_to_hz, Noise};
use crate::engine::params::{AftertouchDest, Osc2Wave, SynthParams};

/// Per-voice output trim so a full chord of hot oscillators keeps headroom.
const VOICE_GAIN: f32 = 0.2;
/// Octaves of cutoff swing at envelope amount ±1.
const ENV_OCTAVES: f32 = 6.0;
const AT_CUTOFF_OCTAVES: f32 = 4.0;
const AT_PITCH_SEMITONES: f32 = 2.0;
const AT_PULSE_WIDTH: f32 = 0.4;
const MAX_PWM_DEPTH: f32 = 0.45;

/// Values that only change between blocks.
#[derive(Clone, Copy, Debug, Default)]
struct BlockMod {
  inc1: f32,
  inc2: f32,
  vel_gain: f32,
  amp_mod: f32,
  pw_offset: f32,
  pwm_depth: f32,
  pan_depth: f32,
  cutoff_octaves: f32,
  hp_octaves: f32,
}

/// One sounding unit: two oscillators plus subs, ring and noise, two
/// envelopes, per-voice lowpass/highpass cascade and pan.
pub struct Voice {
  index: usize,
  sr: f32,
  note: Option<u8>,
  velocity: f32,
  started_at: u64,
  gate: bool,
  sustained: bool,
  osc1: Phasor,
  osc2: Phasor,
  sub1: Phasor,
  sub2: Phasor,
  noise: Noise,
  pwm_lfo: Lfo,
  pan_lfo: Lfo,
  amp_env: Adsr,
  filter_env: Adsr,
  lowpass: FilterBank,
  highpass: FilterBank,
  block: BlockMod,
}

impl Voice {
  pub fn new(index: usize, sr: f32) -> Self {
    Self {
      index,
      sr,
      note: None,
      velocity: 0.0,
      started_at: 0,
      gate: false,
      sustained: false,
      osc1: Phasor::default(),
      osc2: Phasor::default(),
      sub1: Phasor::default(),
      sub2: Phasor::default(),
      noise: Noise::new(0x9E37_79B9 ^ index as u32),
      // spread LFO starts so stacked voices do not move in lockstep
      pwm_lfo: Lfo::with_phase(index as f32 * 0.125),
      pan_lfo: Lfo::with_phase(index as f32 * 0.125 + 0.25),
      amp_env: Adsr::new(sr),
      filter_env: Adsr::new(sr),
      lowpass: FilterBank::new(FilterKind::Lowpass24, sr),
      highpass: FilterBank::new(FilterKind::Highpass18, sr),
      block: BlockMod::default(),
    }
  }

  #[inline] pub fn index(&self) -> usize { self.index }
  #[inline] pub fn note(&self) -> Option<u8> { self.note }
  #[inline] pub fn velocity(&self) -> f32 { self.velocity }
  #[inline] pub fn started_at(&self) -> u64 { self.started_at }
  #[inline] pub fn is_active(&self) -> bool { !self.amp_env.is_idle() }
  #[inline] pub fn is_releasing(&self) -> bool { self.amp_env.stage() == Stage::Release }
  #[inline] pub fn is_gated(&self) -> bool { self.gate }
  #[inline] pub fn is_sustained(&self) -> bool { self.sustained }
  pub fn osc1_phase(&self) -> f32 { self.osc1.phase() }
  pub fn amp_level(&self) -> f32 { self.amp_env.level() }

  /// Start `note`. An idle voice starts from zero phase with clean filter
  /// state; a sounding one (retrigger or steal) keeps its phases and ramps
  /// from its current envelope level.
  pub fn note_on(&mut self, note: u8, velocity: f32, stamp: u64) {
    if !self.is_active() {
      self.osc1.reset(0.0);
      self.osc2.reset(0.0);
      self.sub1.reset(0.0);
      self.sub2.reset(0.0);
      self.lowpass.reset();
      self.highpass.reset();
      self.noise.reseed((note as u32 + 1).wrapping_mul(0x2545_F491) ^ self.index as u32);
    }
    self.note = Some(note);
    self.velocity = velocity;
    self.started_at = stamp;
    self.gate = true;
    self.sustained = false;
    self.amp_env.gate_on();
    self.filter_env.gate_on();
  }

  pub fn note_off(&mut self) {
    self.gate = false;
    self.sustained = false;
    self.amp_env.gate_off();
    self.filter_env.gate_off();
  }

  /// Pedal is down: keep sounding until the pedal lifts.
  pub fn hold_for_sustain(&mut self) { self.sustained = true; }

  /// Forced short ramp to silence.
  pub fn kill(&mut self) {
    self.gate = false;
    self.sustained = false;
    self.amp_env.kill();
    self.filter_env.kill();
  }

  /// Refresh block-rate modulation. Called once per block before `next_frame`.
  pub fn prepare(&mut self, p: &SynthParams, bend: f32, pressure: f32) {
    self.amp_env.set(&p.amp_env);
    self.filter_env.set(&p.filter_env);
    let Some(note) = self.note else { return };
    let at = |d| p.aftertouch_to(d, pressure);
    let pitch = note as f32 + bend + AT_PITCH_SEMITONES * at(AftertouchDest::Pitch);
    let nyquist_inc = 0.5;
    self.block.inc1 = (midi_to_hz(pitch) / self.sr).min(nyquist_inc);
    self.block.inc2 = (midi_to_hz(pitch + p.osc2_semitones) / self.sr).min(nyquist_inc);
    let amt = p.velocity_amount;
    self.block.vel_gain = (1.0 - amt) + amt * self.velocity * self.velocity;
    self.block.amp_mod = (1.0 + at(AftertouchDest::Amplitude)).clamp(0.0, 2.0);
    self.block.pw_offset = AT_PULSE_WIDTH * at(AftertouchDest::PulseWidth);
    self.block.pwm_depth = (p.pwm_depth + MAX_PWM_DEPTH * at(AftertouchDest::PwmDepth)).clamp(0.0, MAX_PWM_DEPTH);
    self.block.pan_depth = (p.pan_lfo_depth + at(AftertouchDest::PanDepth)).clamp(0.0, 1.0);
    self.block.cutoff_octaves = AT_CUTOFF_OCTAVES * at(AftertouchDest::Cutoff);
    self.block.hp_octaves = AT_CUTOFF_OCTAVES * at(AftertouchDest::HpCutoff);
  }

  /// Render one stereo frame. Idle voices return silence without advancing.
  #[inline]
  pub fn next_frame(&mut self, p: &SynthParams) -> (f32, f32) {
    if !self.is_active() { return (0.0, 0.0); }
    let b = self.block;
    let sr = self.sr;

    let pwm = self.pwm_lfo.next(p.pwm_rate, sr) * b.pwm_depth;
    let width = (p.pulse_width + pwm + b.pw_offset).clamp(0.05, 0.95);
    let o1 = pulse(self.osc1.phase(), width, b.inc1);
    let p2 = self.osc2.phase();
    let o2 = match p.osc2_wave {
      Osc2Wave::Saw => saw(p2, b.inc2),
      Osc2Wave::Pulse => pulse(p2, 0.5, b.inc2),
      Osc2Wave::Triangle => triangle(p2),
      Osc2Wave::Sine => sine(p2),
    };
    let s1 = pulse(self.sub1.phase(), 0.5, 0.5 * b.inc1);
    let s2 = pulse(self.sub2.phase(), 0.5, 0.5 * b.inc2);
    let n = self.noise.next();

    let mix = o1 * p.osc1_volume
      + o2 * p.osc2_volume
      + s1 * p.sub1_volume
      + s2 * p.sub2_volume
      + o1 * o2 * p.ring_volume
      + n * p.noise_volume;

    let wrapped = self.osc1.advance(b.inc1);
    self.sub1.advance(0.5 * b.inc1);
    if p.osc2_sync && wrapped && b.inc1 > 0.0 {
      // restart osc2 at the fraction of a sample that has elapsed since the wrap
      self.osc2.reset(self.osc1.phase() * b.inc2 / b.inc1);
    } else {
      self.osc2.advance(b.inc2);
    }
    self.sub2.advance(0.5 * b.inc2);

    let fenv = self.filter_env.next();
    let lp_cut = p.cutoff * (ENV_OCTAVES * p.filter_env_amount * fenv + b.cutoff_octaves).exp2();
    let hp_cut = p.hp_cutoff * (ENV_OCTAVES * p.hp_env_amount * fenv + b.hp_octaves).exp2();
    self.lowpass.set(FilterKind::Lowpass24, lp_cut, p.resonance);
    self.highpass.set(FilterKind::Highpass18, hp_cut, p.hp_resonance);
    let filtered = self.highpass.process(self.lowpass.process(mix));

    let aenv = self.amp_env.next();
    let out = filtered * aenv * b.vel_gain * b.amp_mod * VOICE_GAIN;

    let pan = p.pan + self.pan_lfo.next(p.pan_lfo_rate, sr) * b.pan_depth;
    let (gl, gr) = equal_power_pan(pan);
    if !self.is_active() { self.note = None; }
    (out * gl, out * gr)
  }
}
