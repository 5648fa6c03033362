use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::{debug, info, warn};
use serde::Serialize;

use super::config::EngineConfig;
use super::error::EngineError;
use super::fx;
use super::messages::{EngineMsg, EngineStatus};
use super::midi::{self, MidiMessage};
use super::params::{Param, SharedParams};

/// Outcome of a parameter write that passed validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamUpdate {
  /// Stored; carries the value after clamping.
  Applied(f32),
  /// Arrived inside the throttle window and was dropped.
  Throttled,
}

/// Control-side view of one chain slot.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ChainEntry {
  pub instance: u32,
  pub effect_id: &'static str,
  pub enabled: bool,
  /// Current values, in metadata parameter order.
  pub values: Vec<f32>,
}

impl ChainEntry {
  pub fn value(&self, name: &str) -> Option<f32> {
    let idx = fx::lookup(self.effect_id)?.param_index(name)?;
    self.values.get(idx).copied()
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum ThrottleKey {
  Synth(usize),
  Effect(u32, usize),
}

/// Per-parameter minimum spacing between accepted updates.
struct Throttle {
  min_gap: Duration,
  last: HashMap<ThrottleKey, Instant>,
}

impl Throttle {
  fn new(min_gap_ms: f32) -> Self {
    let ms = if min_gap_ms.is_finite() { min_gap_ms.max(0.0) } else { 0.0 };
    Self { min_gap: Duration::from_secs_f32(ms / 1000.0), last: HashMap::new() }
  }

  fn allow(&mut self, key: ThrottleKey, now: Instant) -> bool {
    if self.min_gap.is_zero() { return true; }
    match self.last.get(&key) {
      Some(&t) if now.duration_since(t) < self.min_gap => false,
      _ => { self.last.insert(key, now); true }
    }
  }

  fn forget_instance(&mut self, instance: u32) {
    self.last.retain(|k, _| !matches!(k, ThrottleKey::Effect(i, _) if *i == instance));
  }
}

/// Control half of a session: validates, clamps and throttles requests, then
/// forwards them to the render engine. Lives on a UI/MIDI thread.
pub struct SynthController {
  sr: f32,
  params: SharedParams,
  tx: Sender<EngineMsg>,
  status: Receiver<EngineStatus>,
  throttle: Throttle,
  chain: Vec<ChainEntry>,
  max_chain_len: usize,
  next_instance: u32,
  voice_count: usize,
}

impl SynthController {
  pub fn new(config: &EngineConfig, params: SharedParams, tx: Sender<EngineMsg>, status: Receiver<EngineStatus>) -> Self {
    let config = &config.clone().sanitized();
    Self {
      sr: config.sample_rate,
      params,
      tx,
      status,
      throttle: Throttle::new(config.param_throttle_ms),
      chain: Vec::with_capacity(config.max_chain_len),
      max_chain_len: config.max_chain_len,
      next_instance: 1,
      voice_count: 0,
    }
  }

  fn send(&self, msg: EngineMsg) -> Result<(), EngineError> {
    self.tx.try_send(msg).map_err(|e| match e {
      TrySendError::Full(msg) => {
        warn!("control queue full, dropping {msg:?}");
        EngineError::QueueFull
      }
      TrySendError::Disconnected(_) => EngineError::Disconnected,
    })
  }

  fn check_note(note: i32) -> Result<u8, EngineError> {
    if (0..=127).contains(&note) {
      Ok(note as u8)
    } else {
      warn!("ignoring out-of-range note {note}");
      Err(EngineError::InvalidNote(note))
    }
  }

  pub fn note_on(&mut self, note: i32, velocity: f32) -> Result<(), EngineError> {
    let note = Self::check_note(note)?;
    let vel = if velocity.is_nan() { 0.0 } else { velocity.clamp(0.0, 1.0) };
    self.send(EngineMsg::NoteOn { note, vel })
  }

  pub fn note_off(&mut self, note: i32) -> Result<(), EngineError> {
    let note = Self::check_note(note)?;
    self.send(EngineMsg::NoteOff { note })
  }

  /// Channel pressure 0..127.
  pub fn aftertouch(&mut self, value: i32) -> Result<(), EngineError> {
    let value = value.clamp(0, 127) as f32 / 127.0;
    self.send(EngineMsg::Aftertouch { value })
  }

  pub fn set_pitch_bend(&mut self, semitones: f32) -> Result<(), EngineError> {
    let semitones = if semitones.is_finite() { semitones } else { 0.0 };
    self.send(EngineMsg::PitchBend { semitones })
  }

  /// 14-bit wheel position, scaled by the current bend range.
  pub fn pitch_bend_raw(&mut self, value: u16) -> Result<(), EngineError> {
    let range = Param::PitchBendRange.spec().clamp(self.params.load(Param::PitchBendRange));
    self.set_pitch_bend(midi::bend_to_semitones(value, range))
  }

  pub fn sustain(&mut self, down: bool) -> Result<(), EngineError> { self.send(EngineMsg::Sustain { down }) }

  /// Release every voice through its normal release stage.
  pub fn all_notes_off(&mut self) -> Result<(), EngineError> { self.send(EngineMsg::AllNotesOff) }

  /// Ramp every voice to silence over a few milliseconds.
  pub fn panic(&mut self) -> Result<(), EngineError> { self.send(EngineMsg::Panic) }

  pub fn set_param(&mut self, name: &str, value: f32) -> Result<ParamUpdate, EngineError> {
    let Some(param) = Param::from_name(name) else {
      warn!("unknown parameter `{name}`");
      return Err(EngineError::UnknownParam(name.to_string()));
    };
    let v = param.spec().clamp(value);
    if !self.throttle.allow(ThrottleKey::Synth(param as usize), Instant::now()) {
      debug!("throttled {name}");
      return Ok(ParamUpdate::Throttled);
    }
    self.params.store(param, v);
    Ok(ParamUpdate::Applied(v))
  }

  pub fn param(&self, name: &str) -> Result<f32, EngineError> {
    Param::from_name(name)
      .map(|p| self.params.load(p))
      .ok_or_else(|| EngineError::UnknownParam(name.to_string()))
  }

  /// Dispatch one raw MIDI message. Unsupported messages are ignored.
  pub fn handle_midi(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
    let Some(msg) = MidiMessage::parse(bytes) else { return Ok(()) };
    match msg {
      MidiMessage::NoteOn { note, velocity, .. } => self.note_on(note as i32, velocity as f32 / 127.0),
      MidiMessage::NoteOff { note, .. } => self.note_off(note as i32),
      MidiMessage::PitchBend { value, .. } => self.pitch_bend_raw(value),
      MidiMessage::ChannelPressure { value, .. } => self.aftertouch(value as i32),
      MidiMessage::ControlChange { controller, value, .. } => match controller {
        midi::CC_SUSTAIN => self.sustain(value >= 64),
        midi::CC_ALL_SOUND_OFF => self.panic(),
        midi::CC_ALL_NOTES_OFF => self.all_notes_off(),
        _ => Ok(()),
      },
      MidiMessage::Other => Ok(()),
    }
  }

  fn entry_index(&self, instance: u32) -> Result<usize, EngineError> {
    self.chain.iter().position(|e| e.instance == instance).ok_or(EngineError::UnknownInstance(instance))
  }

  /// Build a unit and insert it at `position` (clamped to the end). Returns
  /// the new instance id.
  pub fn insert_effect(&mut self, effect_id: &str, position: usize) -> Result<u32, EngineError> {
    if self.chain.len() >= self.max_chain_len {
      warn!("chain full, cannot insert {effect_id}");
      return Err(EngineError::ChainFull(self.max_chain_len));
    }
    let instance = self.next_instance;
    let slot = fx::create(effect_id, self.sr, instance)?;
    let meta = slot.metadata();
    let entry = ChainEntry {
      instance,
      effect_id: meta.id,
      enabled: true,
      values: meta.parameters.iter().map(|p| p.default).collect(),
    };
    self.send(EngineMsg::InsertEffect { position, slot })?;
    let at = position.min(self.chain.len());
    self.chain.insert(at, entry);
    self.next_instance += 1;
    info!("inserted {effect_id}#{instance} at {at}");
    Ok(instance)
  }

  pub fn remove_effect(&mut self, instance: u32) -> Result<(), EngineError> {
    let idx = self.entry_index(instance)?;
    self.send(EngineMsg::RemoveEffect { instance })?;
    let entry = self.chain.remove(idx);
    self.throttle.forget_instance(instance);
    info!("removed {}#{instance}", entry.effect_id);
    Ok(())
  }

  pub fn move_effect(&mut self, instance: u32, position: usize) -> Result<(), EngineError> {
    let from = self.entry_index(instance)?;
    self.send(EngineMsg::MoveEffect { instance, position })?;
    let entry = self.chain.remove(from);
    let to = position.min(self.chain.len());
    self.chain.insert(to, entry);
    Ok(())
  }

  pub fn set_effect_enabled(&mut self, instance: u32, enabled: bool) -> Result<(), EngineError> {
    let idx = self.entry_index(instance)?;
    self.send(EngineMsg::SetEffectEnabled { instance, enabled })?;
    self.chain[idx].enabled = enabled;
    Ok(())
  }

  pub fn set_effect_param(&mut self, instance: u32, name: &str, value: f32) -> Result<ParamUpdate, EngineError> {
    let idx = self.entry_index(instance)?;
    let meta = fx::lookup(self.chain[idx].effect_id).ok_or_else(|| EngineError::UnknownEffect(self.chain[idx].effect_id.to_string()))?;
    let Some(index) = meta.param_index(name) else {
      warn!("{} has no parameter `{name}`", meta.id);
      return Err(EngineError::UnknownParam(name.to_string()));
    };
    let v = meta.parameters[index].clamp(value);
    if !self.throttle.allow(ThrottleKey::Effect(instance, index), Instant::now()) {
      debug!("throttled {}#{instance}.{name}", meta.id);
      return Ok(ParamUpdate::Throttled);
    }
    self.send(EngineMsg::SetEffectParam { instance, index, value: v })?;
    self.chain[idx].values[index] = v;
    Ok(ParamUpdate::Applied(v))
  }

  /// Clear a unit's history. A fresh unit carrying the same settings is built
  /// here and swapped in by the engine.
  pub fn reset_effect(&mut self, instance: u32) -> Result<(), EngineError> {
    let idx = self.entry_index(instance)?;
    let entry = &self.chain[idx];
    let mut slot = fx::create(entry.effect_id, self.sr, instance)?;
    for (i, &v) in entry.values.iter().enumerate() { slot.set_param(i, v); }
    slot.set_enabled(entry.enabled);
    slot.reset();
    self.send(EngineMsg::ReplaceEffect { slot })
  }

  pub fn chain(&self) -> Vec<ChainEntry> { self.chain.clone() }

  /// Drain render-side status. Returns the latest active voice count.
  pub fn poll_status(&mut self) -> usize {
    while let Ok(status) = self.status.try_recv() {
      match status {
        EngineStatus::VoiceCount(n) => self.voice_count = n,
        EngineStatus::Retired(slot) => debug!("released {}#{}", slot.effect_id(), slot.instance),
      }
    }
    self.voice_count
  }

  pub fn voice_count(&self) -> usize { self.voice_count }

  pub fn sample_rate(&self) -> f32 { self.sr }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossbeam_channel::bounded;

  fn controller(throttle_ms: f32) -> (SynthController, Receiver<EngineMsg>, Sender<EngineStatus>) {
    let cfg = EngineConfig { param_throttle_ms: throttle_ms, max_chain_len: 3, ..EngineConfig::default() };
    let (tx, rx) = bounded(64);
    let (stx, srx) = bounded(64);
    (SynthController::new(&cfg, SharedParams::new(), tx, srx), rx, stx)
  }

  #[test]
  fn invalid_notes_send_nothing() {
    let (mut c, rx, _s) = controller(0.0);
    assert_eq!(c.note_on(128, 1.0), Err(EngineError::InvalidNote(128)));
    assert_eq!(c.note_on(-1, 1.0), Err(EngineError::InvalidNote(-1)));
    assert_eq!(c.note_off(300), Err(EngineError::InvalidNote(300)));
    assert!(rx.try_recv().is_err());
  }

  #[test]
  fn velocity_and_pressure_are_clamped() {
    let (mut c, rx, _s) = controller(0.0);
    c.note_on(60, 3.0).unwrap();
    c.aftertouch(500).unwrap();
    assert!(matches!(rx.try_recv(), Ok(EngineMsg::NoteOn { note: 60, vel }) if vel == 1.0));
    assert!(matches!(rx.try_recv(), Ok(EngineMsg::Aftertouch { value }) if value == 1.0));
  }

  #[test]
  fn unknown_param_leaves_table_untouched() {
    let (mut c, _rx, _s) = controller(0.0);
    let before = c.param("cutoff").unwrap();
    assert_eq!(c.set_param("cutof", 100.0), Err(EngineError::UnknownParam("cutof".into())));
    assert_eq!(c.param("cutoff").unwrap(), before);
  }

  #[test]
  fn params_are_clamped() {
    let (mut c, _rx, _s) = controller(0.0);
    assert_eq!(c.set_param("resonance", 4.0), Ok(ParamUpdate::Applied(0.99)));
    assert_eq!(c.param("resonance"), Ok(0.99));
    assert_eq!(c.set_param("cutoff", -5.0), Ok(ParamUpdate::Applied(20.0)));
  }

  #[test]
  fn throttle_drops_rapid_updates_per_param() {
    let (mut c, _rx, _s) = controller(60_000.0);
    assert_eq!(c.set_param("cutoff", 1_000.0), Ok(ParamUpdate::Applied(1_000.0)));
    assert_eq!(c.set_param("cutoff", 2_000.0), Ok(ParamUpdate::Throttled));
    assert_eq!(c.param("cutoff"), Ok(1_000.0));
    // a different parameter has its own window
    assert_eq!(c.set_param("resonance", 0.5), Ok(ParamUpdate::Applied(0.5)));
  }

  #[test]
  fn throttle_window_expires() {
    let mut t = Throttle::new(1.0);
    let t0 = Instant::now();
    assert!(t.allow(ThrottleKey::Synth(0), t0));
    assert!(!t.allow(ThrottleKey::Synth(0), t0 + Duration::from_micros(500)));
    assert!(t.allow(ThrottleKey::Synth(0), t0 + Duration::from_millis(2)));
  }

  #[test]
  fn midi_dispatch() {
    let (mut c, rx, _s) = controller(0.0);
    c.handle_midi(&[0x90, 60, 127]).unwrap();
    c.handle_midi(&[0x90, 60, 0]).unwrap();
    c.handle_midi(&[0xE0, 0x7F, 0x7F]).unwrap();
    c.handle_midi(&[0xB0, 64, 127]).unwrap();
    c.handle_midi(&[0xB0, 120, 0]).unwrap();
    c.handle_midi(&[0xB0, 123, 0]).unwrap();
    c.handle_midi(&[0xB0, 7, 100]).unwrap();
    c.handle_midi(&[]).unwrap();
    let got: Vec<String> = rx.try_iter().map(|m| format!("{m:?}")).collect();
    assert_eq!(got, vec!["NoteOn(60, 1)", "NoteOff(60)", "PitchBend(2)", "Sustain(true)", "Panic", "AllNotesOff"]);
  }

  #[test]
  fn raw_bend_follows_the_current_range() {
    let (mut c, rx, _s) = controller(0.0);
    c.set_param("pitch_bend_range", 12.0).unwrap();
    c.pitch_bend_raw(16_383).unwrap();
    c.pitch_bend_raw(8_192).unwrap();
    c.set_param("pitch_bend_range", 1.0).unwrap();
    c.pitch_bend_raw(0).unwrap();
    let got: Vec<String> = rx.try_iter().map(|m| format!("{m:?}")).collect();
    assert_eq!(got, vec!["PitchBend(12)", "PitchBend(0)", "PitchBend(-1)"]);
  }

  #[test]
  fn chain_mirror_tracks_edits() {
    let (mut c, rx, _s) = controller(0.0);
    let a = c.insert_effect("delay", 0).unwrap();
    let b = c.insert_effect("reverb", 5).unwrap();
    let d = c.insert_effect("chorus", 0).unwrap();
    assert_eq!(c.insert_effect("phaser", 0), Err(EngineError::ChainFull(3)));
    let ids = |c: &SynthController| c.chain().iter().map(|e| e.instance).collect::<Vec<_>>();
    assert_eq!(ids(&c), vec![d, a, b]);
    c.move_effect(d, 10).unwrap();
    assert_eq!(ids(&c), vec![a, b, d]);
    c.set_effect_enabled(b, false).unwrap();
    assert!(!c.chain()[1].enabled);
    c.remove_effect(a).unwrap();
    assert_eq!(ids(&c), vec![b, d]);
    assert_eq!(c.remove_effect(a), Err(EngineError::UnknownInstance(a)));
    assert_eq!(rx.try_iter().count(), 6);
  }

  #[test]
  fn effect_params_validate_and_clamp() {
    let (mut c, rx, _s) = controller(0.0);
    let id = c.insert_effect("bitcrusher", 0).unwrap();
    assert_eq!(c.set_effect_param(id, "bits", 99.0), Ok(ParamUpdate::Applied(16.0)));
    assert_eq!(c.set_effect_param(id, "volume", 1.0), Err(EngineError::UnknownParam("volume".into())));
    assert_eq!(c.set_effect_param(99, "bits", 1.0), Err(EngineError::UnknownInstance(99)));
    assert_eq!(c.chain()[0].value("bits"), Some(16.0));
    let msgs: Vec<String> = rx.try_iter().map(|m| format!("{m:?}")).collect();
    assert_eq!(msgs.last().map(String::as_str), Some("SetEffectParam(1, 0, 16)"));
  }

  #[test]
  fn unknown_effect_is_rejected() {
    let (mut c, rx, _s) = controller(0.0);
    assert_eq!(c.insert_effect("wah-wah", 0), Err(EngineError::UnknownEffect("wah-wah".into())));
    assert!(c.chain().is_empty());
    assert!(rx.try_recv().is_err());
  }

  #[test]
  fn reset_sends_a_configured_replacement() {
    let (mut c, rx, _s) = controller(0.0);
    let id = c.insert_effect("delay", 0).unwrap();
    c.set_effect_param(id, "mix", 0.9).unwrap();
    c.reset_effect(id).unwrap();
    let last = rx.try_iter().last();
    match last {
      Some(EngineMsg::ReplaceEffect { slot }) => {
        assert_eq!(slot.instance, id);
        assert_eq!(slot.effect_id(), "delay");
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn poll_status_keeps_latest_count() {
    let (mut c, _rx, status) = controller(0.0);
    status.send(EngineStatus::VoiceCount(3)).unwrap();
    status.send(EngineStatus::Retired(fx::create("tremolo", 48_000.0, 4).unwrap())).unwrap();
    status.send(EngineStatus::VoiceCount(5)).unwrap();
    assert_eq!(c.poll_status(), 5);
    assert_eq!(c.voice_count(), 5);
  }

  #[test]
  fn full_queue_reports_error() {
    let cfg = EngineConfig::default();
    let (tx, _rx) = bounded(1);
    let (_stx, srx) = bounded(1);
    let mut c = SynthController::new(&cfg, SharedParams::new(), tx, srx);
    c.note_on(60, 1.0).unwrap();
    assert_eq!(c.note_on(61, 1.0), Err(EngineError::QueueFull));
  }
}
