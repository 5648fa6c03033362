use crossbeam_channel::{Receiver, Sender, TryRecvError};

use super::allocator::VoiceAllocator;
use super::config::EngineConfig;
use super::dsp::util::{finite_or_zero, soft_clip, Smooth};
use super::fx::chain::FxChain;
use super::fx::EffectSlot;
use super::messages::{EngineMsg, EngineStatus};
use super::params::{Param, SharedParams, SynthParams, PARAM_COUNT};

const MASTER_SMOOTH_MS: f32 = 20.0;

/// Render half of a session. Owns every piece of audio state and is meant to
/// be moved into the device callback; nothing here allocates, locks or blocks
/// once constructed.
pub struct SynthEngine {
  sr: f32,
  block_size: usize,
  voices: VoiceAllocator,
  chain: FxChain,
  params: SharedParams,
  raw: [f32; PARAM_COUNT],
  snapshot: SynthParams,
  master: Smooth,
  rx: Receiver<EngineMsg>,
  status: Sender<EngineStatus>,
  max_drain: usize,
  /// Units that could not be handed back yet because the status queue was full.
  retired: Vec<EffectSlot>,
  last_reported: usize,
  frame_in_block: usize,
}

impl SynthEngine {
  pub fn new(config: &EngineConfig, params: SharedParams, rx: Receiver<EngineMsg>, status: Sender<EngineStatus>) -> Self {
    let config = &config.clone().sanitized();
    let mut raw = [0.0; PARAM_COUNT];
    params.snapshot(&mut raw);
    let snapshot = SynthParams::from_values(&raw);
    Self {
      sr: config.sample_rate,
      block_size: config.block_size.max(1),
      voices: VoiceAllocator::new(config.sample_rate),
      chain: FxChain::with_capacity(config.max_chain_len),
      params,
      raw,
      snapshot,
      master: Smooth::settled(config.sample_rate, MASTER_SMOOTH_MS, snapshot.master_volume),
      rx,
      status,
      max_drain: config.max_drain_per_block.max(1),
      retired: Vec::with_capacity(config.max_chain_len * 2),
      last_reported: 0,
      frame_in_block: 0,
    }
  }

  pub fn sample_rate(&self) -> f32 { self.sr }
  pub fn active_voices(&self) -> usize { self.voices.active_count() }
  pub fn chain_len(&self) -> usize { self.chain.len() }
  pub fn voices(&self) -> &VoiceAllocator { &self.voices }

  /// Apply pending control messages without blocking. Returns how many were
  /// applied; at most `max_drain_per_block` per call.
  pub fn process_messages(&mut self) -> usize {
    let mut drained = 0usize;
    while drained < self.max_drain {
      match self.rx.try_recv() {
        Ok(msg) => self.apply(msg),
        Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
      }
      drained += 1;
    }
    drained
  }

  fn apply(&mut self, msg: EngineMsg) {
    match msg {
      EngineMsg::NoteOn { note, vel } => self.voices.note_on(note, vel),
      EngineMsg::NoteOff { note } => self.voices.note_off(note),
      EngineMsg::Aftertouch { value } => self.voices.set_aftertouch(value),
      EngineMsg::PitchBend { semitones } => self.voices.set_pitch_bend(semitones),
      EngineMsg::Sustain { down } => self.voices.set_sustain(down),
      EngineMsg::AllNotesOff => self.voices.all_notes_off(),
      EngineMsg::Panic => self.voices.panic(),
      EngineMsg::InsertEffect { position, slot } => {
        if let Err(slot) = self.chain.insert(position, slot) { self.retire(slot); }
      }
      EngineMsg::RemoveEffect { instance } => {
        if let Some(slot) = self.chain.remove(instance) { self.retire(slot); }
      }
      EngineMsg::MoveEffect { instance, position } => { self.chain.move_to(instance, position); }
      EngineMsg::ReplaceEffect { slot } => {
        let old = self.chain.replace(slot);
        self.retire(old);
      }
      EngineMsg::SetEffectEnabled { instance, enabled } => { self.chain.set_enabled(instance, enabled); }
      EngineMsg::SetEffectParam { instance, index, value } => { self.chain.set_param(instance, index, value); }
    }
  }

  /// Hand a unit back to the control side so its buffers are freed there.
  fn retire(&mut self, slot: EffectSlot) {
    match self.status.try_send(EngineStatus::Retired(slot)) {
      Ok(()) => {}
      Err(e) => {
        let EngineStatus::Retired(slot) = e.into_inner() else { return };
        if self.retired.len() < self.retired.capacity() {
          self.retired.push(slot);
        }
        // graveyard full: dropping here is the last resort
      }
    }
  }

  fn flush_retired(&mut self) {
    while let Some(slot) = self.retired.pop() {
      if let Err(e) = self.status.try_send(EngineStatus::Retired(slot)) {
        if let EngineStatus::Retired(slot) = e.into_inner() { self.retired.push(slot); }
        break;
      }
    }
  }

  fn begin_block(&mut self) {
    self.process_messages();
    self.flush_retired();
    self.params.snapshot(&mut self.raw);
    self.snapshot = SynthParams::from_values(&self.raw);
    self.voices.prepare(&self.snapshot);
    self.frame_in_block = 0;
  }

  fn end_block(&mut self) {
    let n = self.voices.active_count();
    if n != self.last_reported && self.status.try_send(EngineStatus::VoiceCount(n)).is_ok() {
      self.last_reported = n;
    }
  }

  #[inline]
  fn frame(&mut self) -> (f32, f32) {
    let (l, r) = self.voices.next_frame(&self.snapshot);
    let g = self.master.next(self.snapshot.master_volume);
    let (l, r) = self.chain.process(finite_or_zero(l * g), finite_or_zero(r * g));
    (soft_clip(finite_or_zero(l)), soft_clip(finite_or_zero(r)))
  }

  /// Fill an interleaved stereo buffer. Messages and parameters are picked up
  /// once at the start of the call.
  pub fn render_block(&mut self, out: &mut [f32]) {
    self.begin_block();
    for frame in out.chunks_mut(2) {
      let (l, r) = self.frame();
      frame[0] = l;
      if frame.len() > 1 { frame[1] = r; }
    }
    self.end_block();
  }

  /// Single-frame rendering; block-level work happens every `block_size` frames.
  pub fn render_frame(&mut self) -> (f32, f32) {
    if self.frame_in_block == 0 { self.begin_block(); }
    let out = self.frame();
    self.frame_in_block += 1;
    if self.frame_in_block >= self.block_size {
      self.end_block();
      self.frame_in_block = 0;
    }
    out
  }

  /// Current master volume target, as seen by the last snapshot.
  pub fn master_volume(&self) -> f32 { self.raw[Param::MasterVolume as usize] }
}
