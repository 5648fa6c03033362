use polysynth::{session, EngineConfig, EngineError, ParamUpdate, SynthController, SynthEngine};

fn unthrottled() -> (SynthController, SynthEngine) {
  session(EngineConfig { param_throttle_ms: 0.0, ..EngineConfig::default() })
}

fn render(engine: &mut SynthEngine, blocks: usize) -> Vec<f32> {
  let mut out = Vec::with_capacity(blocks * 256);
  let mut buf = [0.0f32; 256];
  for _ in 0..blocks {
    engine.render_block(&mut buf);
    out.extend_from_slice(&buf);
  }
  out
}

fn peak(buf: &[f32]) -> f32 { buf.iter().fold(0.0, |m, v| m.max(v.abs())) }

#[test]
fn polyphony_is_capped_at_eight() {
  let (mut synth, mut engine) = unthrottled();
  for n in 0..12 {
    synth.note_on(48 + n, 0.9).unwrap();
    render(&mut engine, 1);
    assert!(engine.active_voices() <= 8);
  }
  assert_eq!(engine.active_voices(), 8);
  assert_eq!(synth.poll_status(), 8);
}

#[test]
fn all_notes_off_releases_to_zero() {
  let (mut synth, mut engine) = unthrottled();
  synth.set_param("amp_release", 0.05).unwrap();
  for n in [60, 64, 67] { synth.note_on(n, 1.0).unwrap(); }
  let held = render(&mut engine, 20);
  assert!(peak(&held) > 0.01);
  synth.all_notes_off().unwrap();
  // about 1 s, twenty release times
  let tail = render(&mut engine, 400);
  assert_eq!(engine.active_voices(), 0);
  assert!(peak(&tail[tail.len() - 256..]) < 1e-4);
  assert_eq!(synth.poll_status(), 0);
}

#[test]
fn rejected_requests_change_nothing() {
  let (mut synth, mut engine) = unthrottled();
  assert_eq!(synth.note_on(200, 1.0), Err(EngineError::InvalidNote(200)));
  assert_eq!(synth.set_param("wobble", 1.0), Err(EngineError::UnknownParam("wobble".into())));
  assert!(matches!(synth.insert_effect("octaver", 0), Err(EngineError::UnknownEffect(_))));
  let out = render(&mut engine, 4);
  assert!(out.iter().all(|&v| v == 0.0));
  assert_eq!(engine.chain_len(), 0);
}

#[test]
fn param_writes_are_clamped_and_visible_to_the_engine() {
  let (mut synth, mut engine) = unthrottled();
  assert_eq!(synth.set_param("master_volume", 3.0), Ok(ParamUpdate::Applied(1.0)));
  render(&mut engine, 1);
  assert_eq!(engine.master_volume(), 1.0);
}

#[test]
fn rapid_param_updates_are_throttled() {
  let (mut synth, _engine) = session(EngineConfig { param_throttle_ms: 60_000.0, ..EngineConfig::default() });
  assert_eq!(synth.set_param("cutoff", 500.0), Ok(ParamUpdate::Applied(500.0)));
  assert_eq!(synth.set_param("cutoff", 900.0), Ok(ParamUpdate::Throttled));
  assert_eq!(synth.param("cutoff"), Ok(500.0));
}

#[test]
fn midi_bytes_drive_voices() {
  let (mut synth, mut engine) = unthrottled();
  synth.handle_midi(&[0x90, 60, 100]).unwrap();
  synth.handle_midi(&[0x90, 64, 100]).unwrap();
  render(&mut engine, 2);
  assert_eq!(engine.active_voices(), 2);
  // sustain down, then note off: voices keep sounding
  synth.handle_midi(&[0xB0, 64, 127]).unwrap();
  synth.handle_midi(&[0x80, 60, 0]).unwrap();
  synth.handle_midi(&[0x90, 64, 0]).unwrap();
  render(&mut engine, 2);
  assert_eq!(engine.active_voices(), 2);
  // all sound off
  synth.handle_midi(&[0xB0, 120, 0]).unwrap();
  render(&mut engine, 10);
  assert_eq!(engine.active_voices(), 0);
}

#[test]
fn effect_edits_keep_engine_and_mirror_in_step() {
  let (mut synth, mut engine) = unthrottled();
  let delay = synth.insert_effect("delay", 0).unwrap();
  let verb = synth.insert_effect("reverb", 1).unwrap();
  render(&mut engine, 1);
  assert_eq!(engine.chain_len(), 2);

  synth.reset_effect(delay).unwrap();
  synth.remove_effect(verb).unwrap();
  render(&mut engine, 1);
  assert_eq!(engine.chain_len(), 1);
  assert_eq!(synth.chain().len(), 1);
  assert_eq!(synth.chain()[0].effect_id, "delay");
}

#[test]
fn chain_reorder_matches_mirror() {
  let (mut synth, mut engine) = unthrottled();
  let a = synth.insert_effect("tremolo", 0).unwrap();
  let b = synth.insert_effect("hardclip", 1).unwrap();
  let c = synth.insert_effect("bitcrusher", 2).unwrap();
  synth.move_effect(a, 2).unwrap();
  render(&mut engine, 1);
  let ids: Vec<u32> = synth.chain().iter().map(|e| e.instance).collect();
  assert_eq!(ids, vec![b, c, a]);
  assert_eq!(engine.chain_len(), 3);
}

#[test]
fn full_effects_chain_stays_finite() {
  let (mut synth, mut engine) = unthrottled();
  for id in ["autowah", "hardclip", "bitcrusher", "phaser", "flanger", "chorus", "freqshifter", "pitchshifter", "tremolo", "delay", "reverb"] {
    synth.insert_effect(id, usize::MAX).unwrap();
  }
  synth.set_param("resonance", 0.99).unwrap();
  synth.set_param("master_volume", 1.0).unwrap();
  for n in [36, 48, 60, 72, 84, 96] { synth.note_on(n, 1.0).unwrap(); }
  synth.set_pitch_bend(2.0).unwrap();
  synth.aftertouch(127).unwrap();
  let out = render(&mut engine, 200);
  assert!(out.iter().all(|v| v.is_finite() && v.abs() <= 1.0));
  assert!(peak(&out) > 0.0);
}

#[test]
fn chain_capacity_is_enforced() {
  let (mut synth, _engine) = session(EngineConfig { max_chain_len: 2, ..EngineConfig::default() });
  synth.insert_effect("delay", 0).unwrap();
  synth.insert_effect("delay", 0).unwrap();
  assert_eq!(synth.insert_effect("delay", 0), Err(EngineError::ChainFull(2)));
}

#[test]
fn status_channel_reports_voice_changes() {
  let (mut synth, mut engine) = unthrottled();
  synth.note_on(60, 1.0).unwrap();
  render(&mut engine, 1);
  assert_eq!(synth.poll_status(), 1);
  // a silent block with no change sends nothing new
  render(&mut engine, 1);
  assert_eq!(synth.poll_status(), 1);
}

#[test]
fn degenerate_config_still_plays() {
  let (mut synth, mut engine) = session(EngineConfig {
    sample_rate: 10.0,
    queue_capacity: 0,
    block_size: 0,
    max_chain_len: 0,
    param_throttle_ms: 0.0,
    ..EngineConfig::default()
  });
  assert_eq!(engine.sample_rate(), 48_000.0);
  synth.note_on(60, 1.0).unwrap();
  synth.insert_effect("delay", 0).unwrap();
  let out = render(&mut engine, 8);
  assert_eq!(engine.active_voices(), 1);
  assert_eq!(engine.chain_len(), 1);
  assert!(out.iter().all(|v| v.is_finite()) && peak(&out) > 0.0);
}
