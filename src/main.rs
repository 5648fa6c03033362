use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use polysynth::engine::audio::AudioOutput;
use polysynth::EngineConfig;

fn load_config() -> Result<EngineConfig> {
  match std::env::args().nth(1) {
    Some(path) => {
      let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
      EngineConfig::from_json(&text).with_context(|| format!("parsing {path}"))
    }
    None => Ok(EngineConfig::default()),
  }
}

fn main() -> Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  let mut output = AudioOutput::open()?;
  let config = EngineConfig { sample_rate: output.sample_rate(), ..load_config()? };
  let block_size = config.block_size;
  let (mut synth, engine) = polysynth::session(config);
  output.start(engine, block_size)?;

  synth.set_param("cutoff", 1_800.0)?;
  synth.set_param("filter_env_amount", 0.4)?;
  synth.set_param("amp_release", 0.6)?;
  let delay = synth.insert_effect("delay", 0)?;
  synth.set_effect_param(delay, "mix", 0.3)?;
  synth.insert_effect("chorus", 0)?;
  synth.insert_effect("reverb", usize::MAX)?;
  info!("chain: {}", serde_json::to_string(&synth.chain())?);

  let chords: [[i32; 3]; 4] = [[57, 60, 64], [53, 57, 60], [48, 52, 55], [55, 59, 62]];
  for chord in chords {
    for &n in &chord { synth.note_on(n, 0.8)?; }
    sleep(Duration::from_millis(700));
    for &n in &chord { synth.note_off(n)?; }
    sleep(Duration::from_millis(150));
    info!("voices: {}", synth.poll_status());
  }

  sleep(Duration::from_secs(2));
  synth.panic()?;
  sleep(Duration::from_millis(50));
  synth.poll_status();
  output.stop();
  Ok(())
}
