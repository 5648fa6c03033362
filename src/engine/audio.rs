use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{error, info, warn};

use super::graph::SynthEngine;

const PREFERRED_RATES: [u32; 2] = [44_100, 48_000];

/// Default output device plus the stream that drives a [`SynthEngine`].
pub struct AudioOutput {
  device: cpal::Device,
  config: cpal::StreamConfig,
  stream: Option<cpal::Stream>,
}

/// Stereo f32 config at 44.1k, else 48k, else the highest rate offered.
fn pick_config(device: &cpal::Device) -> Result<cpal::SupportedStreamConfig> {
  let ranges: Vec<cpal::SupportedStreamConfigRange> = match device.supported_output_configs() {
    Ok(configs) => configs.filter(|c| c.channels() == 2 && c.sample_format() == cpal::SampleFormat::F32).collect(),
    Err(e) => {
      warn!("querying output configs: {e}");
      Vec::new()
    }
  };
  for sr in PREFERRED_RATES {
    if let Some(range) = ranges.iter().find(|c| c.min_sample_rate().0 <= sr && c.max_sample_rate().0 >= sr) {
      return Ok(range.clone().with_sample_rate(cpal::SampleRate(sr)));
    }
  }
  if let Some(range) = ranges.into_iter().next() {
    return Ok(range.with_max_sample_rate());
  }
  let fallback = device.default_output_config().context("no default output config")?;
  if fallback.sample_format() != cpal::SampleFormat::F32 {
    bail!("output device does not offer f32 samples ({:?})", fallback.sample_format());
  }
  Ok(fallback)
}

impl AudioOutput {
  pub fn open() -> Result<Self> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or_else(|| anyhow!("no output device"))?;
    let config: cpal::StreamConfig = pick_config(&device)?.into();
    info!(
      "output device {:?}: {} Hz, {} ch",
      device.name().unwrap_or_default(),
      config.sample_rate.0,
      config.channels
    );
    Ok(Self { device, config, stream: None })
  }

  /// Rate the session should be built at.
  pub fn sample_rate(&self) -> f32 { self.config.sample_rate.0 as f32 }

  /// Move the engine into the device callback and start playback.
  pub fn start(&mut self, mut engine: SynthEngine, block_size: usize) -> Result<()> {
    if self.stream.is_some() { bail!("output already running"); }
    let mut cfg = self.config.clone();
    cfg.buffer_size = cpal::BufferSize::Fixed(block_size as u32);
    let channels = cfg.channels as usize;
    let chunk = block_size.max(1) * 2;
    let err_fn = |e: cpal::StreamError| error!("stream error: {e}");
    let callback = move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
      if channels == 2 {
        for block in data.chunks_mut(chunk) { engine.render_block(block); }
      } else {
        for frame in data.chunks_mut(channels) {
          let (l, r) = engine.render_frame();
          match frame {
            [m] => *m = 0.5 * (l + r),
            [a, b, rest @ ..] => {
              *a = l;
              *b = r;
              rest.fill(0.0);
            }
            [] => {}
          }
        }
      }
    };
    let stream = match self.device.build_output_stream(&cfg, callback, err_fn, None) {
      Ok(s) => s,
      Err(e) => bail!("building output stream with {block_size}-frame buffers: {e}"),
    };
    stream.play().context("starting output stream")?;
    self.stream = Some(stream);
    Ok(())
  }

  pub fn stop(&mut self) {
    if self.stream.take().is_some() { info!("output stopped"); }
  }
}
