//! Sample-level building blocks shared by voices and effect units.

pub mod util;
pub mod envelope;
pub mod filter;
pub mod oscillator;
pub mod delay_line;
pub mod allpass;
pub mod svf;
