//! Isometric waterfall visualizer for audio spectra.
//!
//! Each audio frame is windowed, transformed and folded into log-spaced bands
//! ([`audio::analysis`]), appended to a bounded history ([`render::history`]) and
//! drawn as depth-faded polylines through an isometric projection
//! ([`render::waterfall`], [`render::isometric`]). [`pipeline::Visualizer`] runs
//! the three steps per frame.

pub mod audio;
pub mod config;
pub mod encode;
pub mod pipeline;
pub mod render;
