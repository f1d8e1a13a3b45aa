//! Schema-driven loading, derivation and plotting of simulation output tables.
//!
//! An [`Experiment`](pipeline::Experiment) names its data files, the derived
//! fields to compute and the figures to draw; a [`Pipeline`](pipeline::Pipeline)
//! runs it start to finish and an [`OutputSink`](sink::OutputSink) writes or
//! presents the result.

pub mod battery;
pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod plot;
pub mod sink;

pub use error::{Error, Result};
pub use pipeline::{Experiment, Pipeline, RunReport, Source, Stage};
