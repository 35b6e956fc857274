//! Graviton Core - control-plane and DSP primitives for the graviton engine
//!
//! This crate provides the building blocks the engine crate assembles into
//! a real-time audio control plane, designed for zero allocation in the
//! audio path.
//!
//! # Core Abstractions
//!
//! ## Parameters
//!
//! - [`ParamKey`] / [`ParamSpec`] - the closed set of 28 automatable
//!   parameters with stable string keys, ranges, and smoothing times
//! - [`ParamStore`] - lock-free atomic store written by the UI thread,
//!   snapshotted once per block by the audio thread
//! - [`ParamSnapshot`] - per-block value object passed through the pipeline
//!
//! ## Smoothing
//!
//! - [`LinearRamp`] - constant-rate ramp with a hard per-sample step bound
//! - [`OnePoleLag`] - exponential lag with closed-form block advancement
//!
//! ## Modulation Sources
//!
//! - [`ChaosAttractor`] - Lorenz system at control rate
//! - [`AudioFollower`] - RMS/peak follower with ballistics
//! - [`BrownianMotion`] - seeded bounded random walk
//! - [`EnvelopeTracker`] - level and slope tracker
//!
//! ## DSP Building Blocks
//!
//! - [`DelayLine`], [`Comb`], [`Allpass`], [`OnePole`] - just enough
//!   signal processing for the routing modules to route
//!
//! # no_std Support
//!
//! The crate is `no_std` compatible (with `alloc`); disable the default
//! `std` feature for embedded targets.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod dsp;
pub mod math;
pub mod params;
pub mod ramp;
pub mod sources;
pub mod store;

pub use dsp::{Allpass, Comb, DelayLine, OnePole};
pub use math::{db_to_linear, flush_denormal, lerp, sanitize};
pub use params::{PARAM_COUNT, ParamKey, ParamSpec};
pub use ramp::{LinearRamp, OnePoleLag};
pub use sources::{AudioFollower, BlockStats, BrownianMotion, ChaosAttractor, EnvelopeTracker};
pub use store::{ParamSnapshot, ParamStore};
