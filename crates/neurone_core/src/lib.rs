//! # neurone_core
//!
//! The axon of a Gasworks neurone: an energy state machine that integrates
//! excitation from camera and network dendrites, fires into adjacent neurones
//! and animates the local lights.
//!
//! Hardware and network access are capabilities ([`LightingSink`],
//! [`PeerNotifier`]) supplied by the caller, so the machine runs unchanged
//! against fakes in tests.

pub mod axon;
pub mod config;
pub mod flow;
pub mod lighting;
pub mod neurone;
pub mod notify;

pub use axon::{Axon, STARTUP_SIGNAL};
pub use config::{parse_configuration, ConfigError, NodeConfig, Peer, Timings};
pub use flow::{delta_energy, FlowReading};
pub use lighting::{FrameWriter, LightCommand, LightingSink, NullSink, FRAME_LEN};
pub use neurone::{
    Neurone, NeuroneSnapshot, Phase, BASELINE_ENERGY, FIRE_RESET_ENERGY, IDLE_ENERGY,
};
pub use notify::{excitation_url, fan_out, PeerNotifier};
