//! autoreg CLI library.
//!
//! This crate provides the command implementations behind the `autoreg`
//! binary: waveform generation from a trained model, random model
//! initialization, and silence-mask extraction for preprocessing.

pub mod commands;
