//! RISKscan assistant — lead-qualification chat and AD impact scenarios.
//!
//! A scripted conversational assistant that captures the visitor's name,
//! answers questions about the RISKscan assessment through a generative text
//! endpoint, and steers toward booking a meeting; plus a one-shot generator
//! of three-category attack impact scenarios.
//!
//! See `DESIGN.md` for architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;

pub mod gateway;

pub mod chat;
pub mod scenario;

pub mod adapters;
