//! Adapters — user-facing surfaces for the chat assistant and the scenario
//! generator.
//!
//! Only a terminal adapter exists; it renders transcript segments and
//! scenario cards as plain text and drives one chat session over any async
//! line reader.

pub mod cli;
