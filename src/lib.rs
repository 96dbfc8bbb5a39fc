//! VR Sensei: session coordinator for a VR homework tutor.
//!
//! ```text
//!  camera ──▶ sampler ──triggers/commands──▶ ┌─────────────┐
//!  inbox  ──▶ ingest  ──submissions───────▶ │ coordinator │ ──▶ pipeline ──▶ lesson
//!  stdin  ──▶ console ──operator──────────▶ └─────────────┘ ──▶ teaching / Pkaisetu
//!                                                                   │
//!                                                        transport (UDP) ──▶ headset
//! ```

pub mod collab;
pub mod command;
pub mod config;
pub mod console;
pub mod coordinator;
pub mod ingest;
pub mod interrupt;
pub mod llm;
pub mod pipeline;
pub mod sampler;
pub mod session;
pub mod speech;
pub mod supervisor;
pub mod teaching;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
