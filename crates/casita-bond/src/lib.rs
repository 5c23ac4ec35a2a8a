//! Bond bridge client for casita
//!
//! Implements [`DeviceCommands`](casita_core::DeviceCommands) over the
//! Bond local HTTP API: token-authenticated JSON endpoints under `/v2/`.
//! The client keeps the quirks the hub relies on:
//!
//! - `light_on`/`light_off` read the bridge's belief state first and skip
//!   the transmission when it already matches, since RF receivers toggle
//!   on every frame they hear.
//! - `decrease_speed` powers the fan off instead of stepping below
//!   speed 1.
//!
//! Retries are deliberately absent; a failed command surfaces to the
//! dispatcher and the next button press tries again.

mod client;

pub use client::BondClient;
