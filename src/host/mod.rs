//! Host-facing contracts and the JSON bridge for presentation shells.

pub mod contract;
pub mod handler;
pub mod stdio;
