#![cfg_attr(target_os = "none", no_std)]

pub(crate) mod fmt;

/// Values baked in at build time, see `build.rs`.
pub mod config {
    include!(concat!(env!("OUT_DIR"), "/consts.rs"));
}

pub mod monitor;
pub mod pin;
pub mod report;
pub mod sensor;
pub mod serial;
pub mod tick;
