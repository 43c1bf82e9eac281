//! camsnap library crate.
//!
//! A camera session controller: enumerate cameras, preview one, capture a
//! still, save it as JPEG, and follow cameras being plugged in and out.
//! The host side sits behind [`media::MediaDevices`] and
//! [`export::PhotoSaver`], implemented natively in [`native`] and
//! [`export::DiskSaver`].

pub mod camera;
pub mod cli;
pub mod config;
pub mod event_loop;
pub mod export;
pub mod hotplug;
pub mod input;
pub mod media;
pub mod native;
pub mod preview;
pub mod raw_mode;
pub mod session;
pub mod status;
pub mod surface;
