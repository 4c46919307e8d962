//! ONVIF pan/tilt/zoom relay for cheap IP cameras, plus an MJPEG relay for their video.

#[macro_use] extern crate rocket;
#[macro_use] extern crate serde_derive;

pub mod common;
pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod ffmpeg;
pub mod lifecycle;
pub mod relay;
pub mod rest_api;
pub mod vendor;
pub mod wsse;
