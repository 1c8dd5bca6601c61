//! EchoLearn application: announcement coordination and interaction
//!
//! The library half of the app crate so integration tests can drive the
//! coordinator and controller without the terminal frontend.

pub mod accessibility;
pub mod announcer;
pub mod controller;
pub mod fallback;
pub mod session;
