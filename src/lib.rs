// primus/src/lib.rs
//
//! GPU offloading for GLX applications.
//!
//! This crate interposes the GLX entry points of an OpenGL application and
//! splits its rendering across two GPUs: all GL commands execute against an
//! off-screen surface on a secondary ("accelerating") X display, while the
//! finished frames are read back asynchronously and blitted into the window
//! the application owns on the primary display. The application never
//! notices; it keeps calling `glXSwapBuffers` on what it believes is its own
//! drawable.
//!
//! Two independent vendor GL libraries are loaded side by side, one per GPU.
//! Per visible drawable, a pair of worker threads (readback and display)
//! pipelines the frame hand-off; see the `pipeline` module.

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

#[macro_use]
mod macros;

pub mod error;
pub use crate::error::Error;

mod bridge;
mod config;
pub use crate::config::SyncMode;

mod fbconfig;
mod loader;
mod logging;
mod pipeline;
mod profiler;
mod registry;
mod semaphore;
mod state;

pub mod api;

#[cfg(test)]
mod tests;

mod gl {
    #![allow(clippy::all)]
    include!(concat!(env!("OUT_DIR"), "/gl_bindings.rs"));
}

mod glx {
    #![allow(clippy::all)]
    include!(concat!(env!("OUT_DIR"), "/glx_bindings.rs"));
}
