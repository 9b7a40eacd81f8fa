//! Various errors that methods can produce.

use std::io;

#[derive(Debug)]
pub enum Error {
    /// None of the candidate libraries could be loaded. The payload carries
    /// the dynamic linker's complaint for every path that was tried.
    LibraryLoadFailed(String),
    /// A library search path was not absolute.
    RelativeLibraryPath(String),
    /// Looking up a required symbol in a vendor library failed.
    GLFunctionNotFound(&'static str),
    /// A connection to the display server could not be opened.
    ConnectionFailed,
    /// The system couldn't choose a framebuffer configuration.
    NoPixelFormatFound,
    /// The bridge daemon socket could not be reached.
    BridgeConnectionFailed(io::Error),
    /// The bridge daemon answered something we do not understand.
    BridgeProtocol(String),
    /// The bridge daemon reported that the secondary display is unavailable.
    BridgeRefused(String),
}
