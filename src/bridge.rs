// primus/src/bridge.rs
//
//! Startup handshake with the daemon that manages the secondary display.
//!
//! Before anything else is initialized, the shim asks the daemon for the
//! secondary X display name and for the directories holding the
//! accelerating vendor's libGL, then requests that the display be powered
//! up. The answers are published through `PRIMUS_DISPLAY` and
//! `PRIMUS_libGLa` unless the user already set them. The socket stays open
//! for the whole process lifetime; the daemon tears the secondary display
//! down when it sees the connection close.

use crate::error::Error;

use std::env;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::str;

/// Holds the daemon connection open until the process exits.
pub struct Bridge {
    _socket: UnixStream,
}

/// Answers collected from the daemon. A field is `None` when the
/// corresponding query was skipped because the environment already
/// provides the value.
#[derive(Debug, PartialEq)]
pub struct Negotiated {
    pub display: Option<String>,
    pub library_paths: Option<String>,
}

pub fn connect(path: &str) -> Result<Bridge, Error> {
    let mut socket = UnixStream::connect(path).map_err(Error::BridgeConnectionFailed)?;
    let negotiated = negotiate(
        &mut socket,
        env::var("PRIMUS_DISPLAY").is_err(),
        env::var("PRIMUS_libGLa").is_err(),
    )?;
    if let Some(display) = negotiated.display {
        env::set_var("PRIMUS_DISPLAY", display);
    }
    if let Some(paths) = negotiated.library_paths {
        env::set_var("PRIMUS_libGLa", append_libgl(&paths));
    }
    Ok(Bridge { _socket: socket })
}

/// Runs the query/confirm sequence on an established connection.
pub fn negotiate(
    socket: &mut UnixStream,
    need_display: bool,
    need_libraries: bool,
) -> Result<Negotiated, Error> {
    let display = if need_display {
        Some(query(socket, "VirtualDisplay")?)
    } else {
        None
    };
    let library_paths = if need_libraries {
        Some(query(socket, "LibraryPath")?).filter(|paths| !paths.is_empty())
    } else {
        None
    };
    confirm(socket)?;
    Ok(Negotiated {
        display,
        library_paths,
    })
}

/// Expands a colon-separated directory list into a candidate list of
/// `libGL.so.1` paths.
pub fn append_libgl(paths: &str) -> String {
    paths
        .split(':')
        .map(|p| format!("{}/libGL.so.1", p))
        .collect::<Vec<_>>()
        .join(":")
}

fn query(socket: &mut UnixStream, key: &str) -> Result<String, Error> {
    // Queries are NUL-terminated on the wire.
    let request = format!("Q {}\0", key);
    socket
        .write_all(request.as_bytes())
        .map_err(Error::BridgeConnectionFailed)?;
    let reply = read_reply(socket)?;
    let value = reply
        .strip_prefix("Value: ")
        .ok_or_else(|| Error::BridgeProtocol(reply.clone()))?;
    Ok(value.split('\n').next().unwrap_or("").to_string())
}

fn confirm(socket: &mut UnixStream) -> Result<(), Error> {
    socket
        .write_all(b"C")
        .map_err(Error::BridgeConnectionFailed)?;
    let reply = read_reply(socket)?;
    match reply.as_bytes().first() {
        Some(b'Y') => Ok(()),
        Some(b'N') => {
            let message = if reply.len() > 5 { &reply[5..] } else { "" };
            Err(Error::BridgeRefused(message.trim_end().to_string()))
        }
        _ => Err(Error::BridgeProtocol(reply)),
    }
}

fn read_reply(socket: &mut UnixStream) -> Result<String, Error> {
    let mut buf = [0u8; 256];
    let n = socket.read(&mut buf).map_err(Error::BridgeConnectionFailed)?;
    let text = &buf[..n];
    // Replies are ASCII; anything else is a protocol violation.
    str::from_utf8(text)
        .map(|s| s.trim_end_matches('\0').to_string())
        .map_err(|_| Error::BridgeProtocol(format!("{:?}", text)))
}

#[cfg(test)]
mod tests {
    use super::{append_libgl, negotiate};
    use crate::error::Error;

    use std::io::{Read, Write};
    use std::os::unix::net::{UnixListener, UnixStream};
    use std::path::PathBuf;
    use std::thread;

    fn socket_path(tag: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("primus-bridge-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    /// A daemon stand-in answering a fixed script of (expected request,
    /// reply) pairs.
    fn mock_daemon(path: &PathBuf, script: Vec<(&'static [u8], &'static [u8])>) -> thread::JoinHandle<()> {
        let listener = UnixListener::bind(path).unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            for (expected, reply) in script {
                let mut buf = vec![0u8; expected.len()];
                stream.read_exact(&mut buf).unwrap();
                assert_eq!(&buf[..], expected);
                stream.write_all(reply).unwrap();
            }
        })
    }

    #[test]
    fn handshake_reports_display_and_libraries() {
        let path = socket_path("ok");
        let daemon = mock_daemon(
            &path,
            vec![
                (b"Q VirtualDisplay\0".as_ref(), b"Value: :8\n".as_ref()),
                (b"Q LibraryPath\0".as_ref(), b"Value: /opt/nvidia/lib\n".as_ref()),
                (b"C".as_ref(), b"Y ok".as_ref()),
            ],
        );
        let mut socket = UnixStream::connect(&path).unwrap();
        let negotiated = negotiate(&mut socket, true, true).unwrap();
        assert_eq!(negotiated.display.as_deref(), Some(":8"));
        assert_eq!(negotiated.library_paths.as_deref(), Some("/opt/nvidia/lib"));
        daemon.join().unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn handshake_skips_satisfied_queries() {
        let path = socket_path("skip");
        let daemon = mock_daemon(&path, vec![(b"C".as_ref(), b"Y ok".as_ref())]);
        let mut socket = UnixStream::connect(&path).unwrap();
        let negotiated = negotiate(&mut socket, false, false).unwrap();
        assert_eq!(negotiated.display, None);
        assert_eq!(negotiated.library_paths, None);
        daemon.join().unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn handshake_surfaces_daemon_refusal() {
        let path = socket_path("refuse");
        let daemon = mock_daemon(
            &path,
            vec![(b"C".as_ref(), b"N    no secondary display\n".as_ref())],
        );
        let mut socket = UnixStream::connect(&path).unwrap();
        match negotiate(&mut socket, false, false) {
            Err(Error::BridgeRefused(message)) => assert_eq!(message, "no secondary display"),
            other => panic!("unexpected result: {:?}", other),
        }
        daemon.join().unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn handshake_rejects_garbage() {
        let path = socket_path("junk");
        let daemon = mock_daemon(
            &path,
            vec![(b"Q VirtualDisplay\0".as_ref(), b"whatever\n".as_ref())],
        );
        let mut socket = UnixStream::connect(&path).unwrap();
        match negotiate(&mut socket, true, false) {
            Err(Error::BridgeProtocol(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        daemon.join().unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn library_list_expansion() {
        assert_eq!(
            append_libgl("/a:/b:/c"),
            "/a/libGL.so.1:/b/libGL.so.1:/c/libGL.so.1"
        );
        assert_eq!(append_libgl("/opt/nvidia/lib"), "/opt/nvidia/lib/libGL.so.1");
    }
}
