// primus/src/pipeline/mod.rs
//
//! The per-drawable frame pipeline.
//!
//! Three participants cooperate on every visible drawable: the application
//! thread renders and calls the buffer swap, the readback worker pulls the
//! finished pixels off the accelerating GPU through pixel-pack buffers, and
//! the display worker uploads them into a texture on the primary GPU and
//! presents. Each worker is driven through a pair of counting semaphores;
//! resize and shutdown travel application → readback → display as a
//! `ReinitTodo` word carried next to each pair.

use crate::semaphore::Semaphore;

use euclid::default::Size2D;
use std::os::raw::c_void;
use std::sync::atomic::{AtomicI32, AtomicPtr, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub mod display;
pub mod readback;

/// Give a stuck peer this long before dropping a frame or, during
/// shutdown, killing it.
pub const RELEASE_TIMEOUT: Duration = Duration::from_secs(1);

/// Pending pipeline transition.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReinitTodo {
    None,
    Resize,
    Shutdown,
}

impl ReinitTodo {
    fn from_word(word: u8) -> ReinitTodo {
        match word {
            1 => ReinitTodo::Resize,
            2 => ReinitTodo::Shutdown,
            _ => ReinitTodo::None,
        }
    }

    fn to_word(self) -> u8 {
        match self {
            ReinitTodo::None => 0,
            ReinitTodo::Resize => 1,
            ReinitTodo::Shutdown => 2,
        }
    }
}

/// Handshake channel between one worker and its upstream.
pub struct WorkerLink {
    /// Posted to hand the worker a unit of work.
    pub acqsem: Semaphore,
    /// Posted by the worker when it is done with the handed resource.
    pub relsem: Semaphore,
    reinit: AtomicU8,
}

impl WorkerLink {
    fn new() -> WorkerLink {
        WorkerLink {
            acqsem: Semaphore::new(),
            relsem: Semaphore::new(),
            reinit: AtomicU8::new(0),
        }
    }

    pub fn reinit(&self) -> ReinitTodo {
        ReinitTodo::from_word(self.reinit.load(Ordering::SeqCst))
    }

    pub fn set_reinit(&self, todo: ReinitTodo) {
        self.reinit.store(todo.to_word(), Ordering::SeqCst);
    }

    pub fn clear_reinit(&self) {
        self.set_reinit(ReinitTodo::None);
    }
}

/// State shared by the application thread and both workers of a drawable.
///
/// The semaphore protocol serializes every access that matters; the fields
/// are atomics only so the structure is safe to share at the type level.
pub struct PipeShared {
    width: AtomicI32,
    height: AtomicI32,
    /// Transition noticed by the display worker (resize) or requested by
    /// the application (shutdown), consumed on the next buffer swap.
    reinit: AtomicU8,
    /// Accelerating-side off-screen surface currently backing the drawable.
    pbuffer: AtomicU64,
    /// Mapping of the pixel-pack buffer being handed to the display worker.
    pixeldata: AtomicPtr<c_void>,
    /// Fence inserted by the application thread before signalling readback.
    fence: AtomicPtr<c_void>,
    /// pthread handle of the display worker, for the shutdown-only kill.
    display_thread: AtomicU64,
    pub r: WorkerLink,
    pub d: WorkerLink,
}

impl PipeShared {
    pub fn new(size: Size2D<i32>) -> PipeShared {
        PipeShared {
            width: AtomicI32::new(size.width),
            height: AtomicI32::new(size.height),
            reinit: AtomicU8::new(0),
            pbuffer: AtomicU64::new(0),
            pixeldata: AtomicPtr::new(std::ptr::null_mut()),
            fence: AtomicPtr::new(std::ptr::null_mut()),
            display_thread: AtomicU64::new(0),
            r: WorkerLink::new(),
            d: WorkerLink::new(),
        }
    }

    pub fn size(&self) -> Size2D<i32> {
        Size2D::new(
            self.width.load(Ordering::SeqCst),
            self.height.load(Ordering::SeqCst),
        )
    }

    pub fn set_size(&self, width: i32, height: i32) {
        self.width.store(width, Ordering::SeqCst);
        self.height.store(height, Ordering::SeqCst);
    }

    pub fn reinit(&self) -> ReinitTodo {
        ReinitTodo::from_word(self.reinit.load(Ordering::SeqCst))
    }

    pub fn set_reinit(&self, todo: ReinitTodo) {
        self.reinit.store(todo.to_word(), Ordering::SeqCst);
    }

    pub fn pbuffer(&self) -> u64 {
        self.pbuffer.load(Ordering::SeqCst)
    }

    pub fn set_pbuffer(&self, pbuffer: u64) {
        self.pbuffer.store(pbuffer, Ordering::SeqCst);
    }

    pub fn pixeldata(&self) -> *mut c_void {
        self.pixeldata.load(Ordering::SeqCst)
    }

    pub fn publish_pixeldata(&self, pixeldata: *mut c_void) {
        self.pixeldata.store(pixeldata, Ordering::SeqCst);
    }

    pub fn fence(&self) -> *mut c_void {
        self.fence.load(Ordering::SeqCst)
    }

    pub fn set_fence(&self, fence: *mut c_void) {
        self.fence.store(fence, Ordering::SeqCst);
    }

    pub fn display_thread(&self) -> libc::pthread_t {
        self.display_thread.load(Ordering::SeqCst) as libc::pthread_t
    }

    fn set_display_thread(&self, thread: libc::pthread_t) {
        self.display_thread.store(thread as u64, Ordering::SeqCst);
    }
}

pub struct WorkerPair {
    readback: JoinHandle<()>,
    display: JoinHandle<()>,
}

impl WorkerPair {
    /// Spawns the display and readback workers for a drawable. Both start
    /// with a pending RESIZE so that their first iteration allocates
    /// textures and pixel-pack buffers through the regular resize path.
    pub fn spawn(
        shared: Arc<PipeShared>,
        fbconfig: crate::glx::types::GLXFBConfig,
        actx: crate::glx::types::GLXContext,
        window: x11::xlib::Window,
    ) -> WorkerPair {
        use std::os::unix::thread::JoinHandleExt;

        shared.r.set_reinit(ReinitTodo::Resize);
        shared.d.set_reinit(ReinitTodo::Resize);

        let params = display::DisplayParams {
            shared: Arc::clone(&shared),
            window,
        };
        let display = std::thread::Builder::new()
            .name("primus-display".to_string())
            .spawn(move || display::run(params))
            .unwrap_or_else(|_| fatal!("failed to spawn display worker"));
        shared.set_display_thread(display.as_pthread_t());

        let params = readback::ReadbackParams {
            shared: Arc::clone(&shared),
            fbconfig,
            actx,
        };
        let readback = std::thread::Builder::new()
            .name("primus-readback".to_string())
            .spawn(move || readback::run(params))
            .unwrap_or_else(|_| fatal!("failed to spawn readback worker"));

        WorkerPair { readback, display }
    }

    /// Shuts both workers down and joins them. Initiated by posting the
    /// readback acquire semaphore with a SHUTDOWN word; the readback worker
    /// forwards the transition to the display worker.
    pub fn reap(self, shared: &PipeShared) {
        shared.r.set_reinit(ReinitTodo::Shutdown);
        shared.r.acqsem.post();
        shared.r.relsem.wait();
        let _ = self.readback.join();
        let _ = self.display.join();
    }
}

#[cfg(test)]
mod tests {
    use super::{PipeShared, ReinitTodo};
    use euclid::default::Size2D;

    #[test]
    fn reinit_word_round_trips() {
        let shared = PipeShared::new(Size2D::new(256, 256));
        assert_eq!(shared.reinit(), ReinitTodo::None);
        shared.set_reinit(ReinitTodo::Resize);
        assert_eq!(shared.reinit(), ReinitTodo::Resize);
        shared.set_reinit(ReinitTodo::None);
        assert_eq!(shared.reinit(), ReinitTodo::None);

        shared.r.set_reinit(ReinitTodo::Shutdown);
        assert_eq!(shared.r.reinit(), ReinitTodo::Shutdown);
        shared.r.clear_reinit();
        assert_eq!(shared.r.reinit(), ReinitTodo::None);
    }

    #[test]
    fn resize_publishes_dimensions() {
        let shared = PipeShared::new(Size2D::new(256, 256));
        assert_eq!(shared.size(), Size2D::new(256, 256));
        // What the display worker does on ConfigureNotify.
        shared.set_size(512, 384);
        shared.set_reinit(ReinitTodo::Resize);
        assert_eq!(shared.size(), Size2D::new(512, 384));
        assert_eq!(shared.reinit(), ReinitTodo::Resize);
    }

    #[test]
    fn pbuffer_handle_round_trips() {
        let shared = PipeShared::new(Size2D::new(64, 64));
        assert_eq!(shared.pbuffer(), 0);
        shared.set_pbuffer(0xdead);
        assert_eq!(shared.pbuffer(), 0xdead);
    }
}
