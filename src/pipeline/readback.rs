// primus/src/pipeline/readback.rs
//
//! The readback worker.
//!
//! Owns an accelerating-side context sharing objects with the application's
//! (so it can wait on fences the application inserts) and two pixel-pack
//! buffers. Per frame it waits the fence on the GPU, queues an asynchronous
//! `ReadPixels` into one buffer, maps the finished buffer and hands the
//! mapping to the display worker. Which buffer gets mapped, and when the
//! application is released, depends on the synchronization mode.

use crate::config::SyncMode;
use crate::gl;
use crate::gl::types::{GLsizeiptr, GLuint};
use crate::glx::types::{Display as GlxDisplay, GLXContext, GLXDrawable, GLXFBConfig};
use crate::pipeline::{PipeShared, ReinitTodo, RELEASE_TIMEOUT};
use crate::profiler::Profiler;
use crate::state::PRIMUS;

use std::os::raw::c_int;
use std::ptr;
use std::sync::Arc;

pub struct ReadbackParams {
    pub shared: Arc<PipeShared>,
    pub fbconfig: GLXFBConfig,
    pub actx: GLXContext,
}

// Raw GLX handles; only this worker dereferences them.
unsafe impl Send for ReadbackParams {}

static STATE_NAMES: [&str; 3] = ["app", "map", "wait"];

pub fn run(params: ReadbackParams) {
    let primus = &*PRIMUS;
    let ReadbackParams {
        shared,
        fbconfig,
        actx,
    } = params;
    let afns = &primus.afns;
    let adpy = primus.adpy as *mut GlxDisplay;
    let mut profiler = Profiler::new("readback", &STATE_NAMES);
    let mut pbos: [GLuint; 2] = [0; 2];
    let mut mapped = [false, false];
    let mut cbuf = 0;
    let (mut width, mut height) = (0, 0);

    unsafe {
        if primus.sync != SyncMode::Strict {
            // No pixel-pack buffer is mapped yet; the display release
            // token starts out available.
            shared.d.relsem.post();
        }

        let context = afns.glx.CreateNewContext(
            adpy,
            fbconfig,
            x11::glx::GLX_RGBA_TYPE,
            actx,
            x11::xlib::True,
        );
        if afns.glx.IsDirect(adpy, context) == 0 {
            fatal!("failed to acquire direct rendering context for readback thread");
        }
        afns.glx
            .MakeCurrent(adpy, shared.pbuffer() as GLXDrawable, context);
        afns.gl.GenBuffers(2, pbos.as_mut_ptr());
        afns.gl.ReadBuffer(gl::BACK);
        afns.gl.BindBuffer(gl::PIXEL_PACK_BUFFER, pbos[cbuf]);

        loop {
            shared.r.acqsem.wait();
            profiler.tick(true);

            let todo = shared.r.reinit();
            if todo != ReinitTodo::None {
                forward_reinit(&shared, primus.sync, todo);
                if todo == ReinitTodo::Shutdown {
                    for i in 0..2 {
                        if mapped[i] {
                            afns.gl.BindBuffer(gl::PIXEL_PACK_BUFFER, pbos[i]);
                            afns.gl.UnmapBuffer(gl::PIXEL_PACK_BUFFER);
                        }
                    }
                    afns.gl.DeleteBuffers(2, pbos.as_ptr());
                    afns.glx.MakeCurrent(adpy, 0, ptr::null());
                    afns.glx.DestroyContext(adpy, context);
                    shared.r.relsem.post();
                    return;
                }
                shared.r.clear_reinit();
                let size = shared.size();
                width = size.width;
                height = size.height;
                // The backing surface was recreated by the application
                // thread; rebind it and size both pack buffers to match.
                afns.glx
                    .MakeCurrent(adpy, shared.pbuffer() as GLXDrawable, context);
                for &i in &[cbuf ^ 1, cbuf] {
                    afns.gl.BindBuffer(gl::PIXEL_PACK_BUFFER, pbos[i]);
                    if mapped[i] {
                        afns.gl.UnmapBuffer(gl::PIXEL_PACK_BUFFER);
                        mapped[i] = false;
                    }
                    afns.gl.BufferData(
                        gl::PIXEL_PACK_BUFFER,
                        (width as GLsizeiptr) * (height as GLsizeiptr) * 4,
                        ptr::null(),
                        gl::STREAM_READ,
                    );
                }
            }

            match primus.sync {
                SyncMode::None => {
                    afns.gl.WaitSync(shared.fence() as _, 0, gl::TIMEOUT_IGNORED);
                    afns.gl.ReadPixels(
                        0,
                        0,
                        width as c_int,
                        height as c_int,
                        gl::BGRA,
                        gl::UNSIGNED_INT_8_8_8_8_REV,
                        ptr::null_mut(),
                    );
                    // The read is queued; let the application continue.
                    shared.r.relsem.post();
                    let pixeldata = afns.gl.MapBuffer(gl::PIXEL_PACK_BUFFER, gl::READ_ONLY);
                    mapped[cbuf] = true;
                    profiler.tick(false);
                    if !shared.d.relsem.wait_timeout(RELEASE_TIMEOUT) {
                        warn!("dropping a frame to avoid deadlock");
                        afns.gl.UnmapBuffer(gl::PIXEL_PACK_BUFFER);
                        mapped[cbuf] = false;
                    } else {
                        shared.publish_pixeldata(pixeldata);
                        shared.d.acqsem.post();
                        cbuf ^= 1;
                        afns.gl.BindBuffer(gl::PIXEL_PACK_BUFFER, pbos[cbuf]);
                        if mapped[cbuf] {
                            // The token also released the mapping handed
                            // over one frame ago.
                            afns.gl.UnmapBuffer(gl::PIXEL_PACK_BUFFER);
                            mapped[cbuf] = false;
                        }
                    }
                    profiler.tick(false);
                }
                SyncMode::Lagged => {
                    afns.gl.WaitSync(shared.fence() as _, 0, gl::TIMEOUT_IGNORED);
                    // The buffer about to receive this frame is the one the
                    // display worker consumed last; its mapping must come
                    // back before the buffer can be overwritten.
                    if !shared.d.relsem.wait_timeout(RELEASE_TIMEOUT) {
                        warn!("dropping a frame to avoid deadlock");
                        shared.r.relsem.post();
                        profiler.tick(false);
                        profiler.tick(false);
                        continue;
                    }
                    afns.gl.BindBuffer(gl::PIXEL_PACK_BUFFER, pbos[cbuf]);
                    if mapped[cbuf] {
                        afns.gl.UnmapBuffer(gl::PIXEL_PACK_BUFFER);
                        mapped[cbuf] = false;
                    }
                    afns.gl.ReadPixels(
                        0,
                        0,
                        width as c_int,
                        height as c_int,
                        gl::BGRA,
                        gl::UNSIGNED_INT_8_8_8_8_REV,
                        ptr::null_mut(),
                    );
                    // Hand over the frame captured one swap ago while the
                    // GPU is still writing the current one.
                    afns.gl.BindBuffer(gl::PIXEL_PACK_BUFFER, pbos[cbuf ^ 1]);
                    let pixeldata = afns.gl.MapBuffer(gl::PIXEL_PACK_BUFFER, gl::READ_ONLY);
                    mapped[cbuf ^ 1] = true;
                    profiler.tick(false);
                    shared.publish_pixeldata(pixeldata);
                    shared.d.acqsem.post();
                    shared.r.relsem.post();
                    cbuf ^= 1;
                    afns.gl.BindBuffer(gl::PIXEL_PACK_BUFFER, pbos[cbuf]);
                    profiler.tick(false);
                }
                SyncMode::Strict => {
                    afns.gl.WaitSync(shared.fence() as _, 0, gl::TIMEOUT_IGNORED);
                    afns.gl.ReadPixels(
                        0,
                        0,
                        width as c_int,
                        height as c_int,
                        gl::BGRA,
                        gl::UNSIGNED_INT_8_8_8_8_REV,
                        ptr::null_mut(),
                    );
                    let pixeldata = afns.gl.MapBuffer(gl::PIXEL_PACK_BUFFER, gl::READ_ONLY);
                    mapped[cbuf] = true;
                    profiler.tick(false);
                    shared.publish_pixeldata(pixeldata);
                    shared.d.acqsem.post();
                    // Release the application only once the frame is on
                    // screen.
                    shared.d.relsem.wait();
                    shared.r.relsem.post();
                    cbuf ^= 1;
                    afns.gl.BindBuffer(gl::PIXEL_PACK_BUFFER, pbos[cbuf]);
                    if mapped[cbuf] {
                        afns.gl.UnmapBuffer(gl::PIXEL_PACK_BUFFER);
                        mapped[cbuf] = false;
                    }
                    profiler.tick(false);
                }
            }
        }
    }
}

/// Propagates a resize or shutdown into the display worker and waits for it
/// to complete. On shutdown an unresponsive display worker is killed; being
/// forced to do that during a resize would lose a live window, which is
/// unrecoverable.
unsafe fn forward_reinit(shared: &PipeShared, sync: SyncMode, todo: ReinitTodo) {
    if sync != SyncMode::Strict && !shared.d.relsem.wait_timeout(RELEASE_TIMEOUT) {
        warn!("timeout waiting for display worker");
        libc::pthread_cancel(shared.display_thread());
        // Stand in for the completion the cancelled worker will never post.
        shared.d.relsem.post();
        if todo != ReinitTodo::Shutdown {
            fatal!("display worker killed during resize");
        }
    }
    shared.d.set_reinit(todo);
    shared.d.acqsem.post();
    shared.d.relsem.wait();
    if sync != SyncMode::Strict {
        // Restore the "no pixel-pack buffer mapped" token.
        shared.d.relsem.post();
    }
}
