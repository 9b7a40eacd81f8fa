// primus/src/pipeline/display.rs
//
//! The display worker.
//!
//! Owns a private connection to the primary display and a direct-rendering
//! context on the visible window. Per frame it uploads the mapped pixels
//! handed over by the readback worker into one of two rectangle textures
//! and draws a window-filling textured quad. It is also the only
//! participant that sees X events for the window, so resize detection
//! lives here.

use crate::config::SyncMode;
use crate::gl;
use crate::gl::types::{GLfloat, GLint, GLuint};
use crate::glx::types::{Display as GlxDisplay, GLXDrawable};
use crate::pipeline::{PipeShared, ReinitTodo};
use crate::profiler::Profiler;
use crate::state::PRIMUS;

use std::mem;
use std::os::raw::c_void;
use std::ptr;
use std::sync::Arc;
use x11::xlib;

pub struct DisplayParams {
    pub shared: Arc<PipeShared>,
    pub window: xlib::Window,
}

unsafe impl Send for DisplayParams {}

static STATE_NAMES: [&str; 3] = ["wait", "upload", "draw+swap"];

pub fn run(params: DisplayParams) {
    let primus = &*PRIMUS;
    let DisplayParams { shared, window } = params;
    let dfns = &primus.dfns;
    let mut profiler = Profiler::new("display", &STATE_NAMES);

    let quad_vertex_coords: [GLfloat; 8] = [-1.0, -1.0, -1.0, 1.0, 1.0, 1.0, 1.0, -1.0];
    let mut quad_texture_coords: [GLfloat; 8] = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
    let mut textures: [GLuint; 2] = [0; 2];
    let mut ctex = 0;
    let (mut width, mut height) = (0, 0);

    unsafe {
        // A private connection: the application keeps issuing X requests on
        // its own, and interleaving replies on a shared one would corrupt
        // both.
        let ddpy = xlib::XOpenDisplay(ptr::null());
        if ddpy.is_null() {
            fatal!("failed to open display connection for display thread");
        }
        xlib::XSelectInput(ddpy, window, xlib::StructureNotifyMask);

        let context = dfns.glx.CreateNewContext(
            ddpy as *mut GlxDisplay,
            primus.dconfig,
            x11::glx::GLX_RGBA_TYPE,
            ptr::null(),
            xlib::True,
        );
        if dfns.glx.IsDirect(ddpy as *mut GlxDisplay, context) == 0 {
            fatal!("failed to acquire direct rendering context for display thread");
        }
        dfns.glx
            .MakeCurrent(ddpy as *mut GlxDisplay, window as GLXDrawable, context);

        dfns.gl.VertexPointer(
            2,
            gl::FLOAT,
            0,
            quad_vertex_coords.as_ptr() as *const c_void,
        );
        dfns.gl.TexCoordPointer(
            2,
            gl::FLOAT,
            0,
            quad_texture_coords.as_ptr() as *const c_void,
        );
        dfns.gl.EnableClientState(gl::VERTEX_ARRAY);
        dfns.gl.EnableClientState(gl::TEXTURE_COORD_ARRAY);
        dfns.gl.GenTextures(2, textures.as_mut_ptr());
        dfns.gl.Enable(gl::TEXTURE_RECTANGLE);

        loop {
            shared.d.acqsem.wait();
            profiler.tick(true);

            match shared.d.reinit() {
                ReinitTodo::Shutdown => {
                    dfns.gl.DeleteTextures(2, textures.as_ptr());
                    dfns.glx.MakeCurrent(ddpy as *mut GlxDisplay, 0, ptr::null());
                    dfns.glx.DestroyContext(ddpy as *mut GlxDisplay, context);
                    xlib::XCloseDisplay(ddpy);
                    shared.d.relsem.post();
                    return;
                }
                ReinitTodo::Resize => {
                    shared.d.clear_reinit();
                    let size = shared.size();
                    width = size.width;
                    height = size.height;
                    // Rectangle targets address texels directly, so the
                    // quad's texture coordinates track the window size.
                    quad_texture_coords[4] = width as GLfloat;
                    quad_texture_coords[6] = width as GLfloat;
                    quad_texture_coords[3] = height as GLfloat;
                    quad_texture_coords[5] = height as GLfloat;
                    dfns.gl.Viewport(0, 0, width, height);
                    for &texture in &[textures[ctex ^ 1], textures[ctex]] {
                        dfns.gl.BindTexture(gl::TEXTURE_RECTANGLE, texture);
                        dfns.gl.TexImage2D(
                            gl::TEXTURE_RECTANGLE,
                            0,
                            gl::RGBA as GLint,
                            width,
                            height,
                            0,
                            gl::BGRA,
                            gl::UNSIGNED_INT_8_8_8_8_REV,
                            ptr::null(),
                        );
                    }
                    shared.d.relsem.post();
                    continue;
                }
                ReinitTodo::None => {}
            }

            dfns.gl.TexSubImage2D(
                gl::TEXTURE_RECTANGLE,
                0,
                0,
                0,
                width,
                height,
                gl::BGRA,
                gl::UNSIGNED_INT_8_8_8_8_REV,
                shared.pixeldata(),
            );
            if primus.sync != SyncMode::Strict {
                // The mapping has been consumed; release it as soon as
                // possible.
                shared.d.relsem.post();
            }
            profiler.tick(false);

            let mut pending = xlib::XPending(ddpy);
            while pending > 0 {
                let mut event: xlib::XEvent = mem::zeroed();
                xlib::XNextEvent(ddpy, &mut event);
                if event.get_type() == xlib::ConfigureNotify {
                    let configure = event.configure;
                    shared.set_size(configure.width, configure.height);
                    shared.set_reinit(ReinitTodo::Resize);
                }
                pending -= 1;
            }

            dfns.gl.DrawArrays(gl::QUADS, 0, 4);
            dfns.glx
                .SwapBuffers(ddpy as *mut GlxDisplay, window as GLXDrawable);
            ctex ^= 1;
            dfns.gl.BindTexture(gl::TEXTURE_RECTANGLE, textures[ctex]);
            if primus.sync == SyncMode::Strict {
                shared.d.relsem.post();
            }
            profiler.tick(false);
        }
    }
}
