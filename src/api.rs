// primus/src/api.rs
//
//! The intercepted GLX entry points.
//!
//! Contexts and fbconfigs handed to the application live on the
//! accelerating display; drawable handles and visuals live on the
//! displaying one. `glXSwapBuffers` is where the pipeline is driven: it
//! inserts a fence, wakes the readback worker, and applies any pending
//! resize once the worker releases it.

#![allow(non_snake_case)]
#![allow(clippy::missing_safety_doc)]

use crate::fbconfig;
use crate::glx::types::{
    Display as GlxDisplay, GLXContext, GLXDrawable, GLXFBConfig, GLXPbuffer, GLXPixmap, GLXWindow,
};
use crate::pipeline::{ReinitTodo, WorkerPair};
use crate::registry::{DrawableInfo, DrawableKind};
use crate::state::{Registries, PRIMUS};

use std::cell::Cell;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_uchar, c_uint, c_ulong, c_void};
use std::ptr;
use std::sync::Arc;
use x11::glx::{GLX_EXTENSIONS, GLX_VENDOR, GLX_VERSION, GLX_VISUAL_ID};
use x11::xlib;

const VENDOR_STRING: &[u8] = b"primus\0";
const VERSION_STRING: &[u8] = b"1.4\0";
const EXTENSIONS_STRING: &[u8] = b"GLX_ARB_get_proc_address \0";

/// What this thread believes is current. The accelerating side is actually
/// current on the paired off-screen surfaces.
#[derive(Clone, Copy)]
struct CurrentBinding {
    dpy: *mut xlib::Display,
    drawable: GLXDrawable,
    read_drawable: GLXDrawable,
}

thread_local! {
    static CURRENT: Cell<CurrentBinding> = Cell::new(CurrentBinding {
        dpy: ptr::null_mut(),
        drawable: 0,
        read_drawable: 0,
    });
}

// ---------------------------------------------------------------------------
// Contexts
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn glXCreateContext(
    _dpy: *mut xlib::Display,
    vis: *mut xlib::XVisualInfo,
    share_list: GLXContext,
    direct: c_int,
) -> GLXContext {
    let primus = &*PRIMUS;
    let config = match fbconfig::match_fbconfig(vis) {
        Some(config) => config,
        None => {
            warn!("glXCreateContext: no accelerating fbconfig matches the visual");
            return ptr::null();
        }
    };
    let ctx = primus.afns.glx.CreateNewContext(
        primus.adpy as *mut GlxDisplay,
        config,
        x11::glx::GLX_RGBA_TYPE,
        share_list,
        direct,
    );
    if !ctx.is_null() {
        primus.registries().contexts.record(ctx, config, share_list);
    }
    ctx
}

#[no_mangle]
pub unsafe extern "C" fn glXCreateNewContext(
    _dpy: *mut xlib::Display,
    config: GLXFBConfig,
    render_type: c_int,
    share_list: GLXContext,
    direct: c_int,
) -> GLXContext {
    let primus = &*PRIMUS;
    let ctx = primus.afns.glx.CreateNewContext(
        primus.adpy as *mut GlxDisplay,
        config,
        render_type,
        share_list,
        direct,
    );
    if !ctx.is_null() {
        primus.registries().contexts.record(ctx, config, share_list);
    }
    ctx
}

#[no_mangle]
pub unsafe extern "C" fn glXDestroyContext(_dpy: *mut xlib::Display, ctx: GLXContext) {
    let primus = &*PRIMUS;
    let orphaned = {
        let mut guard = primus.registries();
        guard.contexts.remove(ctx);
        // Without a live context the worker threads can never be asked to
        // stop again; reap them now so the library can be unloaded.
        if guard.contexts.is_empty() {
            guard.drawables.drain_workers()
        } else {
            Vec::new()
        }
    };
    for (shared, pair) in orphaned {
        pair.reap(&shared);
    }
    primus
        .afns
        .glx
        .DestroyContext(primus.adpy as *mut GlxDisplay, ctx);
}

// ---------------------------------------------------------------------------
// Make-current and the backing off-screen surfaces
// ---------------------------------------------------------------------------

/// Returns the parent of a window, or zero for the root.
unsafe fn query_parent(dpy: *mut xlib::Display, window: xlib::Window) -> xlib::Window {
    let mut root = 0;
    let mut parent = 0;
    let mut children: *mut xlib::Window = ptr::null_mut();
    let mut nchildren: c_uint = 0;
    xlib::XQueryTree(dpy, window, &mut root, &mut parent, &mut children, &mut nchildren);
    if !children.is_null() {
        xlib::XFree(children as *mut c_void);
    }
    parent
}

/// Marks the window and every ancestor below the root with the
/// compositor-bypass property, so the compositor does not add another
/// buffering stage on top of ours.
unsafe fn block_compositing(dpy: *mut xlib::Display, window: xlib::Window) {
    let atom = xlib::XInternAtom(
        dpy,
        b"_KDE_NET_WM_BLOCK_COMPOSITING\0".as_ptr() as *const c_char,
        xlib::False,
    );
    let mut current = window;
    loop {
        let parent = query_parent(dpy, current);
        if parent == 0 {
            break;
        }
        xlib::XChangeProperty(
            dpy,
            current,
            atom,
            xlib::XA_ATOM,
            32,
            xlib::PropModeReplace,
            ptr::null(),
            0,
        );
        current = parent;
    }
}

/// Creates or recalls the accelerating-side surface backing a drawable.
///
/// A drawable we have never seen is a plain X window the application
/// created directly; it is adopted with the fbconfig of the supplied
/// context. A known drawable whose context disagrees on the fbconfig gets
/// its surface (and workers) recreated.
///
/// Concurrent make-current of one drawable from several threads is
/// undefined behavior; the recreate path assumes a single caller.
unsafe fn lookup_pbuffer(
    dpy: *mut xlib::Display,
    draw: GLXDrawable,
    ctx: GLXContext,
) -> GLXPbuffer {
    if draw == 0 {
        return 0;
    }
    let primus = &*PRIMUS;

    let known = primus.registries().drawables.known(draw);
    if !known {
        let fbconfig = match primus.registries().contexts.get(ctx) {
            Some(record) => record.fbconfig,
            None => {
                warn!("glXMakeCurrent: cannot adopt a plain X window without a known context");
                return 0;
            }
        };
        let size = fbconfig::note_geometry(dpy, draw);
        block_compositing(dpy, draw);
        primus.registries().drawables.insert(
            draw,
            DrawableInfo::new(DrawableKind::RawWindow, fbconfig, draw as xlib::Window, size),
        );
    } else if !ctx.is_null() {
        let stale = {
            let mut guard = primus.registries();
            let Registries {
                ref mut drawables,
                ref contexts,
            } = *guard;
            let ctx_fbconfig = contexts.get(ctx).map(|record| record.fbconfig);
            match (drawables.get_mut(draw), ctx_fbconfig) {
                (Some(info), Some(ctx_fbconfig)) if info.fbconfig != ctx_fbconfig => {
                    info.fbconfig = ctx_fbconfig;
                    let pbuffer = info.shared.pbuffer();
                    if pbuffer != 0 {
                        info.shared.set_pbuffer(0);
                        Some((Arc::clone(&info.shared), info.workers.take(), pbuffer))
                    } else {
                        None
                    }
                }
                _ => None,
            }
        };
        if let Some((shared, workers, pbuffer)) = stale {
            warn!("recreating incompatible pbuffer");
            if let Some(pair) = workers {
                pair.reap(&shared);
            }
            primus
                .afns
                .glx
                .DestroyPbuffer(primus.adpy as *mut GlxDisplay, pbuffer);
        }
    }

    let missing = {
        let guard = primus.registries();
        match guard.drawables.get(draw) {
            Some(info) if info.shared.pbuffer() == 0 => {
                Some((info.fbconfig, Arc::clone(&info.shared)))
            }
            Some(info) => return info.shared.pbuffer() as GLXPbuffer,
            None => return 0,
        }
    };
    match missing {
        Some((fbconfig, shared)) => {
            let pbuffer = fbconfig::create_pbuffer(fbconfig, shared.size());
            shared.set_pbuffer(pbuffer as u64);
            pbuffer
        }
        None => 0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn glXMakeCurrent(
    dpy: *mut xlib::Display,
    drawable: GLXDrawable,
    ctx: GLXContext,
) -> c_int {
    let primus = &*PRIMUS;
    let pbuffer = lookup_pbuffer(dpy, drawable, ctx);
    CURRENT.with(|current| {
        current.set(CurrentBinding {
            dpy,
            drawable,
            read_drawable: drawable,
        })
    });
    primus
        .afns
        .glx
        .MakeCurrent(primus.adpy as *mut GlxDisplay, pbuffer as GLXDrawable, ctx)
}

#[no_mangle]
pub unsafe extern "C" fn glXMakeContextCurrent(
    dpy: *mut xlib::Display,
    draw: GLXDrawable,
    read: GLXDrawable,
    ctx: GLXContext,
) -> c_int {
    if draw == read {
        return glXMakeCurrent(dpy, draw, ctx);
    }
    let primus = &*PRIMUS;
    let pbuffer = lookup_pbuffer(dpy, draw, ctx);
    let pbuffer_read = lookup_pbuffer(dpy, read, ctx);
    CURRENT.with(|current| {
        current.set(CurrentBinding {
            dpy,
            drawable: draw,
            read_drawable: read,
        })
    });
    primus.afns.glx.MakeContextCurrent(
        primus.adpy as *mut GlxDisplay,
        pbuffer as GLXDrawable,
        pbuffer_read as GLXDrawable,
        ctx,
    )
}

// ---------------------------------------------------------------------------
// Buffer swap
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn glXSwapBuffers(_dpy: *mut xlib::Display, drawable: GLXDrawable) {
    let primus = &*PRIMUS;
    let ctx = primus.afns.glx.GetCurrentContext();

    let (kind, shared) = {
        let guard = primus.registries();
        match guard.drawables.get(drawable) {
            Some(info) => (info.kind, Arc::clone(&info.shared)),
            None => {
                warn!("glXSwapBuffers: unknown drawable");
                return;
            }
        }
    };

    if !kind.presented() {
        // Nothing to show on screen; swap the off-screen surface so the
        // next frame renders into a defined back buffer.
        let pbuffer = shared.pbuffer();
        if pbuffer != 0 {
            primus
                .afns
                .glx
                .SwapBuffers(primus.adpy as *mut GlxDisplay, pbuffer as GLXDrawable);
        }
        return;
    }

    if ctx.is_null() {
        warn!("glXSwapBuffers: no current context");
        return;
    }

    // Workers built around a context from another share group cannot wait
    // on fences this context inserts; replace them.
    let stale = {
        let mut guard = primus.registries();
        let Registries {
            ref mut drawables,
            ref contexts,
        } = *guard;
        match drawables.get_mut(drawable) {
            Some(info) if info.workers.is_some() && !contexts.same_sharegroup(info.actx, ctx) => {
                info.workers.take()
            }
            Some(_) => None,
            None => return,
        }
    };
    if let Some(pair) = stale {
        warn!("glXSwapBuffers: respawning threads after context change");
        pair.reap(&shared);
    }

    {
        let mut guard = primus.registries();
        let info = match guard.drawables.get_mut(drawable) {
            Some(info) => info,
            None => return,
        };
        if info.workers.is_none() {
            info.actx = ctx;
            info.workers = Some(WorkerPair::spawn(
                Arc::clone(&info.shared),
                info.fbconfig,
                ctx,
                info.window,
            ));
        }
    }

    // The readback worker must not read a frame the GPU has not finished.
    let fence = primus.afns.gl.FenceSync(crate::gl::SYNC_GPU_COMMANDS_COMPLETE, 0);
    shared.set_fence(fence as *mut c_void);
    shared.r.acqsem.post();
    shared.r.relsem.wait();
    primus.afns.gl.DeleteSync(fence);

    primus.afns.glx.SwapBuffers(
        primus.adpy as *mut GlxDisplay,
        shared.pbuffer() as GLXDrawable,
    );

    if shared.reinit() == ReinitTodo::Resize {
        let fbconfig = {
            let guard = primus.registries();
            match guard.drawables.get(drawable) {
                Some(info) => info.fbconfig,
                None => return,
            }
        };
        primus.afns.glx.DestroyPbuffer(
            primus.adpy as *mut GlxDisplay,
            shared.pbuffer() as GLXDrawable,
        );
        let pbuffer = fbconfig::create_pbuffer(fbconfig, shared.size());
        shared.set_pbuffer(pbuffer as u64);
        // Keep the fresh surface current in this thread before the next
        // frame starts.
        let binding = CURRENT.with(|current| current.get());
        glXMakeContextCurrent(binding.dpy, binding.drawable, binding.read_drawable, ctx);
        shared.r.set_reinit(ReinitTodo::Resize);
        shared.set_reinit(ReinitTodo::None);
    }
}

// ---------------------------------------------------------------------------
// Drawable creation and destruction
// ---------------------------------------------------------------------------

/// Tears down everything a registry entry owns: worker threads first, then
/// the backing off-screen surface.
unsafe fn release_drawable(info: DrawableInfo) {
    let primus = &*PRIMUS;
    let DrawableInfo {
        workers, shared, ..
    } = info;
    if let Some(pair) = workers {
        pair.reap(&shared);
    }
    let pbuffer = shared.pbuffer();
    if pbuffer != 0 {
        primus
            .afns
            .glx
            .DestroyPbuffer(primus.adpy as *mut GlxDisplay, pbuffer as GLXDrawable);
    }
}

#[no_mangle]
pub unsafe extern "C" fn glXCreateWindow(
    dpy: *mut xlib::Display,
    config: GLXFBConfig,
    win: xlib::Window,
    attrib_list: *const c_int,
) -> GLXWindow {
    let primus = &*PRIMUS;
    let glxwin = primus.dfns.glx.CreateWindow(
        primus.ddpy as *mut GlxDisplay,
        primus.dconfig,
        win,
        attrib_list,
    );
    let size = fbconfig::note_geometry(dpy, win);
    primus.registries().drawables.insert(
        glxwin,
        DrawableInfo::new(DrawableKind::GlxWindow, config, win, size),
    );
    glxwin
}

#[no_mangle]
pub unsafe extern "C" fn glXDestroyWindow(_dpy: *mut xlib::Display, window: GLXWindow) {
    let primus = &*PRIMUS;
    let info = primus.registries().drawables.remove(window);
    match info {
        Some(info) => release_drawable(info),
        None => warn!("glXDestroyWindow: unknown drawable"),
    }
    primus
        .dfns
        .glx
        .DestroyWindow(primus.ddpy as *mut GlxDisplay, window);
}

#[no_mangle]
pub unsafe extern "C" fn glXCreatePbuffer(
    _dpy: *mut xlib::Display,
    config: GLXFBConfig,
    attrib_list: *const c_int,
) -> GLXPbuffer {
    let primus = &*PRIMUS;
    let pbuffer = primus.dfns.glx.CreatePbuffer(
        primus.ddpy as *mut GlxDisplay,
        primus.dconfig,
        attrib_list,
    );
    let mut size = euclid::default::Size2D::new(0, 0);
    if !attrib_list.is_null() {
        let mut i = 0;
        while *attrib_list.offset(i) != 0 {
            let attrib = *attrib_list.offset(i);
            let value = *attrib_list.offset(i + 1);
            if attrib == x11::glx::GLX_PBUFFER_WIDTH {
                size.width = value;
            } else if attrib == x11::glx::GLX_PBUFFER_HEIGHT {
                size.height = value;
            }
            i += 2;
        }
    }
    primus.registries().drawables.insert(
        pbuffer,
        DrawableInfo::new(DrawableKind::Pbuffer, config, 0, size),
    );
    pbuffer
}

#[no_mangle]
pub unsafe extern "C" fn glXDestroyPbuffer(_dpy: *mut xlib::Display, pbuf: GLXPbuffer) {
    let primus = &*PRIMUS;
    let info = primus.registries().drawables.remove(pbuf);
    match info {
        Some(info) => release_drawable(info),
        None => warn!("glXDestroyPbuffer: unknown drawable"),
    }
    primus
        .dfns
        .glx
        .DestroyPbuffer(primus.ddpy as *mut GlxDisplay, pbuf);
}

#[no_mangle]
pub unsafe extern "C" fn glXCreatePixmap(
    dpy: *mut xlib::Display,
    config: GLXFBConfig,
    pixmap: xlib::Pixmap,
    attrib_list: *const c_int,
) -> GLXPixmap {
    let primus = &*PRIMUS;
    let glxpix = primus
        .dfns
        .glx
        .CreatePixmap(dpy as *mut GlxDisplay, primus.dconfig, pixmap, attrib_list);
    let size = fbconfig::note_geometry(dpy, pixmap);
    primus.registries().drawables.insert(
        glxpix,
        DrawableInfo::new(DrawableKind::Pixmap, config, 0, size),
    );
    glxpix
}

#[no_mangle]
pub unsafe extern "C" fn glXDestroyPixmap(dpy: *mut xlib::Display, pixmap: GLXPixmap) {
    let primus = &*PRIMUS;
    let info = primus.registries().drawables.remove(pixmap);
    match info {
        Some(info) => release_drawable(info),
        None => warn!("glXDestroyPixmap: unknown drawable"),
    }
    primus
        .dfns
        .glx
        .DestroyPixmap(dpy as *mut GlxDisplay, pixmap);
}

#[no_mangle]
pub unsafe extern "C" fn glXCreateGLXPixmap(
    dpy: *mut xlib::Display,
    visual: *mut xlib::XVisualInfo,
    pixmap: xlib::Pixmap,
) -> GLXPixmap {
    let primus = &*PRIMUS;
    let glxpix =
        primus
            .dfns
            .glx
            .CreateGLXPixmap(primus.ddpy as *mut GlxDisplay, visual as *mut _, pixmap);
    let size = fbconfig::note_geometry(dpy, pixmap);
    let fbconfig = match fbconfig::match_fbconfig(visual) {
        Some(config) => config,
        None => {
            warn!("glXCreateGLXPixmap: no accelerating fbconfig matches the visual");
            ptr::null()
        }
    };
    primus.registries().drawables.insert(
        glxpix,
        DrawableInfo::new(DrawableKind::Pixmap, fbconfig, 0, size),
    );
    glxpix
}

#[no_mangle]
pub unsafe extern "C" fn glXDestroyGLXPixmap(_dpy: *mut xlib::Display, pixmap: GLXPixmap) {
    let primus = &*PRIMUS;
    glXDestroyPixmap(primus.ddpy, pixmap);
}

// ---------------------------------------------------------------------------
// Visuals and configuration queries
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn glXChooseVisual(
    dpy: *mut xlib::Display,
    screen: c_int,
    attrib_list: *mut c_int,
) -> *mut xlib::XVisualInfo {
    let primus = &*PRIMUS;
    primus
        .dfns
        .glx
        .ChooseVisual(dpy as *mut GlxDisplay, screen, attrib_list) as *mut xlib::XVisualInfo
}

#[no_mangle]
pub unsafe extern "C" fn glXGetConfig(
    dpy: *mut xlib::Display,
    visual: *mut xlib::XVisualInfo,
    attrib: c_int,
    value: *mut c_int,
) -> c_int {
    let primus = &*PRIMUS;
    primus
        .dfns
        .glx
        .GetConfig(dpy as *mut GlxDisplay, visual as *mut _, attrib, value)
}

#[no_mangle]
pub unsafe extern "C" fn glXGetVisualFromFBConfig(
    _dpy: *mut xlib::Display,
    config: GLXFBConfig,
) -> *mut xlib::XVisualInfo {
    fbconfig::visual_for_fbconfig(config)
}

#[no_mangle]
pub unsafe extern "C" fn glXGetFBConfigAttrib(
    dpy: *mut xlib::Display,
    config: GLXFBConfig,
    attribute: c_int,
    value: *mut c_int,
) -> c_int {
    let primus = &*PRIMUS;
    let result =
        primus
            .afns
            .glx
            .GetFBConfigAttrib(primus.adpy as *mut GlxDisplay, config, attribute, value);
    // The application compares visual ids against what the X server on the
    // displaying side reports, so this one attribute is cross-translated.
    if attribute == GLX_VISUAL_ID && *value != 0 {
        let vis = glXGetVisualFromFBConfig(dpy, config);
        if !vis.is_null() {
            let result = primus.dfns.glx.GetConfig(
                primus.ddpy as *mut GlxDisplay,
                vis as *mut _,
                attribute,
                value,
            );
            xlib::XFree(vis as *mut c_void);
            return result;
        }
    }
    result
}

#[no_mangle]
pub unsafe extern "C" fn glXQueryDrawable(
    dpy: *mut xlib::Display,
    draw: GLXDrawable,
    attribute: c_int,
    value: *mut c_uint,
) {
    let primus = &*PRIMUS;
    let pbuffer = lookup_pbuffer(dpy, draw, ptr::null());
    primus.afns.glx.QueryDrawable(
        primus.adpy as *mut GlxDisplay,
        pbuffer as GLXDrawable,
        attribute,
        value,
    );
}

// ---------------------------------------------------------------------------
// Fonts
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn glXUseXFont(font: xlib::Font, first: c_int, count: c_int, list_base: c_int) {
    let primus = &*PRIMUS;
    // Resolve the font to its XLFD name on the displaying server and load
    // the same face on the accelerating one.
    let font_struct = xlib::XQueryFont(primus.ddpy, font);
    if font_struct.is_null() {
        warn!("glXUseXFont: unknown font");
        return;
    }
    let mut name_atom: c_ulong = 0;
    xlib::XGetFontProperty(font_struct, xlib::XA_FONT, &mut name_atom);
    let xlfd = xlib::XGetAtomName(primus.ddpy, name_atom);
    let afont = xlib::XLoadFont(primus.adpy, xlfd);
    primus.afns.glx.UseXFont(afont, first, count, list_base);
    xlib::XUnloadFont(primus.adpy, afont);
    xlib::XFree(xlfd as *mut c_void);
    xlib::XFreeFontInfo(ptr::null_mut(), font_struct, 1);
}

// ---------------------------------------------------------------------------
// Current-state queries and no-ops
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn glXGetCurrentContext() -> GLXContext {
    let primus = &*PRIMUS;
    primus.afns.glx.GetCurrentContext()
}

#[no_mangle]
pub extern "C" fn glXGetCurrentDrawable() -> GLXDrawable {
    CURRENT.with(|current| current.get().drawable)
}

#[no_mangle]
pub extern "C" fn glXGetCurrentReadDrawable() -> GLXDrawable {
    CURRENT.with(|current| current.get().read_drawable)
}

#[no_mangle]
pub extern "C" fn glXGetCurrentDisplay() -> *mut xlib::Display {
    CURRENT.with(|current| current.get().dpy)
}

#[no_mangle]
pub extern "C" fn glXWaitGL() {}

#[no_mangle]
pub extern "C" fn glXWaitX() {}

#[no_mangle]
pub extern "C" fn glXGetClientString(_dpy: *mut xlib::Display, name: c_int) -> *const c_char {
    match name {
        GLX_VENDOR => VENDOR_STRING.as_ptr() as *const c_char,
        GLX_VERSION => VERSION_STRING.as_ptr() as *const c_char,
        GLX_EXTENSIONS => EXTENSIONS_STRING.as_ptr() as *const c_char,
        _ => ptr::null(),
    }
}

#[no_mangle]
pub extern "C" fn glXQueryExtensionsString(
    _dpy: *mut xlib::Display,
    _screen: c_int,
) -> *const c_char {
    EXTENSIONS_STRING.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn glXSwapIntervalSGI(_interval: c_int) -> c_int {
    // Swap interval is meaningless when presentation happens on another
    // GPU; report failure.
    warn!("glXSwapIntervalSGI: not supported");
    1
}

// ---------------------------------------------------------------------------
// Display-redirected forwarders
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn glXChooseFBConfig(
    _dpy: *mut xlib::Display,
    screen: c_int,
    attrib_list: *const c_int,
    nelements: *mut c_int,
) -> *mut GLXFBConfig {
    let primus = &*PRIMUS;
    primus
        .afns
        .glx
        .ChooseFBConfig(primus.adpy as *mut GlxDisplay, screen, attrib_list, nelements)
}

#[no_mangle]
pub unsafe extern "C" fn glXGetFBConfigs(
    _dpy: *mut xlib::Display,
    screen: c_int,
    nelements: *mut c_int,
) -> *mut GLXFBConfig {
    let primus = &*PRIMUS;
    primus
        .afns
        .glx
        .GetFBConfigs(primus.adpy as *mut GlxDisplay, screen, nelements)
}

#[no_mangle]
pub unsafe extern "C" fn glXQueryVersion(
    _dpy: *mut xlib::Display,
    major: *mut c_int,
    minor: *mut c_int,
) -> c_int {
    let primus = &*PRIMUS;
    primus
        .afns
        .glx
        .QueryVersion(primus.adpy as *mut GlxDisplay, major, minor)
}

#[no_mangle]
pub unsafe extern "C" fn glXQueryExtension(
    _dpy: *mut xlib::Display,
    error_base: *mut c_int,
    event_base: *mut c_int,
) -> c_int {
    let primus = &*PRIMUS;
    primus
        .afns
        .glx
        .QueryExtension(primus.adpy as *mut GlxDisplay, error_base, event_base)
}

#[no_mangle]
pub unsafe extern "C" fn glXIsDirect(_dpy: *mut xlib::Display, ctx: GLXContext) -> c_int {
    let primus = &*PRIMUS;
    primus.afns.glx.IsDirect(primus.adpy as *mut GlxDisplay, ctx)
}

#[no_mangle]
pub unsafe extern "C" fn glXQueryContext(
    _dpy: *mut xlib::Display,
    ctx: GLXContext,
    attribute: c_int,
    value: *mut c_int,
) -> c_int {
    let primus = &*PRIMUS;
    primus
        .afns
        .glx
        .QueryContext(primus.adpy as *mut GlxDisplay, ctx, attribute, value)
}

#[no_mangle]
pub unsafe extern "C" fn glXQueryServerString(
    _dpy: *mut xlib::Display,
    screen: c_int,
    name: c_int,
) -> *const c_char {
    let primus = &*PRIMUS;
    primus
        .afns
        .glx
        .QueryServerString(primus.adpy as *mut GlxDisplay, screen, name)
}

#[no_mangle]
pub unsafe extern "C" fn glXSelectEvent(
    _dpy: *mut xlib::Display,
    draw: GLXDrawable,
    event_mask: c_ulong,
) {
    let primus = &*PRIMUS;
    primus
        .afns
        .glx
        .SelectEvent(primus.adpy as *mut GlxDisplay, draw, event_mask);
}

#[no_mangle]
pub unsafe extern "C" fn glXGetSelectedEvent(
    _dpy: *mut xlib::Display,
    draw: GLXDrawable,
    event_mask: *mut c_ulong,
) {
    let primus = &*PRIMUS;
    primus
        .afns
        .glx
        .GetSelectedEvent(primus.adpy as *mut GlxDisplay, draw, event_mask);
}

// ---------------------------------------------------------------------------
// Entry point resolution
// ---------------------------------------------------------------------------

/// The functions this library takes over. Everything else named `glX*` is
/// unavailable on purpose.
fn reimplemented(name: &str) -> *const c_void {
    match name {
        "glXChooseFBConfig" => glXChooseFBConfig as *const c_void,
        "glXChooseVisual" => glXChooseVisual as *const c_void,
        "glXCreateContext" => glXCreateContext as *const c_void,
        "glXCreateGLXPixmap" => glXCreateGLXPixmap as *const c_void,
        "glXCreateNewContext" => glXCreateNewContext as *const c_void,
        "glXCreatePbuffer" => glXCreatePbuffer as *const c_void,
        "glXCreatePixmap" => glXCreatePixmap as *const c_void,
        "glXCreateWindow" => glXCreateWindow as *const c_void,
        "glXDestroyContext" => glXDestroyContext as *const c_void,
        "glXDestroyGLXPixmap" => glXDestroyGLXPixmap as *const c_void,
        "glXDestroyPbuffer" => glXDestroyPbuffer as *const c_void,
        "glXDestroyPixmap" => glXDestroyPixmap as *const c_void,
        "glXDestroyWindow" => glXDestroyWindow as *const c_void,
        "glXGetClientString" => glXGetClientString as *const c_void,
        "glXGetConfig" => glXGetConfig as *const c_void,
        "glXGetCurrentContext" => glXGetCurrentContext as *const c_void,
        "glXGetCurrentDisplay" => glXGetCurrentDisplay as *const c_void,
        "glXGetCurrentDrawable" => glXGetCurrentDrawable as *const c_void,
        "glXGetCurrentReadDrawable" => glXGetCurrentReadDrawable as *const c_void,
        "glXGetFBConfigAttrib" => glXGetFBConfigAttrib as *const c_void,
        "glXGetFBConfigs" => glXGetFBConfigs as *const c_void,
        "glXGetProcAddress" => glXGetProcAddress as *const c_void,
        "glXGetProcAddressARB" => glXGetProcAddressARB as *const c_void,
        "glXGetSelectedEvent" => glXGetSelectedEvent as *const c_void,
        "glXGetVisualFromFBConfig" => glXGetVisualFromFBConfig as *const c_void,
        "glXIsDirect" => glXIsDirect as *const c_void,
        "glXMakeContextCurrent" => glXMakeContextCurrent as *const c_void,
        "glXMakeCurrent" => glXMakeCurrent as *const c_void,
        "glXQueryContext" => glXQueryContext as *const c_void,
        "glXQueryDrawable" => glXQueryDrawable as *const c_void,
        "glXQueryExtension" => glXQueryExtension as *const c_void,
        "glXQueryExtensionsString" => glXQueryExtensionsString as *const c_void,
        "glXQueryServerString" => glXQueryServerString as *const c_void,
        "glXQueryVersion" => glXQueryVersion as *const c_void,
        "glXSelectEvent" => glXSelectEvent as *const c_void,
        "glXSwapBuffers" => glXSwapBuffers as *const c_void,
        "glXSwapIntervalSGI" => glXSwapIntervalSGI as *const c_void,
        "glXUseXFont" => glXUseXFont as *const c_void,
        "glXWaitGL" => glXWaitGL as *const c_void,
        "glXWaitX" => glXWaitX as *const c_void,
        _ => ptr::null(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn glXGetProcAddress(proc_name: *const c_uchar) -> *const c_void {
    if proc_name.is_null() {
        return ptr::null();
    }
    let name = CStr::from_ptr(proc_name as *const c_char);
    let name = match name.to_str() {
        Ok(name) => name,
        Err(_) => return ptr::null(),
    };
    // Plain GL names resolve inside the accelerating library; GLX names are
    // either ours or unavailable.
    if !name.starts_with("glX") {
        let primus = &*PRIMUS;
        return primus.afns.get_proc_address(proc_name);
    }
    reimplemented(name)
}

#[no_mangle]
pub unsafe extern "C" fn glXGetProcAddressARB(proc_name: *const c_uchar) -> *const c_void {
    glXGetProcAddress(proc_name)
}
