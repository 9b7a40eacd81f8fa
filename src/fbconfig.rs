// primus/src/fbconfig.rs
//
//! Matching framebuffer configurations and visuals across the two displays,
//! plus helpers for the accelerating-side off-screen surfaces.
//!
//! The application sees displaying-side visuals but accelerating-side
//! fbconfigs and contexts, so both directions of translation are needed:
//! a displaying visual picks the closest accelerating fbconfig, and an
//! accelerating fbconfig is answered with the closest displaying visual.

use crate::glx::types::{Display as GlxDisplay, GLXFBConfig, GLXPbuffer};
use crate::state::PRIMUS;

use euclid::default::Size2D;
use std::os::raw::{c_int, c_void};
use std::ptr;
use x11::glx::{
    GLX_ACCUM_ALPHA_SIZE, GLX_ACCUM_BLUE_SIZE, GLX_ACCUM_GREEN_SIZE, GLX_ACCUM_RED_SIZE,
    GLX_ALPHA_SIZE, GLX_AUX_BUFFERS, GLX_BLUE_SIZE, GLX_DEPTH_SIZE, GLX_DOUBLEBUFFER,
    GLX_GREEN_SIZE, GLX_PBUFFER_HEIGHT, GLX_PBUFFER_WIDTH, GLX_PRESERVED_CONTENTS, GLX_RED_SIZE,
    GLX_RGBA, GLX_SAMPLES, GLX_SAMPLE_BUFFERS, GLX_STENCIL_SIZE, GLX_STEREO,
};
use x11::xlib;

/// Finds an accelerating-side fbconfig matching a displaying-side visual by
/// copying the attribute vector across.
pub unsafe fn match_fbconfig(vis: *mut xlib::XVisualInfo) -> Option<GLXFBConfig> {
    let primus = &*PRIMUS;
    let mut attribs: [c_int; 31] = [
        GLX_DOUBLEBUFFER, 0, GLX_STEREO, 0, GLX_AUX_BUFFERS, 0,
        GLX_RED_SIZE, 0, GLX_GREEN_SIZE, 0, GLX_BLUE_SIZE, 0,
        GLX_ALPHA_SIZE, 0, GLX_DEPTH_SIZE, 0, GLX_STENCIL_SIZE, 0,
        GLX_ACCUM_RED_SIZE, 0, GLX_ACCUM_GREEN_SIZE, 0, GLX_ACCUM_BLUE_SIZE, 0,
        GLX_ACCUM_ALPHA_SIZE, 0, GLX_SAMPLE_BUFFERS, 0, GLX_SAMPLES, 0,
        0,
    ];
    let mut i = 0;
    while attribs[i] != 0 {
        primus.dfns.glx.GetConfig(
            primus.ddpy as *mut GlxDisplay,
            vis as *mut _,
            attribs[i],
            &mut attribs[i + 1],
        );
        i += 2;
    }

    let mut nconfigs = 0;
    let configs = primus.afns.glx.ChooseFBConfig(
        primus.adpy as *mut GlxDisplay,
        0,
        attribs.as_ptr(),
        &mut nconfigs,
    );
    if configs.is_null() || nconfigs == 0 {
        return None;
    }
    let config = *configs;
    xlib::XFree(configs as *mut c_void);
    Some(config)
}

/// Finds a displaying-side visual for an accelerating-side fbconfig,
/// retrying with progressively fewer attributes when no exact match
/// exists: attributes are stripped from the tail until a visual matches.
pub unsafe fn visual_for_fbconfig(config: GLXFBConfig) -> *mut xlib::XVisualInfo {
    let primus = &*PRIMUS;
    let probe = primus
        .afns
        .glx
        .GetVisualFromFBConfig(primus.adpy as *mut GlxDisplay, config);
    if probe.is_null() {
        return ptr::null_mut();
    }
    xlib::XFree(probe as *mut c_void);

    let mut attribs: [c_int; 19] = [
        GLX_RGBA, GLX_DOUBLEBUFFER,
        GLX_RED_SIZE, 0, GLX_GREEN_SIZE, 0, GLX_BLUE_SIZE, 0,
        GLX_ALPHA_SIZE, 0, GLX_DEPTH_SIZE, 0, GLX_STENCIL_SIZE, 0,
        GLX_SAMPLE_BUFFERS, 0, GLX_SAMPLES, 0,
        0,
    ];
    let mut i = 2;
    while attribs[i] != 0 {
        primus.afns.glx.GetFBConfigAttrib(
            primus.adpy as *mut GlxDisplay,
            config,
            attribs[i],
            &mut attribs[i + 1],
        );
        i += 2;
    }

    let mut vis: *mut xlib::XVisualInfo = ptr::null_mut();
    let mut strip = i as isize - 2;
    while strip >= 0 && vis.is_null() {
        vis = match_visual(&mut attribs);
        attribs[strip as usize] = 0;
        strip -= 2;
    }
    vis
}

/// Asks the displaying side for a visual and verifies the answer satisfies
/// every requested attribute exactly.
unsafe fn match_visual(attribs: &mut [c_int]) -> *mut xlib::XVisualInfo {
    let primus = &*PRIMUS;
    let vis = primus
        .dfns
        .glx
        .ChooseVisual(primus.ddpy as *mut GlxDisplay, 0, attribs.as_mut_ptr());
    if vis.is_null() {
        return ptr::null_mut();
    }
    let mut i = 2;
    while attribs[i] != 0 {
        let mut value = 0;
        primus
            .dfns
            .glx
            .GetConfig(primus.ddpy as *mut GlxDisplay, vis, attribs[i], &mut value);
        if value != attribs[i + 1] {
            xlib::XFree(vis as *mut c_void);
            return ptr::null_mut();
        }
        i += 2;
    }
    vis as *mut xlib::XVisualInfo
}

/// Looks up the dimensions of an X drawable.
pub unsafe fn note_geometry(dpy: *mut xlib::Display, drawable: xlib::Drawable) -> Size2D<i32> {
    let mut root = 0;
    let (mut x, mut y) = (0, 0);
    let (mut width, mut height, mut border_width, mut depth) = (0u32, 0u32, 0u32, 0u32);
    xlib::XGetGeometry(
        dpy,
        drawable,
        &mut root,
        &mut x,
        &mut y,
        &mut width,
        &mut height,
        &mut border_width,
        &mut depth,
    );
    Size2D::new(width as i32, height as i32)
}

/// Creates the accelerating-side off-screen surface backing a drawable.
pub unsafe fn create_pbuffer(fbconfig: GLXFBConfig, size: Size2D<i32>) -> GLXPbuffer {
    let primus = &*PRIMUS;
    let attribs: [c_int; 7] = [
        GLX_PBUFFER_WIDTH,
        size.width,
        GLX_PBUFFER_HEIGHT,
        size.height,
        GLX_PRESERVED_CONTENTS,
        xlib::True,
        0,
    ];
    primus.afns.glx.CreatePbuffer(
        primus.adpy as *mut GlxDisplay,
        fbconfig,
        attribs.as_ptr(),
    )
}
