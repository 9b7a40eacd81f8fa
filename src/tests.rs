// primus/src/tests.rs
//
//! Unit tests.
//!
//! Everything here runs without a GPU or an X server. The scenarios that
//! need two live displays (steady-state rendering, live resize, share-group
//! respawn, shutdown reaping) are exercised manually; see DESIGN.md.

use crate::api;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::ptr;
use x11::glx::{GLX_EXTENSIONS, GLX_VENDOR, GLX_VERSION};

fn cstr(p: *const c_char) -> &'static str {
    assert!(!p.is_null());
    unsafe { CStr::from_ptr(p) }.to_str().unwrap()
}

#[test]
fn client_strings() {
    assert_eq!(cstr(api::glXGetClientString(ptr::null_mut(), GLX_VENDOR)), "primus");
    assert_eq!(cstr(api::glXGetClientString(ptr::null_mut(), GLX_VERSION)), "1.4");
    assert_eq!(
        cstr(api::glXGetClientString(ptr::null_mut(), GLX_EXTENSIONS)),
        "GLX_ARB_get_proc_address "
    );
    assert!(api::glXGetClientString(ptr::null_mut(), 0x1234).is_null());
    assert_eq!(
        cstr(api::glXQueryExtensionsString(ptr::null_mut(), 0)),
        "GLX_ARB_get_proc_address "
    );
}

#[test]
fn swap_interval_reports_failure() {
    assert_eq!(api::glXSwapIntervalSGI(0), 1);
    assert_eq!(api::glXSwapIntervalSGI(1), 1);
}

#[test]
fn reimplemented_glx_names_resolve() {
    // Every name the shim takes over must come back from the lookup; a
    // made-up GLX name must not.
    let reimplemented = [
        &b"glXChooseVisual\0"[..],
        &b"glXCreateContext\0"[..],
        &b"glXCreateNewContext\0"[..],
        &b"glXCreateWindow\0"[..],
        &b"glXDestroyContext\0"[..],
        &b"glXGetProcAddress\0"[..],
        &b"glXGetProcAddressARB\0"[..],
        &b"glXMakeContextCurrent\0"[..],
        &b"glXMakeCurrent\0"[..],
        &b"glXSwapBuffers\0"[..],
        &b"glXSwapIntervalSGI\0"[..],
        &b"glXUseXFont\0"[..],
        &b"glXWaitGL\0"[..],
    ];
    for name in &reimplemented {
        let stub = unsafe { api::glXGetProcAddress(name.as_ptr()) };
        assert!(!stub.is_null(), "missing stub for {:?}", cstr(name.as_ptr() as *const c_char));
    }
    assert!(unsafe { api::glXGetProcAddress(b"glXNotAThing\0".as_ptr()) }.is_null());
}

#[test]
fn make_current_matches_its_own_stub() {
    let stub = unsafe { api::glXGetProcAddress(b"glXMakeCurrent\0".as_ptr()) };
    assert_eq!(stub, api::glXMakeCurrent as *const std::os::raw::c_void);
}

#[test]
fn current_binding_starts_empty() {
    assert_eq!(api::glXGetCurrentDrawable(), 0);
    assert_eq!(api::glXGetCurrentReadDrawable(), 0);
    assert!(api::glXGetCurrentDisplay().is_null());
}
