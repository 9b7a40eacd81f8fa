// primus/src/loader.rs
//
//! Loading the two vendor GL libraries.
//!
//! Each side of the shim owns a full copy of the GL and GLX function tables
//! resolved against one specific `dlopen` handle, so that every call lands
//! in the right vendor's driver no matter what the dynamic linker would
//! otherwise pick. Core entry points come from `dlsym`; everything else is
//! resolved through that library's own `glXGetProcAddress`.

use crate::error::Error;
use crate::gl::Gl;
use crate::glx::Glx;

use std::ffi::{CStr, CString};
use std::mem;
use std::os::raw::{c_char, c_int, c_uchar, c_void};

type GetProcAddressFn = unsafe extern "C" fn(*const c_uchar) -> *const c_void;

/// One vendor library: the `dlopen` handle plus captured function tables.
pub struct LibGl {
    #[allow(dead_code)]
    handle: *mut c_void,
    gpa: GetProcAddressFn,
    pub gl: Gl,
    pub glx: Glx,
}

unsafe impl Send for LibGl {}
unsafe impl Sync for LibGl {}

impl LibGl {
    /// Loads the first library of a colon-separated candidate list and
    /// captures its GL and GLX entry points.
    pub fn load(paths: &str) -> Result<LibGl, Error> {
        let handle = multi_dlopen(paths, libc::RTLD_LAZY)?;
        unsafe {
            let gpa_symbol =
                libc::dlsym(handle, b"glXGetProcAddress\0".as_ptr() as *const c_char);
            if gpa_symbol.is_null() {
                return Err(Error::GLFunctionNotFound("glXGetProcAddress"));
            }
            let gpa: GetProcAddressFn = mem::transmute(gpa_symbol);

            let gl = Gl::load_with(|name| unsafe { resolve(handle, gpa, name) });
            let glx = Glx::load_with(|name| unsafe { resolve(handle, gpa, name) });
            Ok(LibGl {
                handle,
                gpa,
                gl,
                glx,
            })
        }
    }

    /// This library's own `glXGetProcAddress`.
    #[inline]
    pub fn get_proc_address(&self, name: *const c_uchar) -> *const c_void {
        unsafe { (self.gpa)(name) }
    }
}

unsafe fn resolve(handle: *mut c_void, gpa: GetProcAddressFn, name: &str) -> *const c_void {
    let name = CString::new(name).unwrap();
    let symbol = libc::dlsym(handle, name.as_ptr());
    if !symbol.is_null() {
        return symbol as *const c_void;
    }
    gpa(name.as_ptr() as *const c_uchar)
}

/// Tries to load any of the colon-separated libraries. Paths must be
/// absolute; the first one the dynamic linker accepts wins. On total
/// failure every linker complaint is reported at once.
pub fn multi_dlopen(paths: &str, flags: c_int) -> Result<*mut c_void, Error> {
    let mut complaints = String::new();
    for path in paths.split(':') {
        if !path.starts_with('/') {
            return Err(Error::RelativeLibraryPath(path.to_string()));
        }
        let cpath = match CString::new(path) {
            Ok(cpath) => cpath,
            Err(_) => continue,
        };
        let handle = unsafe { libc::dlopen(cpath.as_ptr(), flags) };
        if !handle.is_null() {
            return Ok(handle);
        }
        unsafe {
            let message = libc::dlerror();
            if !message.is_null() {
                complaints.push_str(&CStr::from_ptr(message).to_string_lossy());
                complaints.push('\n');
            }
        }
    }
    Err(Error::LibraryLoadFailed(format!("{}\n{}", paths, complaints)))
}

#[cfg(test)]
mod tests {
    use super::multi_dlopen;
    use crate::error::Error;

    #[test]
    fn relative_paths_are_rejected() {
        match multi_dlopen("relative/libGL.so.1", libc::RTLD_LAZY) {
            Err(Error::RelativeLibraryPath(path)) => assert_eq!(path, "relative/libGL.so.1"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn missing_libraries_report_every_candidate() {
        match multi_dlopen("/nonexistent/a.so:/nonexistent/b.so", libc::RTLD_LAZY) {
            Err(Error::LibraryLoadFailed(report)) => {
                assert!(report.contains("/nonexistent/a.so"));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
