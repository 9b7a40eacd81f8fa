// primus/src/state.rs
//
//! Process-wide state.
//!
//! Initialized lazily on the first intercepted GLX call: the bridge
//! handshake, both X display connections, both vendor GL libraries and the
//! two registries. The registries sit behind a single process-wide mutex;
//! the guard is never held across a GL or X call.

use crate::config::{self, SyncMode};
use crate::glx::types::{Display as GlxDisplay, GLXFBConfig};
use crate::loader::LibGl;
use crate::logging;
use crate::registry::{ContextRegistry, DrawableRegistry};

use std::ffi::CString;
use std::os::raw::{c_int, c_void};
use std::ptr;
use std::sync::{Mutex, MutexGuard};
use x11::xlib;

pub struct Registries {
    pub drawables: DrawableRegistry,
    pub contexts: ContextRegistry,
}

pub struct Primus {
    /// Readback/display synchronization method.
    pub sync: SyncMode,
    /// The accelerating X display.
    pub adpy: *mut xlib::Display,
    /// Our own connection to the displaying X server. The application keeps
    /// using its own.
    pub ddpy: *mut xlib::Display,
    /// The accelerating vendor's GL.
    pub afns: LibGl,
    /// The displaying vendor's GL.
    pub dfns: LibGl,
    /// Double-buffered fbconfig used for everything we create on the
    /// displaying side.
    pub dconfig: GLXFBConfig,
    /// Keeps the dispatch helper visible process-wide (Mesa requirement).
    #[allow(dead_code)]
    needed_global: *mut c_void,
    /// Keeps the daemon connection alive; dropping it would tear down the
    /// secondary display.
    #[cfg(feature = "bridge")]
    #[allow(dead_code)]
    bridge: crate::bridge::Bridge,
    registries: Mutex<Registries>,
}

unsafe impl Send for Primus {}
unsafe impl Sync for Primus {}

lazy_static! {
    pub static ref PRIMUS: Primus = Primus::init();
}

impl Primus {
    fn init() -> Primus {
        logging::init(config::verbosity());

        #[cfg(feature = "bridge")]
        let bridge = match crate::bridge::connect(&config::bridge_socket()) {
            Ok(bridge) => bridge,
            Err(error) => fatal!("failed to contact bridge daemon: {:?}", error),
        };

        let sync = SyncMode::from_env();

        unsafe {
            xlib::XInitThreads();

            let accel_display = CString::new(config::accel_display()).unwrap();
            let adpy = xlib::XOpenDisplay(accel_display.as_ptr());
            if adpy.is_null() {
                fatal!("failed to open secondary X display");
            }
            let ddpy = xlib::XOpenDisplay(ptr::null());
            if ddpy.is_null() {
                fatal!("failed to open primary X display");
            }

            let load_global = CString::new(config::load_global()).unwrap();
            let needed_global =
                libc::dlopen(load_global.as_ptr(), libc::RTLD_LAZY | libc::RTLD_GLOBAL);
            if needed_global.is_null() {
                fatal!("failed to load {}", config::load_global());
            }

            let afns = LibGl::load(&config::accel_libgl())
                .unwrap_or_else(|error| fatal!("loading accelerating libGL: {:?}", error));
            let dfns = LibGl::load(&config::display_libgl())
                .unwrap_or_else(|error| fatal!("loading displaying libGL: {:?}", error));

            let dconfig = choose_display_fbconfig(&dfns, ddpy)
                .unwrap_or_else(|| fatal!("no double-buffered fbconfig on the primary display"));

            Primus {
                sync,
                adpy,
                ddpy,
                afns,
                dfns,
                dconfig,
                needed_global,
                #[cfg(feature = "bridge")]
                bridge,
                registries: Mutex::new(Registries {
                    drawables: DrawableRegistry::default(),
                    contexts: ContextRegistry::default(),
                }),
            }
        }
    }

    /// Locks the registries. Callers copy out what they need and drop the
    /// guard before any GL or X call.
    pub fn registries(&self) -> MutexGuard<Registries> {
        self.registries.lock().unwrap()
    }
}

unsafe fn choose_display_fbconfig(dfns: &LibGl, ddpy: *mut xlib::Display) -> Option<GLXFBConfig> {
    let attribs: [c_int; 3] = [x11::glx::GLX_DOUBLEBUFFER, xlib::True, 0];
    let mut nconfigs = 0;
    let configs = dfns.glx.ChooseFBConfig(
        ddpy as *mut GlxDisplay,
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
