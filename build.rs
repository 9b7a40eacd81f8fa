// primus/build.rs
//
//! The `primus` build script.

use gl_generator::{Api, Fallbacks, Profile, Registry, StructGenerator};
use std::env;
use std::fs::File;
use std::path::PathBuf;

fn main() {
    let dest = PathBuf::from(&env::var("OUT_DIR").unwrap());

    // Generate GL bindings. Struct generators are used because two copies of
    // the API are loaded side by side, one per vendor library. The
    // compatibility profile is needed: the display pass draws fixed-function
    // textured quads.
    let mut file = File::create(&dest.join("gl_bindings.rs")).unwrap();
    let registry = Registry::new(Api::Gl, (3, 2), Profile::Compatibility, Fallbacks::All, []);
    registry.write_bindings(StructGenerator, &mut file).unwrap();

    // Generate GLX bindings.
    let mut file = File::create(&dest.join("glx_bindings.rs")).unwrap();
    let registry = Registry::new(Api::Glx, (1, 4), Profile::Core, Fallbacks::All, []);
    registry.write_bindings(StructGenerator, &mut file).unwrap();
}
