//! Generate `include/httpkit.h` from the `extern "C"` surface.

use std::fs;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let include_dir = crate_dir.join("include");

    // A header generation failure must not break the Rust build.
    let generated = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("HTTPKIT_H")
        .with_pragma_once(true)
        .generate();
    match generated {
        Ok(bindings) => {
            if fs::create_dir_all(&include_dir).is_ok() {
                bindings.write_to_file(include_dir.join("httpkit.h"));
            }
        }
        Err(err) => println!("cargo:warning=cbindgen: {err}"),
    }
}
