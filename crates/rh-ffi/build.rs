use std::path::PathBuf;

fn main() {
    let manifest_dir = PathBuf::from(
        std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR environment variable not set"),
    );
    let csrc = manifest_dir.join("csrc");

    // Cores log through a printf-style variadic callback, which Rust can't define
    cc::Build::new()
        .file(csrc.join("log_shim.c"))
        .warnings(true)
        .compile("rh_log_shim");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", csrc.display());
}
