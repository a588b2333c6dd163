// build.rs

use chrono::Utc;
use std::env;
use std::fs;
use std::path::Path;

fn main() {
    // Get the output directory set by Cargo
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is always set for build scripts");
    let dest_path = Path::new(&out_dir).join("build_info.rs");

    let build_date = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

    // Emitted as a constant, pulled in by main.rs with include!
    fs::write(
        &dest_path,
        format!("pub const BUILD_DATE: &str = \"{}\";", build_date),
    ).expect("failed to write build_info.rs");

    println!("cargo:rerun-if-changed=build.rs");
}
