use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let target = env::var("TARGET").unwrap_or_default();

    if target.contains("avr") {
        // Configure for ATmega128
        println!("cargo:rustc-link-arg=-mmcu=atmega128");
    }

    // Splash payload embedded by the firmware; empty when none is given
    println!("cargo:rerun-if-env-changed=SPLASH_PAYLOAD");
    let payload = out_dir.join("payload.bin");
    match env::var_os("SPLASH_PAYLOAD") {
        Some(path) => {
            let path = PathBuf::from(path);
            println!("cargo:rerun-if-changed={}", path.display());
            fs::copy(&path, &payload)
                .unwrap_or_else(|e| panic!("cannot read SPLASH_PAYLOAD {}: {e}", path.display()));
        }
        None => {
            if target.contains("avr") {
                println!("cargo:warning=SPLASH_PAYLOAD not set, install entry will be disabled");
            }
            fs::write(&payload, b"").expect("OUT_DIR is writable");
        }
    }
}
