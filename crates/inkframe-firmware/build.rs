use std::env;
use std::path::PathBuf;

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| String::from("."));
    let sdkconfig_defaults = PathBuf::from(&manifest_dir).join("sdkconfig.defaults");

    // Tell cargo to rerun if sdkconfig.defaults changes
    println!("cargo:rerun-if-changed=sdkconfig.defaults");

    if env::var("ESP_IDF_SDKCONFIG_DEFAULTS").is_err() {
        eprintln!("WARNING: ESP_IDF_SDKCONFIG_DEFAULTS not set, main task stack may be too small.");
        eprintln!(
            "Build with: export ESP_IDF_SDKCONFIG_DEFAULTS={}",
            sdkconfig_defaults.display()
        );
    }

    embuild::espidf::sysenv::output();
}
