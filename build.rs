//! Build script for flowgen
//!
//! Handles compile-time configuration for distro packagers and embeds
//! build-time information (git commit, dirty status, build timestamp)
//! shown by `flowgen --version`.

fn main() {
    // System-wide config fallback baked in by packagers
    println!("cargo:rerun-if-env-changed=FLOWGEN_SYSTEM_CONFIG");

    shadow_rs::ShadowBuilder::builder()
        .build()
        .expect("Failed to generate build info");
}
