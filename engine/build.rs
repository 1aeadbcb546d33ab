fn main() {
    // build metadata ends up in every JSON report
    built::write_built_file().expect("Failed to acquire build-time information");
    #[cfg(not(debug_assertions))]
    println!("cargo:rerun-if-changed=build.rs");
}
