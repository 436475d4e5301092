fn main() {
    println!("cargo:rerun-if-env-changed=ROTATOR_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=ROTATOR_WIFI_PASS");

    // Host builds (tests, fuzzing) have no IDF toolchain to export.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
