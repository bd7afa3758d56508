fn main() {
    println!("cargo:rerun-if-changed=components/mlx90640");

    // Host builds (tests, fuzzing) have no ESP-IDF environment to export.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
