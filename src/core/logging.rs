//! Logging initialization and utilities

/// Logger builder with the crate's default filter (`info`, overridable
/// with `RUST_LOG`)
pub fn builder() -> env_logger::Builder {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    )
}

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable.
///
/// # Example
/// ```
/// isoforge::core::logging::init();
/// log::info!("Terrain session starting");
/// ```
pub fn init() {
    // A second init (e.g. from several doc tests) is harmless
    let _ = builder().try_init();
}
