//! Command: print version information.

/// Version stamped by the build script, or the package version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("BOOTSTRAP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the bootstrap version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("bootstrap {}", version());
}
