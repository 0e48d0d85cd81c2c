//! Logging helpers
//!
//! Log records go to stderr so they never interleave with relayed bytes on stdout.

/// Initialize the logging system
///
/// `RUST_LOG` wins when set; otherwise `level` is used.
///
/// # Parameters
///
/// * `level` - Log level
pub fn init_logger(level: &str) {
    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // try_init so a second call (tests, embedding) is harmless
    let _ = env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger() {
        init_logger("debug");
        // second initialization must not panic
        init_logger("info");
    }
}
