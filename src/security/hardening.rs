//! Process hardening
//!
//! A signer holds a decoded private key for the whole run, so core dumps are
//! switched off before any key material is read.

use crate::errors::Result;
#[cfg(target_os = "linux")]
use crate::errors::SignerError;
#[cfg(target_os = "linux")]
use tracing::debug;
#[cfg(not(target_os = "linux"))]
use tracing::warn;

/// Disable core dumps for this process
///
/// The caller decides whether a failure is fatal.
pub fn setup_memory_protection() -> Result<()> {
    #[cfg(target_os = "linux")]
    {
        use nix::sys::resource::{setrlimit, Resource};

        setrlimit(Resource::RLIMIT_CORE, 0, 0).map_err(|e| {
            SignerError::MemoryProtection(format!("could not disable core dumps: {}", e))
        })?;
        debug!("Core dumps disabled");
    }

    #[cfg(not(target_os = "linux"))]
    {
        warn!("Core dump suppression not supported on this platform");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{SignerError, EXIT_INTERNAL};

    #[test]
    #[cfg(target_os = "linux")]
    fn test_core_dumps_disabled() {
        use nix::sys::resource::{getrlimit, Resource};

        setup_memory_protection().unwrap();
        let (soft, hard) = getrlimit(Resource::RLIMIT_CORE).unwrap();
        assert_eq!((soft, hard), (0, 0));
    }

    #[test]
    fn test_failure_maps_to_internal_exit_code() {
        let err = SignerError::MemoryProtection("denied".to_string());
        assert_eq!(err.exit_code(), EXIT_INTERNAL);
    }
}
