// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Monotonic time source.
//!
//! All deadlines in the runtime are absolute values of this clock, so they can
//! be handed to the kernel's timer descriptors without translation.

//==============================================================================
// Imports
//==============================================================================

use ::std::{
    mem,
    time::Duration,
};

//==============================================================================
// Standalone Functions
//==============================================================================

/// Returns the current value of the monotonic clock.
pub fn now() -> Duration {
    let mut ts: libc::timespec = unsafe { mem::zeroed() };
    match unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) } {
        0 => Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32),
        _ => {
            let errno: libc::c_int = unsafe { *libc::__errno_location() };
            panic!("clock_gettime failed (errno={:?})", errno);
        },
    }
}

//==============================================================================
// Unit Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use ::anyhow::Result;
    use ::std::time::Duration;

    #[test]
    fn clock_is_monotonic() -> Result<()> {
        let first: Duration = super::now();
        let second: Duration = super::now();
        crate::ensure_eq!(first <= second, true);
        Ok(())
    }
}
