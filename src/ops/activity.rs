// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::{
    fail::Fail,
    reactor::Interest,
    scheduler::ResumeReason,
    SharedRuntime,
};
use ::std::{
    os::fd::RawFd,
    time::Duration,
};

//==============================================================================
// Standalone Functions
//==============================================================================

/// Reports whether the connected socket `fd` has incoming activity, waiting
/// for at most `timeout`. Bytes already queued in the receive buffer
/// short-circuit the wait.
///
/// A hangup counts as "no activity" and returns false, unlike [recv](crate::ops::recv),
/// which raises; callers that must distinguish the two should recv directly.
pub async fn wait_for_activity(runtime: SharedRuntime, fd: RawFd, timeout: Option<Duration>) -> Result<bool, Fail> {
    let mut pending: libc::c_int = 0;
    if unsafe { libc::ioctl(fd, libc::FIONREAD as libc::c_ulong, &mut pending) } == -1 {
        let errno: libc::c_int = unsafe { *libc::__errno_location() };
        let cause: String = format!("wait_for_activity(): FIONREAD failed (fd={:?}, errno={:?})", fd, errno);
        error!("{}", cause);
        return Err(Fail::new(errno, &cause));
    }
    if pending > 0 {
        trace!("wait_for_activity(): {:?} bytes already pending (fd={:?})", pending, fd);
        return Ok(true);
    }

    match runtime.wait_for(fd, Interest::Read, timeout).await? {
        ResumeReason::IoReady => Ok(true),
        ResumeReason::IoTimeout | ResumeReason::IoHup => Ok(false),
        ResumeReason::IoError => {
            let cause: String = format!("wait_for_activity(): socket failed (fd={:?})", fd);
            error!("{}", cause);
            Err(Fail::new(libc::EIO, &cause))
        },
        ResumeReason::Normal => unreachable!("wait_for_activity(): I/O wait resumed without a readiness event"),
    }
}
