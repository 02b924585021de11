// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Readiness-event payloads.
//!
//! Every kernel registration carries a 64-bit payload: the low half names the
//! descriptor the registration is for (the primary), the high half names its
//! pair mate, if any. Bit 31 of each half tags the descriptor as a timer. An
//! I/O registration with a timeout installs two kernel registrations with
//! mirrored payloads, so whichever side fires first knows enough to cancel
//! the other.

//==============================================================================
// Imports
//==============================================================================

use ::std::os::fd::RawFd;

//==============================================================================
// Constants
//==============================================================================

/// Marks the descriptor in a payload half as a timer descriptor.
const TIMER_TAG: u32 = 1 << 31;

/// An absent payload half.
const EMPTY_HALF: u32 = u32::MAX;

//==============================================================================
// Structures
//==============================================================================

/// A descriptor plus its timer tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaggedFd {
    pub fd: RawFd,
    pub is_timer: bool,
}

/// The decoded form of a registration payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventPayload {
    pub primary: TaggedFd,
    pub extra: Option<TaggedFd>,
}

//==============================================================================
// Associate Functions
//==============================================================================

impl TaggedFd {
    pub fn io(fd: RawFd) -> Self {
        Self { fd, is_timer: false }
    }

    pub fn timer(fd: RawFd) -> Self {
        Self { fd, is_timer: true }
    }
}

impl EventPayload {
    pub fn new(primary: TaggedFd, extra: Option<TaggedFd>) -> Self {
        Self { primary, extra }
    }

    pub fn encode(&self) -> u64 {
        let low: u32 = Self::encode_half(Some(self.primary));
        let high: u32 = Self::encode_half(self.extra);
        ((high as u64) << 32) | (low as u64)
    }

    pub fn decode(raw: u64) -> Self {
        let low: u32 = raw as u32;
        let high: u32 = (raw >> 32) as u32;
        Self {
            primary: Self::decode_half(low).expect("payload must carry a primary descriptor"),
            extra: Self::decode_half(high),
        }
    }

    fn encode_half(slot: Option<TaggedFd>) -> u32 {
        match slot {
            None => EMPTY_HALF,
            Some(tagged) => {
                // The tag bit doubles as the range check: a descriptor with
                // bit 31 set cannot be registered.
                assert!(
                    tagged.fd >= 0 && (tagged.fd as u32) & TIMER_TAG == 0,
                    "descriptor out of payload range (fd={:?})",
                    tagged.fd
                );
                (tagged.fd as u32) | if tagged.is_timer { TIMER_TAG } else { 0 }
            },
        }
    }

    fn decode_half(half: u32) -> Option<TaggedFd> {
        if half == EMPTY_HALF {
            return None;
        }
        Some(TaggedFd {
            fd: (half & !TIMER_TAG) as RawFd,
            is_timer: half & TIMER_TAG != 0,
        })
    }
}

//==============================================================================
// Unit Tests
//==============================================================================
