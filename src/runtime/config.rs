// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::limits;
use ::std::env;

//==============================================================================
// Structures
//==============================================================================

/// Runtime tunables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of readiness events drained from the kernel per poll.
    pub epoll_batch_size: usize,
}

//==============================================================================
// Associate Functions
//==============================================================================

impl Config {
    /// Builds a configuration from the environment, falling back to the
    /// compile-time defaults for anything that is unset or malformed.
    pub fn from_env() -> Self {
        let epoll_batch_size: usize = match env::var("CATFIBER_BATCH_SIZE") {
            Ok(value) => match value.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!("from_env(): ignoring malformed CATFIBER_BATCH_SIZE ({:?})", value);
                    limits::EPOLL_BATCH_SIZE
                },
            },
            Err(_) => limits::EPOLL_BATCH_SIZE,
        };
        Self { epoll_batch_size }
    }
}

//==============================================================================
// Trait Implementations
//==============================================================================

impl Default for Config {
    fn default() -> Self {
        Self {
            epoll_batch_size: limits::EPOLL_BATCH_SIZE,
        }
    }
}
