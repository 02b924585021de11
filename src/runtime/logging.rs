// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use ::flexi_logger::Logger;
use ::std::sync::Once;

//==============================================================================
// Static Variables
//==============================================================================

/// Guardian to the logging initialize function.
static INIT_LOG: Once = Once::new();

//==============================================================================
// Standalone Functions
//==============================================================================

/// Initializes logging features. Log verbosity is taken from `RUST_LOG`,
/// falling back to warnings only.
pub fn initialize() {
    INIT_LOG.call_once(|| {
        Logger::try_with_env_or_str("warn").unwrap().start().unwrap();
    });
}
