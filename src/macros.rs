// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

/// Ensures that two expressions are equal, bailing out of the calling test on mismatch.
#[macro_export]
macro_rules! ensure_eq {
    ($left:expr, $right:expr) => {{
        let left = &$left;
        let right = &$right;
        if *left != *right {
            ::anyhow::bail!(
                "ensure_eq!({}, {}) failed: {:?} != {:?}",
                stringify!($left),
                stringify!($right),
                left,
                right
            );
        }
    }};
}

/// Ensures that two expressions are not equal, bailing out of the calling test on a match.
#[macro_export]
macro_rules! ensure_neq {
    ($left:expr, $right:expr) => {{
        let left = &$left;
        let right = &$right;
        if *left == *right {
            ::anyhow::bail!(
                "ensure_neq!({}, {}) failed: both are {:?}",
                stringify!($left),
                stringify!($right),
                left
            );
        }
    }};
}
