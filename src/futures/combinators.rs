// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use ::std::{
    future::Future,
    pin::Pin,
};

//==============================================================================
// Standalone Functions
//==============================================================================

/// Awaits each awaitable in order on the current fiber, discarding results.
/// There is no implicit concurrency: the total elapsed time collapses toward
/// the maximum only when the awaitables suspend on disjoint readiness events.
pub async fn await_all(awaitables: Vec<Pin<Box<dyn Future<Output = ()>>>>) {
    for awaitable in awaitables {
        awaitable.await;
    }
}

/// Awaits each awaitable in order on the current fiber and collects the
/// results, preserving order.
pub async fn capture_all<R>(awaitables: Vec<Pin<Box<dyn Future<Output = R>>>>) -> Vec<R> {
    let mut results: Vec<R> = Vec::with_capacity(awaitables.len());
    for awaitable in awaitables {
        results.push(awaitable.await);
    }
    results
}
