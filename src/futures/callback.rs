// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crate::futures::PollAwaitable;

//==============================================================================
// Structures
//==============================================================================

/// A polling-style future driven by a callback: `None` means not ready yet,
/// `Some(value)` completes it. The first produced value is latched, so the
/// callback is not invoked again once it has yielded one.
pub struct CallbackFuture<T> {
    callback: Box<dyn FnMut() -> Option<T>>,
    value: Option<T>,
}

/// The void flavor of [CallbackFuture]: the callback reports only readiness.
pub struct CallbackVoidFuture {
    callback: Box<dyn FnMut() -> bool>,
    done: bool,
}

//==============================================================================
// Associate Functions
//==============================================================================

impl<T> CallbackFuture<T> {
    pub fn new<F: FnMut() -> Option<T> + 'static>(callback: F) -> Self {
        Self {
            callback: Box::new(callback),
            value: None,
        }
    }
}

impl CallbackVoidFuture {
    pub fn new<F: FnMut() -> bool + 'static>(callback: F) -> Self {
        Self {
            callback: Box::new(callback),
            done: false,
        }
    }
}

//==============================================================================
// Standalone Functions
//==============================================================================

/// Defers a computation to the scheduler: the function runs inline on the
/// first poll, when the loop reaches the awaiting fiber, not when the wrapper
/// is built. Captures move into the closure at construction, so later
/// mutations of the environment are not observed.
pub fn do_async<T, F: FnOnce() -> T + 'static>(f: F) -> CallbackFuture<T> {
    let mut f: Option<F> = Some(f);
    CallbackFuture::new(move || Some((f.take().expect("deferred function already ran"))()))
}

/// The void flavor of [do_async].
pub fn do_async_void<F: FnOnce() + 'static>(f: F) -> CallbackVoidFuture {
    let mut f: Option<F> = Some(f);
    CallbackVoidFuture::new(move || {
        (f.take().expect("deferred function already ran"))();
        true
    })
}

//==============================================================================
// Trait Implementations
//==============================================================================

impl<T> PollAwaitable for CallbackFuture<T> {
    type Output = T;

    fn is_done(&mut self) -> bool {
        if self.value.is_none() {
            self.value = (self.callback)();
        }
        self.value.is_some()
    }

    fn take_value(&mut self) -> T {
        self.value.take().expect("value is not ready")
    }
}

impl PollAwaitable for CallbackVoidFuture {
    type Output = ();

    fn is_done(&mut self) -> bool {
        if !self.done {
            self.done = (self.callback)();
        }
        self.done
    }

    fn take_value(&mut self) {}
}

//==============================================================================
// Unit Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use crate::futures::{
        do_async,
        do_async_void,
        CallbackFuture,
        CallbackVoidFuture,
        PollAwaitable,
    };
    use ::anyhow::Result;
    use ::std::{
        cell::Cell,
        rc::Rc,
    };

    #[test]
    fn callback_is_latched_after_first_value() -> Result<()> {
        let invocations: Rc<Cell<usize>> = Rc::new(Cell::new(0));
        let counter: Rc<Cell<usize>> = invocations.clone();
        let mut future: CallbackFuture<usize> = CallbackFuture::new(move || {
            counter.set(counter.get() + 1);
            if counter.get() >= 3 {
                Some(counter.get())
            } else {
                None
            }
        });

        crate::ensure_eq!(future.is_done(), false);
        crate::ensure_eq!(future.is_done(), false);
        crate::ensure_eq!(future.is_done(), true);
        // Latched: further probes do not run the callback again.
        crate::ensure_eq!(future.is_done(), true);
        crate::ensure_eq!(invocations.get(), 3);
        crate::ensure_eq!(future.take_value(), 3);
        Ok(())
    }

    #[test]
    fn void_callback_latches_readiness() -> Result<()> {
        let ran: Rc<Cell<bool>> = Rc::new(Cell::new(false));
        let flag: Rc<Cell<bool>> = ran.clone();
        let mut future: CallbackVoidFuture = do_async_void(move || flag.set(true));

        crate::ensure_eq!(ran.get(), false);
        crate::ensure_eq!(future.is_done(), true);
        crate::ensure_eq!(future.is_done(), true);
        crate::ensure_eq!(ran.get(), true);
        future.take_value();
        Ok(())
    }

    #[test]
    fn do_async_defers_until_first_probe() -> Result<()> {
        let ran: Rc<Cell<bool>> = Rc::new(Cell::new(false));
        let flag: Rc<Cell<bool>> = ran.clone();
        let mut future: CallbackFuture<i32> = do_async(move || {
            flag.set(true);
            42
        });

        crate::ensure_eq!(ran.get(), false);
        crate::ensure_eq!(future.is_done(), true);
        crate::ensure_eq!(ran.get(), true);
        crate::ensure_eq!(future.take_value(), 42);
        Ok(())
    }
}
