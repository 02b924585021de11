// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use ::std::{
    convert::{
        AsMut,
        AsRef,
    },
    ops::{
        Deref,
        DerefMut,
    },
    rc::Rc,
};

//==============================================================================
// Structures
//==============================================================================

/// The SharedObject wraps an object that will be shared across fibers.
pub struct SharedObject<T>(Rc<T>);

//==============================================================================
// Associate Functions
//==============================================================================

impl<T> SharedObject<T> {
    pub fn new(object: T) -> Self {
        Self(Rc::new(object))
    }
}

//==============================================================================
// Trait Implementations
//==============================================================================

/// Dereferences a shared object for use.
impl<T> Deref for SharedObject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}

/// Dereferences a mutable reference to a shared object for use. This breaks Rust's ownership model because it allows
/// more than one mutable dereference of a shared object at a time. The runtime requires this because multiple fibers
/// hold mutable handles to shared objects at the same time; however, the runtime also ensures that only one fiber runs
/// at a time. Due to this design, Rust's static borrow checker is not able to ensure memory safety and we have chosen
/// not to use the dynamic borrow checker. Instead, shared objects should be used judiciously across fibers with the
/// understanding that the shared object may change/be mutated whenever the fiber yields.
impl<T> DerefMut for SharedObject<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        let ptr: *mut T = Rc::as_ptr(&self.0) as *mut T;
        unsafe { &mut *ptr }
    }
}

/// Returns a reference to the interior object.
impl<T> AsRef<T> for SharedObject<T> {
    fn as_ref(&self) -> &T {
        self.0.as_ref()
    }
}

/// Returns a mutable reference to the interior object. Similar to DerefMut, this breaks Rust's ownership properties
/// and is safe to use if and only if only one fiber runs at a time.
impl<T> AsMut<T> for SharedObject<T> {
    fn as_mut(&mut self) -> &mut T {
        let ptr: *mut T = Rc::as_ptr(&self.0) as *mut T;
        unsafe { &mut *ptr }
    }
}

impl<T> Clone for SharedObject<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
