// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

/// Maximum number of readiness events drained from the kernel in one batch.
/// Set to the max number of file descriptors that can be open without increasing the number on Linux.
pub const EPOLL_BATCH_SIZE: usize = 1024;

/// Maximum size for a receive buffer allocated on behalf of the caller.
pub const RECVBUF_SIZE_MAX: usize = 8192;
