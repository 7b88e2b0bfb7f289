// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! EVM Compatibility Runtime
//!
//! Gives natively compiled contract code the execution semantics of the
//! foreign contract model on top of a host chain:
//!
//! - [`memory`] - word-addressed, metered scratch memory
//! - [`storage`] - deterministic slot derivation over the host store
//! - [`abi`] - head/tail ABI encoding and strict decoding
//! - [`context`] - per-call execution context
//! - [`call`] - plain, context-preserving and read-only calls, contract creation
//! - [`log`] - event records forwarded to the host
//! - [`runtime`] - the entry point binding everything to one host

pub mod abi;
pub mod call;
pub mod config;
pub mod context;
pub mod crypto;
pub mod error;
pub mod frame;
pub mod gas;
pub mod host_functions;
pub mod log;
pub mod math;
pub mod memory;
pub mod runtime;
pub mod storage;
pub mod traits;
pub mod utils;

// Re-export main types for convenience
pub use abi::{AbiType, AbiValue};
pub use call::{CallKind, CallOutcome, NativeCall};
pub use config::{GasSchedule, RuntimeConfig};
pub use context::ExecutionContext;
pub use error::{HostFunctionError, HostFunctionResult};
pub use frame::{Frame, FrameStatus};
pub use runtime::{ActiveFrame, InvocationRequest, InvocationResult, Runtime};
pub use storage::StorageSlot;
pub use traits::*;
pub use utils::{Address, Bytes32};
