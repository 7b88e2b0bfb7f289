// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Compatibility Runtime
//!
//! Owns the host, the configuration, the optional slot cache and the stack
//! of active frames. There is no process-wide runtime: every component
//! reaches its collaborators through the [`Runtime`] it was created by, so
//! independent runtimes can live side by side.
//!
//! # Usage
//!
//! ```rust,ignore
//! let runtime = Runtime::new(host);
//! let (contract, _) = runtime.deploy(&init_code, 1_000_000);
//! let result = runtime.execute(InvocationRequest::new(contract, call_data, 1_000_000));
//! match result {
//!     InvocationResult::Committed { return_data, .. } => { /* ... */ }
//!     InvocationResult::Rejected { reason, .. } => { /* ... */ }
//! }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::evm::call::{derive_create_address, CallKind, Entry, NativeCall};
use crate::evm::config::RuntimeConfig;
use crate::evm::context::ExecutionContext;
use crate::evm::storage::SlotCache;
use crate::evm::traits::CompatHost;
use crate::evm::utils::{format_address, is_zero_word, Address};

/// Entry on the stack of active frames
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveFrame {
    pub code_address: Address,
    pub storage_owner: Address,
    pub kind: CallKind,
    pub depth: usize,
}

/// One transaction submitted to the runtime
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationRequest {
    pub target: Address,
    pub input: Vec<u8>,
    pub gas_limit: u64,
}

impl InvocationRequest {
    pub fn new(target: Address, input: Vec<u8>, gas_limit: u64) -> Self {
        Self {
            target,
            input,
            gas_limit,
        }
    }
}

/// What the transaction submitter observes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvocationResult {
    /// State changes and events were committed
    Committed { return_data: Vec<u8>, gas_used: u64 },
    /// Nothing was committed
    Rejected {
        reason: String,
        return_data: Vec<u8>,
        gas_used: u64,
    },
}

impl InvocationResult {
    pub fn is_committed(&self) -> bool {
        matches!(self, InvocationResult::Committed { .. })
    }

    pub fn return_data(&self) -> &[u8] {
        match self {
            InvocationResult::Committed { return_data, .. }
            | InvocationResult::Rejected { return_data, .. } => return_data,
        }
    }

    pub fn gas_used(&self) -> u64 {
        match self {
            InvocationResult::Committed { gas_used, .. } | InvocationResult::Rejected { gas_used, .. } => {
                *gas_used
            }
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            InvocationResult::Committed { .. } => None,
            InvocationResult::Rejected { reason, .. } => Some(reason),
        }
    }
}

/// Compatibility runtime bound to one host
pub struct Runtime<H: CompatHost> {
    host: H,
    config: RuntimeConfig,
    cache: Option<SlotCache>,
    call_stack: RefCell<Vec<ActiveFrame>>,
}

impl<H: CompatHost> Runtime<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, RuntimeConfig::default())
    }

    pub fn with_config(host: H, config: RuntimeConfig) -> Self {
        let cache = config.storage_cache.then(SlotCache::new);
        Self {
            host,
            config,
            cache,
            call_stack: RefCell::new(Vec::new()),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn slot_cache(&self) -> Option<&SlotCache> {
        self.cache.as_ref()
    }

    /// Frames currently executing, outermost first
    pub fn call_stack(&self) -> Vec<ActiveFrame> {
        self.call_stack.borrow().clone()
    }

    /// Whether a read-only call is active anywhere on the stack
    pub fn in_read_only(&self) -> bool {
        self.call_stack
            .borrow()
            .iter()
            .any(|frame| frame.kind == CallKind::ReadOnly)
    }

    pub(crate) fn enter(&self, frame: ActiveFrame) -> FrameGuard<'_, H> {
        self.call_stack.borrow_mut().push(frame);
        FrameGuard { runtime: self }
    }

    fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Run one transaction from the host's current call metadata.
    ///
    /// The outermost frame runs with depth 0. Any fault or revert there
    /// rejects the whole invocation and asks the host to discard its state.
    pub fn execute(&self, request: InvocationRequest) -> InvocationResult {
        log::debug!(
            "execute: {} -> {} gas {}",
            format_address(&self.host.metadata().sender),
            format_address(&request.target),
            request.gas_limit
        );
        self.host.begin_transaction();
        self.clear_cache();
        self.run_outermost(request.target, request.input, request.gas_limit, Entry::Call)
    }

    /// Deploy `init_code` as a transaction from the host's current sender.
    ///
    /// The address is derived from the sender's nonce, which is bumped first.
    /// On rejection nothing stays installed and the nonce bump is undone with
    /// the rest of the transaction.
    pub fn deploy(&self, init_code: &[u8], gas_limit: u64) -> (Address, InvocationResult) {
        let sender = self.host.metadata().sender;
        self.host.begin_transaction();
        self.clear_cache();

        let address = derive_create_address(&sender, self.host.nonce(&sender));
        log::debug!(
            "deploy: {} -> {} gas {}",
            format_address(&sender),
            format_address(&address),
            gas_limit
        );
        self.host.increment_nonce(&sender);

        if let Err(err) = self.host.install_code(&address, init_code) {
            let reason = err.reason();
            return (address, self.reject(reason, err.into_return_data(), 0));
        }
        let result = self.run_outermost(address, init_code.to_vec(), gas_limit, Entry::Construct);
        (address, result)
    }

    fn run_outermost(&self, target: Address, input: Vec<u8>, gas_limit: u64, entry: Entry) -> InvocationResult {
        let metadata = self.host.metadata();
        if !is_zero_word(&metadata.value) && !self.host.transfer(&metadata.sender, &target, &metadata.value) {
            return self.reject("insufficient balance for value transfer".to_string(), Vec::new(), 0);
        }

        let context = Rc::new(ExecutionContext::from_metadata(&metadata, target, input.clone()));
        let call = NativeCall::new(self, context, input, target, CallKind::Plain, 0, gas_limit, entry);
        let outcome = self.host.invoke(&target, call);

        match outcome.result {
            Ok(return_data) => {
                self.host.end_transaction(true);
                log::debug!("execute: committed, gas used {}", outcome.gas_used);
                InvocationResult::Committed {
                    return_data,
                    gas_used: outcome.gas_used,
                }
            }
            Err(err) => {
                let reason = err.reason();
                self.reject(reason, err.into_return_data(), outcome.gas_used)
            }
        }
    }

    fn reject(&self, reason: String, return_data: Vec<u8>, gas_used: u64) -> InvocationResult {
        log::warn!("execute: rejected: {}", reason);
        self.host.end_transaction(false);
        self.clear_cache();
        InvocationResult::Rejected {
            reason,
            return_data,
            gas_used,
        }
    }
}

/// Pops its frame from the runtime's stack on every exit path
pub(crate) struct FrameGuard<'a, H: CompatHost> {
    runtime: &'a Runtime<H>,
}

impl<H: CompatHost> Drop for FrameGuard<'_, H> {
    fn drop(&mut self) {
        self.runtime.call_stack.borrow_mut().pop();
    }
}
