// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! External Call Manager
//!
//! Message-call semantics over the host's native call primitive.
//!
//! # Call Kinds
//!
//! - [`CallKind::Plain`] - the callee runs in a fresh context whose sender is
//!   the calling contract. Attached value moves before the callee starts and
//!   is not refunded here if the callee fails.
//! - [`CallKind::ContextPreserving`] - the callee's code runs against the
//!   caller's own context and storage.
//! - [`CallKind::ReadOnly`] - dispatched like a plain call without value. The
//!   host rejects any state mutation; the rejection surfaces as a failed
//!   result.
//!
//! Callee faults never propagate to the caller as errors: every dispatch
//! yields a [`ContractCallResult`]. The only errors returned by the dispatch
//! methods are faults of the calling frame itself, such as running out of
//! gas for the call's base cost, or a value transfer or creation attempted
//! while a read-only call is active. Those halt the calling frame.
//!
//! # Address Derivation
//!
//! - Create: `last20(hash256(sender ‖ word(nonce)))`
//! - Create2: `last20(hash256(0xFF ‖ sender ‖ salt ‖ hash256(init_code)))`,
//!   refused when the derived address is already occupied.

use std::rc::Rc;

use crate::evm::abi::encode_revert_reason;
use crate::evm::context::ExecutionContext;
use crate::evm::crypto::{hash256, keccak256};
use crate::evm::error::{call_error, write_protection_error, HostFunctionResult};
use crate::evm::frame::Frame;
use crate::evm::runtime::{ActiveFrame, Runtime};
use crate::evm::traits::{CompatHost, ContractCallResult, ContractCode, ContractCreateResult};
use crate::evm::utils::{
    format_address, is_zero_word, last_20_bytes, word_from_u64, Address, Bytes32, ZERO_WORD,
};

/// Closed set of message-call kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
    Plain,
    ContextPreserving,
    ReadOnly,
}

impl CallKind {
    /// Name of the host function that dispatches this kind
    pub fn function_name(self) -> &'static str {
        match self {
            CallKind::Plain => "call_contract",
            CallKind::ContextPreserving => "call_delegate",
            CallKind::ReadOnly => "call_static",
        }
    }
}

/// Address of a contract created by `sender` with creation nonce `nonce`
pub fn derive_create_address(sender: &Address, nonce: u64) -> Address {
    last_20_bytes(&hash256(&[&sender[..], &word_from_u64(nonce)[..]]))
}

/// Address of a contract created by `sender` from `init_code` with `salt`
pub fn derive_create2_address(sender: &Address, salt: &Bytes32, init_code: &[u8]) -> Address {
    last_20_bytes(&hash256(&[&[0xFFu8][..], &sender[..], &salt[..], &keccak256(init_code)[..]]))
}

/// What a dispatched frame produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallOutcome {
    pub result: HostFunctionResult<Vec<u8>>,
    pub gas_used: u64,
}

impl CallOutcome {
    pub fn returned(data: Vec<u8>, gas_used: u64) -> Self {
        Self {
            result: Ok(data),
            gas_used,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Failures become data: the revert payload or an `Error(string)` reason
    pub fn into_call_result(self) -> ContractCallResult {
        match self.result {
            Ok(data) => ContractCallResult::success(data, self.gas_used),
            Err(err) => ContractCallResult::failure(err.into_return_data(), self.gas_used),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Entry {
    Call,
    Construct,
}

/// A pending frame handed to [`CompatHost::invoke`].
///
/// The host resolves the target's code and calls [`NativeCall::run`], or
/// [`NativeCall::no_code`] when there is nothing to run.
pub struct NativeCall<'a, H: CompatHost> {
    runtime: &'a Runtime<H>,
    context: Rc<ExecutionContext>,
    input: Vec<u8>,
    code_address: Address,
    kind: CallKind,
    depth: usize,
    gas_limit: u64,
    entry: Entry,
}

impl<'a, H: CompatHost> NativeCall<'a, H> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        runtime: &'a Runtime<H>,
        context: Rc<ExecutionContext>,
        input: Vec<u8>,
        code_address: Address,
        kind: CallKind,
        depth: usize,
        gas_limit: u64,
        entry: Entry,
    ) -> Self {
        Self {
            runtime,
            context,
            input,
            code_address,
            kind,
            depth,
            gas_limit,
            entry,
        }
    }

    pub fn kind(&self) -> CallKind {
        self.kind
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn input(&self) -> &[u8] {
        &self.input
    }

    /// Identity whose code runs; differs from the context address for
    /// context-preserving calls
    pub fn code_address(&self) -> &Address {
        &self.code_address
    }

    pub fn is_construct(&self) -> bool {
        self.entry == Entry::Construct
    }

    /// Run `code` in a new frame.
    ///
    /// A fatal fault consumes the whole gas limit; a revert only what was
    /// used up to that point.
    pub fn run(self, code: &dyn ContractCode<H>) -> CallOutcome {
        let runtime = self.runtime;
        let depth = self.depth;
        let gas_limit = self.gas_limit;
        let _guard = runtime.enter(ActiveFrame {
            code_address: self.code_address,
            storage_owner: *self.context.address(),
            kind: self.kind,
            depth,
        });

        let mut frame = Frame::new(
            runtime,
            self.context,
            self.input,
            self.code_address,
            self.kind,
            depth,
            gas_limit,
        );
        let mut result = match self.entry {
            Entry::Call => code.call(&mut frame),
            Entry::Construct => code.construct(&mut frame),
        };
        // A halted frame fails even if its code discarded the fault
        if let Some(fault) = frame.take_fault() {
            result = Err(fault);
        }
        let gas_used = frame.gas().used();

        match result {
            Ok(data) => CallOutcome::returned(data, gas_used),
            Err(err) if err.is_fatal() => {
                log::debug!("frame at depth {} faulted: {}", depth, err);
                CallOutcome {
                    result: Err(err),
                    gas_used: gas_limit,
                }
            }
            Err(err) => {
                log::debug!("frame at depth {} reverted", depth);
                CallOutcome {
                    result: Err(err),
                    gas_used,
                }
            }
        }
    }

    /// Outcome for a target without code
    pub fn no_code(self) -> CallOutcome {
        log::trace!("no code at {}", format_address(&self.code_address));
        CallOutcome::returned(Vec::new(), 0)
    }
}

impl<'a, H: CompatHost> Frame<'a, H> {
    /// Plain call, transferring `value` to `target` first
    pub fn call_plain(
        &mut self,
        target: &Address,
        value: &Bytes32,
        input: &[u8],
        gas: u64,
    ) -> HostFunctionResult<ContractCallResult> {
        self.dispatch(CallKind::Plain, target, value, input, gas)
    }

    /// Run `target`'s code against this frame's context and storage
    pub fn call_context_preserving(
        &mut self,
        target: &Address,
        input: &[u8],
        gas: u64,
    ) -> HostFunctionResult<ContractCallResult> {
        self.dispatch(CallKind::ContextPreserving, target, &ZERO_WORD, input, gas)
    }

    /// Call `target` with state mutation forbidden for the whole sub-tree
    pub fn call_read_only(
        &mut self,
        target: &Address,
        input: &[u8],
        gas: u64,
    ) -> HostFunctionResult<ContractCallResult> {
        self.dispatch(CallKind::ReadOnly, target, &ZERO_WORD, input, gas)
    }

    fn dispatch(
        &mut self,
        kind: CallKind,
        target: &Address,
        value: &Bytes32,
        input: &[u8],
        gas: u64,
    ) -> HostFunctionResult<ContractCallResult> {
        let function = kind.function_name();
        let runtime = self.runtime;
        let schedule = runtime.config().gas_schedule;
        let transfers_value = kind == CallKind::Plain && !is_zero_word(value);
        if transfers_value && self.is_read_only() {
            let err = write_protection_error("value transfer in read-only call", function);
            return self.track(Err(err));
        }

        let mut cost = schedule.call_base;
        if transfers_value {
            cost = cost.saturating_add(schedule.value_transfer);
        }
        self.charge_gas(cost, function)?;
        self.return_data.clear();

        if self.depth >= runtime.config().max_call_depth {
            log::debug!("{}: depth limit {} reached", function, runtime.config().max_call_depth);
            let err = call_error("call depth limit reached", function, &format_address(target));
            return Ok(ContractCallResult::failure(err.into_return_data(), 0));
        }

        if transfers_value && !runtime.host().transfer(self.context.address(), target, value) {
            log::debug!("{}: value transfer to {} refused", function, format_address(target));
            let err = call_error("value transfer failed", function, &format_address(target));
            return Ok(ContractCallResult::failure(err.into_return_data(), 0));
        }

        let context = match kind {
            CallKind::ContextPreserving => Rc::clone(&self.context),
            CallKind::Plain => Rc::new(self.context.derive_call(*target, *value, input.to_vec())),
            CallKind::ReadOnly => Rc::new(self.context.derive_call(*target, ZERO_WORD, input.to_vec())),
        };
        let gas_limit = gas.min(self.gas.call_allowance());

        log::debug!(
            "{}: depth {} -> {} target {} gas {}",
            function,
            self.depth,
            self.depth + 1,
            format_address(target),
            gas_limit
        );

        let call = NativeCall::new(
            runtime,
            context,
            input.to_vec(),
            *target,
            kind,
            self.depth + 1,
            gas_limit,
            Entry::Call,
        );
        let outcome = runtime.host().invoke(target, call);
        self.charge_gas(outcome.gas_used, function)?;

        let result = outcome.into_call_result();
        self.return_data = result.return_data.clone();
        Ok(result)
    }

    /// Create a contract at the nonce-derived address
    pub fn create(&mut self, value: &Bytes32, init_code: &[u8]) -> HostFunctionResult<ContractCreateResult> {
        let sender = *self.context.address();
        let address = derive_create_address(&sender, self.runtime.host().nonce(&sender));
        self.deploy(address, value, init_code, false)
    }

    /// Create a contract at the salt-derived address; fails if it is occupied
    pub fn create2(
        &mut self,
        value: &Bytes32,
        init_code: &[u8],
        salt: &Bytes32,
    ) -> HostFunctionResult<ContractCreateResult> {
        let sender = *self.context.address();
        let address = derive_create2_address(&sender, salt, init_code);
        self.deploy(address, value, init_code, true)
    }

    fn deploy(
        &mut self,
        address: Address,
        value: &Bytes32,
        init_code: &[u8],
        reject_occupied: bool,
    ) -> HostFunctionResult<ContractCreateResult> {
        let function = "create_contract";
        let runtime = self.runtime;
        let host = runtime.host();
        let schedule = runtime.config().gas_schedule;
        let sender = *self.context.address();
        if self.is_read_only() {
            let err = write_protection_error("create in read-only call", function);
            return self.track(Err(err));
        }

        let mut cost = schedule.create_base;
        if reject_occupied {
            cost = cost.saturating_add(schedule.hash_cost(init_code.len()));
        }
        self.charge_gas(cost, function)?;
        self.return_data.clear();

        if self.depth >= runtime.config().max_call_depth {
            return Ok(ContractCreateResult::failure(
                None,
                encode_revert_reason("call depth limit reached"),
                0,
            ));
        }

        host.increment_nonce(&sender);

        if reject_occupied && host.account_exists(&address) {
            log::debug!("{}: {} is already occupied", function, format_address(&address));
            return Ok(ContractCreateResult::failure(
                Some(address),
                encode_revert_reason("address already occupied"),
                0,
            ));
        }

        if let Err(err) = host.install_code(&address, init_code) {
            log::debug!("{}: install at {} refused: {}", function, format_address(&address), err);
            return Ok(ContractCreateResult::failure(Some(address), err.into_return_data(), 0));
        }

        if !is_zero_word(value) && !host.transfer(&sender, &address, value) {
            return Ok(ContractCreateResult::failure(
                Some(address),
                encode_revert_reason("value transfer failed"),
                0,
            ));
        }

        let context = Rc::new(self.context.derive_call(address, *value, init_code.to_vec()));
        let gas_limit = self.gas.call_allowance();
        log::debug!("{}: constructing {} gas {}", function, format_address(&address), gas_limit);

        let call = NativeCall::new(
            runtime,
            context,
            init_code.to_vec(),
            address,
            CallKind::Plain,
            self.depth + 1,
            gas_limit,
            Entry::Construct,
        );
        let outcome = host.invoke(&address, call);
        self.charge_gas(outcome.gas_used, function)?;

        let gas_used = outcome.gas_used;
        let result = match outcome.result {
            Ok(data) => ContractCreateResult::success(address, data, gas_used),
            Err(err) => ContractCreateResult::failure(Some(address), err.into_return_data(), gas_used),
        };
        self.return_data = result.return_data.clone();
        Ok(result)
    }
}
