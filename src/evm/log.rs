// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Event/Log Emitter
//!
//! Maps log records onto the host notification primitive. Records are
//! forwarded verbatim and in emission order; nothing is buffered or
//! filtered here.

use crate::evm::abi::event_topic;
use crate::evm::error::{invalid_parameter_error, HostFunctionResult};
use crate::evm::traits::CompatHost;
use crate::evm::utils::{Address, Bytes32};

/// Topics a single record may carry
pub const MAX_TOPICS: usize = 4;

/// Host event name of a raw log with `topics` topics
pub fn raw_log_name(topics: usize) -> String {
    format!("LOG{}", topics)
}

/// Event name of a signature: the part before the parameter list
pub fn event_name(signature: &str) -> &str {
    signature.split('(').next().unwrap_or(signature)
}

/// Per-frame emitter bound to the identity logs are attributed to
#[derive(Clone, Debug)]
pub struct LogEmitter {
    emitter: Address,
    emitted: usize,
}

impl LogEmitter {
    pub fn new(emitter: Address) -> Self {
        Self { emitter, emitted: 0 }
    }

    pub fn emitter(&self) -> &Address {
        &self.emitter
    }

    /// Records emitted through this emitter
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Emit a raw record with up to four topics
    pub fn log<H: CompatHost>(&mut self, host: &H, topics: &[Bytes32], data: &[u8]) -> HostFunctionResult<()> {
        if topics.len() > MAX_TOPICS {
            return Err(invalid_parameter_error("topics", &topics.len().to_string(), "log"));
        }
        host.notify(&self.emitter, &raw_log_name(topics.len()), topics, data)?;
        self.emitted += 1;
        Ok(())
    }

    /// Emit a typed event; topic 0 is the hash of `signature`, followed by
    /// up to three indexed topics
    pub fn emit_event<H: CompatHost>(
        &mut self,
        host: &H,
        signature: &str,
        indexed: &[Bytes32],
        data: &[u8],
    ) -> HostFunctionResult<()> {
        if indexed.len() >= MAX_TOPICS {
            return Err(invalid_parameter_error("indexed", &indexed.len().to_string(), "emit_event"));
        }
        let mut topics = Vec::with_capacity(indexed.len() + 1);
        topics.push(event_topic(signature));
        topics.extend_from_slice(indexed);

        host.notify(&self.emitter, event_name(signature), &topics, data)?;
        self.emitted += 1;
        Ok(())
    }
}
