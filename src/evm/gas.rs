// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Per-frame resource budget.

use crate::evm::error::{gas_error, HostFunctionResult};

/// Finite budget of one call frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasMeter {
    limit: u64,
    used: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }

    /// Consume `amount`; asking for more than remains drains the budget
    pub fn charge(&mut self, amount: u64, function: &str) -> HostFunctionResult<()> {
        let remaining = self.remaining();
        if amount > remaining {
            self.used = self.limit;
            return Err(gas_error("out of gas", function, amount, remaining));
        }
        self.used += amount;
        Ok(())
    }

    /// Largest limit a nested call may receive: all but one 64th of what is left
    pub fn call_allowance(&self) -> u64 {
        let remaining = self.remaining();
        remaining - remaining / 64
    }
}
