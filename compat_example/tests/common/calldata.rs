// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use crate::calculate_selector;
use ethabi::{encode, Token};

/// Flexible parameter builder for constructing Vec<Token> in a fluent way
#[derive(Debug, Clone, Default)]
pub struct ParamBuilder {
    tokens: Vec<Token>,
}

impl ParamBuilder {
    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Add a uint256 parameter
    pub fn uint256(mut self, value: u64) -> Self {
        self.tokens.push(Token::Uint(value.into()));
        self
    }

    /// Add an address parameter
    pub fn address(mut self, address: &[u8; 20]) -> Self {
        self.tokens.push(Token::Address((*address).into()));
        self
    }

    /// Add a bytes parameter
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.tokens.push(Token::Bytes(data.to_vec()));
        self
    }

    /// Add a fixed bytes parameter (bytes32, etc.)
    pub fn fixed_bytes(mut self, data: &[u8]) -> Self {
        self.tokens.push(Token::FixedBytes(data.to_vec()));
        self
    }

    pub fn string(mut self, s: &str) -> Self {
        self.tokens.push(Token::String(s.to_string()));
        self
    }

    pub fn bool(mut self, value: bool) -> Self {
        self.tokens.push(Token::Bool(value));
        self
    }

    pub fn build(self) -> Vec<Token> {
        self.tokens
    }
}

/// Selector of `signature` followed by the ethabi encoding of `params`
pub fn call_data(signature: &str, params: Vec<Token>) -> Vec<u8> {
    let mut data = calculate_selector(signature).to_vec();
    data.extend_from_slice(&encode(&params));
    data
}

/// Constructor arguments encoded by ethabi
pub fn constructor_data(params: Vec<Token>) -> Vec<u8> {
    encode(&params)
}
