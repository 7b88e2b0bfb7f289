// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Example host integration for the compatibility runtime: an in-memory
//! host with transaction rollback and a handful of native sample contracts.

pub mod contracts;
pub mod mock_host;
