// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Logging and event host functions

use crate::evm::error::{invalid_parameter_error, HostFunctionResult};
use crate::evm::frame::Frame;
use crate::evm::log::MAX_TOPICS;
use crate::evm::traits::CompatHost;

/// Emit a log event (LOG0, LOG1, LOG2, LOG3, LOG4 opcodes)
///
/// Parameters:
/// - data_offset: Memory offset of the log data
/// - length: Length of the log data
/// - num_topics: Number of topics (0-4)
/// - topic_offsets: Memory offsets of the 32-byte topics; only the first
///   `num_topics` are read
pub fn emit_log_event<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    data_offset: u64,
    length: u64,
    num_topics: usize,
    topic_offsets: [u64; 4],
) -> HostFunctionResult<()> {
    if num_topics > MAX_TOPICS {
        return frame.track(Err(invalid_parameter_error(
            "num_topics",
            &num_topics.to_string(),
            "emit_log_event",
        )));
    }

    let log_data = frame.mload_bytes(data_offset, length)?;
    let mut topics = Vec::with_capacity(num_topics);
    for offset in &topic_offsets[..num_topics] {
        topics.push(frame.read_bytes32(*offset)?);
    }

    frame.log(&topics, &log_data)
}

/// Emit a log with no topics (LOG0)
pub fn emit_log0<H: CompatHost>(frame: &mut Frame<'_, H>, data_offset: u64, length: u64) -> HostFunctionResult<()> {
    emit_log_event(frame, data_offset, length, 0, [0; 4])
}

/// Emit a log with one topic (LOG1)
pub fn emit_log1<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    data_offset: u64,
    length: u64,
    topic1_offset: u64,
) -> HostFunctionResult<()> {
    emit_log_event(frame, data_offset, length, 1, [topic1_offset, 0, 0, 0])
}

/// Emit a log with two topics (LOG2)
pub fn emit_log2<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    data_offset: u64,
    length: u64,
    topic1_offset: u64,
    topic2_offset: u64,
) -> HostFunctionResult<()> {
    emit_log_event(frame, data_offset, length, 2, [topic1_offset, topic2_offset, 0, 0])
}

/// Emit a log with three topics (LOG3)
pub fn emit_log3<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    data_offset: u64,
    length: u64,
    topic1_offset: u64,
    topic2_offset: u64,
    topic3_offset: u64,
) -> HostFunctionResult<()> {
    emit_log_event(
        frame,
        data_offset,
        length,
        3,
        [topic1_offset, topic2_offset, topic3_offset, 0],
    )
}

/// Emit a log with four topics (LOG4)
pub fn emit_log4<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    data_offset: u64,
    length: u64,
    topic1_offset: u64,
    topic2_offset: u64,
    topic3_offset: u64,
    topic4_offset: u64,
) -> HostFunctionResult<()> {
    emit_log_event(
        frame,
        data_offset,
        length,
        4,
        [topic1_offset, topic2_offset, topic3_offset, topic4_offset],
    )
}
