// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replies written by the admin endpoint, one JSON object per line

use crate::lease::Status;
use serde::{Deserialize, Serialize};

/// Outcome of one admin command
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdminReply {
    /// Command applied; state after applying it
    Status(Status),
    /// Command rejected
    Error { error: String },
}

impl AdminReply {
    pub fn error(message: impl Into<String>) -> Self {
        AdminReply::Error {
            error: message.into(),
        }
    }
}

#[cfg(test)]
#[path = "reply_tests.rs"]
mod tests;
