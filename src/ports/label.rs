// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::Value;

/// A metadata annotation that travels downstream alongside the data stream.
///
/// `index` is the element offset the label refers to and `width` the number
/// of elements it spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub data: Value,
    pub index: u64,
    #[serde(default = "default_width")]
    pub width: u64,
}

fn default_width() -> u64 {
    1
}

impl Label {
    pub fn new(id: impl Into<String>, data: Value, index: u64) -> Self {
        Self {
            id: id.into(),
            data,
            index,
            width: 1,
        }
    }

    pub fn with_width(mut self, width: u64) -> Self {
        self.width = width;
        self
    }

    /// Rescale index and width, e.g. when converting between element sizes.
    ///
    /// A zero divisor leaves the label unchanged. Results that do not fit
    /// in a `u64` saturate.
    pub fn to_adjusted(&self, mult: u64, div: u64) -> Self {
        if div == 0 {
            return self.clone();
        }
        Self {
            id: self.id.clone(),
            data: self.data.clone(),
            index: scale(self.index, mult, div),
            width: scale(self.width, mult, div),
        }
    }
}

fn scale(value: u64, mult: u64, div: u64) -> u64 {
    let scaled = u128::from(value) * u128::from(mult) / u128::from(div);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}
