//! Named collection of channel query results
//!
//! A `ChannelMap` plays two roles. Built with channel names it is a query
//! filter: the Reader gathers only the channels the map wants. After the
//! gather it carries the per-channel `ChannelData` results.

use crate::storage::channel_data::ChannelData;
use crate::storage::types::{ByteOrder, ChannelType, SpacingPolicy};
use std::collections::BTreeMap;

/// Channel-name keyed map of gathered data
#[derive(Debug, Clone, Default)]
pub struct ChannelMap {
    channels: BTreeMap<String, ChannelData>,
}

impl ChannelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter map requesting the named channels; an empty request wants
    /// everything
    pub fn with_channels<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = Self::new();
        for name in names {
            map.channels.insert(name.into(), ChannelData::new());
        }
        map
    }

    /// Whether this map requests the named channel.
    /// An empty map wants everything.
    pub fn wants(&self, name: &str) -> bool {
        self.channels.is_empty() || self.channels.contains_key(name)
    }

    /// Merge gathered frames into the named channel, creating it if new
    pub fn add(&mut self, name: &str, data: ChannelData) {
        self.channels
            .entry(name.to_string())
            .or_default()
            .append(data);
    }

    pub fn get(&self, name: &str) -> Option<&ChannelData> {
        self.channels.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ChannelData> {
        self.channels.remove(name)
    }

    /// Channel names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.channels.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Total frames across all channels
    pub fn point_count(&self) -> usize {
        self.channels.values().map(|d| d.size()).sum()
    }

    pub fn set_byte_order(&mut self, order: ByteOrder) {
        for data in self.channels.values_mut() {
            data.set_byte_order(order);
        }
    }

    /// Trim every channel to `[start, start+duration]`, expanding packed
    /// frames per the channel's suffix type.
    pub fn trim(&mut self, start: f64, duration: f64, policy: SpacingPolicy) {
        let names: Vec<String> = self.channels.keys().cloned().collect();
        for name in names {
            if let Some(data) = self.channels.get(&name) {
                let ctype = ChannelType::from_name(&name);
                let trimmed = if ctype.is_numeric_string() {
                    data.time_range_numeric(start, duration)
                } else {
                    data.time_range(ctype.word_size(), start, duration, policy)
                };
                self.channels.insert(name, trimmed);
            }
        }
    }
}
