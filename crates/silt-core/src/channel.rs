//! Channel descriptors and the ordered [`ChannelSet`].
//!
//! A channel is a named, fixed-arity group of scalar lanes stored per
//! cell — `{"mass", 1}`, `{"vel", 3}`, `{"sdf", 1}`. A grid's channel
//! set is an ordered list of descriptors; each channel's lane offset is
//! the cumulative arity of everything registered before it.

use crate::error::ChannelError;
use indexmap::IndexMap;

/// Declaration of one named channel: a name and a scalar arity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelTag {
    /// Channel name, unique within a grid.
    pub name: String,
    /// Number of scalar lanes per cell (e.g. 3 for a velocity).
    pub arity: u32,
}

impl ChannelTag {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, arity: u32) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
}

/// A registered channel: its lane offset and arity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Channel {
    /// First scalar lane of this channel within a cell's lane row.
    pub offset: u32,
    /// Number of scalar lanes.
    pub arity: u32,
}

/// Ordered set of channels with cumulative lane offsets.
///
/// Registration order is storage order: the lane offset of each channel
/// is the sum of the arities registered before it, and iteration yields
/// channels in that order. Backed by an insertion-ordered map so name
/// lookup stays O(1).
#[derive(Clone, Debug, Default)]
pub struct ChannelSet {
    channels: IndexMap<String, Channel>,
    total_arity: u32,
}

impl ChannelSet {
    /// Create an empty channel set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a channel set from an ordered list of tags.
    ///
    /// Fails with [`ChannelError::Duplicate`] if two tags share a name
    /// or [`ChannelError::ZeroArity`] if any tag has arity 0.
    pub fn from_tags(tags: &[ChannelTag]) -> Result<Self, ChannelError> {
        let mut set = Self::new();
        for tag in tags {
            set.push(tag.clone())?;
        }
        Ok(set)
    }

    /// Append a channel at the end of the set.
    pub fn push(&mut self, tag: ChannelTag) -> Result<Channel, ChannelError> {
        if tag.arity == 0 {
            return Err(ChannelError::ZeroArity { name: tag.name });
        }
        if self.channels.contains_key(&tag.name) {
            return Err(ChannelError::Duplicate { name: tag.name });
        }
        let channel = Channel {
            offset: self.total_arity,
            arity: tag.arity,
        };
        self.total_arity += tag.arity;
        self.channels.insert(tag.name, channel);
        Ok(channel)
    }

    /// Look up a channel by name.
    pub fn get(&self, name: &str) -> Option<Channel> {
        self.channels.get(name).copied()
    }

    /// First scalar lane of the named channel, if registered.
    pub fn offset(&self, name: &str) -> Option<u32> {
        self.get(name).map(|c| c.offset)
    }

    /// Whether a channel with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Total scalar lanes per cell across all channels.
    pub fn total_arity(&self) -> u32 {
        self.total_arity
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns `true` if no channels are registered.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Iterate channels in registration (storage) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Channel)> {
        self.channels.iter().map(|(name, c)| (name.as_str(), *c))
    }

    /// The tags that would reproduce this set, in order.
    pub fn tags(&self) -> Vec<ChannelTag> {
        self.channels
            .iter()
            .map(|(name, c)| ChannelTag::new(name.clone(), c.arity))
            .collect()
    }
}
