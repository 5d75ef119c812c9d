use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a logical node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub u32);

impl Tag {
    pub const fn new(value: u32) -> Self {
        Tag(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for Tag {
    fn from(value: u32) -> Self {
        Tag(value)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out tags, reusing released ones only once they are no longer live.
///
/// Slots below `first` are never handed out, which keeps surface/root tags
/// out of the free list.
pub struct TagAllocator {
    first: u32,
    live: Vec<bool>,
    free_list: Vec<u32>,
}

impl TagAllocator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u32) -> Self {
        Self {
            first,
            live: Vec::new(),
            free_list: Vec::new(),
        }
    }

    pub fn allocate(&mut self) -> Tag {
        let index = if let Some(idx) = self.free_list.pop() {
            idx as usize
        } else {
            self.live.len()
        };

        if index >= self.live.len() {
            self.live.push(true);
        } else {
            self.live[index] = true;
        }

        Tag(self.first + index as u32)
    }

    /// Returns false when the tag was not live (double release or foreign tag)
    pub fn release(&mut self, tag: Tag) -> bool {
        let Some(index) = tag.0.checked_sub(self.first) else {
            return false;
        };
        match self.live.get_mut(index as usize) {
            Some(slot) if *slot => {
                *slot = false;
                self.free_list.push(index);
                true
            }
            _ => false,
        }
    }

    pub fn is_live(&self, tag: Tag) -> bool {
        tag.0
            .checked_sub(self.first)
            .and_then(|index| self.live.get(index as usize))
            .copied()
            .unwrap_or(false)
    }

    pub fn live_count(&self) -> usize {
        self.live.iter().filter(|live| **live).count()
    }
}

impl Default for TagAllocator {
    fn default() -> Self {
        Self::new()
    }
}
