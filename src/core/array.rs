// Bounded, dense set of channel slots.

use super::channel::Channel;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArrayError {
    #[error("slot {index} outside bounds {lo}..={hi}")]
    OutOfBounds { index: u32, lo: u32, hi: u32 },

    #[error("bounds reversed: {lo} > {hi}")]
    ReversedBounds { lo: u32, hi: u32 },
}

pub type Result<T> = std::result::Result<T, ArrayError>;

/// Every slot between the bounds is always present; deleting a channel
/// means storing an empty one. Mutations set the dirty flag so callers
/// know the array diverged from the image it was decoded from.
#[derive(Debug, Clone)]
pub struct ChannelArray {
    lo: u32,
    hi: u32,
    slots: Vec<Channel>,
    dirty: bool,
}

impl ChannelArray {
    pub fn new(lo: u32, hi: u32) -> Result<Self> {
        if lo > hi {
            return Err(ArrayError::ReversedBounds { lo, hi });
        }
        let slots = (lo..=hi).map(Channel::new_empty).collect();
        Ok(Self {
            lo,
            hi,
            slots,
            dirty: false,
        })
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.lo, self.hi)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: u32) -> Result<&Channel> {
        self.slot_pos(index).map(|p| &self.slots[p])
    }

    /// Replace the slot matching `channel.index`. The stored index is
    /// authoritative; a caller cannot move a channel by editing it.
    pub fn set(&mut self, channel: Channel) -> Result<()> {
        let pos = self.slot_pos(channel.index)?;
        self.slots[pos] = channel;
        self.dirty = true;
        Ok(())
    }

    /// Mark a slot empty, leaving its index intact.
    pub fn clear(&mut self, index: u32) -> Result<()> {
        let pos = self.slot_pos(index)?;
        self.slots[pos] = Channel::new_empty(index);
        self.dirty = true;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.slots.iter()
    }

    /// Non-empty channels only, in slot order.
    pub fn occupied(&self) -> impl Iterator<Item = &Channel> {
        self.slots.iter().filter(|c| !c.empty)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Used by the codec, which fills slots without dirtying the array.
    pub(crate) fn fill(&mut self, channel: Channel) -> Result<()> {
        let pos = self.slot_pos(channel.index)?;
        self.slots[pos] = channel;
        Ok(())
    }

    fn slot_pos(&self, index: u32) -> Result<usize> {
        if index < self.lo || index > self.hi {
            return Err(ArrayError::OutOfBounds {
                index,
                lo: self.lo,
                hi: self.hi,
            });
        }
        Ok((index - self.lo) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_creation() {
        let arr = ChannelArray::new(1, 128).unwrap();
        assert_eq!(arr.len(), 128);
        assert_eq!(arr.bounds(), (1, 128));
        assert!(arr.get(1).unwrap().empty);
        assert!(arr.get(128).unwrap().empty);
        assert!(arr.get(0).is_err());
        assert!(arr.get(129).is_err());
        assert!(ChannelArray::new(5, 2).is_err());
    }

    #[test]
    fn set_marks_dirty() {
        let mut arr = ChannelArray::new(1, 8).unwrap();
        assert!(!arr.is_dirty());

        let mut ch = Channel::new(3);
        ch.freq = 146_520_000;
        arr.set(ch).unwrap();
        assert!(arr.is_dirty());
        assert_eq!(arr.get(3).unwrap().freq, 146_520_000);
        assert_eq!(arr.occupied().count(), 1);

        arr.mark_clean();
        arr.clear(3).unwrap();
        assert!(arr.is_dirty());
        assert!(arr.get(3).unwrap().empty);
    }

    #[test]
    fn fill_does_not_dirty() {
        let mut arr = ChannelArray::new(1, 4).unwrap();
        let mut ch = Channel::new(2);
        ch.freq = 446_000_000;
        arr.fill(ch).unwrap();
        assert!(!arr.is_dirty());
        assert_eq!(arr.occupied().count(), 1);
    }
}
