use std::collections::HashMap;

use filechain_types::Payload;

use crate::block::Block;

/// Content address -> chain position of the first live record holding it.
///
/// Maintained incrementally on append; rebuilt after any truncation.
#[derive(Clone, Debug, Default)]
pub(crate) struct ContentIndex {
    live: HashMap<String, usize>,
}

impl ContentIndex {
    pub(crate) fn rebuild(blocks: &[Block]) -> Self {
        let mut index = Self::default();
        for (position, block) in blocks.iter().enumerate() {
            index.observe(position, &block.payload);
        }
        index
    }

    pub(crate) fn observe(&mut self, position: usize, payload: &Payload) {
        match payload {
            Payload::File(record) => {
                self.live
                    .entry(record.content_address.clone())
                    .or_insert(position);
            }
            Payload::Tombstone(tombstone) => {
                self.live.remove(&tombstone.content_address);
            }
            Payload::Genesis { .. } => {}
        }
    }

    pub(crate) fn get(&self, content_address: &str) -> Option<usize> {
        self.live.get(content_address).copied()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.live.len()
    }
}
