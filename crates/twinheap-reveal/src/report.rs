//! Textual free-list dump.

use std::fmt;

use twinheap_arena::{FreeBlockInfo, Heap};
use twinheap_core::HeapError;

const RULE: &str = "-----------------------";

/// Snapshot of the free list, anchor first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FreeListReport {
    /// Offset the next search will start from.
    pub anchor: u32,
    /// Every member in list order, starting with the anchor.
    pub slots: Vec<FreeBlockInfo>,
}

impl FreeListReport {
    /// Walk `heap`'s free list.
    ///
    /// A broken list yields `Err(HeapError::Fatal)`; the fatal policy is
    /// not applied.
    pub fn capture(heap: &Heap) -> Result<Self, HeapError> {
        let anchor = heap.anchor().ok_or(HeapError::Uninitialized)?;
        let slots = heap.free_blocks()?.collect::<Result<Vec<_>, _>>()?;
        Ok(Self { anchor, slots })
    }

    /// Total bytes on the free list, headers included.
    pub fn free_bytes(&self) -> u64 {
        self.slots.iter().map(|s| u64::from(s.size)).sum()
    }
}

/// The anchor's successors are listed first and the anchor itself last.
impl fmt::Display for FreeListReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "anchor at [{}]", self.anchor)?;
        writeln!(f, "{RULE}")?;
        let Some((anchor, rest)) = self.slots.split_first() else {
            return Ok(());
        };
        for slot in rest {
            writeln!(f, "Free Slot at [{}]", slot.offset)?;
            write_links(f, slot)?;
        }
        writeln!(f, "Last Free Slot at [{}]", anchor.offset)?;
        write_links(f, anchor)
    }
}

fn write_links(f: &mut fmt::Formatter<'_>, slot: &FreeBlockInfo) -> fmt::Result {
    writeln!(f, "  size = {}", slot.size)?;
    writeln!(f, "  next = {}", slot.next)?;
    writeln!(f, "  prev = {}", slot.prev)?;
    writeln!(f, "{RULE}")
}
