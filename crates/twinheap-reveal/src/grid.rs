//! Two-dimensional arena diagram.
//!
//! The arena is folded onto a [`GRID_WIDTH`] × [`GRID_HEIGHT`] grid by
//! reading offset bits from the most significant down and alternating
//! between the x and y axes. An aligned power-of-two block then lands on a
//! rectangle whose area is proportional to its size. The fold runs out of
//! resolution at `arena_size / 512`: smaller blocks collapse to empty
//! rectangles and do not appear.
//!
//! Each cell is two characters wide. A block's rectangle gets a left and
//! bottom border, with its label in the top-left corner:
//!
//! ```text
//! |1        |a
//! |         |
//! |_________|_______
//! ```

use std::fmt;

use smallvec::SmallVec;
use twinheap_arena::{BlockInfo, Heap};
use twinheap_core::{BlockTag, HeapError};

use crate::labels::Labels;
use crate::style::RevealStyle;

/// Cells per row.
pub const GRID_WIDTH: usize = 32;
/// Rows.
pub const GRID_HEIGHT: usize = 16;

/// Column width of the free-size column in the table under the grid.
const TABLE_COLUMN: usize = 32;

/// A grid coordinate. `x` counts cells from the left, `y` rows from the top.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Point {
    /// Column.
    pub(crate) x: usize,
    /// Row.
    pub(crate) y: usize,
}

/// Which corner of a block's rectangle to compute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Edge {
    /// Top-left corner, inclusive.
    Start,
    /// Bottom-right corner, exclusive.
    End,
}

/// Map an arena offset to a grid corner.
///
/// For [`Edge::Start`], `offset` is where a block begins; for
/// [`Edge::End`], where it ends (one past its last byte). Both are
/// measured against an arena of `arena_size` bytes, a power of two.
pub(crate) fn offset_to_point(offset: u32, arena_size: u32, edge: Edge) -> Point {
    let mut span = [GRID_WIDTH, GRID_HEIGHT];
    let (mut coord, bits) = match edge {
        Edge::Start => ([0, 0], offset),
        Edge::End => ([GRID_WIDTH, GRID_HEIGHT], arena_size.saturating_sub(offset)),
    };

    let mut axis = 0;
    let mut bit = arena_size >> 1;
    while bit != 0 {
        span[axis] >>= 1;
        if bits & bit != 0 {
            match edge {
                Edge::Start => coord[axis] += span[axis],
                Edge::End => coord[axis] -= span[axis],
            }
        }
        axis ^= 1;
        bit >>= 1;
    }
    Point {
        x: coord[0],
        y: coord[1],
    }
}

/// How a block is named in the size table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotLabel {
    /// Free blocks are numbered from 1 in address order.
    Free(usize),
    /// Labelled allocations carry their letter.
    Allocated(char),
}

impl fmt::Display for SlotLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free(n) => write!(f, "{n}"),
            Self::Allocated(c) => write!(f, "{c}"),
        }
    }
}

/// One row of the size table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeEntry {
    /// Block name.
    pub label: SlotLabel,
    /// Block size in bytes, header included.
    pub size: u32,
}

impl fmt::Display for SizeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}) {} bytes", self.label, self.size)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cell {
    tag: Option<BlockTag>,
    glyphs: [char; 2],
}

const BLANK: Cell = Cell {
    tag: None,
    glyphs: [' ', ' '],
};

/// A rendered diagram of one heap, ready to print.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutGrid {
    cells: Vec<Cell>,
    free: SmallVec<[SizeEntry; 8]>,
    allocated: SmallVec<[SizeEntry; 8]>,
    style: RevealStyle,
}

impl LayoutGrid {
    /// Draw every block of `heap`, lettering the allocations in `labels`.
    ///
    /// Allocated blocks without a label are drawn with a blank corner and
    /// left out of the size table. A label naming a pointer that is not
    /// currently allocated yields `Err(HeapError::Fatal)`.
    pub fn render(heap: &Heap, labels: &Labels) -> Result<Self, HeapError> {
        let arena_size = heap.arena_size().ok_or(HeapError::Uninitialized)?;
        let mut grid = Self {
            cells: vec![BLANK; GRID_WIDTH * GRID_HEIGHT],
            free: SmallVec::new(),
            allocated: SmallVec::new(),
            style: RevealStyle::default(),
        };

        for block in heap.blocks()? {
            let block = block?;
            match block.tag {
                BlockTag::Free => {
                    let number = grid.free.len() + 1;
                    grid.free.push(SizeEntry {
                        label: SlotLabel::Free(number),
                        size: block.size,
                    });
                    // Corners hold one character; 10 and up show their
                    // leading digit.
                    let mark = number.to_string().chars().next().unwrap_or(' ');
                    grid.fill(arena_size, &block, mark);
                }
                BlockTag::Allocated => grid.fill(arena_size, &block, ' '),
            }
        }

        for (label, ptr) in labels.iter() {
            let block = heap.block_at(ptr)?;
            grid.allocated.push(SizeEntry {
                label: SlotLabel::Allocated(label),
                size: block.size,
            });
            grid.fill(arena_size, &block, label);
        }
        Ok(grid)
    }

    /// Use `style` when printing.
    pub fn with_style(mut self, style: RevealStyle) -> Self {
        self.style = style;
        self
    }

    /// Free blocks in address order.
    pub fn free_sizes(&self) -> &[SizeEntry] {
        &self.free
    }

    /// Labelled allocations in label insertion order.
    pub fn allocated_sizes(&self) -> &[SizeEntry] {
        &self.allocated
    }

    /// Row `y` without colouring, two characters per cell.
    ///
    /// # Panics
    ///
    /// Panics if `y >= GRID_HEIGHT`.
    pub fn row_text(&self, y: usize) -> String {
        self.cells[y * GRID_WIDTH..(y + 1) * GRID_WIDTH]
            .iter()
            .flat_map(|cell| cell.glyphs)
            .collect()
    }

    fn fill(&mut self, arena_size: u32, block: &BlockInfo, mark: char) {
        let start = offset_to_point(block.offset, arena_size, Edge::Start);
        let end = offset_to_point(block.offset + block.size, arena_size, Edge::End);
        for y in start.y..end.y {
            for x in start.x..end.x {
                let glyphs = if x == start.x && y == start.y {
                    ['|', mark]
                } else if x == start.x && y == end.y - 1 {
                    ['|', '_']
                } else if y == end.y - 1 {
                    ['_', '_']
                } else if x == start.x {
                    ['|', ' ']
                } else {
                    [' ', ' ']
                };
                self.cells[y * GRID_WIDTH + x] = Cell {
                    tag: Some(block.tag),
                    glyphs,
                };
            }
        }
    }
}

impl fmt::Display for LayoutGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = self.style;
        for row in self.cells.chunks(GRID_WIDTH) {
            for cell in row {
                let [left, right] = cell.glyphs;
                match cell.tag {
                    Some(tag) => {
                        write!(f, "{}{left}{right}{}", style.background(tag), style.reset())?
                    }
                    None => write!(f, "{left}{right}")?,
                }
            }
            writeln!(f)?;
        }

        write!(
            f,
            "{}{:<width$}{}",
            style.foreground(BlockTag::Free),
            "Free",
            style.reset(),
            width = TABLE_COLUMN
        )?;
        if !self.allocated.is_empty() {
            write!(
                f,
                "{}Allocated{}",
                style.foreground(BlockTag::Allocated),
                style.reset()
            )?;
        }
        writeln!(f)?;

        let rows = self.free.len().max(self.allocated.len());
        for i in 0..rows {
            let free = self.free.get(i).map(ToString::to_string).unwrap_or_default();
            let allocated = self
                .allocated
                .get(i)
                .map(ToString::to_string)
                .unwrap_or_default();
            writeln!(f, "{free:<width$}{allocated}", width = TABLE_COLUMN)?;
        }
        Ok(())
    }
}
