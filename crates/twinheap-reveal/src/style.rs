//! Terminal colouring for the layout diagram.

use twinheap_core::BlockTag;

const BG_FREE: &str = "\x1b[48;5;35m";
const BG_ALLOCATED: &str = "\x1b[48;5;39m";
const FG_FREE: &str = "\x1b[38;5;35m";
const FG_ALLOCATED: &str = "\x1b[38;5;39m";
const RESET: &str = "\x1b[0m";

/// How a [`LayoutGrid`](crate::LayoutGrid) is printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RevealStyle {
    /// 256-colour ANSI escapes: green for free blocks, blue for allocated.
    #[default]
    Ansi,
    /// Borders and labels only.
    Plain,
}

impl RevealStyle {
    pub(crate) fn background(self, tag: BlockTag) -> &'static str {
        match (self, tag) {
            (Self::Plain, _) => "",
            (Self::Ansi, BlockTag::Free) => BG_FREE,
            (Self::Ansi, BlockTag::Allocated) => BG_ALLOCATED,
        }
    }

    pub(crate) fn foreground(self, tag: BlockTag) -> &'static str {
        match (self, tag) {
            (Self::Plain, _) => "",
            (Self::Ansi, BlockTag::Free) => FG_FREE,
            (Self::Ansi, BlockTag::Allocated) => FG_ALLOCATED,
        }
    }

    pub(crate) fn reset(self) -> &'static str {
        match self {
            Self::Plain => "",
            Self::Ansi => RESET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_emits_no_escapes() {
        let style = RevealStyle::Plain;
        for tag in [BlockTag::Free, BlockTag::Allocated] {
            assert!(style.background(tag).is_empty());
            assert!(style.foreground(tag).is_empty());
        }
        assert!(style.reset().is_empty());
    }

    #[test]
    fn ansi_distinguishes_tags() {
        let style = RevealStyle::Ansi;
        assert_ne!(
            style.background(BlockTag::Free),
            style.background(BlockTag::Allocated)
        );
        assert!(style.reset().starts_with('\x1b'));
    }
}
