// crates/lyt-core/src/lib.rs
pub mod archive;
pub mod pane;
pub mod strings;
pub mod widget;
pub mod widget_pos;

pub use archive::*;
pub use pane::*;
pub use strings::*;
pub use widget::*;
pub use widget_pos::*;

/// 3x4 world transform, the layout equivalent of a row-major `Matrix34`.
pub type Matrix34 = glam::Affine3A;

/// 2x3 transform used for text effects.
pub type Matrix23 = glam::Affine2;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Archive too small: {0} bytes")]
    TooSmall(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid magic number: {0:02X?}")]
    BadMagic([u8; 4]),

    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u16),

    #[error("{what} at offset 0x{offset:X} runs past the end of the archive ({len} bytes)")]
    OutOfBounds {
        what: &'static str,
        offset: usize,
        len: usize,
    },

    #[error("Unknown pane type tag {tag} in pane record {index}")]
    UnknownPaneType { index: usize, tag: u16 },

    #[error("Pane record {index} uses {pane_type:?}, which has no supported layout")]
    UnsupportedPaneType { index: usize, pane_type: PaneType },

    #[error("Pane record {index} ({pane_type:?}) declares 0x{declared:X} bytes, expected 0x{expected:X}")]
    PaneSizeMismatch {
        index: usize,
        pane_type: PaneType,
        declared: usize,
        expected: usize,
    },

    #[error("Unknown widget type {ty} in widget record {index}")]
    UnknownWidgetType { index: usize, ty: u16 },

    #[error("{what} index {value} out of range (count {count}) in widget record {index}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        value: u32,
        count: usize,
    },

    #[error("Invalid name at string offset 0x{offset:X}")]
    BadName { offset: u32 },

    #[error("Archive has no root widget")]
    NoRoot,

    #[error("Archive has more than one root widget ({first} and {second})")]
    MultipleRoots { first: usize, second: usize },

    #[error("Widget {child} lists parent {parent}, but {parent} does not own it")]
    ParentMismatch { child: usize, parent: usize },

    #[error("Pane {pane} is owned by widgets {first} and {second}")]
    PaneSharedByWidgets {
        pane: usize,
        first: usize,
        second: usize,
    },

    #[error("Widget {0} is not reachable from the root")]
    Unreachable(usize),

    #[error("Widget {0} is reached more than once from the root")]
    Cycle(usize),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
