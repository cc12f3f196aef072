// crates/lyt-runtime/src/lib.rs
pub mod anim;
pub mod calc;
pub mod draw;
pub mod layout;
pub mod mgr;
pub mod package;

pub use anim::*;
pub use calc::*;
pub use draw::*;
pub use layout::*;
pub use mgr::*;
pub use package::*;

use lyt_core::ArchiveError;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Layout {0:?} is not registered")]
    UnknownLayout(LayoutHandle),

    #[error("A layout cannot host itself")]
    SelfAttach,

    #[error("Main widget slot {slot} out of range ({count} slots)")]
    SlotOutOfRange { slot: u16, count: usize },

    #[error("Main widget slot {0} already hosts a layout")]
    SlotOccupied(u16),

    #[error("Main widget slot {0} is empty")]
    SlotEmpty(u16),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
