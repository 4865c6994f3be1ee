//! Rowan-based concrete syntax tree types for Melt.
//!
//! `MeltLanguage` connects [`SyntaxKind`] to rowan's generic tree types.

use crate::syntax_kind::SyntaxKind;

/// Marker type for Melt in rowan's generic tree system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MeltLanguage {}

impl rowan::Language for MeltLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::ARG_LIST as u16);
        // SAFETY: SyntaxKind is #[repr(u16)] with contiguous discriminants
        // and the bound was checked above. Rowan only stores kinds handed
        // to it through kind_to_raw.
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}

pub type SyntaxNode = rowan::SyntaxNode<MeltLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<MeltLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<MeltLanguage>;
