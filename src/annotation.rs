//! Values attached to a single move: comments, glyphs, evaluation, markup, clock.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use cozy_chess::Square;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommentPosition {
    Before,
    After,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub position: CommentPosition,
}

impl Comment {
    pub fn before(text: impl Into<String>) -> Self { Self { text: text.into(), position: CommentPosition::Before } }
    pub fn after(text: impl Into<String>) -> Self { Self { text: text.into(), position: CommentPosition::After } }
}

/// Numeric annotation glyph (`$n` in PGN).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nag(pub u8);

impl Nag {
    pub const GOOD: Nag = Nag(1);
    pub const MISTAKE: Nag = Nag(2);
    pub const BRILLIANT: Nag = Nag(3);
    pub const BLUNDER: Nag = Nag(4);
    pub const SPECULATIVE: Nag = Nag(5);
    pub const DUBIOUS: Nag = Nag(6);
    pub const FORCED: Nag = Nag(7);
    pub const DRAWISH: Nag = Nag(10);
    pub const QUIET: Nag = Nag(11);
    pub const ACTIVE: Nag = Nag(12);
    pub const UNCLEAR: Nag = Nag(13);
    pub const WHITE_SLIGHT: Nag = Nag(14);
    pub const BLACK_SLIGHT: Nag = Nag(15);
    pub const WHITE_MODERATE: Nag = Nag(16);
    pub const BLACK_MODERATE: Nag = Nag(17);
    pub const WHITE_DECISIVE: Nag = Nag(18);
    pub const BLACK_DECISIVE: Nag = Nag(19);
    pub const NOVELTY: Nag = Nag(146);

    /// Canonical glyph text, when the glyph has one.
    pub fn symbol(self) -> Option<&'static str> {
        GLYPHS.iter().find(|(n, _)| *n == self).map(|(_, s)| *s)
    }

    /// Inverse of [`Nag::symbol`]. Covers the move suffixes and the standalone position glyphs.
    pub fn from_symbol(text: &str) -> Option<Nag> {
        GLYPHS.iter().find(|(_, s)| *s == text).map(|(n, _)| *n)
    }

    /// Move-quality glyphs written glued to the SAN (`e4!`).
    pub fn is_suffix(self) -> bool { self.group() == Some(NagGroup::MoveQuality) }

    pub fn group(self) -> Option<NagGroup> {
        NAG_GROUPS.iter().find(|(_, members)| members.contains(&self)).map(|(g, _)| *g)
    }
}

impl fmt::Display for Nag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "${}", self.0) }
}

const GLYPHS: &[(Nag, &str)] = &[
    (Nag::GOOD, "!"),
    (Nag::MISTAKE, "?"),
    (Nag::BRILLIANT, "!!"),
    (Nag::BLUNDER, "??"),
    (Nag::SPECULATIVE, "!?"),
    (Nag::DUBIOUS, "?!"),
    (Nag::FORCED, "□"),
    (Nag::DRAWISH, "="),
    (Nag::UNCLEAR, "∞"),
    (Nag::WHITE_SLIGHT, "⩲"),
    (Nag::BLACK_SLIGHT, "⩱"),
    (Nag::WHITE_MODERATE, "±"),
    (Nag::BLACK_MODERATE, "∓"),
    (Nag::WHITE_DECISIVE, "+-"),
    (Nag::BLACK_DECISIVE, "-+"),
    (Nag::NOVELTY, "N"),
];

/// Mutually exclusive glyph families: a node carries at most one glyph per group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NagGroup {
    MoveQuality,
    Position,
}

const NAG_GROUPS: &[(NagGroup, &[Nag])] = &[
    (NagGroup::MoveQuality, &[Nag::GOOD, Nag::MISTAKE, Nag::BRILLIANT, Nag::BLUNDER, Nag::SPECULATIVE, Nag::DUBIOUS]),
    (
        NagGroup::Position,
        &[
            Nag::DRAWISH,
            Nag::QUIET,
            Nag::ACTIVE,
            Nag::UNCLEAR,
            Nag::WHITE_SLIGHT,
            Nag::BLACK_SLIGHT,
            Nag::WHITE_MODERATE,
            Nag::BLACK_MODERATE,
            Nag::WHITE_DECISIVE,
            Nag::BLACK_DECISIVE,
        ],
    ),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvalKind {
    Centipawn,
    Mate,
}

/// Engine evaluation from white's point of view; `value` is centipawns or mate distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub kind: EvalKind,
    pub value: i32,
    pub depth: Option<u32>,
}

impl Evaluation {
    pub fn centipawns(value: i32) -> Self { Self { kind: EvalKind::Centipawn, value, depth: None } }
    pub fn mate(value: i32) -> Self { Self { kind: EvalKind::Mate, value, depth: None } }
    pub fn with_depth(mut self, depth: u32) -> Self { self.depth = Some(depth); self }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkColor {
    Green,
    Red,
    Yellow,
    Blue,
}

impl MarkColor {
    pub fn letter(self) -> char {
        match self { MarkColor::Green => 'G', MarkColor::Red => 'R', MarkColor::Yellow => 'Y', MarkColor::Blue => 'B' }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c { 'G' => Some(MarkColor::Green), 'R' => Some(MarkColor::Red), 'Y' => Some(MarkColor::Yellow), 'B' => Some(MarkColor::Blue), _ => None }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisualMark {
    Arrow { from: Square, to: Square, color: MarkColor },
    Highlight { square: Square, color: MarkColor },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Annotation {
    pub comments: Vec<Comment>,
    pub nags: BTreeSet<Nag>,
    pub evaluation: Option<Evaluation>,
    pub marks: Vec<VisualMark>,
    pub clock: Option<Duration>,
}

impl Annotation {
    /// Inserts `nag` after removing any other glyph from its exclusion group.
    pub fn add_nag(&mut self, nag: Nag) {
        if let Some(group) = nag.group() {
            self.nags.retain(|n| *n == nag || n.group() != Some(group));
        }
        self.nags.insert(nag);
    }

    pub fn remove_nag(&mut self, nag: Nag) -> bool { self.nags.remove(&nag) }

    pub fn comments_at(&self, position: CommentPosition) -> impl Iterator<Item = &Comment> {
        self.comments.iter().filter(move |c| c.position == position)
    }

    /// Equal content, where only the order within each comment position counts.
    pub fn matches(&self, other: &Annotation) -> bool {
        self.nags == other.nags
            && self.evaluation == other.evaluation
            && self.clock == other.clock
            && self.marks == other.marks
            && [CommentPosition::Before, CommentPosition::After]
                .into_iter()
                .all(|p| self.comments_at(p).eq(other.comments_at(p)))
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty() && self.nags.is_empty() && self.evaluation.is_none() && self.marks.is_empty() && self.clock.is_none()
    }
}
