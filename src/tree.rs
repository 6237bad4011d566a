//! Move tree: arena-allocated nodes and variations under a [`Game`] root.
//!
//! Nodes never own each other. A node's `parent` is a handle back to the node
//! whose position it was played from, and each node belongs to exactly one
//! move list ([`Line`]): the main line or one variation.

use cozy_chess::Color;
use generational_arena::{Arena, Index};

use crate::annotation::Annotation;
use crate::board::PlayedMove;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VariationId(Index);

/// The move list owning a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Line {
    Main,
    Variation(VariationId),
}

/// The variation list a variation is kept in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fork {
    /// Alternatives to the first main-line move
    Root,
    /// Alternatives to the node's successor, or continuations when it ends its line
    Node(NodeId),
    /// Alternatives to the first move of a variation
    First(VariationId),
}

impl Fork {
    pub fn at(anchor: Option<NodeId>) -> Self { anchor.map_or(Fork::Root, Fork::Node) }
}

#[derive(Clone, Debug)]
pub struct MoveNode {
    pub id: NodeId,
    pub san: String,
    /// Position after this move
    pub fen: String,
    pub uci: Option<String>,
    pub annotation: Annotation,
    /// Alternatives to this node's successor, primary first
    pub variations: Vec<VariationId>,
    pub parent: Option<NodeId>,
    pub is_mainline: bool,
    pub move_number: u32,
    pub color: Color,
    pub line: Line,
}

#[derive(Clone, Debug)]
pub struct Variation {
    pub id: VariationId,
    pub moves: Vec<NodeId>,
    pub starting_fen: String,
    pub comment: Option<String>,
    pub is_primary: bool,
    /// Node whose position the variation starts from; `None` for the root position
    pub anchor: Option<NodeId>,
    pub fork: Fork,
    /// Alternatives to this variation's first move, primary first
    pub alternatives: Vec<VariationId>,
}

/// Ordered PGN tag pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tags(Vec<(String, String)>);

impl Tags {
    pub fn new() -> Self { Self(Vec::new()) }

    /// Event, Site, Date, Round, White, Black, Result with their unknown-value defaults.
    pub fn seven_tag_roster() -> Self {
        let mut t = Self::new();
        for (k, v) in [("Event", "?"), ("Site", "?"), ("Date", "????.??.??"), ("Round", "?"), ("White", "?"), ("Black", "?"), ("Result", "*")] {
            t.set(k, v);
        }
        t
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Updates an existing key in place or appends a new one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

#[derive(Clone, Debug)]
pub struct Game {
    metadata: Tags,
    root_fen: String,
    main_line: Vec<NodeId>,
    root_variations: Vec<VariationId>,
    nodes: Arena<MoveNode>,
    variations: Arena<Variation>,
    cursor: Option<NodeId>,
}

impl Game {
    pub(crate) fn new(root_fen: String) -> Self {
        Self::with_tags(root_fen, Tags::seven_tag_roster())
    }

    pub(crate) fn with_tags(root_fen: String, metadata: Tags) -> Self {
        Self {
            metadata,
            root_fen,
            main_line: Vec::new(),
            root_variations: Vec::new(),
            nodes: Arena::new(),
            variations: Arena::new(),
            cursor: None,
        }
    }

    pub fn metadata(&self) -> &Tags { &self.metadata }

    pub fn root_fen(&self) -> &str { &self.root_fen }

    pub fn main_line(&self) -> &[NodeId] { &self.main_line }

    pub fn root_variations(&self) -> &[VariationId] { &self.root_variations }

    pub fn cursor(&self) -> Option<NodeId> { self.cursor }

    pub fn node(&self, id: NodeId) -> Option<&MoveNode> { self.nodes.get(id.0) }

    pub fn variation(&self, id: VariationId) -> Option<&Variation> { self.variations.get(id.0) }

    pub fn node_count(&self) -> usize { self.nodes.len() }

    pub fn contains(&self, id: NodeId) -> bool { self.nodes.contains(id.0) }

    pub fn line_moves(&self, line: Line) -> &[NodeId] {
        match line {
            Line::Main => &self.main_line,
            Line::Variation(v) => self.variations.get(v.0).map(|v| v.moves.as_slice()).unwrap_or(&[]),
        }
    }

    /// Variations kept at `anchor` (`None` = root).
    pub fn variations_of(&self, anchor: Option<NodeId>) -> &[VariationId] { self.variations_in(Fork::at(anchor)) }

    pub fn variations_in(&self, fork: Fork) -> &[VariationId] {
        match fork {
            Fork::Root => &self.root_variations,
            Fork::Node(id) => self.node(id).map(|n| n.variations.as_slice()).unwrap_or(&[]),
            Fork::First(v) => self.variation(v).map(|v| v.alternatives.as_slice()).unwrap_or(&[]),
        }
    }

    /// The list holding variations that compete with `id`.
    pub fn alternatives_fork(&self, id: NodeId) -> Option<Fork> {
        let node = self.node(id)?;
        if self.line_moves(node.line).first() == Some(&id) {
            return Some(match node.line {
                Line::Main => Fork::Root,
                Line::Variation(v) => Fork::First(v),
            });
        }
        node.parent.map(Fork::Node)
    }

    /// Position the variations in `fork` start from.
    pub fn fork_fen(&self, fork: Fork) -> Option<&str> {
        match fork {
            Fork::Root => Some(&self.root_fen),
            Fork::Node(id) => self.node(id).map(|n| n.fen.as_str()),
            Fork::First(v) => self.variation(v).map(|v| v.starting_fen.as_str()),
        }
    }

    fn fork_anchor(&self, fork: Fork) -> Option<NodeId> {
        match fork {
            Fork::Root => None,
            Fork::Node(id) => Some(id),
            Fork::First(v) => self.variation(v).and_then(|v| v.anchor),
        }
    }

    /// Next move in the anchor's own line; for the root that is the first main-line move.
    pub fn successor(&self, anchor: Option<NodeId>) -> Option<NodeId> {
        match anchor {
            None => self.main_line.first().copied(),
            Some(id) => {
                let moves = self.line_moves(self.node(id)?.line);
                let idx = moves.iter().position(|m| *m == id)?;
                moves.get(idx + 1).copied()
            }
        }
    }

    /// Position at `anchor` (`None` = root).
    pub fn fen_of(&self, anchor: Option<NodeId>) -> Option<&str> {
        match anchor {
            None => Some(&self.root_fen),
            Some(id) => self.node(id).map(|n| n.fen.as_str()),
        }
    }

    /// Nodes from the first move down to `id`, inclusive. Empty for a stale handle.
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cur = self.node(id);
        while let Some(n) = cur {
            path.push(n.id);
            cur = n.parent.and_then(|p| self.node(p));
        }
        path.reverse();
        path
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut Tags { &mut self.metadata }

    pub(crate) fn set_cursor(&mut self, cursor: Option<NodeId>) { self.cursor = cursor; }

    pub(crate) fn annotation_mut(&mut self, id: NodeId) -> Option<&mut Annotation> {
        self.nodes.get_mut(id.0).map(|n| &mut n.annotation)
    }

    /// Appends a played move to the end of `line`.
    pub(crate) fn append(&mut self, line: Line, played: PlayedMove) -> NodeId {
        let parent = match self.line_moves(line).last() {
            Some(last) => Some(*last),
            None => match line {
                Line::Main => None,
                Line::Variation(v) => self.variations.get(v.0).and_then(|v| v.anchor),
            },
        };
        let idx = self.nodes.insert_with(|idx| MoveNode {
            id: NodeId(idx),
            san: played.san,
            fen: played.fen,
            uci: Some(played.uci),
            annotation: Annotation::default(),
            variations: Vec::new(),
            parent,
            is_mainline: line == Line::Main,
            move_number: played.move_number,
            color: played.color,
            line,
        });
        let id = NodeId(idx);
        match line {
            Line::Main => self.main_line.push(id),
            Line::Variation(v) => {
                if let Some(var) = self.variations.get_mut(v.0) { var.moves.push(id); }
            }
        }
        id
    }

    /// Opens a new variation at `anchor` whose first move is `played`.
    pub(crate) fn branch(&mut self, anchor: Option<NodeId>, played: PlayedMove) -> (VariationId, NodeId) {
        self.branch_at(Fork::at(anchor), played)
    }

    pub(crate) fn branch_at(&mut self, fork: Fork, played: PlayedMove) -> (VariationId, NodeId) {
        let starting_fen = self.fork_fen(fork).unwrap_or(&self.root_fen).to_string();
        let anchor = self.fork_anchor(fork);
        let is_primary = self.variations_in(fork).is_empty();
        let vidx = self.variations.insert_with(|idx| Variation {
            id: VariationId(idx),
            moves: Vec::new(),
            starting_fen,
            comment: None,
            is_primary,
            anchor,
            fork,
            alternatives: Vec::new(),
        });
        let vid = VariationId(vidx);
        if let Some(list) = self.variation_list_mut(fork) { list.push(vid); }
        let node = self.append(Line::Variation(vid), played);
        (vid, node)
    }

    pub(crate) fn set_variation_comment(&mut self, id: VariationId, comment: Option<String>) -> bool {
        match self.variations.get_mut(id.0) {
            Some(v) => { v.comment = comment; true }
            None => false,
        }
    }

    fn variation_list_mut(&mut self, fork: Fork) -> Option<&mut Vec<VariationId>> {
        match fork {
            Fork::Root => Some(&mut self.root_variations),
            Fork::Node(id) => self.nodes.get_mut(id.0).map(|n| &mut n.variations),
            Fork::First(v) => self.variations.get_mut(v.0).map(|v| &mut v.alternatives),
        }
    }

    fn refresh_primary(&mut self, fork: Fork) {
        let list = self.variations_in(fork).to_vec();
        for (i, vid) in list.iter().enumerate() {
            if let Some(v) = self.variations.get_mut(vid.0) { v.is_primary = i == 0; }
        }
    }

    /// Detaches `id` from its list and frees everything inside it.
    pub(crate) fn remove_variation(&mut self, id: VariationId) -> bool {
        let Some(fork) = self.variation(id).map(|v| v.fork) else { return false };
        let Some(list) = self.variation_list_mut(fork) else { return false };
        let Some(pos) = list.iter().position(|v| *v == id) else { return false };
        list.remove(pos);
        self.free_variation(id);
        self.refresh_primary(fork);
        true
    }

    fn free_variation(&mut self, id: VariationId) {
        let Some(var) = self.variations.remove(id.0) else { return };
        for nested in var.alternatives { self.free_variation(nested); }
        for nid in var.moves {
            if let Some(node) = self.nodes.remove(nid.0) {
                for nested in node.variations { self.free_variation(nested); }
            }
        }
    }

    /// Moves `id` to the front of its list.
    pub(crate) fn promote_variation(&mut self, id: VariationId) -> bool {
        let Some(fork) = self.variation(id).map(|v| v.fork) else { return false };
        let Some(list) = self.variation_list_mut(fork) else { return false };
        let Some(pos) = list.iter().position(|v| *v == id) else { return false };
        let vid = list.remove(pos);
        list.insert(0, vid);
        self.refresh_primary(fork);
        true
    }

    pub(crate) fn clear_moves(&mut self) {
        self.main_line.clear();
        self.root_variations.clear();
        self.nodes.clear();
        self.variations.clear();
        self.cursor = None;
    }

    /// Same tags, root, line shapes and annotations; handle values are ignored.
    pub fn structurally_eq(&self, other: &Game) -> bool {
        self.metadata == other.metadata
            && self.root_fen == other.root_fen
            && self.lines_eq(&self.main_line, other, &other.main_line)
            && self.variation_lists_eq(&self.root_variations, other, &other.root_variations)
    }

    fn lines_eq(&self, a: &[NodeId], other: &Game, b: &[NodeId]) -> bool {
        a.len() == b.len()
            && a.iter().zip(b).all(|(x, y)| match (self.node(*x), other.node(*y)) {
                (Some(x), Some(y)) => {
                    x.san == y.san
                        && x.fen == y.fen
                        && x.uci == y.uci
                        && x.annotation.matches(&y.annotation)
                        && x.is_mainline == y.is_mainline
                        && x.move_number == y.move_number
                        && x.color == y.color
                        && self.variation_lists_eq(&x.variations, other, &y.variations)
                }
                _ => false,
            })
    }

    fn variation_lists_eq(&self, a: &[VariationId], other: &Game, b: &[VariationId]) -> bool {
        a.len() == b.len()
            && a.iter().zip(b).all(|(x, y)| match (self.variation(*x), other.variation(*y)) {
                (Some(x), Some(y)) => {
                    x.comment == y.comment
                        && x.is_primary == y.is_primary
                        && x.starting_fen == y.starting_fen
                        && self.lines_eq(&x.moves, other, &y.moves)
                        && self.variation_lists_eq(&x.alternatives, other, &y.alternatives)
                }
                _ => false,
            })
    }
}
