//! Cursor-driven editing of a single [`Game`].
//!
//! The engine owns the game, the position oracle and the live position at the
//! cursor. Every navigation recomputes that position by replaying the moves on
//! the root-to-cursor path.

use std::time::Duration;

use log::{debug, trace, warn};

use crate::annotation::{Annotation, Comment, CommentPosition, Evaluation, Nag, VisualMark};
use crate::board::{CozyOracle, PositionOracle};
use crate::error::{TreeError, TreeResult};
use crate::pgn::lexer::{is_tag_key, RESULTS};
use crate::tree::{Game, Line, MoveNode, NodeId, Tags, VariationId};

pub struct TreeEngine<O: PositionOracle = CozyOracle> {
    game: Game,
    oracle: O,
    current_fen: String,
}

impl TreeEngine<CozyOracle> {
    pub fn new() -> Self {
        let oracle = CozyOracle;
        let game = Game::new(oracle.start_fen());
        let current_fen = game.root_fen().to_string();
        Self { game, oracle, current_fen }
    }

    pub fn with_root(fen: &str) -> TreeResult<Self> { Self::with_oracle(CozyOracle, Some(fen)) }
}

impl Default for TreeEngine<CozyOracle> {
    fn default() -> Self { Self::new() }
}

impl<O: PositionOracle> TreeEngine<O> {
    pub fn with_oracle(oracle: O, root: Option<&str>) -> TreeResult<Self> {
        let game = new_game(&oracle, root)?;
        let current_fen = game.root_fen().to_string();
        Ok(Self { game, oracle, current_fen })
    }

    /// Takes over a parsed or previously built game, replaying to its cursor.
    pub fn from_game(game: Game, oracle: O) -> TreeResult<Self> {
        let mut engine = Self { current_fen: game.root_fen().to_string(), game, oracle };
        let cursor = engine.game.cursor();
        engine.go_to_node(cursor)?;
        Ok(engine)
    }

    pub fn game(&self) -> &Game { &self.game }

    pub fn into_game(self) -> Game { self.game }

    pub fn oracle(&self) -> &O { &self.oracle }

    pub fn current_fen(&self) -> &str { &self.current_fen }

    pub fn current_node(&self) -> Option<&MoveNode> { self.game.cursor().and_then(|id| self.game.node(id)) }

    pub fn main_line(&self) -> Vec<&MoveNode> {
        self.game.main_line().iter().filter_map(|id| self.game.node(*id)).collect()
    }

    /// Plies in the main line.
    pub fn move_count(&self) -> usize { self.game.main_line().len() }

    pub fn is_at_start(&self) -> bool { self.game.cursor().is_none() }

    pub fn is_at_end(&self) -> bool { self.forward_target().is_none() }

    // ---- mutation ----

    /// Plays `san` at the cursor and moves the cursor onto the resulting node.
    ///
    /// With `as_variation` the move always opens a new variation at the cursor.
    /// Otherwise it extends the cursor's line when the cursor is that line's last
    /// move, and opens a variation when the line already continues. Exactly one
    /// node is created either way; an illegal move leaves the tree untouched.
    pub fn add_move(&mut self, san: &str, as_variation: bool) -> TreeResult<NodeId> {
        let anchor = self.game.cursor();
        let played = self.oracle.play(&self.current_fen, san)?;

        let id = if anchor.is_none() && self.game.main_line().is_empty() {
            self.game.append(Line::Main, played)
        } else if as_variation {
            self.game.branch(anchor, played).1
        } else {
            match (self.game.successor(anchor), anchor) {
                (None, Some(a)) => {
                    let line = self.game.node(a).map(|n| n.line).ok_or(TreeError::UnknownNode)?;
                    self.game.append(line, played)
                }
                (None, None) => self.game.append(Line::Main, played),
                (Some(_), _) => self.game.branch(anchor, played).1,
            }
        };

        debug!("add_move {} as_variation={} -> {:?}", san, as_variation, id);
        self.current_fen = self.game.node(id).map(|n| n.fen.clone()).ok_or(TreeError::UnknownNode)?;
        self.game.set_cursor(Some(id));
        Ok(id)
    }

    // ---- navigation ----

    /// Puts the cursor on `target` (`None` = root) and replays its position.
    pub fn go_to_node(&mut self, target: Option<NodeId>) -> TreeResult<()> {
        let fen = self.replay(target)?;
        self.game.set_cursor(target);
        self.current_fen = fen;
        Ok(())
    }

    fn replay(&self, target: Option<NodeId>) -> TreeResult<String> {
        let mut fen = self.game.root_fen().to_string();
        let Some(id) = target else { return Ok(fen) };
        if !self.game.contains(id) { return Err(TreeError::UnknownNode); }
        for nid in self.game.path_to(id) {
            let node = self.game.node(nid).ok_or(TreeError::UnknownNode)?;
            let played = self.oracle.play(&fen, &node.san)?;
            trace!("replay {} {} -> {}", node.move_number, node.san, played.fen);
            if played.fen != node.fen {
                warn!("replayed position differs from stored position for {}", node.san);
            }
            fen = played.fen;
        }
        Ok(fen)
    }

    fn forward_target(&self) -> Option<NodeId> {
        let anchor = self.game.cursor();
        let first_variation_move = || {
            self.game
                .variations_of(anchor)
                .first()
                .and_then(|v| self.game.variation(*v))
                .and_then(|v| v.moves.first().copied())
        };
        self.game.successor(anchor).or_else(first_variation_move)
    }

    /// Steps to the successor in the cursor's line, else into the primary variation.
    pub fn go_forward(&mut self) -> bool {
        match self.forward_target() {
            Some(next) => self.step_to(Some(next)),
            None => false,
        }
    }

    pub fn go_back(&mut self) -> bool {
        let Some(node) = self.current_node() else { return false };
        let parent = node.parent;
        self.step_to(parent)
    }

    fn step_to(&mut self, target: Option<NodeId>) -> bool {
        match self.go_to_node(target) {
            Ok(()) => true,
            Err(e) => {
                warn!("cannot step to {:?}: {}", target, e);
                false
            }
        }
    }

    pub fn go_to_start(&mut self) {
        self.game.set_cursor(None);
        self.current_fen = self.game.root_fen().to_string();
    }

    pub fn go_to_end(&mut self) {
        while self.go_forward() {}
    }

    // ---- annotation ----

    fn current_annotation(&mut self) -> Option<&mut Annotation> {
        let id = self.game.cursor()?;
        self.game.annotation_mut(id)
    }

    /// Blank comments are ignored; text is stored trimmed.
    pub fn add_comment(&mut self, text: &str, position: CommentPosition) -> TreeResult<()> {
        let text = text.trim();
        if text.is_empty() { return Ok(()); }
        check_comment(text)?;
        if let Some(a) = self.current_annotation() {
            a.comments.push(Comment { text: text.to_string(), position });
        }
        Ok(())
    }

    /// Replaces the text of comment `index`; blank text removes the comment.
    /// `Ok(false)` when there is no such comment.
    pub fn update_comment(&mut self, index: usize, text: &str) -> TreeResult<bool> {
        let text = text.trim();
        if !text.is_empty() { check_comment(text)?; }
        let Some(a) = self.current_annotation() else { return Ok(false) };
        if index >= a.comments.len() { return Ok(false); }
        if text.is_empty() {
            a.comments.remove(index);
        } else {
            a.comments[index].text = text.to_string();
        }
        Ok(true)
    }

    pub fn remove_comment(&mut self, index: usize) -> Option<Comment> {
        let a = self.current_annotation()?;
        (index < a.comments.len()).then(|| a.comments.remove(index))
    }

    pub fn add_nag(&mut self, nag: Nag) {
        if let Some(a) = self.current_annotation() { a.add_nag(nag); }
    }

    pub fn remove_nag(&mut self, nag: Nag) -> bool {
        self.current_annotation().map_or(false, |a| a.remove_nag(nag))
    }

    pub fn set_evaluation(&mut self, evaluation: Option<Evaluation>) {
        if let Some(a) = self.current_annotation() { a.evaluation = evaluation; }
    }

    /// Clocks are kept to the millisecond.
    pub fn set_clock(&mut self, clock: Option<Duration>) {
        let clock = clock.map(|c| Duration::from_millis(u64::try_from(c.as_millis()).unwrap_or(u64::MAX)));
        if let Some(a) = self.current_annotation() { a.clock = clock; }
    }

    pub fn add_visual_annotation(&mut self, mark: VisualMark) {
        if let Some(a) = self.current_annotation() { a.marks.push(mark); }
    }

    pub fn remove_visual_annotation(&mut self, index: usize) -> Option<VisualMark> {
        let a = self.current_annotation()?;
        (index < a.marks.len()).then(|| a.marks.remove(index))
    }

    // ---- structural edits ----

    fn starts_at_cursor(&self, id: VariationId) -> TreeResult<()> {
        match self.game.variation(id) {
            Some(v) if v.anchor == self.game.cursor() => Ok(()),
            _ => Err(TreeError::UnknownVariation),
        }
    }

    /// Removes a variation starting from the cursor's position, with everything inside it.
    pub fn delete_variation(&mut self, id: VariationId) -> TreeResult<()> {
        self.starts_at_cursor(id)?;
        let anchor = self.game.cursor();
        if !self.game.remove_variation(id) { return Err(TreeError::UnknownVariation); }
        debug!("deleted variation {:?} at {:?}", id, anchor);
        // A cursor inside the freed nodes falls back to the anchor
        if let Some(cur) = self.game.cursor() {
            if !self.game.contains(cur) { self.go_to_node(anchor)?; }
        }
        Ok(())
    }

    /// Makes `id` the primary variation at the cursor; nothing else changes.
    pub fn promote_variation(&mut self, id: VariationId) -> TreeResult<()> {
        self.starts_at_cursor(id)?;
        let anchor = self.game.cursor();
        if !self.game.promote_variation(id) { return Err(TreeError::UnknownVariation); }
        debug!("promoted variation {:?} at {:?}", id, anchor);
        Ok(())
    }

    pub fn set_variation_comment(&mut self, id: VariationId, comment: Option<&str>) -> TreeResult<()> {
        self.starts_at_cursor(id)?;
        let comment = comment.map(str::trim).filter(|c| !c.is_empty());
        if let Some(text) = comment { check_comment(text)?; }
        self.game.set_variation_comment(id, comment.map(str::to_string));
        Ok(())
    }

    // ---- metadata & lifecycle ----

    /// Sets every pair or none of them. `FEN` and `SetUp` follow the root and are
    /// changed through [`TreeEngine::reset`].
    pub fn set_metadata<I, K, V>(&mut self, tags: I) -> TreeResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let tags: Vec<(String, String)> = tags.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        for (k, v) in &tags { check_tag(k, v)?; }
        let meta = self.game.metadata_mut();
        for (k, v) in tags { meta.set(k, v); }
        Ok(())
    }

    /// Starts a fresh game at `root` (standard start when `None`).
    pub fn reset(&mut self, root: Option<&str>) -> TreeResult<()> {
        self.game = new_game(&self.oracle, root)?;
        self.current_fen = self.game.root_fen().to_string();
        Ok(())
    }

    /// Drops every move, keeping the root position and the tags.
    pub fn clear(&mut self) {
        self.game.clear_moves();
        self.current_fen = self.game.root_fen().to_string();
    }
}

fn check_comment(text: &str) -> TreeResult<()> {
    let reason = if text.contains('}') {
        "contains '}'"
    } else if text.contains("[%") {
        "contains a '[%' command opener"
    } else if text.lines().skip(1).any(|l| l.trim_start().starts_with('[')) {
        "a later line would read as a tag pair"
    } else {
        return Ok(());
    };
    Err(TreeError::InvalidComment { text: text.to_string(), reason: reason.to_string() })
}

fn check_tag(key: &str, value: &str) -> TreeResult<()> {
    let reason = if !is_tag_key(key) {
        "names are ASCII alphanumerics or '_'"
    } else if matches!(key, "FEN" | "SetUp") {
        "follows the root position"
    } else if value.contains(['\n', '\r']) {
        "value spans lines"
    } else if key == "Result" && !RESULTS.contains(&value) {
        "not a game result"
    } else {
        return Ok(());
    };
    Err(TreeError::InvalidTag { key: key.to_string(), reason: reason.to_string() })
}

fn new_game<O: PositionOracle>(oracle: &O, root: Option<&str>) -> TreeResult<Game> {
    let start = oracle.start_fen();
    let Some(fen) = root else { return Ok(Game::new(start)) };
    let fen = oracle.normalize(fen)?;
    let mut tags = Tags::seven_tag_roster();
    if fen != start {
        tags.set("SetUp", "1");
        tags.set("FEN", fen.clone());
    }
    Ok(Game::with_tags(fen, tags))
}
