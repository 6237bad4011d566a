use cozy_chess::Color;
use log::{debug, warn};

use super::commands::{self, Commands};
use super::lexer::{Lexer, Token, TokenKind};
use crate::annotation::{Comment, CommentPosition, Nag};
use crate::board::{PlayedMove, PositionOracle};
use crate::error::{NotationError, NotationResult};
use crate::tree::{Fork, Game, Line, MoveNode, NodeId, Tags};

/// One open move list: the main line or a parenthesised variation.
#[derive(Default)]
struct Frame {
    line: Option<Line>,
    last: Option<NodeId>,
    /// Move written just before the opening parenthesis
    branch_point: Option<NodeId>,
    open_offset: usize,
    number: Option<(u32, bool)>,
    after_number: bool,
    before: Vec<String>,
    before_commands: Commands,
    variation_comment: Vec<String>,
}

/// Plies before a move; `None` when the move number is out of range.
fn ply(number: u32, black: bool) -> Option<u32> {
    number.saturating_sub(1).checked_mul(2)?.checked_add(u32::from(black))
}

fn node_ply(n: &MoveNode) -> Option<u32> { ply(n.move_number, n.color == Color::Black) }

struct Parser<'o, O: PositionOracle> {
    oracle: &'o O,
    game: Option<Game>,
    tags: Tags,
    frames: Vec<Frame>,
    result: Option<String>,
}

impl<'o, O: PositionOracle> Parser<'o, O> {
    fn new(oracle: &'o O) -> Self {
        Self { oracle, game: None, tags: Tags::new(), frames: vec![Frame { line: Some(Line::Main), ..Frame::default() }], result: None }
    }

    fn unexpected(offset: usize, text: &str) -> NotationError {
        NotationError::UnexpectedToken { offset, token: text.to_string() }
    }

    fn build_game(&mut self) -> NotationResult<Game> {
        let root = match self.tags.get("FEN") {
            Some(fen) => self
                .oracle
                .normalize(fen)
                .map_err(|e| NotationError::InvalidPosition { fen: fen.to_string(), reason: e.to_string() })?,
            None => self.oracle.start_fen(),
        };
        Ok(Game::with_tags(root, std::mem::take(&mut self.tags)))
    }

    /// The game under construction; created once the header is complete.
    fn game(&mut self) -> NotationResult<&mut Game> {
        let game = match self.game.take() {
            Some(g) => g,
            None => self.build_game()?,
        };
        Ok(self.game.insert(game))
    }

    fn frame(&mut self) -> &mut Frame {
        let idx = self.frames.len() - 1;
        &mut self.frames[idx]
    }

    fn feed(&mut self, tok: Token<'_>) -> NotationResult<()> {
        let offset = tok.offset;
        if self.result.is_some() { return Err(Self::unexpected(offset, "token after game result")); }
        match tok.kind {
            TokenKind::Tag { key, value } => {
                if self.game.is_some() { return Err(Self::unexpected(offset, &format!("[{key}"))); }
                self.tags.set(key, value);
            }
            TokenKind::MoveNumber { number, black } => {
                if ply(number, black).is_none() { return Err(Self::unexpected(offset, &number.to_string())); }
                self.game()?;
                let f = self.frame();
                f.number = Some((number, black));
                f.after_number = true;
            }
            TokenKind::San(word) => self.san(word, offset)?,
            TokenKind::Nag(n) => self.nag(Nag(n), offset)?,
            TokenKind::Glyph(g) => {
                let nag = Nag::from_symbol(g).ok_or_else(|| Self::unexpected(offset, g))?;
                self.nag(nag, offset)?;
            }
            TokenKind::Comment(text) => self.comment(text)?,
            TokenKind::Open => {
                self.game()?;
                let last = self.frame().last.ok_or_else(|| Self::unexpected(offset, "("))?;
                self.frames.push(Frame { branch_point: Some(last), open_offset: offset, ..Frame::default() });
            }
            TokenKind::Close => self.close(offset)?,
            TokenKind::Result(r) => {
                if self.frames.len() > 1 {
                    return Err(NotationError::UnbalancedVariation { offset: self.frame().open_offset });
                }
                let game = self.game()?;
                if game.metadata().get("Result").map_or(false, |tag| tag != r) {
                    return Err(Self::unexpected(offset, r));
                }
                self.result = Some(r.to_string());
            }
        }
        Ok(())
    }

    fn san(&mut self, word: &str, offset: usize) -> NotationResult<()> {
        let move_text = word.trim_end_matches(['!', '?']);
        let suffix = &word[move_text.len()..];
        let illegal = || NotationError::IllegalMove { offset, san: word.to_string() };
        let oracle = self.oracle;
        self.game()?;
        let frame_idx = self.frames.len() - 1;
        let (last, line, branch_point, number) = {
            let f = &self.frames[frame_idx];
            (f.last, f.line, f.branch_point, f.number)
        };
        let game = self.game.as_mut().ok_or_else(illegal)?;

        let id = match (last, line) {
            (Some(prev), Some(line)) => {
                let fen = game.fen_of(Some(prev)).ok_or_else(illegal)?.to_string();
                let played = oracle.play(&fen, move_text).map_err(|_| illegal())?;
                game.append(line, played)
            }
            (None, Some(line)) => {
                let played = oracle.play(game.root_fen(), move_text).map_err(|_| illegal())?;
                game.append(line, played)
            }
            (_, None) => {
                // First move of a variation: either an alternative to the branch
                // point or a continuation from it, as the move number indicates
                let m = branch_point.and_then(|id| game.node(id)).ok_or_else(illegal)?;
                let continuation = Fork::Node(m.id);
                let alternative = game.alternatives_fork(m.id).ok_or_else(illegal)?;
                let next_ply = node_ply(m).and_then(|p| p.checked_add(1));
                let continues = matches!(number, Some((n, black)) if next_ply.is_some() && ply(n, black) == next_ply);
                let order = if continues { [continuation, alternative] } else { [alternative, continuation] };
                let (fork, played) = order
                    .iter()
                    .find_map(|fork| {
                        let fen = game.fork_fen(*fork)?;
                        oracle.play(fen, move_text).ok().map(|p: PlayedMove| (*fork, p))
                    })
                    .ok_or_else(illegal)?;
                let (vid, node) = game.branch_at(fork, played);
                let comment = std::mem::take(&mut self.frames[frame_idx].variation_comment);
                if !comment.is_empty() { game.set_variation_comment(vid, Some(comment.join(" "))); }
                self.frames[frame_idx].line = Some(Line::Variation(vid));
                node
            }
        };

        let f = &mut self.frames[frame_idx];
        let before = std::mem::take(&mut f.before);
        let before_commands = std::mem::take(&mut f.before_commands);
        f.last = Some(id);
        f.number = None;
        f.after_number = false;

        let game = self.game.as_mut().ok_or_else(illegal)?;
        let a = game.annotation_mut(id).ok_or_else(illegal)?;
        for text in before { a.comments.push(Comment { text, position: CommentPosition::Before }); }
        before_commands.apply(a);
        if !suffix.is_empty() {
            match Nag::from_symbol(suffix) {
                Some(nag) => a.add_nag(nag),
                None => warn!("ignoring unknown move suffix '{}' at offset {}", suffix, offset),
            }
        }
        Ok(())
    }

    fn nag(&mut self, nag: Nag, offset: usize) -> NotationResult<()> {
        let last = self.frame().last.ok_or_else(|| Self::unexpected(offset, &nag.to_string()))?;
        if let Some(a) = self.game()?.annotation_mut(last) { a.add_nag(nag); }
        Ok(())
    }

    fn comment(&mut self, raw: &str) -> NotationResult<()> {
        self.game()?;
        let (text, cmds) = commands::extract(raw);
        let (last, after_number, fresh_variation) = {
            let f = self.frame();
            (f.last, f.after_number, f.line.is_none())
        };
        match (last, after_number) {
            (Some(last), false) => {
                if let Some(a) = self.game()?.annotation_mut(last) {
                    if !text.is_empty() { a.comments.push(Comment { text, position: CommentPosition::After }); }
                    cmds.apply(a);
                }
            }
            (None, false) if fresh_variation => {
                if !cmds.is_empty() { warn!("dropping commands in variation comment"); }
                if !text.is_empty() { self.frame().variation_comment.push(text); }
            }
            _ => {
                let f = self.frame();
                if !text.is_empty() { f.before.push(text); }
                let pending = std::mem::take(&mut f.before_commands);
                let mut merged = cmds;
                if merged.evaluation.is_none() { merged.evaluation = pending.evaluation; }
                if merged.clock.is_none() { merged.clock = pending.clock; }
                let mut marks = pending.marks;
                marks.extend(merged.marks);
                merged.marks = marks;
                f.before_commands = merged;
            }
        }
        Ok(())
    }

    fn close(&mut self, offset: usize) -> NotationResult<()> {
        if self.frames.len() < 2 { return Err(NotationError::UnbalancedVariation { offset }); }
        let frame = self.frames.pop().unwrap_or_default();
        if frame.line.is_none() { return Err(NotationError::EmptyVariation { offset: frame.open_offset }); }
        if !frame.before.is_empty() { warn!("dropping comments after the last move of a variation"); }
        let parent = self.frame();
        parent.after_number = false;
        parent.number = None;
        Ok(())
    }

    fn finish(mut self) -> NotationResult<Game> {
        if self.frames.len() > 1 {
            return Err(NotationError::UnbalancedVariation { offset: self.frame().open_offset });
        }
        let main = self.frames.pop().unwrap_or_default();
        let result = self.result.take();
        let mut game = match self.game.take() {
            Some(g) => g,
            None => self.build_game()?,
        };
        // Trailing comments with no move to precede become remarks on the last move
        if let Some(last) = main.last {
            if let Some(a) = game.annotation_mut(last) {
                for text in main.before { a.comments.push(Comment { text, position: CommentPosition::After }); }
            }
        }
        if let Some(r) = result {
            if game.metadata().get("Result").is_none() { game.metadata_mut().set("Result", r); }
        }
        debug!("parsed game: {} main-line plies, {} nodes", game.main_line().len(), game.node_count());
        Ok(game)
    }
}

/// Parses one game. Any grammar violation or illegal move fails the whole parse.
pub fn parse<O: PositionOracle>(text: &str, oracle: &O) -> NotationResult<Game> {
    let mut parser = Parser::new(oracle);
    let mut lexer = Lexer::new(text);
    while let Some(tok) = lexer.next_token()? { parser.feed(tok)?; }
    parser.finish()
}

/// Splits a multi-game file at each header that follows movetext.
pub fn split_games(text: &str) -> Vec<&str> {
    let mut games = Vec::new();
    let mut start = 0usize;
    let mut offset = 0usize;
    let mut in_movetext = false;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            if in_movetext {
                games.push(&text[start..offset]);
                start = offset;
                in_movetext = false;
            }
        } else if !trimmed.is_empty() && !trimmed.starts_with('%') {
            in_movetext = true;
        }
        offset += line.len();
    }
    games.push(&text[start..]);
    games.into_iter().filter(|g| !g.trim().is_empty()).collect()
}

pub fn parse_all<O: PositionOracle>(text: &str, oracle: &O) -> NotationResult<Vec<Game>> {
    split_games(text).into_iter().map(|g| parse(g, oracle)).collect()
}
