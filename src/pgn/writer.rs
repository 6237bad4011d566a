use cozy_chess::Color;

use super::commands;
use crate::annotation::CommentPosition;
use crate::tree::{Game, MoveNode, NodeId, VariationId};

const LINE_WIDTH: usize = 80;

fn escape(value: &str) -> String { value.replace('\\', "\\\\").replace('"', "\\\"") }

/// Movetext tokens. `(` glues onto the following token and `)` onto the preceding one.
#[derive(Default)]
struct Movetext {
    tokens: Vec<String>,
    open_pending: bool,
    need_number: bool,
}

impl Movetext {
    fn push(&mut self, token: String) {
        if std::mem::take(&mut self.open_pending) {
            self.tokens.push(format!("({token}"));
        } else {
            self.tokens.push(token);
        }
    }

    fn comment(&mut self, text: &str) {
        self.push(format!("{{{text}}}"));
        self.need_number = true;
    }

    fn open(&mut self) {
        self.open_pending = true;
        self.need_number = true;
    }

    fn close(&mut self) {
        if let Some(last) = self.tokens.last_mut() { last.push(')'); }
        self.need_number = true;
    }

    fn wrap(&self) -> String {
        let mut out = String::new();
        let mut width = 0usize;
        for tok in &self.tokens {
            let len = tok.chars().count();
            if width > 0 && width + 1 + len > LINE_WIDTH {
                out.push('\n');
                width = 0;
            } else if width > 0 {
                out.push(' ');
                width += 1;
            }
            out.push_str(tok);
            width += len;
        }
        out
    }
}

struct Writer<'g> {
    game: &'g Game,
    text: Movetext,
}

impl<'g> Writer<'g> {
    fn number(&mut self, node: &MoveNode) {
        let has_before = node.annotation.comments_at(CommentPosition::Before).next().is_some();
        if node.color == Color::White {
            self.text.push(format!("{}.", node.move_number));
        } else if self.text.need_number || has_before {
            self.text.push(format!("{}...", node.move_number));
        }
    }

    fn node(&mut self, node: &MoveNode) {
        self.number(node);
        let a = &node.annotation;
        for c in a.comments_at(CommentPosition::Before) { self.text.comment(&c.text); }

        let suffix = a.nags.iter().find(|n| n.is_suffix()).and_then(|n| n.symbol()).unwrap_or("");
        self.text.push(format!("{}{}", node.san, suffix));
        self.text.need_number = false;
        for nag in a.nags.iter().filter(|n| !n.is_suffix()) {
            self.text.push(nag.symbol().map_or_else(|| nag.to_string(), str::to_string));
        }

        if let Some(block) = commands::render(a) { self.text.comment(&block); }
        for c in a.comments_at(CommentPosition::After) { self.text.comment(&c.text); }
    }

    fn variations(&mut self, list: &[VariationId]) {
        let game = self.game;
        for vid in list {
            let Some(var) = game.variation(*vid) else { continue };
            self.text.open();
            if let Some(c) = &var.comment { self.text.comment(c); }
            self.line(&var.moves, &var.alternatives);
            self.text.close();
        }
    }

    /// Writes one move list. `alternatives_to_first` holds the variations that
    /// compete with the list's first move.
    fn line(&mut self, moves: &[NodeId], alternatives_to_first: &[VariationId]) {
        let game = self.game;
        self.text.need_number = true;
        for (i, id) in moves.iter().enumerate() {
            let Some(node) = game.node(*id) else { continue };
            self.node(node);
            // Alternatives to this move hang off its predecessor
            match i.checked_sub(1).and_then(|p| moves.get(p)).and_then(|p| game.node(*p)) {
                Some(prev) => self.variations(&prev.variations),
                None => self.variations(alternatives_to_first),
            }
            if i + 1 == moves.len() { self.variations(&node.variations); }
        }
    }
}

/// Serialises a game: tag section, blank line, wrapped movetext, result.
pub fn write(game: &Game) -> String {
    let mut out = String::new();
    let tags = game.metadata();
    for (k, v) in tags.iter() { out.push_str(&format!("[{} \"{}\"]\n", k, escape(v))); }
    if !out.is_empty() { out.push('\n'); }

    let mut w = Writer { game, text: Movetext::default() };
    w.line(game.main_line(), game.root_variations());
    w.text.push(tags.get("Result").unwrap_or("*").to_string());
    out.push_str(&w.text.wrap());
    out.push('\n');
    out
}
