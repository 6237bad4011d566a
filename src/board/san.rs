//! Standard algebraic notation on top of cozy-chess move generation.
//!
//! cozy-chess encodes castling as the king capturing its own rook (e1h1);
//! everything here presents the standard forms instead (`O-O`, `e1g1`).

use cozy_chess::{Board, Move, Piece, Square};

pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut v = Vec::new();
    board.generate_moves(|ml| { for m in ml { v.push(m); } false });
    v
}

fn file_of(sq: Square) -> u8 { format!("{}", sq).as_bytes()[0] }

fn rank_of(sq: Square) -> u8 { format!("{}", sq).as_bytes()[1] }

fn piece_letter(p: Piece) -> char {
    match p { Piece::Knight => 'N', Piece::Bishop => 'B', Piece::Rook => 'R', Piece::Queen => 'Q', Piece::King => 'K', Piece::Pawn => 'P' }
}

fn letter_piece(c: char) -> Option<Piece> {
    match c { 'N' => Some(Piece::Knight), 'B' => Some(Piece::Bishop), 'R' => Some(Piece::Rook), 'Q' => Some(Piece::Queen), 'K' => Some(Piece::King), _ => None }
}

/// Castling in either library encoding: king onto its own rook, or king two files over.
pub fn is_castle(board: &Board, mv: Move) -> bool {
    if board.piece_on(mv.from) != Some(Piece::King) { return false; }
    let stm = board.side_to_move();
    let delta = (file_of(mv.to) as i32 - file_of(mv.from) as i32).abs();
    board.color_on(mv.to) == Some(stm) || (delta == 2 && rank_of(mv.to) == rank_of(mv.from))
}

fn is_capture(board: &Board, mv: Move) -> bool {
    let stm = board.side_to_move();
    if let Some(col) = board.color_on(mv.to) { return col != stm; }
    // En passant: diagonal pawn move onto an empty square
    board.piece_on(mv.from) == Some(Piece::Pawn) && file_of(mv.from) != file_of(mv.to)
}

/// Canonical SAN for a legal move, including check/mate suffix.
pub fn to_san(board: &Board, mv: Move) -> String {
    let mut s = String::new();
    if is_castle(board, mv) {
        s.push_str(if file_of(mv.to) > file_of(mv.from) { "O-O" } else { "O-O-O" });
    } else {
        let piece = board.piece_on(mv.from).unwrap_or(Piece::Pawn);
        let capture = is_capture(board, mv);
        if piece == Piece::Pawn {
            if capture { s.push(file_of(mv.from) as char); }
        } else {
            s.push(piece_letter(piece));
            // Minimal disambiguation among same-type pieces reaching the same square
            let others: Vec<Square> = legal_moves(board)
                .into_iter()
                .filter(|m| m.to == mv.to && m.from != mv.from && board.piece_on(m.from) == Some(piece))
                .map(|m| m.from)
                .collect();
            if !others.is_empty() {
                let same_file = others.iter().any(|&o| file_of(o) == file_of(mv.from));
                let same_rank = others.iter().any(|&o| rank_of(o) == rank_of(mv.from));
                if !same_file { s.push(file_of(mv.from) as char); }
                else if !same_rank { s.push(rank_of(mv.from) as char); }
                else { s.push(file_of(mv.from) as char); s.push(rank_of(mv.from) as char); }
            }
        }
        if capture { s.push('x'); }
        s.push_str(&format!("{}", mv.to));
        if let Some(promo) = mv.promotion {
            s.push('=');
            s.push(piece_letter(promo));
        }
    }

    let mut next = board.clone();
    next.play(mv);
    if !next.checkers().is_empty() {
        let mut has_reply = false;
        next.generate_moves(|ml| { has_reply = !ml.is_empty(); has_reply });
        s.push(if has_reply { '+' } else { '#' });
    }
    s
}

/// Standard UCI text for a legal move (castling as the king's two-square step).
pub fn to_uci(board: &Board, mv: Move) -> String {
    let to = if is_castle(board, mv) {
        let file = if file_of(mv.to) > file_of(mv.from) { 'g' } else { 'c' };
        format!("{}{}", file, rank_of(mv.from) as char)
    } else {
        format!("{}", mv.to)
    };
    let promo = mv.promotion.map(|p| piece_letter(p).to_ascii_lowercase().to_string()).unwrap_or_default();
    format!("{}{}{}", mv.from, to, promo)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SanPattern {
    Castle { long: bool },
    Piece {
        piece: Piece,
        from_file: Option<u8>,
        from_rank: Option<u8>,
        to: Square,
        promotion: Option<Piece>,
    },
}

/// Lenient SAN reader: ignores check and judgment suffixes, optional `x` and `=`,
/// accepts `0-0` castling and over-disambiguated origins.
pub fn parse_san(text: &str) -> Option<SanPattern> {
    let t = text.trim().trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'));
    match t {
        "O-O" | "0-0" => return Some(SanPattern::Castle { long: false }),
        "O-O-O" | "0-0-0" => return Some(SanPattern::Castle { long: true }),
        _ => {}
    }
    let mut chars: Vec<char> = t.chars().collect();
    if chars.is_empty() { return None; }
    let piece = match letter_piece(chars[0]) {
        Some(p) => { chars.remove(0); p }
        None => Piece::Pawn,
    };

    let mut promotion = None;
    if piece == Piece::Pawn && chars.len() >= 3 {
        if let Some(&last) = chars.last() {
            if last.is_ascii_alphabetic() {
                promotion = Some(letter_piece(last.to_ascii_uppercase()).filter(|p| *p != Piece::King)?);
                chars.pop();
                if chars.last() == Some(&'=') { chars.pop(); }
            }
        }
    }
    if chars.len() < 2 { return None; }
    let dest: String = chars[chars.len() - 2..].iter().collect();
    let to: Square = dest.parse().ok()?;
    let mut from_file = None;
    let mut from_rank = None;
    for &c in chars[..chars.len() - 2].iter().filter(|c| !matches!(c, 'x' | ':' | '-')) {
        match c {
            'a'..='h' if from_file.is_none() => from_file = Some(c as u8),
            '1'..='8' if from_rank.is_none() => from_rank = Some(c as u8),
            _ => return None,
        }
    }
    Some(SanPattern::Piece { piece, from_file, from_rank, to, promotion })
}

/// The unique legal move matching `san`, if there is exactly one.
pub fn find_move(board: &Board, san: &str) -> Option<Move> {
    let pattern = parse_san(san)?;
    let candidates: Vec<Move> = legal_moves(board)
        .into_iter()
        .filter(|&mv| match &pattern {
            SanPattern::Castle { long } => is_castle(board, mv) && (file_of(mv.to) < file_of(mv.from)) == *long,
            SanPattern::Piece { piece, from_file, from_rank, to, promotion } => {
                board.piece_on(mv.from) == Some(*piece)
                    && !is_castle(board, mv)
                    && mv.to == *to
                    && mv.promotion == *promotion
                    && from_file.map_or(true, |f| file_of(mv.from) == f)
                    && from_rank.map_or(true, |r| rank_of(mv.from) == r)
            }
        })
        .collect();
    match candidates.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}
