use cozy_chess::{Board as CozyBoard, Color, Move};

use super::san;
use super::{PlayedMove, PositionOracle};
use crate::error::OracleError;

#[derive(Clone, Debug)]
pub struct Position {
    board: CozyBoard,
}

impl Position {
    pub fn startpos() -> Self {
        Self { board: CozyBoard::default() }
    }

    pub fn from_fen(fen: &str) -> Result<Self, OracleError> {
        CozyBoard::from_fen(fen.trim(), false)
            .map(|b| Self { board: b })
            .map_err(|e| OracleError::InvalidPosition { fen: fen.to_string(), reason: format!("{e:?}") })
    }

    pub fn board(&self) -> &CozyBoard { &self.board }

    pub fn fen(&self) -> String { format!("{}", self.board) }

    pub fn side_to_move(&self) -> Color { self.board.side_to_move() }

    pub fn legal_moves_count(&self) -> usize {
        let mut ct = 0usize;
        self.board.generate_moves(|moves| { ct += moves.len(); false });
        ct
    }

    pub fn find_san(&self, text: &str) -> Option<Move> { san::find_move(&self.board, text) }

    /// Plays `text` (lenient SAN) and reports the canonical forms of the move.
    pub fn play_san(&mut self, text: &str) -> Result<PlayedMove, OracleError> {
        let mv = self.find_san(text).ok_or_else(|| OracleError::IllegalMove { san: text.to_string(), fen: self.fen() })?;
        let san = san::to_san(&self.board, mv);
        let uci = san::to_uci(&self.board, mv);
        let color = self.board.side_to_move();
        let move_number = u32::from(self.board.fullmove_number());
        self.board.play(mv);
        Ok(PlayedMove { san, uci, fen: self.fen(), color, move_number })
    }
}

/// Position oracle backed by cozy-chess legal move generation.
#[derive(Clone, Copy, Debug, Default)]
pub struct CozyOracle;

impl PositionOracle for CozyOracle {
    fn start_fen(&self) -> String { Position::startpos().fen() }

    fn normalize(&self, fen: &str) -> Result<String, OracleError> { Position::from_fen(fen).map(|p| p.fen()) }

    fn play(&self, fen: &str, san: &str) -> Result<PlayedMove, OracleError> {
        let mut pos = Position::from_fen(fen)?;
        pos.play_san(san)
    }
}
