//! Position oracle: the only place move legality is decided.

pub mod cozy;
pub mod san;

use cozy_chess::Color;

use crate::error::OracleError;

pub use cozy::{CozyOracle, Position};

/// Outcome of a legal move, in the canonical encodings stored on a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayedMove {
    pub san: String,
    pub uci: String,
    /// Position after the move
    pub fen: String,
    /// Side that made the move
    pub color: Color,
    /// Full-move number of the position the move was played from
    pub move_number: u32,
}

/// Move-legality engine seam. Positions are FEN strings in and out.
pub trait PositionOracle {
    fn start_fen(&self) -> String;

    /// Decode and re-encode a position; fails on anything undecodable.
    fn normalize(&self, fen: &str) -> Result<String, OracleError>;

    fn play(&self, fen: &str, san: &str) -> Result<PlayedMove, OracleError>;
}

impl<T: PositionOracle + ?Sized> PositionOracle for &T {
    fn start_fen(&self) -> String { (**self).start_fen() }
    fn normalize(&self, fen: &str) -> Result<String, OracleError> { (**self).normalize(fen) }
    fn play(&self, fen: &str, san: &str) -> Result<PlayedMove, OracleError> { (**self).play(fen, san) }
}
