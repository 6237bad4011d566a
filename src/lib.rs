// Game-notation tree: main line, nested variations, annotations, PGN in and out
pub mod annotation;
pub mod board;
pub mod engine;
pub mod error;
pub mod pgn;
pub mod tree;

pub use annotation::{Annotation, Comment, CommentPosition, EvalKind, Evaluation, MarkColor, Nag, NagGroup, VisualMark};
pub use board::{CozyOracle, PlayedMove, Position, PositionOracle};
pub use engine::TreeEngine;
pub use error::{NotationError, OracleError, TreeError};
pub use tree::{Fork, Game, Line, MoveNode, NodeId, Tags, Variation, VariationId};
