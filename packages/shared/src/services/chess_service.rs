use chess::{Board, BoardStatus, ChessMove, File, MoveGen, Piece, Rank, Square, EMPTY};
use std::str::FromStr;

use crate::models::game::Color;
use crate::models::move_request::MoveRequest;
use crate::services::errors::chess_service_errors::ChessServiceError;

/// Everything the session layer needs to know about an accepted move. The
/// resulting FEN is authoritative for the game's next position.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub fen_after: String,
    pub notation: String,
    pub piece_moved: String,
    pub from_square: String,
    pub to_square: String,
    pub mover: Color,
    pub is_capture: bool,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
}

/// Thin wrapper around the `chess` crate, which acts as the rules oracle:
/// it judges legality and terminal states, this service never does.
#[derive(Clone)]
pub struct ChessService;

impl ChessService {
    pub fn new() -> Self {
        ChessService
    }

    /// Judge a candidate move against a position. Distinguishes moving the
    /// opponent's piece (`NotYourTurn`) from an illegal move of one's own;
    /// the mover's side is taken from the piece on the origin square.
    pub fn evaluate_move(
        &self,
        fen: &str,
        request: &MoveRequest,
    ) -> Result<MoveOutcome, ChessServiceError> {
        let board = Board::from_str(fen)
            .map_err(|e| ChessServiceError::InvalidPosition(format!("invalid FEN: {}", e)))?;

        let from_square = request.from_square.trim().to_ascii_lowercase();
        let to_square = request.to_square.trim().to_ascii_lowercase();
        let from = Square::from_str(&from_square)
            .map_err(|_| ChessServiceError::InvalidSquare(request.from_square.clone()))?;
        let to = Square::from_str(&to_square)
            .map_err(|_| ChessServiceError::InvalidSquare(request.to_square.clone()))?;

        let piece = board.piece_on(from).ok_or_else(|| {
            ChessServiceError::IllegalMove(format!("no piece on {}", from_square))
        })?;
        if board.color_on(from) != Some(board.side_to_move()) {
            return Err(ChessServiceError::NotYourTurn);
        }

        let promotion = promotion_piece(request, piece, to)?;
        let chess_move = ChessMove::new(from, to, promotion);

        let legal_moves: Vec<ChessMove> = MoveGen::new_legal(&board).collect();
        if !legal_moves.contains(&chess_move) {
            return Err(ChessServiceError::IllegalMove(format!(
                "{} to {} is not legal",
                from_square, to_square
            )));
        }

        let is_capture = board.piece_on(to).is_some()
            || (piece == Piece::Pawn && from.get_file() != to.get_file());

        let mut after = board.clone();
        board.make_move(chess_move, &mut after);

        let status_after = after.status();
        let is_checkmate = status_after == BoardStatus::Checkmate;
        let is_stalemate = status_after == BoardStatus::Stalemate;
        let is_check = *after.checkers() != EMPTY;

        let notation = san_notation(
            &board,
            chess_move,
            piece,
            is_capture,
            is_check,
            is_checkmate,
            &legal_moves,
        );

        Ok(MoveOutcome {
            fen_after: format!("{}", after),
            notation,
            piece_moved: piece_name(piece).to_string(),
            from_square,
            to_square,
            mover: side_from_engine(board.side_to_move()),
            is_capture,
            is_check,
            is_checkmate,
            is_stalemate,
        })
    }
}

impl Default for ChessService {
    fn default() -> Self {
        Self::new()
    }
}

fn promotion_piece(
    request: &MoveRequest,
    piece: Piece,
    to: Square,
) -> Result<Option<Piece>, ChessServiceError> {
    let promoting =
        piece == Piece::Pawn && matches!(to.get_rank(), Rank::First | Rank::Eighth);
    if !promoting {
        return Ok(None);
    }
    match request.promotion_piece.as_deref() {
        Some("q") => Ok(Some(Piece::Queen)),
        Some("r") => Ok(Some(Piece::Rook)),
        Some("b") => Ok(Some(Piece::Bishop)),
        Some("n") => Ok(Some(Piece::Knight)),
        Some(other) => Err(ChessServiceError::InvalidPromotion(other.to_string())),
        // An unspecified promotion defaults to queen.
        None => Ok(Some(Piece::Queen)),
    }
}

fn san_notation(
    board: &Board,
    chess_move: ChessMove,
    piece: Piece,
    is_capture: bool,
    is_check: bool,
    is_checkmate: bool,
    legal_moves: &[ChessMove],
) -> String {
    let from = chess_move.get_source();
    let to = chess_move.get_dest();

    let mut san = if piece == Piece::King && file_distance(from, to) == 2 {
        if to.get_file() == File::G {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        }
    } else if piece == Piece::Pawn {
        let mut s = String::new();
        if is_capture {
            s.push(file_char(from.get_file()));
            s.push('x');
        }
        s.push_str(&to.to_string());
        if let Some(promotion) = chess_move.get_promotion() {
            s.push('=');
            s.push(piece_letter(promotion));
        }
        s
    } else {
        let mut s = String::new();
        s.push(piece_letter(piece));
        s.push_str(&disambiguation(board, chess_move, piece, legal_moves));
        if is_capture {
            s.push('x');
        }
        s.push_str(&to.to_string());
        s
    };

    if is_checkmate {
        san.push('#');
    } else if is_check {
        san.push('+');
    }
    san
}

/// Minimal SAN disambiguation: file if unique, then rank, then full square.
fn disambiguation(
    board: &Board,
    chess_move: ChessMove,
    piece: Piece,
    legal_moves: &[ChessMove],
) -> String {
    let from = chess_move.get_source();
    let rivals: Vec<Square> = legal_moves
        .iter()
        .filter(|m| {
            m.get_dest() == chess_move.get_dest()
                && m.get_source() != from
                && board.piece_on(m.get_source()) == Some(piece)
        })
        .map(|m| m.get_source())
        .collect();

    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|s| s.get_file() != from.get_file()) {
        file_char(from.get_file()).to_string()
    } else if rivals.iter().all(|s| s.get_rank() != from.get_rank()) {
        rank_char(from.get_rank()).to_string()
    } else {
        from.to_string()
    }
}

fn side_from_engine(color: chess::Color) -> Color {
    match color {
        chess::Color::White => Color::White,
        chess::Color::Black => Color::Black,
    }
}

fn piece_name(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "pawn",
        Piece::Knight => "knight",
        Piece::Bishop => "bishop",
        Piece::Rook => "rook",
        Piece::Queen => "queen",
        Piece::King => "king",
    }
}

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

fn file_char(file: File) -> char {
    (b'a' + file.to_index() as u8) as char
}

fn rank_char(rank: Rank) -> char {
    (b'1' + rank.to_index() as u8) as char
}

fn file_distance(a: Square, b: Square) -> i32 {
    (a.get_file().to_index() as i32 - b.get_file().to_index() as i32).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::INITIAL_FEN;

    #[test]
    fn test_opening_pawn_push() {
        let service = ChessService::new();
        let outcome = service
            .evaluate_move(INITIAL_FEN, &MoveRequest::new("e2", "e4"))
            .unwrap();

        assert_eq!(outcome.notation, "e4");
        assert_eq!(outcome.piece_moved, "pawn");
        assert_eq!(outcome.mover, Color::White);
        assert!(!outcome.is_capture);
        assert!(!outcome.is_check);
        assert!(!outcome.is_checkmate);
        assert!(!outcome.is_stalemate);
        assert_ne!(outcome.fen_after, INITIAL_FEN);
        assert!(outcome.fen_after.contains(" b "));
    }

    #[test]
    fn test_illegal_move_rejected() {
        let service = ChessService::new();
        let err = service
            .evaluate_move(INITIAL_FEN, &MoveRequest::new("e2", "e5"))
            .unwrap_err();
        assert!(matches!(err, ChessServiceError::IllegalMove(_)));
    }

    #[test]
    fn test_moving_opponent_piece_is_not_your_turn() {
        let service = ChessService::new();
        let err = service
            .evaluate_move(INITIAL_FEN, &MoveRequest::new("e7", "e5"))
            .unwrap_err();
        assert!(matches!(err, ChessServiceError::NotYourTurn));
    }

    #[test]
    fn test_empty_origin_square_is_illegal() {
        let service = ChessService::new();
        let err = service
            .evaluate_move(INITIAL_FEN, &MoveRequest::new("e3", "e4"))
            .unwrap_err();
        assert!(matches!(err, ChessServiceError::IllegalMove(_)));
    }

    #[test]
    fn test_invalid_square_string() {
        let service = ChessService::new();
        let err = service
            .evaluate_move(INITIAL_FEN, &MoveRequest::new("z9", "e4"))
            .unwrap_err();
        assert!(matches!(err, ChessServiceError::InvalidSquare(_)));
    }

    #[test]
    fn test_uppercase_squares_are_normalized() {
        let service = ChessService::new();
        let outcome = service
            .evaluate_move(INITIAL_FEN, &MoveRequest::new("E2", "E4"))
            .unwrap();
        assert_eq!(outcome.from_square, "e2");
        assert_eq!(outcome.to_square, "e4");
    }

    #[test]
    fn test_pawn_capture_notation() {
        // After 1. e4 d5, white captures on d5.
        let fen = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2";
        let service = ChessService::new();
        let outcome = service
            .evaluate_move(fen, &MoveRequest::new("e4", "d5"))
            .unwrap();

        assert!(outcome.is_capture);
        assert_eq!(outcome.notation, "exd5");
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let fen = "8/P6k/8/8/8/8/8/K7 w - - 0 1";
        let service = ChessService::new();
        let outcome = service
            .evaluate_move(fen, &MoveRequest::new("a7", "a8"))
            .unwrap();

        assert_eq!(outcome.notation, "a8=Q");
        assert!(outcome.fen_after.starts_with("Q7/"));
    }

    #[test]
    fn test_underpromotion_to_knight() {
        let fen = "8/P6k/8/8/8/8/8/K7 w - - 0 1";
        let service = ChessService::new();
        let outcome = service
            .evaluate_move(fen, &MoveRequest::with_promotion("a7", "a8", "n"))
            .unwrap();

        assert_eq!(outcome.notation, "a8=N");
        assert!(outcome.fen_after.starts_with("N7/"));
    }

    #[test]
    fn test_invalid_promotion_piece_rejected() {
        let fen = "8/P6k/8/8/8/8/8/K7 w - - 0 1";
        let service = ChessService::new();
        let err = service
            .evaluate_move(fen, &MoveRequest::with_promotion("a7", "a8", "k"))
            .unwrap_err();
        assert!(matches!(err, ChessServiceError::InvalidPromotion(_)));
    }

    #[test]
    fn test_kingside_castle_notation() {
        let fen = "rnbqk2r/pppp1ppp/5n2/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";
        let service = ChessService::new();
        let outcome = service
            .evaluate_move(fen, &MoveRequest::new("e1", "g1"))
            .unwrap();

        assert_eq!(outcome.notation, "O-O");
        assert_eq!(outcome.piece_moved, "king");
    }

    #[test]
    fn test_checkmate_is_flagged() {
        // Fool's mate: after 1. f3 e5 2. g4, black mates with Qh4#.
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq g3 0 2";
        let service = ChessService::new();
        let outcome = service
            .evaluate_move(fen, &MoveRequest::new("d8", "h4"))
            .unwrap();

        assert_eq!(outcome.notation, "Qh4#");
        assert_eq!(outcome.mover, Color::Black);
        assert!(outcome.is_check);
        assert!(outcome.is_checkmate);
        assert!(!outcome.is_stalemate);
    }

    #[test]
    fn test_stalemate_is_flagged() {
        let fen = "k7/8/2K5/8/8/8/8/1Q6 w - - 0 1";
        let service = ChessService::new();
        let outcome = service
            .evaluate_move(fen, &MoveRequest::new("b1", "b6"))
            .unwrap();

        assert_eq!(outcome.notation, "Qb6");
        assert!(!outcome.is_check);
        assert!(!outcome.is_checkmate);
        assert!(outcome.is_stalemate);
    }

    #[test]
    fn test_rook_file_disambiguation() {
        let fen = "1k6/8/8/8/R6R/8/8/4K3 w - - 0 1";
        let service = ChessService::new();
        let outcome = service
            .evaluate_move(fen, &MoveRequest::new("a4", "d4"))
            .unwrap();

        assert_eq!(outcome.notation, "Rad4");
    }

    #[test]
    fn test_evaluating_on_garbage_fen_fails() {
        let service = ChessService::new();
        let err = service
            .evaluate_move("not a position", &MoveRequest::new("e2", "e4"))
            .unwrap_err();
        assert!(matches!(err, ChessServiceError::InvalidPosition(_)));
    }
}
