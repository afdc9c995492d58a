pub mod game;
pub mod game_move;
pub mod move_request;
pub mod requests;
pub mod responses;
