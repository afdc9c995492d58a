pub mod chess_service;
pub mod errors;
pub mod game_service;
