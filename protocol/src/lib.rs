use thiserror::Error;

pub mod client;
pub mod server;

pub use client::{ClientCommand, ClientMessage};
pub use server::battle::{
    GameType, HpStatus, Player, Pokemon, PokemonDetails, Side, Stat, to_id,
};
pub use server::lines::{FrameDecoder, RawFrame, frame_text};
pub use server::request::{
    ActivePokemon, BattleRequest, MoveSlot, PokemonStats, SideInfo, SidePokemon,
};
pub use server::{
    ChallengeState, OutgoingChallenge, RoomType, SearchState, ServerMessage,
    parse_server_message,
};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Empty message")]
    EmptyMessage,
}
