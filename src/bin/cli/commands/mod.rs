pub mod decks;
pub mod generate;
pub mod status;
pub mod sync;
