//! Service coordination for the tournament engine
//!
//! This module exposes the async service that ties storage, the engine
//! components and metrics together.

pub mod tournament;

pub use tournament::TournamentService;
