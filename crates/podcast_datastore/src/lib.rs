//! # DataStore Module
//!
//! Persistence for podcast creators, their episodes and the AI summaries derived from them.
//!
//! The module uses sqlx for database operations against PostgreSQL and exposes the
//! [`DataStore`] trait so the processing pipeline can run against any backing store.

mod datastore;
mod domain;

pub use datastore::postgres::PgDataStore;
pub use datastore::DataStore;
pub use domain::{
    is_chronological, Creator, CreatorProfile, Episode, EpisodeRecord, EpisodeStatus, NewCreator,
    NewEpisode, Platform, Summary, Timestamp, TransitionError, UnknownVariant,
};
