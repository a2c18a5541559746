//! Infrastructure Layer
//!
//! Database, session store and mail implementations.

pub mod mail;
pub mod memory;
pub mod postgres;
pub mod redis;

pub use mail::LogMailer;
pub use memory::{InMemoryMailer, InMemorySessionStore, InMemoryUserRepository};
pub use postgres::PgUserRepository;
pub use self::redis::RedisSessionStore;
