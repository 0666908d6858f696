pub mod postgrest;

pub use postgrest::{DbError, PostgrestClient};
