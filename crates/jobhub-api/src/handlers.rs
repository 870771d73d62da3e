//! Request handlers.

pub mod cron;
pub mod extract;
pub mod health;
pub mod jobs;
pub mod profile;
pub mod search_usage;
pub mod sitemap;

pub use cron::*;
pub use extract::*;
pub use health::*;
pub use jobs::*;
pub use profile::*;
pub use search_usage::*;
pub use sitemap::*;
