//! Data models for wishsync.
//!
//! - [`BannerType`] - the fixed set of wish categories
//! - [`Wish`] - a single draw event
//! - [`Cutoff`] - the import high-water-mark derived from stored wishes
//! - [`User`] - a local account and its linked provider identity

pub mod banner;
pub mod user;
pub mod wish;

pub use banner::BannerType;
pub use user::User;
pub use wish::{Cutoff, Wish};
