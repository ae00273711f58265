//! KeyAuth domain
//!
//! A KeyAuth is the namespace grouping the keys usable against one Api.

mod entity;

pub use entity::KeyAuth;
