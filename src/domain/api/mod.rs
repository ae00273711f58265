//! Api domain
//!
//! An Api is a named resource configured with an authentication mode.
//! Only Apis using key authentication can have keys issued against them.

mod entity;

pub use entity::{Api, AuthType};
