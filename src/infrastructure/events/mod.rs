//! Event bus implementations

mod emitter;
mod in_memory;
mod redis;

pub use emitter::KeyEventEmitter;
pub use in_memory::InMemoryEventPublisher;
pub use self::redis::{RedisEventConfig, RedisEventPublisher};
