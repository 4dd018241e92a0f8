pub mod redis_cache;

mod macros;

pub use redis_cache::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
