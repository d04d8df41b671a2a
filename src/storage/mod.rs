/// Address record store
pub mod address;
/// Key-value cache with per-entry TTL
pub mod cache;
