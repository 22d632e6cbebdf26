pub mod controller;
#[cfg(test)]
pub mod memory_store;
pub mod reconciler;
pub mod stores;
