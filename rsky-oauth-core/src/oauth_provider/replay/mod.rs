pub mod replay_manager;
pub mod replay_store;
pub mod replay_store_memory;
