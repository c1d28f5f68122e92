pub mod daily_store;
