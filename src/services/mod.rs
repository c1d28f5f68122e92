pub mod collection_runner;
