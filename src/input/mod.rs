pub mod ticker_list;
