pub mod poll_refresher;
