pub mod cs;
pub mod dead_nonce_list;
pub mod fib;
pub mod network_region;
pub mod pit;
pub mod record;
pub mod strategy_choice;
