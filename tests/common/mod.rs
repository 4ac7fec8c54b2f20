#![allow(dead_code)]

pub mod fake_server;
pub mod mock_queue;
pub mod strategies;

pub use fake_server::*;
pub use mock_queue::*;
pub use strategies::*;
