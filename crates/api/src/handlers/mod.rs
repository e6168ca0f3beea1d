pub mod contracts;
pub mod dispatch;
pub mod weather;
