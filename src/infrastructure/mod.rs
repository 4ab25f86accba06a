pub mod providers;
pub mod transports;
