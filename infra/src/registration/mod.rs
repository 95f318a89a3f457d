//! Registration sink adapters

pub mod kv_sink;

pub use kv_sink::KeyValueRegistrationSink;
