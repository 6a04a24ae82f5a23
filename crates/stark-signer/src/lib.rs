pub mod payload_builder;
