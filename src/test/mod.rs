mod nats_bus;
mod stats;
mod support;
