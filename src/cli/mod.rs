pub mod app;
pub mod browse;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod events;
pub mod info;
pub mod output;
pub mod runtime;
pub mod send;
pub mod serve;
pub mod waits;
