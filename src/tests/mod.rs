mod commands;
mod mock;
mod transport;
