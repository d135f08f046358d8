pub mod check_config;
pub mod init;
pub mod plugins;
pub mod roundtrip;

pub use check_config::{check_config, CheckConfigArgs};
pub use init::{init, InitArgs};
pub use plugins::{plugins, PluginsArgs};
pub use roundtrip::{roundtrip, RoundtripArgs};
