pub mod commands;
pub mod compose;
pub mod config;
pub mod deploy;
pub mod fleet;
pub mod verify;

/// ASCII art logo for dockhand CLI
pub const LOGO: &str = "\
   ╷
   │  ┌┬┐┌─┐┌─┐┬┌─┬ ┬┌─┐┌┐┌┌┬┐
   │   ││││ ││  ├┴┐├─┤├─┤│││ ││
   ┴─┘─┴┘└─┘└─┘┴ ┴┴ ┴┴ ┴┘└┘─┴┘";
