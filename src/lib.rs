// Library surface for headless/integration tests and reuse.
// The binary in main.rs only adds the CLI and terminal setup.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod cue;
pub mod error;
pub mod form;
pub mod logging;
pub mod projection;
pub mod runtime;
pub mod sequencer;
pub mod session;
pub mod ui;
