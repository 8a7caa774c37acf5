//! Client for a field-mapping file conversion service.
//!
//! [`controller::Controller`] owns the interaction state (mode, selected file,
//! mapping rows) and talks to the service through [`remote::Backend`]. The
//! terminal UI and the headless CLI are thin [`surface::Surface`]s over it.

pub mod config;
pub mod controller;
pub mod delivery;
pub mod headless;
pub mod logging;
pub mod model;
pub mod remote;
pub mod surface;
pub mod tui;

mod tui_shell;
