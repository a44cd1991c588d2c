pub mod config;
pub mod contact;
pub mod dom;
pub mod effects;
pub mod logging;
pub mod nav;
pub mod notify;
pub mod page;
pub mod reveal;
pub mod scroll;
pub mod site;
pub mod timers;

#[cfg(target_arch = "wasm32")]
pub mod browser;
#[cfg(not(target_arch = "wasm32"))]
pub mod memory;
#[cfg(not(target_arch = "wasm32"))]
pub mod report;
