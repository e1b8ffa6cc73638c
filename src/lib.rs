pub mod ai;
pub mod api;
pub mod files;
pub mod ongoing;
pub mod reconcile;
pub mod session;
pub mod storage;
pub mod theme;
pub mod types;
#[cfg(any(feature = "desktop", feature = "web", feature = "mobile"))]
pub mod ui;
#[cfg(any(feature = "desktop", feature = "web", feature = "mobile"))]
pub mod views;
