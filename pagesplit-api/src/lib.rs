//! # pagesplit-api
//!
//! REST API server for the pagesplit library
//!

mod api;
pub mod config;
mod error;
pub mod response;
pub mod state;

pub use api::{
    app, download_page, health_check, method_not_allowed, preflight, split_pdf, DownloadQuery,
    SplitQuery, PREFLAG_HEADER,
};
pub use config::{Config, ConfigError};
pub use error::{AppError, ErrorResponse};
pub use response::{
    download_url, ResponseMode, SplitFileInfo, SplitPdfResponse, UnknownResponseMode,
};
pub use state::{spawn_session_sweeper, AppState, SharedSplitter};
