pub mod client;
pub mod error;

pub use client::RivalsRestClient;
pub use error::RivalsApiError;
