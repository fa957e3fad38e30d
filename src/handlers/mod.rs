mod url_mapping;

pub use url_mapping::{json_error_handler, redirect_handler, shorten_handler};
