mod url_mapping;

pub use url_mapping::{ShortenRequest, ShortenResponse, UrlMapping};
