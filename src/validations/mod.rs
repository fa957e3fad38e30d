mod url_mapping;

pub use url_mapping::validate_long_url;
