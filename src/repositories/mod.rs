mod memory;
mod url_mapping;

pub use memory::MemoryUrlRepository;
pub use url_mapping::{PgUrlRepository, UrlRepositoryTrait};

#[cfg(test)]
pub use url_mapping::MockUrlRepositoryTrait;
