mod frontend;
mod loader;
mod parser;

pub use frontend::YamlFrontend;
pub use loader::{ConfigLoader, ConfigSource, LoaderConfig};
