mod backend;

pub use backend::MemoryBackend;
