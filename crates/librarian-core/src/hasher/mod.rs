pub mod sha256;

pub use sha256::{content_digest, hash_file};
