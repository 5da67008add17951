pub mod encoding;
pub mod filename;

pub use encoding::{decode_data_uri, encode_data_uri};
pub use filename::{
    default_filename, fallback_filename, filename_from_content_disposition, resolve_filename,
    sanitize_filename,
};
