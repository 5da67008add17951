use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Input bytes encoded per step. A multiple of 3 so no padding appears
/// between pieces and the joined text equals a one-shot encoding.
pub const ENCODE_CHUNK: usize = 3 * 64 * 1024;

/// Encodes `data` as a base64 `data:` URI, one bounded slice at a time.
pub fn encode_data_uri(data: &[u8], mime: &str) -> String {
    let prefix = format!("data:{};base64,", mime);
    let mut out = String::with_capacity(prefix.len() + data.len().div_ceil(3) * 4);
    out.push_str(&prefix);

    for piece in data.chunks(ENCODE_CHUNK) {
        STANDARD.encode_string(piece, &mut out);
    }
    out
}

/// Splits a base64 data URI into its media type and decoded bytes.
pub fn decode_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    let bytes = STANDARD.decode(payload).ok()?;
    Some((mime.to_string(), bytes))
}
