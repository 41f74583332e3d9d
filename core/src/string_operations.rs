/// Reads a fixed-width, NUL padded name field from a legacy record.
///
/// Stops at the first NUL byte. Names that are not valid UTF-8 come back as
/// `"*UNKNOWN*"` rather than failing the whole record.
pub fn c_string_to_str(c_string: &[u8]) -> &str {
    let end = c_string
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(c_string.len());
    std::str::from_utf8(&c_string[..end]).unwrap_or("*UNKNOWN*")
}
