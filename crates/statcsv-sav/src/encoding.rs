//! Text encoding resolution.

use encoding_rs::{Encoding, WINDOWS_1252};

/// Pick the encoding for strings in the file.
///
/// The character encoding record (subtype 20) wins, then the code page from
/// the machine integer record (subtype 3), then windows-1252.
pub(crate) fn resolve_encoding(
    name: Option<&[u8]>,
    character_code: Option<i32>,
) -> &'static Encoding {
    name.map(trim_padding)
        .and_then(Encoding::for_label)
        .or_else(|| character_code.and_then(code_page))
        .unwrap_or(WINDOWS_1252)
}

fn code_page(code: i32) -> Option<&'static Encoding> {
    let label: &[u8] = match code {
        65001 => b"utf-8",
        874 => b"windows-874",
        932 => b"shift_jis",
        936 => b"gbk",
        949 => b"euc-kr",
        950 => b"big5",
        866 => b"ibm866",
        1250 => b"windows-1250",
        1251 => b"windows-1251",
        1252 | 20127 | 28591 => b"windows-1252",
        1253 => b"windows-1253",
        1254 => b"windows-1254",
        1255 => b"windows-1255",
        1256 => b"windows-1256",
        1257 => b"windows-1257",
        1258 => b"windows-1258",
        20866 => b"koi8-r",
        28592 => b"iso-8859-2",
        28605 => b"iso-8859-15",
        _ => return None,
    };
    Encoding::for_label(label)
}

/// Decode a fixed-width field, dropping trailing spaces and NULs.
pub(crate) fn decode_text(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    text.trim_end_matches([' ', '\0']).to_string()
}

fn trim_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !matches!(b, b' ' | b'\0'))
        .map_or(0, |pos| pos + 1);
    &bytes[..end]
}
