//! Byte-exact `multipart/form-data` decoding.
//!
//! The decoder works on a fully buffered body and knows nothing about HTTP
//! beyond the boundary token. Part contents are never interpreted as text;
//! only the header block of each part is decoded (lossily) as UTF-8.

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// One decoded segment of a multipart payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content: Vec<u8>,
}

impl Part {
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

/// Extracts the `boundary` parameter from a `Content-Type` header value.
///
/// Accepts quoted and unquoted values, matches the parameter name
/// case-insensitively and drops a stray trailing `--`.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    split_params(content_type)
        .into_iter()
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| {
            let value = unquote(value.trim()).trim();
            value.strip_suffix("--").unwrap_or(value).to_string()
        })
        .filter(|b| !b.is_empty())
}

/// Splits `body` into its parts.
///
/// Each part runs from just after a delimiter line up to the next
/// `CRLF--boundary`; that CRLF belongs to the delimiter, not to the content.
/// Anything after the last delimiter (the closing `--boundary--` and any
/// epilogue) is discarded, as is a body that never reaches a second delimiter.
pub fn decode(body: &[u8], boundary: &str) -> Vec<Part> {
    let opening = format!("--{}", boundary).into_bytes();
    let delimiter = format!("\r\n--{}", boundary).into_bytes();
    let mut parts = Vec::new();

    let mut pos = if body.starts_with(&opening) && ends_delimiter(&body[opening.len()..]) {
        opening.len()
    } else {
        // Skip a preamble.
        match find_delimiter(body, &delimiter, 0) {
            Some(at) => at + delimiter.len(),
            None => return parts,
        }
    };

    loop {
        if body[pos..].starts_with(b"--") {
            break;
        }
        // Transport padding is allowed between the boundary and its CRLF.
        while matches!(body.get(pos), Some(b' ') | Some(b'\t')) {
            pos += 1;
        }
        if body[pos..].starts_with(CRLF) {
            pos += CRLF.len();
        }

        let Some(end) = find_delimiter(body, &delimiter, pos) else {
            break;
        };
        let chunk = &body[pos..end];
        pos = end + delimiter.len();

        if chunk.is_empty() {
            continue;
        }
        if let Some(part) = parse_part(chunk) {
            parts.push(part);
        }
    }

    parts
}

fn parse_part(chunk: &[u8]) -> Option<Part> {
    let (head, content) = match find(chunk, HEADER_END, 0) {
        Some(at) => (&chunk[..at], &chunk[at + HEADER_END.len()..]),
        // Headers only: the blank line's final CRLF was taken by the delimiter.
        None if chunk.ends_with(CRLF) => (&chunk[..chunk.len() - CRLF.len()], &chunk[chunk.len()..]),
        None => return None,
    };

    let head = String::from_utf8_lossy(head);
    let disposition = head.split("\r\n").find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case("content-disposition").then_some(value)
    })?;

    let name = disposition_param(disposition, "name").filter(|n| !n.is_empty())?;
    let filename = disposition_param(disposition, "filename").filter(|f| !f.is_empty());

    Some(Part { name, filename, content: content.to_vec() })
}

fn disposition_param(value: &str, key: &str) -> Option<String> {
    split_params(value).into_iter().skip(1).find_map(|param| {
        let (k, v) = param.split_once('=')?;
        k.trim().eq_ignore_ascii_case(key).then(|| unquote(v.trim()).to_string())
    })
}

/// Splits a header value on `;`, ignoring separators inside double quotes.
fn split_params(value: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                out.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&value[start..]);
    out
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Next `delimiter` at or after `from` that is not just the prefix of a
/// longer token.
fn find_delimiter(body: &[u8], delimiter: &[u8], mut from: usize) -> Option<usize> {
    while let Some(at) = find(body, delimiter, from) {
        if ends_delimiter(&body[at + delimiter.len()..]) {
            return Some(at);
        }
        from = at + 1;
    }
    None
}

/// A boundary token ends at CRLF, at the closing `--`, at transport padding
/// or at the end of the body.
fn ends_delimiter(rest: &[u8]) -> bool {
    rest.is_empty() || rest.starts_with(CRLF) || rest.starts_with(b"--") || matches!(rest[0], b' ' | b'\t')
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|at| at + from)
}
