//! A minimal, incremental HTTP/1.0 request reader. No framework: the
//! connection server drives this directly off a raw `TcpStream`.

use std::collections::HashMap;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::RequestError;

const HEADER_READ_CHUNK: usize = 8 * 1024;
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone)]
pub struct WebRequest {
    pub method: String,
    pub path: Vec<String>,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl WebRequest {
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

/// Reads bytes from `reader` until a full HTTP/1.0 request (request line,
/// headers, and any Content-Length body) has been accumulated, then parses
/// it into a [`WebRequest`].
pub async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> Result<WebRequest, RequestError> {
    let mut buf = Vec::new();
    let header_end = loop {
        if let Some(pos) = find_subslice(&buf, HEADER_TERMINATOR) {
            break pos;
        }
        let mut chunk = [0u8; HEADER_READ_CHUNK];
        let n = reader
            .read(&mut chunk)
            .await
            .map_err(|_| RequestError::MalformedRequestLine)?;
        if n == 0 {
            return Err(RequestError::MalformedRequestLine);
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = &buf[..header_end];
    let mut lines = head.split(|&b| b == b'\n').map(strip_cr);

    let request_line = lines.next().ok_or(RequestError::MalformedRequestLine)?;
    let (method, uri) = parse_request_line(request_line)?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = parse_header_line(line)?;
        headers.insert(name, value);
    }

    let (path, query) = parse_uri(&uri)?;

    let mut body = buf[header_end + HEADER_TERMINATOR.len()..].to_vec();
    if let Some(len) = headers.get("Content-Length").and_then(|v| v.parse::<usize>().ok()) {
        while body.len() < len {
            let mut chunk = [0u8; HEADER_READ_CHUNK];
            let n = reader
                .read(&mut chunk)
                .await
                .map_err(|_| RequestError::MalformedRequestLine)?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        body.truncate(len);
    } else {
        body.clear();
    }

    Ok(WebRequest {
        method,
        path,
        query,
        headers,
        body,
    })
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn parse_request_line(line: &[u8]) -> Result<(String, String), RequestError> {
    let line = std::str::from_utf8(line).map_err(|_| RequestError::MalformedRequestLine)?;
    let mut parts = line.split(' ');
    let method = parts.next().ok_or(RequestError::MalformedRequestLine)?;
    let uri = parts.next().ok_or(RequestError::MalformedRequestLine)?;
    let _version = parts.next().ok_or(RequestError::MalformedRequestLine)?;
    if method.is_empty() || uri.is_empty() {
        return Err(RequestError::MalformedRequestLine);
    }
    Ok((method.to_string(), uri.to_string()))
}

fn parse_header_line(line: &[u8]) -> Result<(String, String), RequestError> {
    let line = std::str::from_utf8(line).map_err(|_| RequestError::MalformedHeader)?;
    let (name, value) = line.split_once(':').ok_or(RequestError::MalformedHeader)?;
    Ok((name.to_string(), value.trim_start().to_string()))
}

fn parse_uri(uri: &str) -> Result<(Vec<String>, HashMap<String, String>), RequestError> {
    let (path_part, query_part) = match uri.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (uri, None),
    };

    let path = path_part
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode(s))
        .collect::<Result<Vec<_>, _>>()?;

    let mut query = HashMap::new();
    if let Some(q) = query_part {
        for pair in q.split('&').filter(|p| !p.is_empty()) {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            query.insert(percent_decode(k)?, percent_decode(v)?);
        }
    }

    Ok((path, query))
}

/// Decodes `%HH` triplets and `+` (as space), per HTTP URL-encoding.
pub fn percent_decode(s: &str) -> Result<String, RequestError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let hex = bytes.get(i + 1..i + 3).ok_or(RequestError::BadEncoding)?;
                let hex = std::str::from_utf8(hex).map_err(|_| RequestError::BadEncoding)?;
                let byte = u8::from_str_radix(hex, 16).map_err(|_| RequestError::BadEncoding)?;
                out.push(byte);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| RequestError::BadEncoding)
}
