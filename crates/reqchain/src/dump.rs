//! HTTP/1.x wire-format dumps for diagnostics

use std::fmt::Write;

use reqwest::header::{HeaderMap, HOST};
use reqwest::{StatusCode, Version};

use crate::request::SentRequest;

pub(crate) fn dump_request(request: &SentRequest, include_body: bool) -> String {
    let url = &request.url;
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut out = String::new();
    let _ = write!(out, "{} {} HTTP/1.1\r\n", request.method, target);
    if !request.headers.contains_key(HOST) {
        if let Some(host) = url.host_str() {
            match url.port() {
                Some(port) => {
                    let _ = write!(out, "Host: {host}:{port}\r\n");
                }
                None => {
                    let _ = write!(out, "Host: {host}\r\n");
                }
            }
        }
    }
    write_headers(&mut out, &request.headers);
    out.push_str("\r\n");

    if include_body {
        if let Some(body) = &request.body {
            out.push_str(&String::from_utf8_lossy(body));
        }
    }
    out
}

pub(crate) fn dump_response(
    version: Version,
    status: StatusCode,
    headers: &HeaderMap,
    body: Option<&[u8]>,
) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "{} {} {}\r\n",
        version_str(version),
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );
    write_headers(&mut out, headers);
    out.push_str("\r\n");

    if let Some(body) = body {
        out.push_str(&String::from_utf8_lossy(body));
    }
    out
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let _ = write!(
            out,
            "{}: {}\r\n",
            canonical_name(name.as_str()),
            String::from_utf8_lossy(value.as_bytes())
        );
    }
}

/// `content-type` -> `Content-Type`
fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
