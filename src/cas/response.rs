//! Typed model of the CAS `serviceValidate` XML response.
//!
//! Decoding is namespace-aware: only elements bound to the CAS namespace
//! count, whatever prefix the server chose. The body is checked for
//! well-formedness while it is decoded, so a `ServiceResponse` always comes
//! from a complete document.

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use thiserror::Error;

/// XML namespace of CAS protocol responses.
pub const CAS_NS: &str = "http://www.yale.edu/tp/cas";

const AUTHENTICATION_SUCCESS: &[u8] = b"authenticationSuccess";
const AUTHENTICATION_FAILURE: &[u8] = b"authenticationFailure";
const USER: &[u8] = b"user";

/// Decoded `cas:serviceResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceResponse {
    /// `cas:authenticationSuccess` was present. `user` is `None` when the
    /// element has no non-empty `cas:user` child.
    Success { user: Option<String> },
    /// `cas:authenticationFailure` was present (and no success element).
    Failure {
        code: Option<String>,
        description: Option<String>,
    },
    /// Well-formed XML without either CAS element.
    Unrecognized,
}

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response body is not valid utf-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("xml attribute error: {0}")]
    Attribute(#[from] AttrError),
    #[error("response body has no root element")]
    MissingRoot,
    #[error("unexpected content outside the root element")]
    ContentOutsideRoot,
    #[error("document ended inside an open element")]
    UnexpectedEof,
}

impl ServiceResponse {
    /// Decode a raw response body.
    pub fn parse(body: &[u8]) -> Result<Self, ResponseError> {
        let xml = std::str::from_utf8(body)?;

        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut collector = Collector::default();
        let mut depth = 0usize;
        let mut seen_root = false;

        loop {
            let (ns, event) = reader.read_resolved_event()?;
            let in_cas_ns = is_cas_namespace(&ns);

            match event {
                Event::Start(e) => {
                    enter_element(depth, &mut seen_root)?;
                    depth += 1;
                    if in_cas_ns {
                        collector.open(&e, depth, false)?;
                    }
                }
                Event::Empty(e) => {
                    enter_element(depth, &mut seen_root)?;
                    if in_cas_ns {
                        collector.open(&e, depth + 1, true)?;
                    }
                }
                Event::End(_) => {
                    collector.close(depth);
                    depth = depth
                        .checked_sub(1)
                        .ok_or(ResponseError::ContentOutsideRoot)?;
                }
                Event::Text(e) => {
                    let text = e.unescape()?;
                    if depth == 0 {
                        if !text.trim().is_empty() {
                            return Err(ResponseError::ContentOutsideRoot);
                        }
                    } else {
                        collector.text(&text);
                    }
                }
                Event::CData(e) => {
                    if depth == 0 {
                        return Err(ResponseError::ContentOutsideRoot);
                    }
                    collector.text(&String::from_utf8_lossy(&e));
                }
                Event::Eof => break,
                // declarations, comments, processing instructions, doctype
                _ => {}
            }
        }

        if depth != 0 {
            return Err(ResponseError::UnexpectedEof);
        }
        if !seen_root {
            return Err(ResponseError::MissingRoot);
        }

        Ok(collector.finish())
    }
}

fn is_cas_namespace(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == CAS_NS.as_bytes())
}

fn enter_element(depth: usize, seen_root: &mut bool) -> Result<(), ResponseError> {
    if depth == 0 {
        if *seen_root {
            return Err(ResponseError::ContentOutsideRoot);
        }
        *seen_root = true;
    }
    Ok(())
}

// Only the first success element, its first user element and the first
// failure element are looked at, in document order.
#[derive(Default)]
struct Collector {
    success_seen: bool,
    success_open: Option<usize>,

    user: Option<String>,
    user_seen: bool,
    user_open: Option<usize>,
    user_text: String,

    failure_seen: bool,
    failure_open: Option<usize>,
    failure_code: Option<String>,
    failure_text: String,
}

impl Collector {
    fn open(&mut self, e: &BytesStart<'_>, depth: usize, empty: bool) -> Result<(), ResponseError> {
        match e.local_name().as_ref() {
            AUTHENTICATION_SUCCESS if !self.success_seen => {
                self.success_seen = true;
                if !empty {
                    self.success_open = Some(depth);
                }
            }
            USER if self.success_open.is_some() && !self.user_seen => {
                self.user_seen = true;
                if !empty {
                    self.user_open = Some(depth);
                }
            }
            AUTHENTICATION_FAILURE if !self.failure_seen => {
                self.failure_seen = true;
                self.failure_code = match e.try_get_attribute("code")? {
                    Some(attr) => Some(attr.unescape_value()?.into_owned()),
                    None => None,
                };
                if !empty {
                    self.failure_open = Some(depth);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, depth: usize) {
        if self.user_open == Some(depth) {
            self.user_open = None;
            let user = self.user_text.trim();
            if !user.is_empty() {
                self.user = Some(user.to_string());
            }
        }
        if self.success_open == Some(depth) {
            self.success_open = None;
        }
        if self.failure_open == Some(depth) {
            self.failure_open = None;
        }
    }

    fn text(&mut self, text: &str) {
        if self.user_open.is_some() {
            self.user_text.push_str(text);
        }
        if self.failure_open.is_some() {
            self.failure_text.push_str(text);
        }
    }

    fn finish(self) -> ServiceResponse {
        if self.success_seen {
            return ServiceResponse::Success { user: self.user };
        }
        if self.failure_seen {
            let description = self.failure_text.trim();
            return ServiceResponse::Failure {
                code: self.failure_code,
                description: (!description.is_empty()).then(|| description.to_string()),
            };
        }
        ServiceResponse::Unrecognized
    }
}
