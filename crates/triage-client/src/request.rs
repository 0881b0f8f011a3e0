//! Replayable request descriptions
//!
//! A `reqwest::RequestBuilder` is consumed by `send()`, and multipart bodies
//! cannot be cloned once built. Requests are therefore described as plain
//! data and rebuilt for each attempt, so a request that hit a 401 can be
//! replayed after the token refresh with an identical body.

use std::fmt;

use reqwest::Method;
use serde::Serialize;
use triage_auth::endpoint_url;
use uuid::Uuid;

use crate::error::{Error, Result};

/// One field of a multipart form.
#[derive(Clone)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FormPart::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> Self {
        FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime: mime.map(str::to_owned),
            bytes,
        }
    }

    fn to_part(&self) -> Result<(String, reqwest::multipart::Part)> {
        match self {
            FormPart::Text { name, value } => Ok((
                name.clone(),
                reqwest::multipart::Part::text(value.clone()),
            )),
            FormPart::File {
                name,
                file_name,
                mime,
                bytes,
            } => {
                let mut part =
                    reqwest::multipart::Part::bytes(bytes.clone()).file_name(file_name.clone());
                if let Some(mime) = mime {
                    part = part.mime_str(mime).map_err(|e| {
                        Error::InvalidRequest(format!("invalid mime type {mime}: {e}"))
                    })?;
                }
                Ok((name.clone(), part))
            }
        }
    }
}

impl fmt::Debug for FormPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormPart::Text { name, value } => f
                .debug_struct("Text")
                .field("name", name)
                .field("value", value)
                .finish(),
            FormPart::File {
                name,
                file_name,
                mime,
                bytes,
            } => f
                .debug_struct("File")
                .field("name", name)
                .field("file_name", file_name)
                .field("mime", mime)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormPart>),
}

/// Method, path, query and body of one logical API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: RequestBody,
    request_id: String,
    retried: bool,
}

impl ApiRequest {
    /// `path` is relative to the configured base URL, e.g. `/patients`.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            request_id: format!("req_{}", Uuid::new_v4().simple()),
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Serialize `body` as the JSON payload.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| Error::InvalidRequest(format!("serializing request body: {e}")))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Correlation id sent as `x-request-id`; shared by the original attempt and its replay.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Whether this request is already the post-refresh replay.
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn into_retry(mut self) -> Self {
        self.retried = true;
        self
    }

    /// Build a fresh `RequestBuilder` for one attempt.
    pub(crate) fn build(
        &self,
        client: &reqwest::Client,
        base_url: &str,
    ) -> Result<reqwest::RequestBuilder> {
        let mut builder = client
            .request(self.method.clone(), endpoint_url(base_url, &self.path))
            .header("x-request-id", &self.request_id);

        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }

        builder = match &self.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => {
                let mut form = reqwest::multipart::Form::new();
                for part in parts {
                    let (name, part) = part.to_part()?;
                    form = form.part(name, part);
                }
                builder.multipart(form)
            }
        };

        Ok(builder)
    }
}

/// Validate an id before interpolating it into a path.
pub(crate) fn path_segment(id: &str) -> Result<&str> {
    if id.is_empty() || id.contains(['/', '?', '#']) {
        return Err(Error::InvalidRequest(format!("invalid resource id: {id:?}")));
    }
    Ok(id)
}
