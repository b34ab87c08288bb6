//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Request bodies, as JSON, XML or form-encoded `job[field]=value` pairs

use std::str::FromStr;

use axum::http::header;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::db::models::JobFields;
use crate::db::models::JobOutput;
use crate::error::Error;
use crate::error::Result;
use crate::error::ValidationErrors;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BodyFormat {
    Json,
    Xml,
    Form,
}

impl BodyFormat {
    /// The format named by the `Content-Type` header, JSON if there is none
    pub fn from_headers(headers: &HeaderMap) -> std::result::Result<BodyFormat, Response> {
        let content_type = match headers.get(header::CONTENT_TYPE) {
            None => return Ok(BodyFormat::Json),
            Some(value) => value.to_str().unwrap_or_default(),
        };

        let media_type = content_type.split(';').next().unwrap_or_default().trim();
        match media_type.to_ascii_lowercase().as_str() {
            "application/json" => Ok(BodyFormat::Json),
            "application/xml" | "text/xml" => Ok(BodyFormat::Xml),
            "application/x-www-form-urlencoded" => Ok(BodyFormat::Form),
            _ => Err((
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("Unsupported content type: '{}'", content_type),
            )
                .into_response()),
        }
    }
}

/// Body of the status routes
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// Form-encoded pairs, looked up as `root[name]` or as plain `name`
pub struct FormFields {
    root: Option<String>,
    pairs: Vec<(String, String)>,
}

impl FormFields {
    fn parse(root: Option<&str>, content: &[u8]) -> Self {
        FormFields {
            root: root.map(String::from),
            pairs: url::form_urlencoded::parse(content).into_owned().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let nested = self.root.as_ref().map(|root| format!("{}[{}]", root, name));
        self.pairs
            .iter()
            .rev()
            .find(|(key, _)| Some(key) == nested.as_ref() || key == name)
            .map(|(_, value)| value.clone())
    }

    /// An empty value counts as not given
    pub fn parsed<T>(&self, name: &str, errors: &mut ValidationErrors) -> Option<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.get(name).filter(|v| !v.trim().is_empty())?;
        match value.trim().parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                errors.add(name, format!("is invalid: {}", e));
                None
            }
        }
    }
}

/// Resources which can be submitted as a form
pub trait FromForm: Sized {
    fn from_form(form: &FormFields) -> Result<Self>;
}

impl FromForm for JobFields {
    fn from_form(form: &FormFields) -> Result<Self> {
        let mut errors = ValidationErrors::default();
        let fields = JobFields {
            job_group_id: form.parsed("job_group_id", &mut errors),
            config_template_id: form.parsed("config_template_id", &mut errors),
            kind: form.parsed("type", &mut errors),
            status: form.parsed("status", &mut errors),
            nova_revision: form.get("nova_revision"),
            glance_revision: form.get("glance_revision"),
            msg: form.get("msg"),
        };
        errors.into_result().map(|_| fields)
    }
}

impl FromForm for JobOutput {
    fn from_form(form: &FormFields) -> Result<Self> {
        Ok(JobOutput {
            stdout: form.get("stdout"),
            stderr: form.get("stderr"),
            nova_revision: form.get("nova_revision"),
            glance_revision: form.get("glance_revision"),
            msg: form.get("msg"),
        })
    }
}

impl FromForm for StatusRequest {
    fn from_form(form: &FormFields) -> Result<Self> {
        form.get("status")
            .map(|status| StatusRequest { status })
            .ok_or_else(|| invalid("status", "can't be blank"))
    }
}

fn invalid(field: &str, message: impl Into<String>) -> Error {
    let mut errors = ValidationErrors::default();
    errors.add(field, message);
    Error::ValidationFailed(errors)
}

/// Parse a request body
///
/// With a `root`, the JSON form wraps the fields in an object of that name (`{"job": {..}}`)
/// and form keys may be written as `root[field]`. XML bodies carry the fields as child elements
/// of the document element, whatever it is called. Malformed bodies are reported as a
/// validation failure of `field`.
pub fn parse<T>(format: BodyFormat, field: &str, root: Option<&str>, content: &[u8]) -> Result<T>
where
    T: DeserializeOwned + FromForm,
{
    match format {
        BodyFormat::Json => {
            let value = serde_json::from_slice::<serde_json::Value>(content)
                .map_err(|e| invalid(field, format!("is invalid: {}", e)))?;
            let value = match root {
                Some(root) => value
                    .get(root)
                    .cloned()
                    .ok_or_else(|| invalid(field, format!("is missing the '{}' object", root)))?,
                None => value,
            };
            serde_json::from_value(value).map_err(|e| invalid(field, format!("is invalid: {}", e)))
        }

        BodyFormat::Xml => {
            let text = std::str::from_utf8(content).map_err(|e| invalid(field, format!("is invalid: {}", e)))?;
            quick_xml::de::from_str(text).map_err(|e| invalid(field, format!("is invalid: {}", e)))
        }

        BodyFormat::Form => T::from_form(&FormFields::parse(root, content)),
    }
}
