//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Wire representations of jobs, job lists and errors
//!
//! Every resource has a JSON form, an XML form with the same fields and a plain text "native"
//! form meant for humans.

use std::str::FromStr;

use ascii_table::Align;
use ascii_table::AsciiTable;
use serde::Serialize;

use chrono::NaiveDateTime;

use crate::db::models::ConfigTemplateRef;
use crate::db::models::Job;
use crate::db::models::JobListing;
use crate::db::models::SmokeTestRef;
use crate::variant::JobKind;
use crate::error::Error;
use crate::error::Result;
use crate::error::ValidationErrors;
use crate::status::Status;
use crate::status::TrackedKind;

#[derive(parse_display::Display, Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
    #[default]
    #[display("native")]
    Native,

    #[display("json")]
    Json,

    #[display("xml")]
    Xml,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown format: '{0}'")]
pub struct UnknownFormat(String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "table" | "text" | "txt" => Ok(Format::Native),
            "json" => Ok(Format::Json),
            "xml" => Ok(Format::Xml),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl Format {
    /// Split a path segment like `12.json` into the bare segment and the format it names
    pub fn split_extension(segment: &str) -> std::result::Result<(&str, Option<Format>), UnknownFormat> {
        match segment.rsplit_once('.') {
            Some((stem, ext)) => ext.parse().map(|f| (stem, Some(f))),
            None => Ok((segment, None)),
        }
    }

    /// The first JSON or XML media type in an `Accept` header, if any
    pub fn from_accept(accept: &str) -> Option<Format> {
        accept
            .split(',')
            .map(|part| part.split(';').next().unwrap_or("").trim())
            .find_map(|media_type| match media_type {
                "application/json" => Some(Format::Json),
                "application/xml" | "text/xml" => Some(Format::Xml),
                "text/plain" | "text/html" => Some(Format::Native),
                _ => None,
            })
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Format::Native => "text/plain; charset=utf-8",
            Format::Json => "application/json",
            Format::Xml => "application/xml",
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Other(e.into()))
}

/// Drop the C0 control characters XML 1.0 does not allow, even as character references
///
/// Captured job output regularly carries terminal escape sequences.
fn xml_safe(markup: String) -> String {
    if !markup.chars().any(is_forbidden_in_xml) {
        return markup;
    }
    markup.chars().filter(|c| !is_forbidden_in_xml(*c)).collect()
}

fn is_forbidden_in_xml(c: char) -> bool {
    c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r' | '\u{7f}')
}

fn xml_error<E: std::fmt::Display>(e: E) -> Error {
    Error::Other(anyhow::anyhow!("XML serialization failed: {}", e))
}

fn to_xml<T: Serialize>(value: &T) -> Result<String> {
    quick_xml::se::to_string(value).map(xml_safe).map_err(xml_error)
}

fn to_xml_with_root<T: Serialize>(root: &str, value: &T) -> Result<String> {
    quick_xml::se::to_string_with_root(root, value)
        .map(xml_safe)
        .map_err(xml_error)
}

/// A nullable column in the XML forms: `<msg>text</msg>`, or `<msg nil="true"/>` if unset
#[derive(Serialize)]
struct Nullable<'a> {
    #[serde(rename = "@nil", skip_serializing_if = "Option::is_none")]
    nil: Option<&'static str>,

    #[serde(rename = "$text", skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

impl<'a> From<&'a Option<String>> for Nullable<'a> {
    fn from(value: &'a Option<String>) -> Self {
        match value.as_deref() {
            Some(text) => Nullable { nil: None, text: Some(text) },
            None => Nullable { nil: Some("true"), text: None },
        }
    }
}

#[derive(Serialize)]
struct JobXml<'a> {
    id: i32,
    status: Status,
    stdout: Nullable<'a>,
    stderr: Nullable<'a>,
    nova_revision: Nullable<'a>,
    glance_revision: Nullable<'a>,
    msg: Nullable<'a>,
    job_group_id: i32,
    config_template_id: i32,
    #[serde(rename = "type")]
    kind: JobKind,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl<'a> From<&'a Job> for JobXml<'a> {
    fn from(job: &'a Job) -> Self {
        JobXml {
            id: job.id,
            status: job.status,
            stdout: (&job.stdout).into(),
            stderr: (&job.stderr).into(),
            nova_revision: (&job.nova_revision).into(),
            glance_revision: (&job.glance_revision).into(),
            msg: (&job.msg).into(),
            job_group_id: job.job_group_id,
            config_template_id: job.config_template_id,
            kind: job.kind,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[derive(Serialize)]
struct JobListingXml<'a> {
    id: i32,
    status: Status,
    job_group_id: i32,
    nova_revision: Nullable<'a>,
    glance_revision: Nullable<'a>,
    msg: Nullable<'a>,
    config_template_id: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_template: Option<&'a ConfigTemplateRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    smoke_test: Option<&'a SmokeTestRef>,
}

impl<'a> From<&'a JobListing> for JobListingXml<'a> {
    fn from(l: &'a JobListing) -> Self {
        JobListingXml {
            id: l.id,
            status: l.status,
            job_group_id: l.job_group_id,
            nova_revision: (&l.nova_revision).into(),
            glance_revision: (&l.glance_revision).into(),
            msg: (&l.msg).into(),
            config_template_id: l.config_template_id,
            created_at: l.created_at,
            updated_at: l.updated_at,
            config_template: l.config_template.as_ref(),
            smoke_test: l.smoke_test.as_ref(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename = "jobs")]
struct JobsXml<'a> {
    #[serde(rename = "job")]
    jobs: Vec<JobListingXml<'a>>,
}

#[derive(Serialize)]
#[serde(rename = "errors")]
struct ValidationErrorsXml {
    #[serde(rename = "error")]
    errors: Vec<String>,
}

#[derive(Serialize)]
struct ErrorJson<'a> {
    error: &'a str,
    kind: &'static str,
}

#[derive(Serialize)]
#[serde(rename = "error")]
struct ErrorXml<'a> {
    kind: &'static str,
    message: &'a str,
}

/// The outcome of a status transition
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename = "status_change")]
pub struct StatusChange {
    pub kind: &'static str,
    pub id: i32,
    pub status: Status,
}

impl StatusChange {
    pub fn new(kind: TrackedKind, id: i32, status: Status) -> Self {
        StatusChange {
            kind: kind.as_str(),
            id,
            status,
        }
    }
}

pub fn render_job_list(format: Format, listings: &[JobListing], table_only: bool) -> Result<String> {
    match format {
        Format::Json => to_json(listings),
        Format::Xml => to_xml(&JobsXml {
            jobs: listings.iter().map(JobListingXml::from).collect(),
        }),
        Format::Native => {
            let table = job_table(listings);
            if table_only {
                Ok(table)
            } else {
                Ok(format!("Listing jobs\n\n{}", table))
            }
        }
    }
}

pub fn render_job(format: Format, job: &Job) -> Result<String> {
    match format {
        Format::Json => to_json(job),
        Format::Xml => to_xml_with_root("job", &JobXml::from(job)),
        Format::Native => Ok(job_detail(job)),
    }
}

pub fn render_validation_errors(format: Format, errors: &ValidationErrors) -> Result<String> {
    match format {
        Format::Json => to_json(errors),
        Format::Xml => to_xml(&ValidationErrorsXml {
            errors: errors.full_messages(),
        }),
        Format::Native => Ok(errors
            .full_messages()
            .into_iter()
            .map(|m| format!("{}\n", m))
            .collect()),
    }
}

/// Render any error, validation errors get their per-field form
pub fn render_error(format: Format, error: &Error) -> Result<String> {
    if let Error::ValidationFailed(errors) = error {
        return render_validation_errors(format, errors);
    }

    let message = error.to_string();
    match format {
        Format::Json => to_json(&ErrorJson {
            error: &message,
            kind: error.kind(),
        }),
        Format::Xml => to_xml(&ErrorXml {
            kind: error.kind(),
            message: &message,
        }),
        Format::Native => Ok(format!("{}\n", message)),
    }
}

pub fn render_status_change(format: Format, change: &StatusChange) -> Result<String> {
    match format {
        Format::Json => to_json(change),
        Format::Xml => to_xml(change),
        Format::Native => Ok(format!("{} {} is now {}\n", change.kind, change.id, change.status)),
    }
}

/// JSON or XML form of any other record listing, `None` for the native form
///
/// The XML form wraps one `<item>` element per record in a `<root>` element.
pub fn render_records<T: Serialize>(format: Format, root: &str, item: &str, records: &[T]) -> Result<Option<String>> {
    match format {
        Format::Json => to_json(records).map(Some),
        Format::Xml => to_xml_with_root(item, &records)
            .map(|inner| Some(format!("<{root}>{inner}</{root}>", root = root, inner = inner))),
        Format::Native => Ok(None),
    }
}

/// Both wire forms of a job, taken before it was deleted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub job: Job,
    pub json: String,
    pub xml: String,
}

impl Snapshot {
    pub fn capture(job: Job) -> Result<Snapshot> {
        let json = render_job(Format::Json, &job)?;
        let xml = render_job(Format::Xml, &job)?;
        Ok(Snapshot { job, json, xml })
    }

    /// The captured form, or the native rendering of the captured job
    pub fn render(&self, format: Format) -> String {
        match format {
            Format::Json => self.json.clone(),
            Format::Xml => self.xml.clone(),
            Format::Native => job_detail(&self.job),
        }
    }
}

pub const JOB_LIST_HEADER: [&str; 9] = [
    "Id",
    "Status",
    "Job Group",
    "Config Template",
    "Smoke Test",
    "Nova Revision",
    "Glance Revision",
    "Message",
    "Updated",
];

/// One row per listing, in the column order of [`JOB_LIST_HEADER`]
pub fn job_rows(listings: &[JobListing]) -> Vec<Vec<String>> {
    listings
        .iter()
        .map(|l| {
            let template = l
                .config_template
                .as_ref()
                .map(|t| format!("{} ({})", t.name, t.id))
                .unwrap_or_else(|| l.config_template_id.to_string());
            let smoke_test = l
                .smoke_test
                .as_ref()
                .map(|s| s.id.to_string())
                .unwrap_or_default();

            vec![
                l.id.to_string(),
                l.status.to_string(),
                l.job_group_id.to_string(),
                template,
                smoke_test,
                l.nova_revision.clone().unwrap_or_default(),
                l.glance_revision.clone().unwrap_or_default(),
                l.msg.clone().unwrap_or_default(),
                l.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ]
        })
        .collect()
}

/// Width of tables which are not printed to a terminal
const UNBOUNDED_TABLE_WIDTH: usize = 1024;

fn job_table(listings: &[JobListing]) -> String {
    let mut table = AsciiTable::default();
    table.set_max_width(UNBOUNDED_TABLE_WIDTH);
    for (i, name) in JOB_LIST_HEADER.iter().enumerate() {
        table.column(i).set_header(*name).set_align(Align::Left);
    }
    table.format(job_rows(listings))
}

fn job_detail(job: &Job) -> String {
    indoc::formatdoc!(
        "
        Job {id} ({kind})
        Status:          {status}
        Runs on:         {target}
        Packages:        {packages}
        Job group:       {group}
        Config template: {template}
        Nova revision:   {nova}
        Glance revision: {glance}
        Message:         {msg}
        Created:         {created}
        Updated:         {updated}

        --- stdout ---
        {stdout}
        --- stderr ---
        {stderr}
        ",
        id = job.id,
        kind = job.kind,
        status = job.status,
        target = job.kind.execution_target(),
        packages = job
            .kind
            .required_packages()
            .iter()
            .map(|p| p.project())
            .collect::<Vec<_>>()
            .join(", "),
        group = job.job_group_id,
        template = job.config_template_id,
        nova = job.nova_revision.as_deref().unwrap_or("-"),
        glance = job.glance_revision.as_deref().unwrap_or("-"),
        msg = job.msg.as_deref().unwrap_or("-"),
        created = job.created_at,
        updated = job.updated_at,
        stdout = job.stdout.as_deref().unwrap_or(""),
        stderr = job.stderr.as_deref().unwrap_or(""),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::tests::job;
    use crate::db::models::ConfigTemplateRef;
    use crate::db::models::JobSummary;
    use crate::db::models::SmokeTestRef;
    use crate::error::EntityKind;

    fn listing(id: i32) -> JobListing {
        let j = job(id, 1, 2);
        let summary = JobSummary {
            id: j.id,
            status: j.status,
            job_group_id: j.job_group_id,
            nova_revision: Some(String::from("abc")),
            glance_revision: None,
            msg: None,
            config_template_id: j.config_template_id,
            created_at: j.created_at,
            updated_at: j.updated_at,
        };
        JobListing::new(
            summary,
            ConfigTemplateRef { id: 2, name: String::from("vpc") },
            SmokeTestRef { id: 4, description: None, status: Status::Running },
        )
    }

    #[test]
    fn test_render_records() {
        let jobs = vec![job(1, 1, 1), job(2, 1, 1)];
        let xml = render_records(Format::Xml, "jobs", "job", &jobs).unwrap().unwrap();
        assert!(xml.starts_with("<jobs><job>"));
        assert!(xml.ends_with("</job></jobs>"));
        assert_eq!(xml.matches("<job>").count(), 2);

        let json = render_records(Format::Json, "jobs", "job", &jobs).unwrap().unwrap();
        let parsed: Vec<Job> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, jobs);

        assert!(render_records(Format::Native, "jobs", "job", &jobs).unwrap().is_none());
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<Format>(), Ok(Format::Json));
        assert_eq!("xml".parse::<Format>(), Ok(Format::Xml));
        assert_eq!("table".parse::<Format>(), Ok(Format::Native));
        assert!("yaml".parse::<Format>().is_err());
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(Format::split_extension("12.json"), Ok(("12", Some(Format::Json))));
        assert_eq!(Format::split_extension("jobs.xml"), Ok(("jobs", Some(Format::Xml))));
        assert_eq!(Format::split_extension("12"), Ok(("12", None)));
        assert!(Format::split_extension("12.yaml").is_err());
    }

    #[test]
    fn test_accept_header() {
        assert_eq!(Format::from_accept("application/json"), Some(Format::Json));
        assert_eq!(Format::from_accept("text/xml;q=0.9, */*"), Some(Format::Xml));
        assert_eq!(Format::from_accept("*/*"), None);
    }

    #[test]
    fn test_json_list_keeps_order_and_related() {
        let out = render_job_list(Format::Json, &[listing(3), listing(2)], false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let list = value.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["id"], 3);
        assert_eq!(list[1]["id"], 2);
        assert_eq!(list[0]["status"], "Pending");
        assert_eq!(list[0]["config_template"]["name"], "vpc");
        assert_eq!(list[0]["smoke_test"]["id"], 4);
        assert!(list[0].get("stdout").is_none());
    }

    #[test]
    fn test_json_list_without_related() {
        let out = render_job_list(Format::Json, &[listing(3).without_related()], false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(value[0].get("config_template").is_none());
        assert!(value[0].get("smoke_test").is_none());
        assert_eq!(value[0]["config_template_id"], 2);
    }

    #[test]
    fn test_xml_list() {
        let out = render_job_list(Format::Xml, &[listing(3), listing(2)], false).unwrap();
        assert!(out.starts_with("<jobs>"), "{}", out);
        assert!(out.ends_with("</jobs>"), "{}", out);
        assert_eq!(out.matches("<job>").count(), 2);
        assert!(out.contains("<id>3</id>"));
        assert!(out.contains("<nova_revision>abc</nova_revision>"));
        assert!(out.find("<id>3</id>") < out.find("<id>2</id>"));
    }

    #[test]
    fn test_native_list() {
        let with_title = render_job_list(Format::Native, &[listing(1)], false).unwrap();
        let table_only = render_job_list(Format::Native, &[listing(1)], true).unwrap();
        assert!(with_title.starts_with("Listing jobs"));
        assert!(!table_only.contains("Listing jobs"));
        assert!(table_only.contains("Config Template"));
        assert!(table_only.contains("vpc (2)"));
    }

    #[test]
    fn test_snapshot_forms_describe_the_same_job() {
        let mut j = job(7, 1, 2);
        j.stdout = Some(String::from("all green"));
        let snapshot = Snapshot::capture(j.clone()).unwrap();

        let back: Job = serde_json::from_str(&snapshot.json).unwrap();
        assert_eq!(back, j);

        assert!(snapshot.xml.starts_with("<job>"));
        assert!(snapshot.xml.contains("<id>7</id>"));
        assert!(snapshot.xml.contains("<stdout>all green</stdout>"));
        assert!(snapshot.xml.contains("<type>JobVPC</type>"));
        assert_eq!(snapshot.render(Format::Json), snapshot.json);
        assert!(snapshot.render(Format::Native).contains("all green"));
    }

    #[test]
    fn test_unset_fields_are_rendered_as_null() {
        let j = job(7, 1, 2);

        let json: serde_json::Value = serde_json::from_str(&render_job(Format::Json, &j).unwrap()).unwrap();
        for field in ["stdout", "stderr", "nova_revision", "glance_revision", "msg"] {
            assert_eq!(json.get(field), Some(&serde_json::Value::Null), "{} missing", field);
        }

        let xml = render_job(Format::Xml, &j).unwrap();
        assert!(xml.contains(r#"<stdout nil="true"/>"#), "{}", xml);
        assert!(xml.contains(r#"<msg nil="true"/>"#), "{}", xml);

        let xml = render_job_list(Format::Xml, &[listing(3)], false).unwrap();
        assert!(xml.contains(r#"<glance_revision nil="true"/>"#), "{}", xml);
        assert!(xml.contains("<nova_revision>abc</nova_revision>"), "{}", xml);
    }

    #[test]
    fn test_xml_drops_control_characters() {
        let mut j = job(7, 1, 2);
        j.stdout = Some(String::from("\u{1b}[32mok\u{1b}[0m\tdone\n"));
        j.msg = Some(String::from("bell\u{7}"));

        let xml = render_job(Format::Xml, &j).unwrap();
        assert!(!xml.contains('\u{1b}'));
        assert!(!xml.contains('\u{7}'));
        assert!(xml.contains("<stdout>[32mok[0m\tdone\n</stdout>"), "{}", xml);
        assert!(xml.contains("<msg>bell</msg>"), "{}", xml);

        // the JSON form escapes them instead
        let json = render_job(Format::Json, &j).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stdout, j.stdout);
    }

    #[test]
    fn test_validation_errors() {
        let mut errors = ValidationErrors::default();
        errors.add("job_group_id", "must reference an existing job group");

        let json = render_validation_errors(Format::Json, &errors).unwrap();
        assert_eq!(json, r#"{"job_group_id":["must reference an existing job group"]}"#);

        let xml = render_validation_errors(Format::Xml, &errors).unwrap();
        assert_eq!(
            xml,
            "<errors><error>job_group_id must reference an existing job group</error></errors>"
        );
    }

    #[test]
    fn test_other_errors() {
        let e = Error::not_found(EntityKind::Job, 9);

        let json: serde_json::Value = serde_json::from_str(&render_error(Format::Json, &e).unwrap()).unwrap();
        assert_eq!(json["kind"], "not_found");
        assert_eq!(json["error"], "No job with id 9");

        let xml = render_error(Format::Xml, &e).unwrap();
        assert_eq!(xml, "<error><kind>not_found</kind><message>No job with id 9</message></error>");
    }

    #[test]
    fn test_status_change() {
        let change = StatusChange::new(TrackedKind::JobGroup, 3, Status::Running);
        assert_eq!(
            render_status_change(Format::Json, &change).unwrap(),
            r#"{"kind":"job_group","id":3,"status":"Running"}"#
        );
        assert_eq!(render_status_change(Format::Native, &change).unwrap(), "job_group 3 is now Running\n");
    }
}
