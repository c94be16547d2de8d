#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod auditor;
pub mod check;
mod error;
mod finding;
mod gateway;
#[cfg(feature = "http-client")]
mod http;
mod query;
mod report;
mod scope;
mod subsumption;
pub mod vocab;

pub use crate::auditor::{AuditMode, AuditOptions, Auditor};
pub use crate::error::{GatewayError, ReportError};
pub use crate::finding::{Expected, Finding, FindingCode, FixAction, Severity};
pub use crate::gateway::{ClosureDirection, QueryGateway, read_json_solutions, read_solutions};
#[cfg(feature = "http-client")]
pub use crate::http::HttpGateway;
pub use crate::query::{SelectQuery, SparqlIri};
pub use crate::report::{AuditReport, CheckReport};
pub use crate::scope::Scope;
pub use crate::subsumption::{SubsumptionEntry, SubsumptionResolver};
