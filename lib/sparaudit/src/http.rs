//! A [`QueryGateway`] talking to a SPARQL 1.1 Protocol endpoint.

use crate::error::GatewayError;
use crate::finding::FixAction;
use crate::gateway::{QueryGateway, read_solutions};
use crate::query::SparqlIri;
use oxhttp::model::header::{ACCEPT, CONTENT_TYPE};
use oxhttp::model::{Body, Method, Request};
use oxrdf::Term;
use sparesults::{QueryResultsFormat, QuerySolution};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const RESULTS_MEDIA_TYPES: &str = "application/sparql-results+json, application/sparql-results+xml;q=0.9, text/tab-separated-values;q=0.5";
const REDIRECTION_LIMIT: usize = 10;

/// Evaluates queries against a remote SPARQL endpoint over HTTP.
///
/// ```no_run
/// use sparaudit::{HttpGateway, QueryGateway};
/// use std::time::Duration;
///
/// let gateway = HttpGateway::new(
///     "http://localhost:7878/query",
///     Some("http://localhost:7878/update"),
///     Some(Duration::from_secs(30)),
/// )?;
/// let solutions = gateway.select("SELECT * WHERE { ?s ?p ?o } LIMIT 1")?;
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone)]
pub struct HttpGateway {
    client: Arc<oxhttp::Client>,
    query_endpoint: String,
    update_endpoint: Option<String>,
}

impl HttpGateway {
    /// Builds a gateway for the given query endpoint.
    ///
    /// Without an update endpoint, [`remove_triple`](QueryGateway::remove_triple) fails.
    /// The timeout applies to every single request.
    pub fn new(
        query_endpoint: impl Into<String>,
        update_endpoint: Option<impl Into<String>>,
        timeout: Option<Duration>,
    ) -> Result<Self, GatewayError> {
        let mut client = oxhttp::Client::new()
            .with_redirection_limit(REDIRECTION_LIMIT)
            .with_user_agent(concat!("sparaudit/", env!("CARGO_PKG_VERSION")))
            .map_err(|e| GatewayError::service(e.to_string()))?;
        if let Some(timeout) = timeout {
            client = client.with_global_timeout(timeout);
        }
        Ok(Self {
            client: Arc::new(client),
            query_endpoint: query_endpoint.into(),
            update_endpoint: update_endpoint.map(Into::into),
        })
    }

    pub fn query_endpoint(&self) -> &str {
        &self.query_endpoint
    }

    fn post(
        &self,
        url: &str,
        payload: String,
        content_type: &'static str,
        accept: &'static str,
    ) -> Result<(Option<String>, Body), GatewayError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(url)
            .header(ACCEPT, accept)
            .header(CONTENT_TYPE, content_type)
            .body(payload.into_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let response = self.client.request(request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::service(format!(
                "Error {} returned by {} with payload:\n{}",
                status,
                url,
                response.into_body().to_string()?
            )));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        Ok((content_type, response.into_body()))
    }
}

impl QueryGateway for HttpGateway {
    fn select(&self, query: &str) -> Result<Vec<QuerySolution>, GatewayError> {
        let (content_type, body) = self.post(
            &self.query_endpoint,
            query.to_owned(),
            "application/sparql-query; charset=utf-8",
            RESULTS_MEDIA_TYPES,
        )?;
        let format = match content_type {
            Some(content_type) => QueryResultsFormat::from_media_type(&content_type)
                .ok_or(GatewayError::UnsupportedMediaType(content_type))?,
            None => QueryResultsFormat::Json,
        };
        read_solutions(format, body)
    }

    fn remove_triple(&self, action: &FixAction) -> Result<(), GatewayError> {
        let Some(update_endpoint) = &self.update_endpoint else {
            return Err(GatewayError::UpdateUnsupported);
        };
        let update = delete_data(action)?;
        debug!(update = %update, "sending update");
        self.post(
            update_endpoint,
            update,
            "application/sparql-update; charset=utf-8",
            "*/*",
        )?;
        Ok(())
    }
}

fn delete_data(action: &FixAction) -> Result<String, GatewayError> {
    Ok(format!(
        "DELETE DATA {{ GRAPH {} {{ {} {} {} }} }}",
        SparqlIri(action.dataset.as_ref()),
        SparqlIri(action.subject.as_ref()),
        SparqlIri(action.predicate.as_ref()),
        ground_term(&action.object)?
    ))
}

/// Serializes a term allowed in `DELETE DATA`.
fn ground_term(term: &Term) -> Result<String, GatewayError> {
    match term {
        Term::NamedNode(node) => Ok(SparqlIri(node.as_ref()).to_string()),
        Term::Literal(literal) => Ok(literal.to_string()),
        _ => Err(GatewayError::service(format!(
            "{term} cannot be deleted with DELETE DATA"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{BlankNode, Literal, NamedNode};

    fn action(object: Term) -> FixAction {
        FixAction {
            dataset: NamedNode::new_unchecked("http://example.com/d"),
            subject: NamedNode::new_unchecked("http://example.com/s"),
            predicate: NamedNode::new_unchecked("http://example.com/p"),
            object,
        }
    }

    #[test]
    fn test_delete_data() {
        let update =
            delete_data(&action(NamedNode::new_unchecked("http://example.com/o").into())).unwrap();
        assert_eq!(
            update,
            "DELETE DATA { GRAPH <http://example.com/d> { <http://example.com/s> <http://example.com/p> <http://example.com/o> } }"
        );
        let update = delete_data(&action(Literal::new_simple_literal("a \"b\"").into())).unwrap();
        assert!(update.ends_with("<http://example.com/p> \"a \\\"b\\\"\" } }"));
    }

    #[test]
    fn test_blank_node_object_is_rejected() {
        assert!(delete_data(&action(BlankNode::default().into())).is_err());
    }

    #[test]
    fn test_update_without_endpoint() {
        let gateway =
            HttpGateway::new("http://localhost:1/query", None::<String>, None).unwrap();
        assert_eq!(gateway.query_endpoint(), "http://localhost:1/query");
        let error = gateway
            .remove_triple(&action(NamedNode::new_unchecked("http://example.com/o").into()))
            .unwrap_err();
        assert!(matches!(error, GatewayError::UpdateUnsupported));
    }
}
