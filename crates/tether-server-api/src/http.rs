use std::sync::Arc;

use base64::Engine as _;
use serde::Deserialize;
use tether_scheduler::CancellationToken;
use url::Url;

use crate::{ApiError, Credentials, EndpointParams, ServerApi, ServerApiProvider, ServerProject};

const PAGE_SIZE: usize = 500;

/// Blocking HTTP implementation of [`ServerApi`] over the components API.
pub struct HttpServerApi {
    agent: ureq::Agent,
    endpoint: EndpointParams,
    credentials: Credentials,
}

impl HttpServerApi {
    pub fn new(agent: ureq::Agent, endpoint: EndpointParams, credentials: Credentials) -> Self {
        Self {
            agent,
            endpoint,
            credentials,
        }
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{path}", self.endpoint.base_url())).map_err(|err| {
            ApiError::Payload {
                path: path.to_string(),
                message: err.to_string(),
            }
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
            if let Some(organization) = self.endpoint.organization() {
                pairs.append_pair("organization", organization);
            }
        }
        Ok(url)
    }

    fn get(&self, url: &Url) -> Result<ureq::Response, ApiError> {
        tracing::debug!(target = "tether.serverapi", "GET {}", url.path());
        let mut request = self.agent.request_url("GET", url);
        match &self.credentials {
            Credentials::Anonymous => {}
            Credentials::Token(token) => {
                request = request.set("Authorization", &format!("Bearer {token}"));
            }
            Credentials::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                request = request.set("Authorization", &format!("Basic {encoded}"));
            }
        }

        request.call().map_err(|err| match err {
            ureq::Error::Status(401 | 403, _) => ApiError::Unauthorized,
            ureq::Error::Status(status, _) => ApiError::Status {
                status,
                path: url.path().to_string(),
            },
            ureq::Error::Transport(transport) => ApiError::Transport {
                path: url.path().to_string(),
                message: transport.to_string(),
            },
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &Url) -> Result<T, ApiError> {
        let response = self.get(url)?;
        response.into_json().map_err(|err| ApiError::Payload {
            path: url.path().to_string(),
            message: err.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct ComponentPayload {
    key: String,
    name: String,
}

impl From<ComponentPayload> for ServerProject {
    fn from(component: ComponentPayload) -> Self {
        ServerProject {
            key: component.key,
            name: component.name,
        }
    }
}

#[derive(Deserialize)]
struct ShowResponse {
    component: ComponentPayload,
}

#[derive(Deserialize)]
struct SearchResponse {
    components: Vec<ComponentPayload>,
    paging: Paging,
}

#[derive(Deserialize)]
struct Paging {
    #[serde(rename = "pageIndex")]
    page_index: usize,
    #[serde(rename = "pageSize")]
    page_size: usize,
    total: usize,
}

impl ServerApi for HttpServerApi {
    fn get_project(
        &self,
        project_key: &str,
        token: &CancellationToken,
    ) -> Result<Option<ServerProject>, ApiError> {
        if token.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let url = self.url("/api/components/show", &[("component", project_key)])?;
        match self.get_json::<ShowResponse>(&url) {
            Ok(response) => Ok(Some(response.component.into())),
            Err(ApiError::Status { status: 404, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn search_projects(&self, token: &CancellationToken) -> Result<Vec<ServerProject>, ApiError> {
        let mut projects = Vec::new();
        let mut page = 1usize;
        loop {
            if token.is_cancelled() {
                return Err(ApiError::Cancelled);
            }

            let page_param = page.to_string();
            let url = self.url(
                "/api/components/search_projects",
                &[("ps", &PAGE_SIZE.to_string()), ("p", &page_param)],
            )?;
            let response: SearchResponse = self.get_json(&url)?;
            projects.extend(response.components.into_iter().map(ServerProject::from));

            let fetched = response.paging.page_index * response.paging.page_size;
            if fetched >= response.paging.total {
                return Ok(projects);
            }
            page += 1;
        }
    }
}

/// Default [`ServerApiProvider`]: one shared agent, one API value per
/// resolved endpoint.
pub struct HttpServerApiProvider {
    agent: ureq::Agent,
}

impl HttpServerApiProvider {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(std::time::Duration::from_secs(30))
                .build(),
        }
    }
}

impl Default for HttpServerApiProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerApiProvider for HttpServerApiProvider {
    fn create(&self, endpoint: &EndpointParams, credentials: &Credentials) -> Arc<dyn ServerApi> {
        Arc::new(HttpServerApi::new(
            self.agent.clone(),
            endpoint.clone(),
            credentials.clone(),
        ))
    }
}
