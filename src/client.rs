//! GitLab REST client
//!
//! Offset-paginated issue listing against `/api/v4/projects/:id/issues`.

use crate::error::{BurndownError, Result};
use crate::models::config::{Config, ProjectRef, ResolvedConfig, APP_NAME};
use crate::models::RawIssue;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Url;
use serde::Deserialize;

/// Query filters added to every page request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub scope: Option<String>,
    pub milestone_id: Option<String>,
}

impl IssueFilter {
    /// Every issue of the project, whoever created it.
    pub fn all() -> Self {
        Self {
            scope: Some("all".into()),
            milestone_id: None,
        }
    }

    fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(scope) = &self.scope {
            pairs.push(("scope", scope.as_str()));
        }
        if let Some(milestone) = &self.milestone_id {
            pairs.push(("milestone_id", milestone.as_str()));
        }
        pairs
    }
}

#[derive(Deserialize)]
struct ProjectInfo {
    id: u64,
}

#[derive(Debug, Clone)]
pub struct Client {
    client: reqwest::Client,
    host: Url,
    project: ProjectRef,
    per_page: u32,
}

impl Client {
    pub fn new(config: &ResolvedConfig) -> Result<Self> {
        if config.host.cannot_be_a_base() {
            return Err(BurndownError::Configuration(format!(
                "host {} cannot hold an API path",
                config.host
            )));
        }

        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.access_token {
            let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|err| {
                BurndownError::Configuration(format!("access token is not a valid header: {err}"))
            })?;
            auth.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth);
        }

        let client = reqwest::Client::builder()
            .user_agent(APP_NAME)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|err| BurndownError::Configuration(format!("http client: {err}")))?;

        Ok(Self {
            client,
            host: config.host.clone(),
            project: config.project.clone(),
            per_page: config.per_page,
        })
    }

    /// Builds `{host}/api/v4/projects/{project}/{rest...}`, keeping any path
    /// prefix the host already has.
    fn project_url(&self, project: &str, rest: &[&str]) -> Result<Url> {
        let mut url = self.host.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                BurndownError::Configuration(format!("host {} cannot hold an API path", self.host))
            })?;
            let _ = segments
                .pop_if_empty()
                .extend(["api", "v4", "projects", project])
                .extend(rest);
        }
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let fail = |source| BurndownError::RemoteFetch {
            url: url.to_string(),
            source,
        };
        self.client
            .get(url.clone())
            .send()
            .await
            .map_err(fail)?
            .error_for_status()
            .map_err(fail)?
            .json::<T>()
            .await
            .map_err(fail)
    }

    /// Fetches every page of issues until the API returns an empty one.
    ///
    /// `on_page` is called after each non-empty page with the page number and
    /// the number of records collected so far.
    pub async fn fetch_issues(
        &self,
        filter: &IssueFilter,
        mut on_page: impl FnMut(u32, usize),
    ) -> Result<Vec<RawIssue>> {
        let project = self.project.as_segment();
        let per_page = self.per_page.to_string();
        let mut issues = Vec::new();

        for page in 1.. {
            let mut url = self.project_url(&project, &["issues"])?;
            {
                let page = page.to_string();
                let mut query = url.query_pairs_mut();
                let _ = query
                    .append_pair("page", &page)
                    .append_pair("per_page", &per_page);
                for (key, value) in filter.query_pairs() {
                    let _ = query.append_pair(key, value);
                }
            }

            log::info!("fetching issues page {page}");
            let batch: Vec<RawIssue> = self.get_json(url).await?;
            if batch.is_empty() {
                log::debug!("page {page} is empty, stopping");
                break;
            }
            issues.extend(batch);
            on_page(page, issues.len());
        }

        log::info!("fetched {} issues", issues.len());
        Ok(issues)
    }

    /// Looks up the numeric id of a project given its `namespace/name` path.
    pub async fn resolve_project_id(&self, path: &str) -> Result<u64> {
        let url = self.project_url(path, &[])?;
        let info: ProjectInfo = self.get_json(url).await?;
        log::info!("project {path} has id {}", info.id);
        Ok(info.id)
    }

    pub fn project(&self) -> &ProjectRef {
        &self.project
    }

    /// Addresses subsequent requests by numeric id.
    pub fn set_project_id(&mut self, id: u64) {
        self.project = ProjectRef::Id(id);
    }

    /// Resolves a path-addressed project to its numeric id, switches to it,
    /// and records it in `config` so a stored config skips the lookup.
    pub async fn pin_project_id(&mut self, config: &mut Config) -> Result<u64> {
        let id = match self.project.clone() {
            ProjectRef::Id(id) => id,
            ProjectRef::Path(path) => {
                let id = self.resolve_project_id(&path).await?;
                self.set_project_id(id);
                id
            }
        };
        config.project_id = Some(id);
        Ok(id)
    }
}
