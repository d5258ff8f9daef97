use crate::config::{Config, SsoConfig};
use crate::esi::sso::{self, AccessToken, SsoError};
use crate::esi::{EsiError, read_failure};
use crate::error::InitializationError;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PAGES_HEADER: &str = "x-pages";

/// One entry of `/corporations/{id}/structures/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureDto {
    pub structure_id: i64,
    #[serde(default, alias = "structure_name")]
    pub name: Option<String>,
    #[serde(default, alias = "structure_type_id")]
    pub type_id: Option<i64>,
    #[serde(default)]
    pub solar_system_id: Option<i64>,
    /// ISO-8601 with a `Z` or offset suffix. Absent when the structure is unfueled.
    #[serde(default)]
    pub fuel_expires: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CharacterDto {
    pub corporation_id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifyDto {
    #[serde(rename = "CharacterID")]
    pub character_id: i64,
    #[serde(rename = "CharacterName", default)]
    pub character_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedDto {
    name: String,
}

#[derive(Clone)]
pub struct EsiClient {
    client: Client,
    sso: SsoConfig,
    base_url: String,
    datasource: String,
}

impl EsiClient {
    pub fn new(config: &Config) -> Result<Self, InitializationError> {
        let client = Client::builder()
            .user_agent(config.esi.user_agent.as_str())
            .build()?;
        Ok(Self::new_with_client(client, config))
    }

    pub fn new_with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            sso: config.sso.clone(),
            base_url: config.esi.base_url.trim_end_matches('/').to_string(),
            datasource: config.esi.datasource.clone(),
        }
    }

    pub async fn refresh_access_token(&self) -> Result<AccessToken, SsoError> {
        sso::refresh_access_token(&self.client, &self.sso).await
    }

    /// Identifies the character that owns `token`.
    pub async fn verify(&self, token: &AccessToken) -> Result<VerifyDto, EsiError> {
        let resp = self
            .client
            .get(&self.sso.verify_url)
            .bearer_auth(token.secret())
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json::<VerifyDto>().await?)
    }

    pub async fn character(
        &self,
        token: &AccessToken,
        character_id: i64,
    ) -> Result<CharacterDto, EsiError> {
        let url = format!("{}/characters/{character_id}/", self.base_url);
        Ok(self.get(token, &url, None).await?.json().await?)
    }

    pub async fn corporation_id(&self, token: &AccessToken) -> Result<i64, EsiError> {
        let whoami = self.verify(token).await?;
        let character = self.character(token, whoami.character_id).await?;
        debug!(
            character_id = whoami.character_id,
            character = ?whoami.character_name.as_deref().or(character.name.as_deref()),
            corporation_id = character.corporation_id,
            "resolved corporation for token"
        );
        Ok(character.corporation_id)
    }

    /// Fetches every page of the corporation's structures, in ESI order.
    pub async fn structures(
        &self,
        token: &AccessToken,
        corporation_id: i64,
    ) -> Result<Vec<StructureDto>, EsiError> {
        let url = format!("{}/corporations/{corporation_id}/structures/", self.base_url);
        let first = self.get(token, &url, Some(1)).await?;
        let pages = page_count(&first)?;
        let mut structures = first.json::<Vec<StructureDto>>().await?;

        for page in 2..=pages {
            let mut more: Vec<StructureDto> = self.get_json(token, &url, Some(page)).await?;
            structures.append(&mut more);
        }

        debug!(count = structures.len(), pages, "fetched corporation structures");
        Ok(structures)
    }

    pub async fn system_name(&self, token: &AccessToken, system_id: i64) -> Result<String, EsiError> {
        let url = format!("{}/universe/systems/{system_id}/", self.base_url);
        self.get_json::<NamedDto>(token, &url, None).await.map(|n| n.name)
    }

    pub async fn type_name(&self, token: &AccessToken, type_id: i64) -> Result<String, EsiError> {
        let url = format!("{}/universe/types/{type_id}/", self.base_url);
        self.get_json::<NamedDto>(token, &url, None).await.map(|n| n.name)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        url: &str,
        page: Option<u32>,
    ) -> Result<T, EsiError> {
        Ok(self.get(token, url, page).await?.json::<T>().await?)
    }

    async fn get(
        &self,
        token: &AccessToken,
        url: &str,
        page: Option<u32>,
    ) -> Result<Response, EsiError> {
        let mut req = self
            .client
            .get(url)
            .bearer_auth(token.secret())
            .query(&[("datasource", self.datasource.as_str())]);
        if let Some(page) = page {
            req = req.query(&[("page", page)]);
        }
        ensure_success(req.send().await?).await
    }
}

async fn ensure_success(resp: Response) -> Result<Response, EsiError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    let (status, body) = read_failure(resp).await;
    Err(EsiError::Status { status, url, body })
}

/// Missing header means a single page.
fn page_count(resp: &Response) -> Result<u32, EsiError> {
    let Some(value) = resp.headers().get(PAGES_HEADER) else {
        return Ok(1);
    };
    let raw = value
        .to_str()
        .map_err(|_| EsiError::Pages(String::from_utf8_lossy(value.as_bytes()).into_owned()))?;
    raw.trim()
        .parse::<u32>()
        .map(|pages| pages.max(1))
        .map_err(|_| EsiError::Pages(raw.to_string()))
}
