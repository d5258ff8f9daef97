use shared::esi::{AccessToken, EsiClient, EsiError, SsoError, StructureDto};
use std::future::Future;

/// The remote collaborators a run reads from: identity provider, structure listing,
/// and name resolution.
pub trait FacilityApi: Send + Sync {
    fn authenticate(&self) -> impl Future<Output = Result<AccessToken, SsoError>> + Send;

    fn organization_id(
        &self,
        token: &AccessToken,
    ) -> impl Future<Output = Result<i64, EsiError>> + Send;

    fn facilities(
        &self,
        token: &AccessToken,
        organization_id: i64,
    ) -> impl Future<Output = Result<Vec<StructureDto>, EsiError>> + Send;

    fn location_name(
        &self,
        token: &AccessToken,
        location_id: i64,
    ) -> impl Future<Output = Result<String, EsiError>> + Send;

    fn type_name(
        &self,
        token: &AccessToken,
        type_id: i64,
    ) -> impl Future<Output = Result<String, EsiError>> + Send;
}

impl FacilityApi for EsiClient {
    async fn authenticate(&self) -> Result<AccessToken, SsoError> {
        self.refresh_access_token().await
    }

    async fn organization_id(&self, token: &AccessToken) -> Result<i64, EsiError> {
        self.corporation_id(token).await
    }

    async fn facilities(
        &self,
        token: &AccessToken,
        organization_id: i64,
    ) -> Result<Vec<StructureDto>, EsiError> {
        self.structures(token, organization_id).await
    }

    async fn location_name(&self, token: &AccessToken, location_id: i64) -> Result<String, EsiError> {
        self.system_name(token, location_id).await
    }

    async fn type_name(&self, token: &AccessToken, type_id: i64) -> Result<String, EsiError> {
        EsiClient::type_name(self, token, type_id).await
    }
}
