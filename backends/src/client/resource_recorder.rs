use async_trait::async_trait;
use http::header::AUTHORIZATION;
use shuttle_proto::resource_recorder::Client;
use shuttle_proto::resource_recorder::ProjectResourcesRequest;
use tracing::instrument;

use shuttle_common::{database, resource};

use super::Error;

/// DAL for access resources data of projects
#[async_trait]
pub trait ResourceDal: Send {
    /// Get the resources belonging to a project
    async fn get_project_resources(
        &mut self,
        project_id: &str,
        token: &str,
    ) -> Result<Vec<resource::Response>, Error>;

    /// Get only the RDS resources that belong to a project
    async fn get_project_rds_resources(
        &mut self,
        project_id: &str,
        token: &str,
    ) -> Result<Vec<resource::Response>, Error> {
        let rds_resources = self
            .get_project_resources(project_id, token)
            .await?
            .into_iter()
            .filter(|r| {
                matches!(
                    r.r#type,
                    resource::Type::Database(database::Type::AwsRds(_))
                )
            })
            .collect();

        Ok(rds_resources)
    }
}

#[async_trait]
impl<T> ResourceDal for &mut T
where
    T: ResourceDal,
{
    #[instrument(skip_all, fields(shuttle.project.id = project_id))]
    async fn get_project_resources(
        &mut self,
        project_id: &str,
        token: &str,
    ) -> Result<Vec<resource::Response>, Error> {
        (**self).get_project_resources(project_id, token).await
    }
}

#[async_trait]
impl ResourceDal for Client {
    async fn get_project_resources(
        &mut self,
        project_id: &str,
        token: &str,
    ) -> Result<Vec<shuttle_common::resource::Response>, Error> {
        let mut req = tonic::Request::new(ProjectResourcesRequest {
            project_id: project_id.to_string(),
        });

        req.metadata_mut().insert(
            AUTHORIZATION.as_str(),
            format!("Bearer {token}")
                .parse()
                .expect("to construct a bearer token"),
        );

        let resp = (*self)
            .get_project_resources(req)
            .await?
            .into_inner()
            .clone();

        let resources = resp
            .resources
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error: anyhow::Error| tonic::Status::internal(error.to_string()))?;

        Ok(resources)
    }
}
