//! Permission groups ("cargos") under `/permissions`.

use serde::{Deserialize, Serialize};

use crate::api::CallOptions;
use crate::client::ConsoleClient;
use crate::error::Error;
use crate::session::SessionRepository;
use crate::transport::HttpTransport;
use crate::validation::{self, ValidationError};
use crate::wire::{self, Envelope};

const GROUPS_ENDPOINT: &str = "/permissions/grupos";
const GROUP_ENDPOINT: &str = "/permissions/grupo-usuario";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Group {
    #[serde(rename = "CodGrupoUsu")]
    pub code: String,
    #[serde(rename = "DescrGrupoUsu")]
    pub description: String,
    #[serde(rename = "permissoes", default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GroupList {
    grupos: Vec<Group>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedGroup {
    cod_grupo_usu: String,
    descr_grupo_usu: String,
}

/// Form for a new group. The code is sent upper-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub code: String,
    pub description: String,
}

impl NewGroup {
    #[must_use]
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }

    /// # Errors
    ///
    /// Returns the first field that fails its rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::new_group(&self.code, &self.description)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewGroupBody<'a> {
    cod_grupo_usu: String,
    descr_grupo_usu: &'a str,
}

impl<T: HttpTransport, S: SessionRepository> ConsoleClient<T, S> {
    /// # Errors
    ///
    /// Any [`call`](Self::call) error, or [`Error::Rejected`] when the server
    /// answers `success: false`.
    pub async fn list_groups(&self) -> Result<Vec<Group>, Error> {
        let envelope: Envelope<GroupList> =
            self.call_json(GROUPS_ENDPOINT, CallOptions::get()).await?;
        Ok(envelope.into_data(GROUPS_ENDPOINT)?.grupos)
    }

    /// Create a group and return it as the server stored it.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] before any request, otherwise as
    /// [`list_groups`](Self::list_groups).
    pub async fn create_group(&self, group: &NewGroup) -> Result<Group, Error> {
        group.validate()?;
        let body = serde_json::to_value(NewGroupBody {
            cod_grupo_usu: group.code.to_uppercase(),
            descr_grupo_usu: &group.description,
        })?;
        let envelope: Envelope<CreatedGroup> = self
            .call_json(GROUP_ENDPOINT, CallOptions::post(body))
            .await?;
        let created = envelope.into_data(GROUP_ENDPOINT)?;
        tracing::info!(code = %created.cod_grupo_usu, "Group created");
        Ok(Group {
            code: created.cod_grupo_usu,
            description: created.descr_grupo_usu,
            permissions: Vec::new(),
        })
    }

    /// # Errors
    ///
    /// Any [`call`](Self::call) error.
    pub async fn delete_group(&self, code: &str) -> Result<(), Error> {
        let endpoint = format!("{GROUP_ENDPOINT}/{}", urlencoding::encode(code));
        let body = self.call(&endpoint, CallOptions::delete()).await?;
        wire::acknowledge(&body)
    }
}
