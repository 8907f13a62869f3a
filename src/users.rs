//! User administration endpoints (`/users`).

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::api::CallOptions;
use crate::client::ConsoleClient;
use crate::error::Error;
use crate::session::SessionRepository;
use crate::transport::HttpTransport;
use crate::types::{Flag, UserId};
use crate::validation::{self, ValidationError};
use crate::wire::{self, UserCodeBody};

const USERS_ENDPOINT: &str = "/users";
const BLOCK_ENDPOINT: &str = "/users/block";
const UNBLOCK_ENDPOINT: &str = "/users/unblock";

/// Phone and extension the console sends when the form leaves them out.
pub const DEFAULT_PHONE: &str = "(11) 3333-4444";
pub const DEFAULT_EXTENSION: &str = "1234";

/// One row of the user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserSummary {
    #[serde(rename = "CodUsu")]
    pub id: UserId,
    #[serde(rename = "NomeUsu")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Tel", default)]
    pub phone: Option<String>,
    #[serde(rename = "Ramal", default)]
    pub extension: Option<String>,
    #[serde(rename = "Cel", default)]
    pub mobile: Option<String>,
    #[serde(rename = "TrocarSenha", default)]
    pub must_change_password: Flag,
    #[serde(rename = "DataInc", default)]
    pub created_at: Option<String>,
    #[serde(rename = "DataAlt", default)]
    pub updated_at: Option<String>,
    #[serde(rename = "DataBloqueado", default)]
    pub blocked_at: Option<String>,
    #[serde(rename = "Logado", default)]
    pub logged_in: Option<String>,
    #[serde(rename = "CodGrupoUsu", default)]
    pub group: Option<String>,
}

impl UserSummary {
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.blocked_at.is_some()
    }
}

/// A page of the user listing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct UserPage {
    pub users: Vec<UserSummary>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Deserialize)]
struct UserListResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<Vec<UserSummary>>,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    page: u64,
    #[serde(default)]
    limit: u64,
}

impl UserListResponse {
    fn into_page(self) -> Result<UserPage, Error> {
        match self {
            Self {
                success: true,
                data: Some(users),
                total,
                page,
                limit,
                ..
            } => Ok(UserPage {
                users,
                total,
                page,
                limit,
            }),
            Self { message, error, .. } => Err(Error::Rejected(
                message
                    .filter(|m| !m.is_empty())
                    .or(error.filter(|e| !e.is_empty()))
                    .unwrap_or_else(|| "Erro ao carregar usuários".to_owned()),
            )),
        }
    }
}

/// Registration form.
#[derive(Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub mobile: Option<String>,
    pub phone: String,
    pub extension: String,
    pub must_change_password: bool,
}

impl NewUser {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            mobile: None,
            phone: DEFAULT_PHONE.into(),
            extension: DEFAULT_EXTENSION.into(),
            must_change_password: false,
        }
    }

    #[must_use]
    pub fn with_mobile(mut self, mobile: impl Into<String>) -> Self {
        self.mobile = Some(mobile.into());
        self
    }

    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    #[must_use]
    pub fn with_must_change_password(mut self, must_change: bool) -> Self {
        self.must_change_password = must_change;
        self
    }

    /// # Errors
    ///
    /// Returns the first field that fails its rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::registration_name(&self.name)?;
        validation::email(&self.email)?;
        validation::password(&self.password)?;
        validation::mobile_digits(self.mobile.as_deref().filter(|m| !m.is_empty()))
    }

    fn to_body(&self) -> CreateUserBody<'_> {
        CreateUserBody {
            nome_usu: self.name.trim(),
            email: self.email.trim().to_lowercase(),
            tel: &self.phone,
            ramal: &self.extension,
            cel: self.mobile.as_deref().filter(|m| !m.is_empty()),
            senha: &self.password,
            trocar_senha: Flag::from(self.must_change_password),
        }
    }
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("mobile", &self.mobile)
            .field("phone", &self.phone)
            .field("extension", &self.extension)
            .field("must_change_password", &self.must_change_password)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserBody<'a> {
    nome_usu: &'a str,
    email: String,
    tel: &'a str,
    ramal: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cel: Option<&'a str>,
    senha: &'a str,
    trocar_senha: Flag,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user_id: Option<JsonValue>,
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedUser {
    /// Server-assigned id, when the server reports it.
    pub id: Option<String>,
    pub message: Option<String>,
}

/// Edit form for an existing user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    #[serde(rename = "nomeUsu")]
    pub name: String,
    pub email: String,
    #[serde(rename = "cel")]
    pub mobile: String,
    #[serde(rename = "tel")]
    pub phone: String,
    #[serde(rename = "ramal")]
    pub extension: String,
    #[serde(rename = "codGrupoUsu")]
    pub group: String,
}

impl UserUpdate {
    /// Form pre-filled from a listing row.
    #[must_use]
    pub fn from_summary(user: &UserSummary) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            mobile: user.mobile.clone().unwrap_or_default(),
            phone: user.phone.clone().unwrap_or_default(),
            extension: user.extension.clone().unwrap_or_default(),
            group: user.group.clone().unwrap_or_default(),
        }
    }

    /// # Errors
    ///
    /// Returns the first field that fails its rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::name(&self.name)?;
        validation::email(&self.email)?;
        validation::mobile_length(&self.mobile)?;
        validation::group(&self.group)
    }
}

impl<T: HttpTransport, S: SessionRepository> ConsoleClient<T, S> {
    /// Self-service registration; does not need a session.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] before any request, [`Error::Rejected`] when the
    /// server answers `success: false`, or any [`call`](Self::call) error.
    pub async fn register_user(&self, user: &NewUser) -> Result<CreatedUser, Error> {
        self.submit_new_user(user, false).await
    }

    /// Create a user on behalf of the logged-in administrator.
    ///
    /// # Errors
    ///
    /// As [`register_user`](Self::register_user), plus the session errors of
    /// [`call`](Self::call).
    pub async fn create_user(&self, user: &NewUser) -> Result<CreatedUser, Error> {
        self.submit_new_user(user, true).await
    }

    async fn submit_new_user(&self, user: &NewUser, require_auth: bool) -> Result<CreatedUser, Error> {
        user.validate()?;
        let options = CallOptions::post(serde_json::to_value(user.to_body())?)
            .with_require_auth(require_auth);
        let response: CreateUserResponse = self.call_json(USERS_ENDPOINT, options).await?;

        if !response.success {
            return Err(Error::Rejected(
                response
                    .message
                    .or(response.error)
                    .unwrap_or_else(|| "Erro ao cadastrar usuário".to_owned()),
            ));
        }
        let id = response.user_id.and_then(|id| match id {
            JsonValue::String(s) => Some(s),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        });
        Ok(CreatedUser {
            id,
            message: response.message,
        })
    }

    /// # Errors
    ///
    /// Any [`call`](Self::call) error, [`Error::Decode`] for an unexpected
    /// row shape, or [`Error::Rejected`] when the server reports a failure or
    /// sends no rows.
    pub async fn list_users(&self) -> Result<UserPage, Error> {
        let response: UserListResponse = self.call_json(USERS_ENDPOINT, CallOptions::get()).await?;
        response.into_page()
    }

    /// # Errors
    ///
    /// [`Error::Validation`] before any request, or any [`call`](Self::call) error.
    pub async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<(), Error> {
        update.validate()?;
        let body = self
            .call(&user_path(id), CallOptions::put(serde_json::to_value(update)?))
            .await?;
        wire::acknowledge(&body)
    }

    /// # Errors
    ///
    /// Any [`call`](Self::call) error.
    pub async fn delete_user(&self, id: UserId) -> Result<(), Error> {
        let body = self.call(&user_path(id), CallOptions::delete()).await?;
        wire::acknowledge(&body)
    }

    /// # Errors
    ///
    /// Any [`call`](Self::call) error.
    pub async fn block_user(&self, id: UserId) -> Result<(), Error> {
        self.post_user_code(BLOCK_ENDPOINT, id).await
    }

    /// # Errors
    ///
    /// Any [`call`](Self::call) error.
    pub async fn unblock_user(&self, id: UserId) -> Result<(), Error> {
        self.post_user_code(UNBLOCK_ENDPOINT, id).await
    }

    /// Block an active user or unblock a blocked one. Returns the new
    /// blocked state.
    ///
    /// # Errors
    ///
    /// Any [`call`](Self::call) error.
    pub async fn toggle_block(&self, user: &UserSummary) -> Result<bool, Error> {
        if user.is_blocked() {
            self.unblock_user(user.id).await?;
            Ok(false)
        } else {
            self.block_user(user.id).await?;
            Ok(true)
        }
    }

    async fn post_user_code(&self, endpoint: &str, id: UserId) -> Result<(), Error> {
        let body = serde_json::to_value(UserCodeBody { cod_usu: id })?;
        let body = self.call(endpoint, CallOptions::post(body)).await?;
        wire::acknowledge(&body)
    }
}

fn user_path(id: UserId) -> String {
    format!("{USERS_ENDPOINT}/{id}")
}
