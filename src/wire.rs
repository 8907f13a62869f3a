//! Request and response bodies of the auth endpoints, and their validation
//! into explicit outcomes.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Error;
use crate::types::{Flag, Role, TokenPair, User, UserId};

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub senha: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
    pub cod_user: UserId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserCodeBody {
    pub cod_usu: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginUserDto {
    cod_usu: UserId,
    nome_usu: String,
    email: String,
    #[serde(default)]
    trocar_senha: Option<Flag>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<LoginUserDto>,
    #[serde(default)]
    tokens: Option<TokenPair>,
}

/// Outcome of `POST /users/login` once the body has been validated.
#[derive(Debug)]
pub(crate) enum LoginReply {
    Granted { user: User, tokens: TokenPair },
    Denied { message: Option<String> },
}

impl LoginReply {
    pub(crate) fn parse(body: &[u8]) -> Result<Self, Error> {
        let response: LoginResponse = decode("/users/login", body)?;
        match response {
            LoginResponse {
                success: true,
                data: Some(data),
                tokens: Some(tokens),
                ..
            } => {
                let user = User::new(data.cod_usu, data.email, data.nome_usu)
                    .with_role(Role::Member)
                    .with_must_change_password(data.trocar_senha.is_some_and(Flag::is_set));
                Ok(Self::Granted { user, tokens })
            }
            LoginResponse { message, .. } => Ok(Self::Denied {
                message: non_empty(message),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    tokens: Option<TokenPair>,
    #[serde(default)]
    logout: bool,
}

/// Outcome of `POST /users/refresh-token`.
#[derive(Debug)]
pub(crate) enum RefreshReply {
    Renewed(TokenPair),
    /// The server revoked the session.
    ForcedLogout,
    Rejected { message: Option<String> },
}

impl RefreshReply {
    pub(crate) fn parse(body: &[u8]) -> Result<Self, Error> {
        let response: RefreshResponse = decode("/users/refresh-token", body)?;
        Ok(match response {
            RefreshResponse {
                success: true,
                tokens: Some(tokens),
                ..
            } => Self::Renewed(tokens),
            RefreshResponse { logout: true, .. } => Self::ForcedLogout,
            RefreshResponse { message, .. } => Self::Rejected {
                message: non_empty(message),
            },
        })
    }
}

/// `{success, message, data}` wrapper used by the CRUD endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Payload of a successful envelope; `success: false` becomes [`Error::Rejected`].
    pub(crate) fn into_data(self, endpoint: &str) -> Result<T, Error> {
        if !self.success {
            return Err(Error::Rejected(
                non_empty(self.message)
                    .or(non_empty(self.error))
                    .unwrap_or_else(|| format!("{endpoint} reported failure")),
            ));
        }
        self.data.ok_or_else(|| Error::Decode {
            endpoint: endpoint.to_owned(),
            detail: "missing data".into(),
        })
    }
}

/// Accept any 2xx body unless it explicitly reports `success: false`.
pub(crate) fn acknowledge(body: &JsonValue) -> Result<(), Error> {
    if body.get("success").and_then(JsonValue::as_bool) == Some(false) {
        return Err(Error::Rejected(
            error_message(body).unwrap_or_else(|| "operation reported failure".to_owned()),
        ));
    }
    Ok(())
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    endpoint: &str,
    body: &[u8],
) -> Result<T, Error> {
    serde_json::from_slice(body).map_err(|e| Error::Decode {
        endpoint: endpoint.to_owned(),
        detail: e.to_string(),
    })
}

pub(crate) fn decode_value<T: serde::de::DeserializeOwned>(
    endpoint: &str,
    value: JsonValue,
) -> Result<T, Error> {
    serde_json::from_value(value).map_err(|e| Error::Decode {
        endpoint: endpoint.to_owned(),
        detail: e.to_string(),
    })
}

/// `message`, else `error`, from a JSON error body.
pub(crate) fn error_message(body: &JsonValue) -> Option<String> {
    ["message", "error"].into_iter().find_map(|field| {
        body.get(field)
            .and_then(JsonValue::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    })
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}
