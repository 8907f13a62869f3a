use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Backend user code (`codUsu`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    From, Into,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Backend `"S"`/`"N"` character flag.
///
/// Anything other than `"S"` reads as [`Flag::No`]; serializes back as `"S"`/`"N"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Flag {
    Yes,
    #[default]
    No,
}

impl Flag {
    #[must_use]
    pub fn is_set(self) -> bool {
        self == Self::Yes
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "S",
            Self::No => "N",
        }
    }
}

impl From<String> for Flag {
    fn from(s: String) -> Self {
        Self::from(s == "S")
    }
}

impl From<bool> for Flag {
    fn from(set: bool) -> Self {
        if set { Self::Yes } else { Self::No }
    }
}

impl From<Flag> for &'static str {
    fn from(flag: Flag) -> Self {
        flag.as_str()
    }
}

impl From<Flag> for bool {
    fn from(flag: Flag) -> Self {
        flag.is_set()
    }
}

/// Console role of the logged-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "user")]
    User,
    /// Every login currently yields this role.
    #[default]
    #[serde(rename = "Membro")]
    Member,
}

/// The authenticated user as persisted in the session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(rename = "trocarSenha", default)]
    pub must_change_password: bool,
}

impl User {
    #[must_use]
    pub fn new(id: UserId, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            name: name.into(),
            role: Role::default(),
            must_change_password: false,
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    #[must_use]
    pub fn with_must_change_password(mut self, must_change: bool) -> Self {
        self.must_change_password = must_change;
        self
    }
}

/// Access/refresh token pair. Replaced wholesale on every refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime in seconds as reported by the server. Informational only.
    pub expires_in: u64,
    pub token_type: String,
}

impl TokenPair {
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_in: 0,
            token_type: "Bearer".into(),
        }
    }

    #[must_use]
    pub fn with_expires_in(mut self, seconds: u64) -> Self {
        self.expires_in = seconds;
        self
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// The single persisted unit. Present iff the user is logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user: User,
    pub tokens: TokenPair,
}

impl SessionRecord {
    #[must_use]
    pub fn new(user: User, tokens: TokenPair) -> Self {
        Self { user, tokens }
    }

    /// A record with an empty access token counts as logged out.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.tokens.access_token.is_empty()
    }
}
