use crate::config::ProfileOverrides;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;

/// Credentials and address of the target database instance
#[derive(Clone, PartialEq)]
pub struct ConnectionProfile {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// Connection details as submitted by a client. Every field is optional;
/// `username` and `dbName` are accepted for `user` and `database`.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ConnectRequest {
    pub host: Option<String>,
    #[serde(default, deserialize_with = "port_from_number_or_string")]
    pub port: Option<u16>,
    #[serde(alias = "username")]
    pub user: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "dbName")]
    pub database: Option<String>,
}

impl ConnectionProfile {
    /// Merges a client request with configured overrides. Non-empty
    /// overrides win, then non-empty request values, then defaults.
    pub fn resolve(request: ConnectRequest, overrides: &ProfileOverrides) -> Self {
        let pick = |over: &Option<String>, req: Option<String>| {
            over.clone()
                .filter(|v| !v.is_empty())
                .or(req.filter(|v| !v.is_empty()))
        };

        Self {
            host: pick(&overrides.host, request.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(request.port).unwrap_or(DEFAULT_PORT),
            user: pick(&overrides.user, request.user).unwrap_or_default(),
            password: pick(&overrides.password, request.password).unwrap_or_default(),
            database: pick(&overrides.database, request.database).unwrap_or_default(),
        }
    }
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Number(u16),
        Text(String),
    }

    match Option::<RawPort>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawPort::Number(port)) => Ok(Some(port)),
        Some(RawPort::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawPort::Text(text)) => text
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid port '{}': {}", text, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_ui_field_names_and_string_port() {
        let request: ConnectRequest = serde_json::from_str(
            r#"{"host":"db.local","port":"3307","username":"app","password":"pw","dbName":"shop"}"#,
        )
        .unwrap();

        assert_eq!(request.port, Some(3307));
        assert_eq!(request.user.as_deref(), Some("app"));
        assert_eq!(request.database.as_deref(), Some("shop"));
    }

    #[test]
    fn request_rejects_non_numeric_port() {
        let result = serde_json::from_str::<ConnectRequest>(r#"{"port":"abc"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn overrides_take_precedence_over_request() {
        let request = ConnectRequest {
            host: Some("client-host".into()),
            port: Some(3307),
            user: Some("client".into()),
            password: Some("client-pw".into()),
            database: Some("client_db".into()),
        };
        let overrides = ProfileOverrides {
            host: Some("server-host".into()),
            port: None,
            user: None,
            password: Some("server-pw".into()),
            database: None,
        };

        let profile = ConnectionProfile::resolve(request, &overrides);
        assert_eq!(profile.host, "server-host");
        assert_eq!(profile.port, 3307);
        assert_eq!(profile.user, "client");
        assert_eq!(profile.password, "server-pw");
        assert_eq!(profile.database, "client_db");
    }

    #[test]
    fn empty_overrides_fall_through_to_request() {
        let request = ConnectRequest {
            host: Some("client-host".into()),
            password: Some("pw".into()),
            ..ConnectRequest::default()
        };
        let overrides = ProfileOverrides {
            host: Some(String::new()),
            password: Some(String::new()),
            ..ProfileOverrides::default()
        };

        let profile = ConnectionProfile::resolve(request, &overrides);
        assert_eq!(profile.host, "client-host");
        assert_eq!(profile.password, "pw");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let profile = ConnectionProfile::resolve(ConnectRequest::default(), &ProfileOverrides::default());
        assert_eq!(profile.host, DEFAULT_HOST);
        assert_eq!(profile.port, DEFAULT_PORT);
        assert!(profile.database.is_empty());
    }

    #[test]
    fn debug_output_hides_password() {
        let profile = ConnectionProfile {
            host: "h".into(),
            port: 1,
            user: "u".into(),
            password: "secret".into(),
            database: "d".into(),
        };
        assert!(!format!("{:?}", profile).contains("secret"));
    }
}
