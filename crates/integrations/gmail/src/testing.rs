//! Fixtures shared by the credential and backend tests.

use std::path::Path;

pub(crate) use inkwell_provider::testing::MockServer;

/// Write an `installed` client secrets file whose token endpoint is
/// `token_uri`.
pub(crate) fn write_client_secrets(path: &Path, token_uri: &str) {
    let json = serde_json::json!({
        "installed": {
            "client_id": "inkwell-client",
            "client_secret": "inkwell-secret",
            "auth_uri": "https://accounts.example.com/o/oauth2/auth",
            "token_uri": token_uri,
            "redirect_uris": ["http://localhost:8080/"]
        }
    });
    std::fs::write(path, json.to_string()).unwrap();
}
