mod common;

use std::time::Duration;

use inkwell_mailer::{EmailManager, HealthStatus, MailerConfig, MailerError, TestStatus};
use inkwell_provider::ProviderKind;

use common::{Harness, Script, settings};

use ProviderKind::{Gmail, SendGrid, Smtp};

#[tokio::test]
async fn test_all_providers_reports_every_provider() {
    let harness = Harness::new(&[
        (Gmail, Script::FailConnect),
        (Smtp, Script::Accept(0)),
        (SendGrid, Script::Accept(1)),
    ]);
    let manager = harness.manager(Smtp);

    let results = manager.test_all_providers().await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[&Gmail].status, TestStatus::Error);
    assert!(results[&Gmail].message.contains("gmail is not configured"));
    assert_eq!(results[&Smtp].status, TestStatus::Failed);
    assert_eq!(results[&Smtp].message, "Sent 0 messages");
    assert_eq!(results[&SendGrid].status, TestStatus::Success);
    assert_eq!(results[&SendGrid].message, "Sent 1 messages");
}

#[tokio::test]
async fn test_all_providers_isolates_slow_provider() {
    let harness = Harness::new(&[
        (Gmail, Script::Hang),
        (Smtp, Script::Accept(1)),
        (SendGrid, Script::Accept(1)),
    ]);
    let mut settings = settings();
    settings.attempt_timeout = Duration::from_millis(100);
    settings.max_concurrent_tests = 1;
    let manager = harness.manager_with(Smtp, settings);

    let results = manager.test_all_providers().await;

    assert_eq!(results[&Gmail].status, TestStatus::Error);
    assert!(results[&Gmail].message.contains("timeout"));
    assert_eq!(results[&Smtp].status, TestStatus::Success);
    assert_eq!(results[&SendGrid].status, TestStatus::Success);
    for kind in [Gmail, Smtp, SendGrid] {
        assert_eq!(harness.calls(kind).connects(), 1);
    }
}

#[tokio::test]
async fn check_health_does_not_send() {
    let harness = Harness::new(&[
        (Gmail, Script::FailConnect),
        (Smtp, Script::Accept(1)),
        (SendGrid, Script::FailSend),
    ]);
    let manager = harness.manager(Smtp);

    let health = manager.check_health().await;

    assert_eq!(health[&Gmail].status, HealthStatus::Error);
    assert_eq!(health[&Smtp].status, HealthStatus::Healthy);
    assert!(health[&Smtp].message.is_none());
    assert_eq!(health[&SendGrid].status, HealthStatus::Error);
    assert!(health[&SendGrid].message.as_deref().unwrap().contains("bad key"));
    for kind in [Gmail, Smtp, SendGrid] {
        assert_eq!(harness.calls(kind).sends(), 0);
    }
}

#[tokio::test]
async fn authorization_requires_a_credential_store() {
    let harness = Harness::new(&[(Smtp, Script::Accept(1))]);
    let manager = harness.manager(Smtp);

    let err = manager.authorization_url().await.unwrap_err();
    assert!(matches!(err, MailerError::AuthorizationUnavailable));
}

#[tokio::test]
async fn manager_from_config_reports_missing_gmail_token() {
    let dir = tempfile::tempdir().unwrap();
    let secrets = dir.path().join("credentials.json");
    std::fs::write(
        &secrets,
        r#"{"installed": {"client_id": "inkwell", "client_secret": "s"}}"#,
    )
    .unwrap();

    let mut config = MailerConfig::default();
    config.gmail.credentials_path = secrets;
    config.gmail.token_path = dir.path().join("token.json");
    let manager = EmailManager::from_config(&config).unwrap();

    assert_eq!(manager.primary(), Smtp);
    assert_eq!(manager.fallback_order(), &[Smtp, Gmail, SendGrid]);

    let url = manager.authorization_url().await.unwrap();
    assert!(url.contains("client_id=inkwell"));
    assert!(matches!(
        manager.try_load_credential().await.unwrap(),
        inkwell_gmail::CredentialState::NeedsAuthorization { .. }
    ));

    let err = manager.get_connection(Some(Gmail)).await.err().unwrap();
    assert!(matches!(
        err,
        inkwell_provider::DeliveryError::AuthenticationRequired { .. }
    ));
}
