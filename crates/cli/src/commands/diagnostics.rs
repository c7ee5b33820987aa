use inkwell_mailer::{EmailManager, HealthStatus, TestStatus};

use crate::OutputFormat;

pub async fn test_providers(manager: &EmailManager, format: &OutputFormat) -> anyhow::Result<()> {
    let results = manager.test_all_providers().await;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        OutputFormat::Text => {
            println!(
                "Tested {} providers (recipient: {}):",
                results.len(),
                manager.settings().test_recipient
            );
            for (provider, result) in &results {
                let tag = match result.status {
                    TestStatus::Success => "OK ",
                    TestStatus::Failed => "FAIL",
                    TestStatus::Error => "ERR",
                };
                println!("  [{tag}] {provider}: {}", result.message);
            }
        }
    }

    if results.values().all(|r| r.status != TestStatus::Success) {
        std::process::exit(1);
    }
    Ok(())
}

pub async fn health(manager: &EmailManager, format: &OutputFormat) -> anyhow::Result<()> {
    let health = manager.check_health().await;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        OutputFormat::Text => {
            for (provider, status) in &health {
                match (&status.status, &status.message) {
                    (HealthStatus::Healthy, _) => println!("  [OK ] {provider}"),
                    (HealthStatus::Error, Some(message)) => {
                        println!("  [ERR] {provider}: {message}");
                    }
                    (HealthStatus::Error, None) => println!("  [ERR] {provider}"),
                }
            }
        }
    }

    if health.values().any(|h| h.status == HealthStatus::Error) {
        std::process::exit(1);
    }
    Ok(())
}

pub fn providers(manager: &EmailManager, format: &OutputFormat) -> anyhow::Result<()> {
    let registry = manager.registry();
    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = manager
                .fallback_order()
                .iter()
                .filter_map(|kind| registry.resolve(*kind).ok())
                .map(|d| serde_json::json!({"provider": d.kind, "priority": d.priority}))
                .collect();
            let json = serde_json::json!({"primary": manager.primary(), "providers": entries});
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("{} providers, in fallback order:", registry.len());
            for (position, kind) in manager.fallback_order().iter().enumerate() {
                let priority = registry.resolve(*kind).map(|d| d.priority).unwrap_or_default();
                let marker = if *kind == manager.primary() { " (primary)" } else { "" };
                println!("  {}. {kind} | priority: {priority}{marker}", position + 1);
            }
        }
    }
    Ok(())
}
