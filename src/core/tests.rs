use super::bundle::*;
use super::config::*;
use super::currency::*;
use super::error::*;
use super::message::*;
use super::model::*;
use super::session::*;
use std::collections::HashMap;

#[test]
fn test_pricing_builtins() {
    let table = PricingTable::builtin();
    assert_eq!(table.rate_for(HAIKU_4_5), PricingEntry::new(0.80, 4.00));
    assert_eq!(table.rate_for(SONNET_4_5), PricingEntry::new(3.00, 15.00));
    assert_eq!(table.rate_for(OPUS_4_1), PricingEntry::new(15.00, 75.00));
    assert!(table.is_known(SONNET_4_5));
}

#[test]
fn test_unknown_model_gets_fallback_tier() {
    let table = PricingTable::builtin();
    assert!(!table.is_known("gpt-unknown"));
    assert_eq!(table.rate_for("gpt-unknown"), table.fallback());
    assert_eq!(table.rate_for(""), PricingEntry::new(0.80, 4.00));
}

#[test]
fn test_pricing_cost_calculation() {
    let entry = PricingEntry::new(0.80, 4.00);
    // (1000/1M * 0.80) + (500/1M * 4.00) = 0.0008 + 0.002
    assert!((entry.cost(1000, 500) - 0.0028).abs() < 1e-12);
    assert_eq!(entry.cost(0, 0), 0.0);
}

#[test]
fn test_pricing_overrides() {
    let mut overrides = HashMap::new();
    overrides.insert("local-model".to_string(), PricingEntry::new(0.0, 0.0));
    overrides.insert(HAIKU_4_5.to_string(), PricingEntry::new(1.00, 5.00));

    let table = PricingTable::with_overrides(&overrides, SONNET_4_5);
    assert_eq!(table.rate_for("local-model"), PricingEntry::new(0.0, 0.0));
    assert_eq!(table.rate_for(HAIKU_4_5), PricingEntry::new(1.00, 5.00));
    assert_eq!(table.rate_for("mystery"), PricingEntry::new(3.00, 15.00));

    // A fallback id with no entry keeps the builtin baseline.
    let table = PricingTable::with_overrides(&HashMap::new(), "missing-model");
    assert_eq!(table.fallback(), PricingEntry::new(0.80, 4.00));
}

#[test]
fn test_pricing_entry_deserialize() {
    let entry: PricingEntry = serde_json::from_str(r#"{"input": 2.5, "output": 10}"#).unwrap();
    assert_eq!(entry, PricingEntry::new(2.5, 10.0));
}

#[test]
fn test_currency_conversion() {
    let fx = CurrencyConverter::default();
    assert_eq!(fx.code(), "THB");
    assert_eq!(fx.rate(), 33.50);
    assert!((fx.to_secondary(0.0028) - 0.0938).abs() < 1e-12);
}

#[test]
fn test_currency_rate_reload() {
    let fx = CurrencyConverter::new("EUR", 0.92);
    assert!(fx.set_rate(0.95));
    assert_eq!(fx.rate(), 0.95);

    for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(!fx.set_rate(bad));
        assert_eq!(fx.rate(), 0.95);
    }

    fx.set_code("USD");
    assert_eq!(fx.code(), "USD");
}

#[test]
fn test_currency_invalid_initial_rate() {
    let fx = CurrencyConverter::new("THB", -3.0);
    assert_eq!(fx.rate(), DEFAULT_EXCHANGE_RATE);
}

#[test]
fn test_combined_markup() {
    let bundle = CodeBundle::new("", "<p>hi</p>", "p { color: red; }", "console.log(1);");
    assert_eq!(
        bundle.combined_markup(),
        "<p>hi</p>\n<style>\np { color: red; }\n</style>\n<script>\nconsole.log(1);\n</script>"
    );

    let html_only = CodeBundle::new("", "<p>hi</p>", "", "");
    assert_eq!(html_only.combined_markup(), "<p>hi</p>");
}

#[test]
fn test_combined_markup_strips_asset_links() {
    let html = r#"<link rel="stylesheet" href="style.css"><main></main><script src="script.js"></script>"#;
    let bundle = CodeBundle::new("", html, "", "run();");
    assert_eq!(
        bundle.combined_markup(),
        "<main></main>\n<script>\nrun();\n</script>"
    );
    assert_eq!(
        strip_asset_links(r#"<script src='app.js'></script>"#),
        r#"<script src='app.js'></script>"#
    );
}

#[test]
fn test_bundle_fallback_message() {
    let bundle = CodeBundle::new("", "<p></p>", "", "");
    assert_eq!(bundle.as_fallback().message, DEFAULT_EDIT_MESSAGE);
    assert_eq!(bundle.as_fallback().html, "<p></p>");

    let bundle = CodeBundle::new("Kept", "", "", "");
    assert_eq!(bundle.as_fallback().message, "Kept");
}

#[test]
fn test_bundle_deserialize_fills_missing_fields() {
    let bundle: CodeBundle = serde_json::from_str(r#"{"html":"<b></b>"}"#).unwrap();
    assert_eq!(bundle.html, "<b></b>");
    assert_eq!(bundle.message, "");
    assert_eq!(bundle.js, "");
}

#[test]
fn test_role_labels() {
    assert_eq!(ChatRole::from_label("ai"), ChatRole::Assistant);
    assert_eq!(ChatRole::from_label("assistant"), ChatRole::Assistant);
    assert_eq!(ChatRole::from_label("user"), ChatRole::User);
    assert_eq!(ChatRole::from_label("AI"), ChatRole::User);

    let msg = ChatMessage::from(&HistoryEntry::ai("done"));
    assert_eq!(msg, ChatMessage::assistant("done"));
}

#[test]
fn test_chat_role_serialization() {
    let json = serde_json::to_string(&ChatRole::Assistant).unwrap();
    assert_eq!(json, "\"assistant\"");

    let role: ChatRole = serde_json::from_str("\"user\"").unwrap();
    assert_eq!(role, ChatRole::User);
}

#[test]
fn test_session_apply() {
    let mut session = Session::new("s1".into(), HAIKU_4_5.into());
    assert_eq!(session.average_tokens_per_request(), 0);

    let totals = session.apply(
        &RequestTokens::new(100, 50),
        &RequestCost {
            primary: 0.00028,
            secondary: 0.00938,
        },
    );
    assert_eq!(totals.requests, 1);
    assert_eq!(totals.total_tokens, 150);

    session.apply(
        &RequestTokens::new(200, 101),
        &RequestCost {
            primary: 0.000564,
            secondary: 0.018894,
        },
    );
    assert_eq!(session.total_input_tokens, 300);
    assert_eq!(session.total_output_tokens, 151);
    assert_eq!(session.average_tokens_per_request(), 226);
    assert!(session.updated_at >= session.created_at);
}

#[test]
fn test_request_tokens_saturate() {
    let tokens = RequestTokens::new(u64::MAX, 1);
    assert_eq!(tokens.total, u64::MAX);

    let usage = TokenUsage {
        input_tokens: 1,
        output_tokens: u64::MAX,
    };
    assert_eq!(usage.total(), u64::MAX);
}

#[test]
fn test_session_totals_saturate() {
    let mut session = Session::new("s1".into(), HAIKU_4_5.into());
    let cost = RequestCost {
        primary: 0.0,
        secondary: 0.0,
    };
    let totals = session.apply(&RequestTokens::new(u64::MAX, 1), &cost);
    assert_eq!(totals.total_tokens, u64::MAX);
    assert_eq!(totals.requests, 1);

    let totals = session.apply(&RequestTokens::new(5, 5), &cost);
    assert_eq!(totals.total_tokens, u64::MAX);
    assert_eq!(totals.requests, 2);
    assert_eq!(session.total_input_tokens, u64::MAX);

    session.requests = u64::MAX;
    assert_eq!(session.apply(&RequestTokens::new(0, 0), &cost).requests, u64::MAX);
}

#[test]
fn test_error_kinds() {
    let cases: Vec<(AssistError, ErrorKind, u16)> = vec![
        (ProviderError::Auth("bad".into()).into(), ErrorKind::Auth, 401),
        (
            ProviderError::MissingApiKey("unset".into()).into(),
            ErrorKind::Auth,
            401,
        ),
        (
            ProviderError::RateLimited {
                retry_after_ms: None,
            }
            .into(),
            ErrorKind::RateLimited,
            429,
        ),
        (ProviderError::Timeout(120).into(), ErrorKind::Timeout, 504),
        (
            ProviderError::Api {
                status: 500,
                message: "overloaded".into(),
            }
            .into(),
            ErrorKind::Upstream,
            502,
        ),
        (
            ValidationError::InvalidHistory("got a string".into()).into(),
            ErrorKind::BadRequest,
            400,
        ),
        (
            AssistError::SessionNotFound("s1".into()),
            ErrorKind::NotFound,
            404,
        ),
        (
            AssistError::Analysis(DecodeError::Analysis("eof".into())),
            ErrorKind::Decode,
            500,
        ),
    ];

    for (err, kind, status) in cases {
        assert_eq!(err.kind(), kind, "{err}");
        assert_eq!(err.kind().http_status(), status, "{err}");
        assert!(err.fallback_bundle().is_none());
    }
}

#[test]
fn test_transient_provider_errors() {
    assert!(ProviderError::Http("reset".into()).is_transient());
    assert!(ProviderError::Api {
        status: 529,
        message: "overloaded".into()
    }
    .is_transient());
    assert!(!ProviderError::Api {
        status: 400,
        message: "bad".into()
    }
    .is_transient());
    assert!(!ProviderError::RateLimited {
        retry_after_ms: Some(1000)
    }
    .is_transient());
    assert!(!ProviderError::Auth("x".into()).is_transient());
}

#[test]
fn test_rate_limit_message() {
    let err = ProviderError::RateLimited {
        retry_after_ms: Some(3000),
    };
    assert_eq!(err.to_string(), "Rate limited, retry after 3000ms");
    let err = ProviderError::RateLimited {
        retry_after_ms: None,
    };
    assert_eq!(err.to_string(), "Rate limited");
}

#[test]
fn test_config_defaults() {
    let config = AppConfig::default();
    assert!(config.api_key.is_none());
    assert_eq!(config.base_url, "https://api.anthropic.com");
    assert_eq!(config.edit.model.0, HAIKU_4_5);
    assert_eq!(config.edit.max_tokens, 8192);
    assert_eq!(config.analyze.max_tokens, 2048);
    assert_eq!(config.request_timeout_secs, 120);
    assert_eq!(config.currency.code, "THB");
    assert_eq!(config.currency.rate, 33.50);
    assert_eq!(config.fallback_model, HAIKU_4_5);
}

#[test]
fn test_config_has_api_key() {
    let mut config = AppConfig::default();
    assert!(!config.has_api_key());

    config.api_key = Some("test-key".into());
    assert!(config.has_api_key());

    config.api_key = Some("".into());
    assert!(!config.has_api_key());
}

#[test]
fn test_request_timeout_has_floor() {
    let config = AppConfig {
        request_timeout_secs: 0,
        ..Default::default()
    };
    assert_eq!(config.request_timeout(), std::time::Duration::from_secs(1));
}

#[test]
fn test_env_overrides() {
    let env: HashMap<&str, &str> = [
        ("ANTHROPIC_API_KEY", "sk-test"),
        ("ANTHROPIC_BASE_URL", "http://localhost:8080/"),
        ("CLAUDE_MODEL", SONNET_4_5),
        ("MAX_TOKENS", "4096"),
        ("USD_TO_SECONDARY_RATE", "36.1"),
        ("SECONDARY_CURRENCY", "JPY"),
    ]
    .into_iter()
    .collect();

    let mut config = AppConfig::default();
    apply_env_overrides(&mut config, |name| env.get(name).map(|v| v.to_string()));

    assert_eq!(config.get_api_key(), Some("sk-test"));
    assert_eq!(config.base_url, "http://localhost:8080");
    assert_eq!(config.edit.model.0, SONNET_4_5);
    assert_eq!(config.edit.max_tokens, 4096);
    assert_eq!(config.currency.rate, 36.1);
    assert_eq!(config.currency.code, "JPY");
    // Analysis keeps its own profile.
    assert_eq!(config.analyze.model.0, HAIKU_4_5);
}

#[test]
fn test_env_overrides_ignore_invalid_values() {
    let env: HashMap<&str, &str> = [
        ("ANTHROPIC_API_KEY", "  "),
        ("MAX_TOKENS", "lots"),
        ("USD_TO_SECONDARY_RATE", "-2"),
    ]
    .into_iter()
    .collect();

    let mut config = AppConfig::default();
    apply_env_overrides(&mut config, |name| env.get(name).map(|v| v.to_string()));

    assert!(!config.has_api_key());
    assert_eq!(config.edit.max_tokens, 8192);
    assert_eq!(config.currency.rate, 33.50);
}

#[test]
fn test_read_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "analyze": {"model": "claude-sonnet-4-5-20250929", "max_tokens": 1024},
            "pricing": {"my-proxy-model": {"input": 1.0, "output": 2.0}},
            "currency": {"rate": 35.0}
        }"#,
    )
    .unwrap();

    let config = read_config_file(&path).unwrap();
    assert_eq!(config.analyze.max_tokens, 1024);
    assert_eq!(config.pricing["my-proxy-model"], PricingEntry::new(1.0, 2.0));
    assert_eq!(config.currency.rate, 35.0);
    // Unset fields keep their defaults.
    assert_eq!(config.currency.code, "THB");
    assert_eq!(config.edit.max_tokens, 8192);
}

#[test]
fn test_read_config_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = read_config_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(missing, ConfigError::File(_)));

    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    let invalid = read_config_file(&path).unwrap_err();
    assert!(matches!(invalid, ConfigError::Invalid(_)));
}

#[test]
fn test_load_config_reads_local_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("tinyplugin-assist.json"),
        r#"{"analyze": {"model": "claude-opus-4-1-20250514", "max_tokens": 512}, "request_timeout_secs": 30}"#,
    )
    .unwrap();

    let config = load_config(Some(dir.path().to_path_buf())).unwrap();
    assert_eq!(config.analyze.model.0, OPUS_4_1);
    assert_eq!(config.analyze.max_tokens, 512);
    assert_eq!(config.request_timeout_secs, 30);
}
