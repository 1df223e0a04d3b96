//! 客户端配置测试

use flare_rpc_client::{BackoffKind, ClientConfig, ErrorCode, HostAndPort};
use std::time::Duration;

/// 测试：默认配置的各项取值
#[test]
fn test_create_default_values() {
    let config = ClientConfig::create_default("h1:2379,h2:2379").unwrap();

    assert_eq!(config.retry_count(), 3);
    assert_eq!(config.timeout(), Duration::from_secs(600));
    assert_eq!(config.scan_batch_size(), 100);
    assert!(config.ignore_truncation_errors());
    assert!(!config.truncation_as_warning());
    assert_eq!(config.metadata_reload_period(), Duration::from_secs(10));
    assert_eq!(config.max_frame_size(), 536_870_911);
    assert_eq!(config.backoff(), BackoffKind::default());
    assert_eq!(
        config.endpoints(),
        &[HostAndPort::new("h1", 2379), HostAndPort::new("h2", 2379)]
    );
    assert!(config.validate().is_ok());
}

/// 测试：地址保持输入顺序
#[test]
fn test_endpoints_keep_input_order() {
    let config = ClientConfig::create_default("c:3,a:1, b:2").unwrap();
    let hosts: Vec<&str> = config.endpoints().iter().map(|e| e.host.as_str()).collect();
    assert_eq!(hosts, vec!["c", "a", "b"]);
}

/// 测试：空地址串和非法地址段被拒绝
#[test]
fn test_invalid_endpoints_are_rejected() {
    let err = ClientConfig::create_default("").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigurationError);

    let err = ClientConfig::create_default("h1:2379,h2").unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidEndpoint);
    assert!(err.to_string().contains("h2"));
}

/// 测试：setter 链式修改配置，不影响其他字段
#[test]
fn test_fluent_setters() {
    let config = ClientConfig::create_default("pd:2379")
        .unwrap()
        .with_retry_count(0)
        .with_timeout(Duration::from_secs(3))
        .with_backoff(BackoffKind::Fixed { delay_ms: 50 })
        .with_scan_batch_size(512)
        .with_ignore_truncation_errors(false)
        .with_truncation_as_warning(true)
        .with_metadata_reload_period(Duration::from_secs(30))
        .with_max_frame_size(4 * 1024 * 1024);

    assert_eq!(config.retry_count(), 0);
    assert_eq!(config.timeout(), Duration::from_secs(3));
    assert_eq!(config.backoff(), BackoffKind::Fixed { delay_ms: 50 });
    assert_eq!(config.scan_batch_size(), 512);
    assert!(!config.ignore_truncation_errors());
    assert!(config.truncation_as_warning());
    assert_eq!(config.metadata_reload_period(), Duration::from_secs(30));
    assert_eq!(config.max_frame_size(), 4 * 1024 * 1024);
    assert_eq!(config.endpoints().len(), 1);
}

/// 测试：校验拒绝零超时、零帧大小和零乘数
#[test]
fn test_validate_rejects_degenerate_values() {
    let base = ClientConfig::create_default("pd:2379").unwrap();

    assert!(base.clone().with_timeout(Duration::ZERO).validate().is_err());
    assert!(base.clone().with_max_frame_size(0).validate().is_err());
    assert!(base.clone().with_scan_batch_size(0).validate().is_err());
    assert!(
        base.with_backoff(BackoffKind::Exponential {
            base_delay_ms: 10,
            multiplier: 0,
            max_delay_ms: 100,
        })
        .validate()
        .is_err()
    );
}

/// 测试：TOML 中的地址使用逗号分隔字符串
#[test]
fn test_toml_with_csv_endpoints() {
    let config = ClientConfig::from_toml_str(
        r#"
        endpoints = "pd0:2379,pd1:2379"
        retry_count = 5
        timeout_secs = 30

        [backoff]
        kind = "exponential"
        base_delay_ms = 50
        "#,
    )
    .unwrap();

    assert_eq!(config.endpoints().len(), 2);
    assert_eq!(config.retry_count(), 5);
    assert_eq!(config.timeout(), Duration::from_secs(30));
    assert_eq!(
        config.backoff(),
        BackoffKind::Exponential {
            base_delay_ms: 50,
            multiplier: 2,
            max_delay_ms: 10_000,
        }
    );
    // 未出现的字段保持默认值
    assert_eq!(config.scan_batch_size(), 100);
}

/// 测试：TOML 中的地址使用数组
#[test]
fn test_toml_with_endpoint_array() {
    let config = ClientConfig::from_toml_str(
        r#"
        endpoints = ["[::1]:2379", "pd1:2379"]
        ignore_truncation_errors = false
        metadata_reload_period_secs = 60

        [backoff]
        kind = "none"
        "#,
    )
    .unwrap();

    assert_eq!(config.endpoints()[0], HostAndPort::new("::1", 2379));
    assert!(!config.ignore_truncation_errors());
    assert_eq!(config.metadata_reload_period(), Duration::from_secs(60));
    assert_eq!(config.backoff(), BackoffKind::NoBackoff);
}

/// 测试：未知字段和非法取值被拒绝
#[test]
fn test_toml_rejects_bad_input() {
    let err = ClientConfig::from_toml_str(
        r#"
        endpoints = "pd:2379"
        retries = 3
        "#,
    )
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigurationError);

    let err = ClientConfig::from_toml_str(
        r#"
        endpoints = "pd:2379"
        timeout_secs = 0
        "#,
    )
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigurationError);

    assert!(ClientConfig::from_toml_str("retry_count = 1").is_err());
}

/// 测试：从文件加载配置，文件不存在时报告 IO 错误
#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("flare-rpc-client-{}.toml", std::process::id()));
    std::fs::write(&path, "endpoints = \"pd0:2379\"\nretry_count = 1\n").unwrap();

    let config = ClientConfig::load_from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.retry_count(), 1);
    assert_eq!(config.endpoints(), &[HostAndPort::new("pd0", 2379)]);

    let err = ClientConfig::load_from_file(&path).unwrap_err();
    assert_eq!(err.code(), ErrorCode::IoError);
}
