//! 重试执行引擎测试
//!
//! 覆盖重试次数、成功即停止、致命失败立即终止、退避序列等行为。

use flare_rpc_client::{
    BackoffKind, CallInterceptor, ClientConfig, ExponentialBackoff, FixedBackoff, NoBackoff,
    RetryDecision, RetryPolicy, StatusCodeHandler,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tonic::{Code, Status};

/// 记录退避延迟的拦截器
#[derive(Default)]
struct RecordingInterceptor {
    retries: Mutex<Vec<(u32, Duration)>>,
}

impl CallInterceptor for RecordingInterceptor {
    fn on_retry(&self, _method: &str, attempt: u32, delay: Duration, _status: &Status) {
        self.retries.lock().unwrap().push((attempt, delay));
    }
}

fn always_retry(_: &Result<u32, Status>) -> RetryDecision {
    RetryDecision::Retry
}

/// 测试：始终可重试时，调用 k+1 次后报告重试耗尽
#[test]
fn test_exhausts_after_k_plus_one_attempts() {
    for k in 0..5u32 {
        let policy = RetryPolicy::new(Box::new(NoBackoff::new(k)));
        let mut calls = 0u32;
        let result = policy.call_with_retry("tikvpb.Tikv/KvGet", &always_retry, || {
            calls += 1;
            Err(Status::unavailable("store down"))
        });

        let err = result.unwrap_err();
        assert!(err.is_retry_exhausted(), "k={}: {}", k, err);
        assert_eq!(err.attempts(), Some(k + 1));
        assert_eq!(err.method(), Some("tikvpb.Tikv/KvGet"));
        assert_eq!(err.status().map(Status::code), Some(Code::Unavailable));
        assert_eq!(calls, k + 1);
    }
}

/// 测试：第 m 次成功时立即返回，不再多调用
#[test]
fn test_returns_on_first_success() {
    let handler = StatusCodeHandler::new();
    for k in 0..4u32 {
        for m in 1..=k + 1 {
            let policy = RetryPolicy::new(Box::new(NoBackoff::new(k)));
            let mut calls = 0u32;
            let result = policy.call_with_retry("pdpb.PD/GetRegion", &handler, || {
                calls += 1;
                if calls < m {
                    Err(Status::unavailable("not ready"))
                } else {
                    Ok(calls * 10)
                }
            });

            assert_eq!(result.unwrap(), m * 10, "k={}, m={}", k, m);
            assert_eq!(calls, m);
        }
    }
}

/// 测试：致命失败立即终止，忽略剩余重试次数
#[test]
fn test_fatal_stops_immediately() {
    let policy = RetryPolicy::new(Box::new(NoBackoff::new(10)));
    let mut calls = 0u32;
    let result: flare_rpc_client::Result<u32> =
        policy.call_with_retry("tikvpb.Tikv/KvPrewrite", &StatusCodeHandler::new(), || {
            calls += 1;
            Err(Status::permission_denied("no access"))
        });

    let err = result.unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err.attempts(), Some(1));
    assert_eq!(err.status().map(Status::code), Some(Code::PermissionDenied));
    assert_eq!(calls, 1);
}

/// 测试：可重试几次之后出现致命失败，尝试次数如实记录
#[test]
fn test_fatal_after_retries_reports_attempts() {
    let policy = RetryPolicy::new(Box::new(NoBackoff::new(5)));
    let mut calls = 0u32;
    let result: flare_rpc_client::Result<u32> =
        policy.call_with_retry("tikvpb.Tikv/KvCommit", &StatusCodeHandler::new(), || {
            calls += 1;
            if calls < 3 {
                Err(Status::deadline_exceeded("slow"))
            } else {
                Err(Status::invalid_argument("bad key"))
            }
        });

    let err = result.unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err.attempts(), Some(3));
    assert_eq!(calls, 3);
}

/// 测试：retry_count = 0 时只调用一次
#[test]
fn test_zero_retries_attempts_once() {
    let policy = RetryPolicy::new(Box::new(FixedBackoff::new(0, Duration::from_secs(60))));
    let mut calls = 0u32;
    let started = Instant::now();
    let result = policy.call_with_retry("tikvpb.Tikv/KvScan", &always_retry, || {
        calls += 1;
        Err(Status::unavailable("down"))
    });

    assert!(result.unwrap_err().is_retry_exhausted());
    assert_eq!(calls, 1);
    assert!(started.elapsed() < Duration::from_secs(1));
}

/// 测试：空结果也是正常的成功结果
#[test]
fn test_empty_success_value_is_accepted() {
    let policy = RetryPolicy::new(Box::new(NoBackoff::new(3)));
    let mut calls = 0u32;
    let result = policy.call_with_retry("tikvpb.Tikv/KvGet", &StatusCodeHandler::new(), || {
        calls += 1;
        Ok(None::<Vec<u8>>)
    });

    assert_eq!(result.unwrap(), None);
    assert_eq!(calls, 1);
}

/// 测试：错误处理器可以拒绝成功响应并要求重试
#[test]
fn test_handler_can_reject_successful_response() {
    let policy = RetryPolicy::new(Box::new(NoBackoff::new(5)));
    let handler = |outcome: &Result<u32, Status>| match outcome {
        Ok(version) if *version < 3 => RetryDecision::Retry,
        Ok(_) => RetryDecision::Accept,
        Err(_) => RetryDecision::Fatal,
    };

    let mut version = 0u32;
    let result = policy.call_with_retry("pdpb.PD/GetMembers", &handler, || {
        version += 1;
        Ok(version)
    });
    assert_eq!(result.unwrap(), 3);

    let policy = RetryPolicy::new(Box::new(NoBackoff::new(1)));
    let result = policy.call_with_retry("pdpb.PD/GetMembers", &handler, || Ok(0));
    let err = result.unwrap_err();
    assert!(err.is_retry_exhausted());
    assert_eq!(err.attempts(), Some(2));
    assert_eq!(err.status().map(Status::code), Some(Code::Aborted));
}

/// 测试：接受一个失败结果等同于致命失败
#[test]
fn test_accepting_failure_surfaces_it() {
    let policy = RetryPolicy::new(Box::new(NoBackoff::new(3)));
    let accept_all = |_: &Result<u32, Status>| RetryDecision::Accept;
    let err = policy
        .call_with_retry("tikvpb.Tikv/KvGet", &accept_all, || {
            Err(Status::not_found("missing"))
        })
        .unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(err.status().map(Status::code), Some(Code::NotFound));
}

/// 测试：同步循环按退避时间阻塞
#[test]
fn test_blocking_loop_sleeps_between_attempts() {
    let policy = RetryPolicy::new(Box::new(FixedBackoff::new(2, Duration::from_millis(20))));
    let started = Instant::now();
    let _ = policy.call_with_retry("tikvpb.Tikv/KvGet", &always_retry, || {
        Err(Status::unavailable("down"))
    });

    assert!(started.elapsed() >= Duration::from_millis(40));
}

/// 测试：指数退避的延迟序列确定
#[tokio::test(start_paused = true)]
async fn test_exponential_delays_are_deterministic() {
    let interceptor = Arc::new(RecordingInterceptor::default());
    let policy = RetryPolicy::new(Box::new(ExponentialBackoff::new(
        3,
        Duration::from_millis(100),
        2,
        Duration::from_secs(10),
    )))
    .with_interceptor(interceptor.clone());

    let started = tokio::time::Instant::now();
    let result = policy
        .call_with_retry_async("tikvpb.Tikv/KvGet", &always_retry, || async {
            Err(Status::unavailable("down"))
        })
        .await;

    assert!(result.unwrap_err().is_retry_exhausted());
    assert_eq!(
        *interceptor.retries.lock().unwrap(),
        vec![
            (1, Duration::from_millis(100)),
            (2, Duration::from_millis(200)),
            (3, Duration::from_millis(400)),
        ]
    );
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(700));
    assert!(elapsed < Duration::from_millis(800));
}

/// 测试：按配置创建的引擎使用配置中的重试次数
#[tokio::test]
async fn test_policy_from_config() {
    let config = ClientConfig::create_default("pd0:2379")
        .unwrap()
        .with_retry_count(2)
        .with_backoff(BackoffKind::NoBackoff);
    let policy = RetryPolicy::from_config(&config);

    let mut calls = 0u32;
    let result = policy
        .call_with_retry_async("pdpb.PD/Tso", &always_retry, || {
            calls += 1;
            async { Err(Status::unavailable("down")) }
        })
        .await;

    tokio_test::assert_err!(result);
    assert_eq!(calls, 3);
}
