// tests/login_flow_test.rs

mod common;

use common::{HANDSHAKE, mock_login, solver};
use mockito::Matcher;
use std::sync::Arc;
use xk_sniper::{
    config::AppConfig,
    error::AppError,
    session::{SessionManager, encode_credentials},
};

#[tokio::test]
async fn test_login_posts_encoded_credentials_and_reuses_session() {
    let mut server = mockito::Server::new_async().await;
    let config = Arc::new(AppConfig::for_testing(&server.url()));

    let handshake = server
        .mock("GET", "/Logon.do")
        .match_query(Matcher::UrlEncoded("flag".into(), "sess".into()))
        .with_body(HANDSHAKE)
        .expect(1)
        .create_async()
        .await;
    let captcha = server
        .mock("GET", "/verifycode.servlet")
        .match_query(Matcher::Any)
        .with_body(vec![1, 2, 3])
        .expect(1)
        .create_async()
        .await;
    let encoded = encode_credentials(HANDSHAKE, &config.account, &config.password).unwrap();
    let login = server
        .mock("POST", "/Logon.do")
        .match_query(Matcher::UrlEncoded("method".into(), "logonLdap".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("userAccount".into(), config.account.clone()),
            Matcher::UrlEncoded("userPassword".into(), config.password.clone()),
            Matcher::UrlEncoded("RANDOMCODE".into(), "abcd".into()),
            Matcher::UrlEncoded("encoded".into(), encoded),
        ]))
        .with_body("<html>欢迎</html>")
        .expect(1)
        .create_async()
        .await;

    let solver = solver();
    let sessions = SessionManager::new(config, solver.clone());
    let first = sessions.ensure_authenticated().await.unwrap();
    let second = sessions.ensure_authenticated().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(solver.calls(), 1);
    handshake.assert_async().await;
    captcha.assert_async().await;
    login.assert_async().await;
}

#[tokio::test]
async fn test_rejected_captcha_is_retried_until_exhausted() {
    let mut server = mockito::Server::new_async().await;
    let config = Arc::new(AppConfig::for_testing(&server.url()));
    let (handshake, captcha, login) =
        mock_login(&mut server, "<font color='red'>验证码错误!!</font>", 1, 3).await;

    let solver = solver();
    let sessions = SessionManager::new(config, solver.clone());
    let err = sessions.ensure_authenticated().await.unwrap_err();

    assert!(matches!(err, AppError::CaptchaExhausted(3)));
    assert!(err.is_fatal());
    assert_eq!(solver.calls(), 3);
    assert!(sessions.current().await.is_none());
    handshake.assert_async().await;
    captcha.assert_async().await;
    login.assert_async().await;
}

#[tokio::test]
async fn test_bad_credentials_fail_without_retry() {
    let mut server = mockito::Server::new_async().await;
    let config = Arc::new(AppConfig::for_testing(&server.url()));
    let (_handshake, _captcha, login) = mock_login(&mut server, "用户名或密码错误", 1, 1).await;

    let sessions = SessionManager::new(config, solver());
    let err = sessions.ensure_authenticated().await.unwrap_err();

    assert!(matches!(err, AppError::BadCredentials));
    assert!(err.is_fatal());
    login.assert_async().await;
}

#[tokio::test]
async fn test_invalidated_session_logs_in_again() {
    let mut server = mockito::Server::new_async().await;
    let config = Arc::new(AppConfig::for_testing(&server.url()));
    let (handshake, _captcha, _login) = mock_login(&mut server, "<html>ok</html>", 2, 1).await;

    let sessions = SessionManager::new(config, solver());
    let first = sessions.ensure_authenticated().await.unwrap();
    sessions.invalidate().await;
    assert!(sessions.current().await.is_none());
    let second = sessions.ensure_authenticated().await.unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    handshake.assert_async().await;
}
