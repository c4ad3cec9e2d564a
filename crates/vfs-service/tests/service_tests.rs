//! Tests for the session layer and command dispatch.

use std::sync::Arc;

use tokio::sync::broadcast::error::TryRecvError;
use vfs_core::FsConfig;
use vfs_proto::{Request, ServerMessage, SessionToken};
use vfs_service::{Error, VfsService};

fn service() -> VfsService {
    VfsService::from_config(&FsConfig::default()).expect("default config is valid")
}

#[tokio::test]
async fn test_authorize_starts_at_default_volume() {
    let service = service();
    let auth = service.authorize("alice").await.unwrap();
    assert_eq!(auth.user_name, "alice");
    assert_eq!(auth.current_directory, "C:");

    let session = service.sessions().get_session(auth.token).await.unwrap();
    assert_eq!(session.user_name.as_str(), "alice");
}

#[tokio::test]
async fn test_authorize_rejects_duplicate_and_blank_users() {
    let service = service();
    service.authorize("alice").await.unwrap();

    assert!(matches!(
        service.authorize("ALICE").await,
        Err(Error::AlreadyAuthorized { .. })
    ));
    assert!(matches!(service.authorize("  ").await, Err(Error::Fs(_))));
}

#[tokio::test]
async fn test_deauthorize_frees_the_user_name() {
    let service = service();
    let auth = service.authorize("alice").await.unwrap();

    let resp = service.deauthorize(auth.token).await.unwrap();
    assert_eq!(resp.user_name, "alice");
    assert!(matches!(
        service.deauthorize(auth.token).await,
        Err(Error::UnknownSession(_))
    ));
    assert!(service.authorize("alice").await.is_ok());
}

#[tokio::test]
async fn test_cd_moves_current_directory() {
    let service = service();
    let token = service.authorize("alice").await.unwrap().token;

    service.perform_command(token, "md docs").await.unwrap();
    let resp = service.perform_command(token, "cd docs").await.unwrap();
    assert_eq!(resp.current_directory, "C:/docs");
    assert_eq!(resp.response_message, "C:/docs");

    let resp = service.perform_command(token, "mf a.txt").await.unwrap();
    assert_eq!(resp.response_message, "C:/docs/a.txt");
    assert_eq!(resp.current_directory, "C:/docs");

    let session = service.sessions().get_session(token).await.unwrap();
    assert_eq!(session.current_directory, "C:/docs");
}

#[tokio::test]
async fn test_failed_cd_keeps_current_directory() {
    let service = service();
    let token = service.authorize("alice").await.unwrap().token;

    assert!(matches!(
        service.perform_command(token, "cd nowhere").await,
        Err(Error::Fs(vfs_core::FsError::PathNotFound { .. }))
    ));
    let session = service.sessions().get_session(token).await.unwrap();
    assert_eq!(session.current_directory, "C:");
}

#[tokio::test]
async fn test_lock_uses_session_user() {
    let service = service();
    let alice = service.authorize("alice").await.unwrap().token;
    let bob = service.authorize("bob").await.unwrap().token;

    service.perform_command(alice, "md /C:/docs").await.unwrap();
    service.perform_command(alice, "mf /C:/docs/a.txt").await.unwrap();
    service.perform_command(bob, "lock /C:/docs/a.txt").await.unwrap();
    service.perform_command(alice, "lock /C:/docs/a.txt").await.unwrap();

    let tree = service.perform_command(alice, "print").await.unwrap();
    assert!(tree
        .response_message
        .contains("a.txt [FILE] [LOCKED BY: alice, bob]"));

    assert!(matches!(
        service.perform_command(alice, "deltree /C:/docs").await,
        Err(Error::Fs(vfs_core::FsError::LockedResource { .. }))
    ));

    service.perform_command(alice, "unlock /C:/docs/a.txt").await.unwrap();
    service.perform_command(bob, "unlock /C:/docs/a.txt").await.unwrap();
    service.perform_command(alice, "deltree /C:/docs").await.unwrap();
}

#[tokio::test]
async fn test_notifications_follow_successful_mutations_only() {
    let service = service();
    let token = service.authorize("alice").await.unwrap().token;
    let mut events = service.subscribe();

    service.perform_command(token, "md docs").await.unwrap();
    let event = events.recv().await.unwrap();
    assert_eq!(event.command_line, "md docs");
    assert_eq!(event.user_name, "alice");

    service.perform_command(token, "cd docs").await.unwrap();
    service.perform_command(token, "print").await.unwrap();
    assert!(service.perform_command(token, "md /C:/missing/x").await.is_err());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    service.perform_command(token, "copy /C:/docs D:").await.unwrap();
    assert_eq!(events.recv().await.unwrap().command_line, "copy /C:/docs D:");
}

#[tokio::test]
async fn test_handle_request_maps_faults() {
    let service = service();

    let token = match service.handle_request(Request::authorize("alice")).await {
        ServerMessage::Authorized(resp) => resp.token,
        other => panic!("unexpected message: {other:?}"),
    };

    match service.handle_request(Request::command(token, "rd /C:")).await {
        ServerMessage::CommandFault(fault) => {
            assert_eq!(fault.user_name.as_deref(), Some("alice"));
            assert_eq!(fault.command_line, "rd /C:");
        }
        other => panic!("unexpected message: {other:?}"),
    }

    match service.handle_request(Request::command(SessionToken::new(), "print")).await {
        ServerMessage::CommandFault(fault) => assert_eq!(fault.user_name, None),
        other => panic!("unexpected message: {other:?}"),
    }

    assert!(matches!(
        service.handle_request(Request::authorize("Alice")).await,
        ServerMessage::AuthorizeFault(_)
    ));
    assert!(matches!(
        service.handle_request(Request::command(token, "bogus")).await,
        ServerMessage::CommandFault(_)
    ));
    assert!(matches!(
        service.handle_request(Request::deauthorize(token)).await,
        ServerMessage::Deauthorized(_)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_share_one_tree() {
    let service = Arc::new(service());
    let mut handles = Vec::new();

    for i in 0..8 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            let token = service.authorize(&format!("user{i}")).await.unwrap().token;
            service
                .perform_command(token, &format!("md /C:/dir{i}"))
                .await
                .unwrap();
            service
                .perform_command(token, &format!("mf /C:/dir{i}/f.txt"))
                .await
                .unwrap();
            service
                .perform_command(token, &format!("lock /C:/dir{i}/f.txt"))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let printed = service.host().print_tree(false).await.unwrap();
    for i in 0..8 {
        assert!(printed.contains(&format!("|_dir{i} [DIR]")));
        assert!(printed.contains(&format!("f.txt [FILE] [LOCKED BY: user{i}]")));
    }
    assert_eq!(service.sessions().list_sessions().await.len(), 8);
}
