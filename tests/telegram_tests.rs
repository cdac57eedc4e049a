//! Telegram Bot API client against a mock HTTP server.

use std::sync::Arc;

use mockito::{Matcher, Server};
use secrecy::SecretString;
use serde_json::json;

use metis_token_bot::bot::protocol::{Button, MessageRef, Reply, ReplySink};
use metis_token_bot::channels::telegram::{TelegramApi, TelegramSink};

const TOKEN: &str = "123:abc";

fn api(server: &Server) -> Arc<TelegramApi> {
    Arc::new(TelegramApi::new(&server.url(), SecretString::new(TOKEN.to_string())))
}

#[tokio::test]
async fn test_send_with_keyboard_returns_message_ref() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/bot123:abc/sendMessage")
        .match_body(Matcher::PartialJson(json!({
            "chat_id": 42,
            "text": "pick one",
            "reply_markup": {"inline_keyboard": [[{"text": "Deploy ERC20", "callback_data": "deploy_erc20"}]]}
        })))
        .with_header("content-type", "application/json")
        .with_body(
            json!({"ok": true, "result": {"message_id": 77, "chat": {"id": 42, "type": "private"}, "date": 0, "text": "pick one"}})
                .to_string(),
        )
        .create_async()
        .await;

    let sink = TelegramSink::new(api(&server), 42);
    let sent = sink
        .send(Reply::text("pick one").with_buttons(vec![vec![Button::new("Deploy ERC20", "deploy_erc20")]]))
        .await
        .unwrap();
    assert_eq!(sent, Some(MessageRef { chat_id: 42, message_id: 77 }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_edit_replaces_status_text() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/bot123:abc/editMessageText")
        .match_body(Matcher::PartialJson(json!({"chat_id": 42, "message_id": 77, "text": "done"})))
        .with_body(json!({"ok": true, "result": true}).to_string())
        .create_async()
        .await;

    let sink = TelegramSink::new(api(&server), 42);
    sink.edit(MessageRef { chat_id: 42, message_id: 77 }, "done".to_string())
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_updates_and_api_errors() {
    let mut server = Server::new_async().await;
    let _updates = server
        .mock("POST", "/bot123:abc/getUpdates")
        .match_body(Matcher::PartialJson(json!({"offset": 5})))
        .with_body(
            json!({"ok": true, "result": [
                {"update_id": 5, "message": {"message_id": 1, "chat": {"id": 9}, "text": "hi"}},
                {"update_id": 6, "callback_query": {"id": "q", "data": "cancel_deploy", "message": {"message_id": 2, "chat": {"id": 9}}}}
            ]})
            .to_string(),
        )
        .create_async()
        .await;
    let _unauthorized = server
        .mock("POST", "/bot123:abc/answerCallbackQuery")
        .with_status(401)
        .with_body(json!({"ok": false, "error_code": 401, "description": "Unauthorized"}).to_string())
        .create_async()
        .await;

    let api = api(&server);
    let updates = api.get_updates(5, 0).await.unwrap();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].to_inbound().unwrap().chat_id, 9);
    assert!(updates[1].callback_query.is_some());

    let err = api.answer_callback_query("q").await.unwrap_err();
    assert!(err.to_string().contains("Unauthorized"));
}
