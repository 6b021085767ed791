//! End-to-end flows through the router, against a mock GAP service

#[cfg(test)]
mod tests {
    use mockito::{Matcher, ServerGuard};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use crate::api::commands::{CommandOutcome, KeyboardCommand, ServiceStatus};
    use crate::core::clipboard::PASTE_TIMEOUT;
    use crate::runtime::ExtensionRuntime;
    use crate::shared::events::{AppEvent, NotificationLevel};
    use crate::shared::settings::{PersistentSettings, SettingsStore};
    use crate::shared::types::{
        ActionKind, ActionRequest, ActionResponse, ContextKind, PlatformId, TextPayload,
        TransformPayload, WrapPayload,
    };
    use crate::system::clipboard::MemoryClipboard;
    use crate::system::page::{PageDocument, SimulatedPage};

    const ENVELOPE: &str = "[GAP:START]\nPlatform: claude.ai\nEntities: Mercury, Apple\nHello\n[GAP:END]";

    struct Harness {
        runtime: ExtensionRuntime,
        page: Arc<SimulatedPage>,
        popup_page: Arc<SimulatedPage>,
        os: MemoryClipboard,
        server: ServerGuard,
    }

    async fn harness_with(url: &str, settings: PersistentSettings) -> Harness {
        let server = mockito::Server::new_async().await;
        let settings = SettingsStore::in_memory(PersistentSettings {
            service_url: server.url(),
            ..settings
        });
        let os = MemoryClipboard::new();
        let page = Arc::new(SimulatedPage::new(url, os.clone()));
        let popup_page = Arc::new(SimulatedPage::new("chrome-extension://gap/popup.html", os.clone()));
        let runtime = ExtensionRuntime::builder(settings)
            .clipboard(Arc::new(os.clone()))
            .start(page.clone(), popup_page.clone())
            .unwrap();
        Harness { runtime, page, popup_page, os, server }
    }

    async fn harness(url: &str) -> Harness {
        harness_with(url, PersistentSettings::default()).await
    }

    fn last_message(page: &SimulatedPage) -> (String, NotificationLevel) {
        let n = page.notifications().pop().expect("a notification");
        (n.message, n.level)
    }

    #[tokio::test]
    async fn test_wrap_content_returns_service_envelope() {
        let mut h = harness("https://claude.ai/chat/1").await;
        let mock = h
            .server
            .mock("POST", "/gap/wrap")
            .match_body(Matcher::PartialJson(json!({ "content": "Hello", "platform": "claude.ai", "role": "assistant" })))
            .with_status(200)
            .with_body(json!({ "gap_markdown": ENVELOPE }).to_string())
            .create_async()
            .await;

        let mut payload = WrapPayload::new("Hello");
        payload.platform = Some(PlatformId::ClaudeAi.to_string());
        let request = ActionRequest::with_payload(ActionKind::WrapContent, &payload).unwrap();

        let response = h.runtime.send(request).await.unwrap();
        assert_eq!(response, ActionResponse::Result(json!(ENVELOPE)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_wrap_generates_chat_id_when_missing() {
        let mut h = harness("https://claude.ai/").await;
        let _mock = h
            .server
            .mock("POST", "/gap/wrap")
            .match_body(Matcher::Regex(r#""chat_id":"ext_[0-9a-f]{32}""#.to_string()))
            .with_status(200)
            .with_body(json!({ "gap_markdown": ENVELOPE }).to_string())
            .create_async()
            .await;

        let request = ActionRequest::with_payload(ActionKind::WrapContent, &WrapPayload::new("Hello")).unwrap();
        assert!(!h.runtime.send(request).await.unwrap().is_error());
    }

    #[tokio::test]
    async fn test_wrap_service_500_becomes_error_response() {
        let mut h = harness("https://claude.ai/").await;
        let _mock = h.server.mock("POST", "/gap/wrap").with_status(500).create_async().await;

        let request = ActionRequest::with_payload(ActionKind::WrapContent, &WrapPayload::new("Hello")).unwrap();
        let response = h.runtime.send(request).await.unwrap();
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({ "error": "Service error: 500" }));
    }

    #[tokio::test]
    async fn test_wrap_output_is_accepted_by_transform() {
        let mut h = harness("https://claude.ai/").await;
        let _wrap = h
            .server
            .mock("POST", "/gap/wrap")
            .with_status(200)
            .with_body(json!({ "gap_markdown": ENVELOPE }).to_string())
            .create_async()
            .await;
        let transform = h
            .server
            .mock("POST", "/gap/transform")
            .match_body(Matcher::PartialJson(json!({ "gap_markdown": ENVELOPE })))
            .with_status(200)
            .with_body(json!({ "transformed_content": "ok" }).to_string())
            .create_async()
            .await;

        let request = ActionRequest::with_payload(ActionKind::WrapContent, &WrapPayload::new("Hello")).unwrap();
        let wrapped = h.runtime.router().request(request).await.unwrap();
        let wrapped = wrapped.as_str().unwrap().to_string();

        let request =
            ActionRequest::with_payload(ActionKind::TransformContent, &TransformPayload::new(wrapped)).unwrap();
        let transformed = h.runtime.router().request(request).await.unwrap();
        assert_eq!(transformed, json!("ok"));
        transform.assert_async().await;
    }

    #[tokio::test]
    async fn test_insert_text_without_target_warns() {
        let h = harness("https://example.com/").await;
        h.page.add_element("div", &[]);

        let request = ActionRequest::with_payload(ActionKind::InsertText, &TextPayload { text: "x".into() }).unwrap();
        let response = h.runtime.send(request).await.unwrap();

        assert_eq!(response, ActionResponse::Error("Please click in a text input area first".into()));
        assert_eq!(
            last_message(&h.page),
            ("Please click in a text input area first".to_string(), NotificationLevel::Warning)
        );
    }

    #[tokio::test]
    async fn test_insert_text_into_chat_input() {
        let h = harness("https://chat.openai.com/").await;
        let input = h.page.add_element("textarea", &[("data-id", "prompt")]);

        let request = ActionRequest::with_payload(ActionKind::InsertText, &TextPayload { text: "hi".into() }).unwrap();
        let response = h.runtime.send(request).await.unwrap();

        assert_eq!(response, ActionResponse::Result(json!({ "success": true })));
        assert_eq!(h.page.value(input).unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_get_clipboard_exhausted_resolves_empty() {
        let h = harness("https://example.com/").await;
        h.os.set("secret");
        h.os.set_read_allowed(false);
        h.page.set_paste_allowed(false);

        let started = Instant::now();
        let response = h.runtime.send(ActionRequest::new(ActionKind::GetClipboard)).await.unwrap();
        assert_eq!(response, ActionResponse::Result(json!({ "clipboard": "" })));
        assert!(started.elapsed() < PASTE_TIMEOUT + Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_copy_to_clipboard_notifies() {
        let h = harness("https://example.com/").await;
        let request = ActionRequest::with_payload(ActionKind::CopyToClipboard, &TextPayload { text: "copied".into() }).unwrap();

        let response = h.runtime.send(request).await.unwrap();
        assert_eq!(response, ActionResponse::Result(json!({ "success": true })));
        assert_eq!(h.os.get(), "copied");
        assert_eq!(last_message(&h.page), ("Copied to clipboard!".to_string(), NotificationLevel::Success));
    }

    #[tokio::test]
    async fn test_copy_failure_notifies_error() {
        let h = harness("https://example.com/").await;
        h.os.set_write_allowed(false);
        h.page.set_copy_allowed(false);
        let request = ActionRequest::with_payload(ActionKind::CopyToClipboard, &TextPayload { text: "x".into() }).unwrap();

        assert!(h.runtime.send(request).await.unwrap().is_error());
        assert_eq!(last_message(&h.page), ("Failed to copy".to_string(), NotificationLevel::Error));
    }

    #[tokio::test]
    async fn test_wrap_selection_command_copies_envelope() {
        let mut h = harness("https://claude.ai/chat/1").await;
        let mock = h
            .server
            .mock("POST", "/gap/wrap")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({ "content": "Hello", "platform": "claude.ai" })),
                Matcher::Regex(r#""chat_id":"cmd_"#.to_string()),
            ]))
            .with_status(200)
            .with_body(json!({ "gap_markdown": ENVELOPE }).to_string())
            .create_async()
            .await;
        h.page.set_page_selection("Hello");

        let outcome = h.runtime.run_command(KeyboardCommand::WrapSelection).await.unwrap();
        assert_eq!(outcome, CommandOutcome::Completed { text: ENVELOPE.to_string() });
        assert_eq!(h.os.get(), ENVELOPE);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_wrap_selection_command_failure_is_reported() {
        let mut h = harness("https://claude.ai/").await;
        let _mock = h.server.mock("POST", "/gap/wrap").with_status(500).create_async().await;
        h.page.set_page_selection("Hello");
        let mut events = h.runtime.subscribe();

        let err = h.runtime.run_command(KeyboardCommand::WrapSelection).await.unwrap_err();
        assert_eq!(err.to_string(), "Service error: 500");
        assert_eq!(
            last_message(&h.page),
            ("Error: Service error: 500".to_string(), NotificationLevel::Error)
        );

        match events.recv().await.unwrap() {
            AppEvent::Notification(n) => {
                assert_eq!(n.context, ContextKind::Background);
                assert_eq!(n.message, "Error: Service error: 500");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wrap_selection_command_skips_empty_selection() {
        let h = harness("https://claude.ai/").await;
        let outcome = h.runtime.run_command(KeyboardCommand::WrapSelection).await.unwrap();
        assert!(!outcome.is_completed());
    }

    #[tokio::test]
    async fn test_quick_transform_command() {
        let mut h = harness("https://gemini.google.com/app").await;
        let _mock = h
            .server
            .mock("POST", "/gap/transform")
            .match_body(Matcher::PartialJson(json!({ "target_platform": "gemini" })))
            .with_status(200)
            .with_body(json!({ "transformed_content": "Hello, Gemini" }).to_string())
            .create_async()
            .await;

        h.os.set("plain text");
        let skipped = h.runtime.run_command(KeyboardCommand::QuickTransform).await.unwrap();
        assert!(!skipped.is_completed());

        h.os.set(ENVELOPE);
        let done = h.runtime.run_command(KeyboardCommand::QuickTransform).await.unwrap();
        assert_eq!(done.text(), Some("Hello, Gemini"));
        assert_eq!(h.os.get(), "Hello, Gemini");
    }

    #[tokio::test]
    async fn test_popup_wrap_selection_uses_thread_id() {
        let settings = PersistentSettings {
            last_thread_id: Some("thread-7".into()),
            ..Default::default()
        };
        let mut h = harness_with("https://poe.com/", settings).await;
        let mock = h
            .server
            .mock("POST", "/gap/wrap")
            .match_body(Matcher::PartialJson(json!({ "thread_id": "thread-7", "platform": "poe" })))
            .with_status(200)
            .with_body(json!({ "gap_markdown": ENVELOPE }).to_string())
            .create_async()
            .await;

        assert_eq!(h.runtime.popup().wrap_selection().await.unwrap(), None);
        assert_eq!(
            last_message(&h.popup_page),
            ("Please select some text on the page first".to_string(), NotificationLevel::Warning)
        );

        h.page.set_page_selection("Hello");
        let wrapped = h.runtime.popup().wrap_selection().await.unwrap();
        assert_eq!(wrapped.as_deref(), Some(ENVELOPE));
        assert_eq!(h.os.get(), ENVELOPE);
        assert_eq!(last_message(&h.popup_page).0, "Selection wrapped and copied!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_popup_transform_clipboard_honours_default_platform() {
        let settings = PersistentSettings {
            auto_detect_platform: false,
            default_platform: PlatformId::Copilot,
            ..Default::default()
        };
        let mut h = harness_with("https://claude.ai/", settings).await;
        let mock = h
            .server
            .mock("POST", "/gap/transform")
            .match_body(Matcher::PartialJson(json!({ "target_platform": "copilot" })))
            .with_status(200)
            .with_body(json!({ "transformed_content": "for copilot" }).to_string())
            .create_async()
            .await;
        let input = h.page.add_element("textarea", &[]);

        h.os.set("no envelope here");
        assert_eq!(h.runtime.popup().transform_clipboard().await.unwrap(), None);
        assert_eq!(
            last_message(&h.popup_page),
            ("Clipboard does not contain GAP content".to_string(), NotificationLevel::Warning)
        );

        h.os.set(ENVELOPE);
        let out = h.runtime.popup().transform_clipboard().await.unwrap();
        assert_eq!(out.as_deref(), Some("for copilot"));
        assert_eq!(h.os.get(), "for copilot");
        assert_eq!(h.page.value(input).unwrap(), "for copilot");
        assert_eq!(last_message(&h.popup_page).0, "Content transformed and copied!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_popup_transform_empty_clipboard() {
        let h = harness("https://claude.ai/").await;
        assert_eq!(h.runtime.popup().transform_clipboard().await.unwrap(), None);
        assert_eq!(
            last_message(&h.popup_page),
            ("Could not read clipboard".to_string(), NotificationLevel::Error)
        );
    }

    #[tokio::test]
    async fn test_popup_service_status() {
        let mut h = harness("https://claude.ai/").await;
        let offline = h.runtime.popup().check_service_status().await;
        assert_eq!(offline, ServiceStatus::Offline);
        assert_eq!(last_message(&h.popup_page).0, "GAP service is not running");

        let _mock = h
            .server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(json!({ "status": "healthy", "version": "0.1.0" }).to_string())
            .create_async()
            .await;
        let online = h.runtime.popup().check_service_status().await;
        assert_eq!(online, ServiceStatus::Online { version: "0.1.0".into() });
        assert_eq!(last_message(&h.popup_page).0, "Service connected");
    }

    #[tokio::test]
    async fn test_content_transform_from_clipboard_inserts_at_cursor() {
        let mut h = harness("https://perplexity.ai/").await;
        let _mock = h
            .server
            .mock("POST", "/gap/transform")
            .match_body(Matcher::PartialJson(json!({ "target_platform": "perplexity" })))
            .with_status(200)
            .with_body(json!({ "transformed_content": "NEW " }).to_string())
            .create_async()
            .await;
        let input = h.page.add_element("textarea", &[]);
        h.page.set_value(input, "before after");
        h.page.set_selection_range(input, 7, 7);
        h.page.focus(input);

        h.os.set("nothing");
        assert_eq!(h.runtime.content().transform_from_clipboard().await.unwrap(), None);
        assert_eq!(last_message(&h.page).0, "No GAP content in clipboard");

        h.os.set("[GAP:START] cut short");
        assert_eq!(h.runtime.content().transform_from_clipboard().await.unwrap(), None);
        assert_eq!(
            last_message(&h.page),
            ("No GAP content in clipboard".to_string(), NotificationLevel::Warning)
        );

        h.os.set(ENVELOPE);
        h.runtime.content().transform_from_clipboard().await.unwrap();
        assert_eq!(h.page.value(input).unwrap(), "before NEW after");
        assert_eq!(last_message(&h.page).0, "Content transformed and inserted!");
    }

    #[tokio::test]
    async fn test_content_wrap_current_selection_reports_service_error() {
        let mut h = harness("https://claude.ai/").await;
        let _mock = h.server.mock("POST", "/gap/wrap").with_status(503).create_async().await;
        h.page.set_page_selection("Hello");

        assert!(h.runtime.content().wrap_current_selection().await.is_err());
        assert_eq!(
            last_message(&h.page),
            ("Error: Service error: 503".to_string(), NotificationLevel::Error)
        );
    }

    #[tokio::test]
    async fn test_detect_entities_in_selection() {
        let mut h = harness("https://claude.ai/").await;
        let _mock = h
            .server
            .mock("POST", "/gap/wrap")
            .match_body(Matcher::PartialJson(json!({ "platform": "analysis" })))
            .with_status(200)
            .with_body(json!({ "gap_markdown": ENVELOPE }).to_string())
            .create_async()
            .await;
        h.page.set_page_selection("Mercury and Apple");

        let entities = h.runtime.content().detect_entities_in_selection().await.unwrap();
        assert_eq!(entities, vec!["Mercury", "Apple"]);
        assert_eq!(
            last_message(&h.page),
            ("Found entities: Mercury, Apple".to_string(), NotificationLevel::Info)
        );
    }

    #[tokio::test]
    async fn test_settings_edit_is_broadcast() {
        let h = harness("https://claude.ai/").await;
        let mut events = h.runtime.subscribe();

        h.runtime.popup().set_default_platform(PlatformId::Gemini).await.unwrap();

        let settings = h.runtime.settings().get().await;
        assert_eq!(settings.default_platform, PlatformId::Gemini);
        assert_eq!(settings.service_url, h.server.url());

        loop {
            match events.recv().await.unwrap() {
                AppEvent::SettingsUpdated(s) => {
                    assert_eq!(s.default_platform, PlatformId::Gemini);
                    break;
                }
                AppEvent::Notification(_) => continue,
            }
        }
    }
}
