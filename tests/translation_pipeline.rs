//! 翻译管道集成测试
//!
//! 收集、排队、批次调度和写回文档的端到端行为

use std::rc::Rc;
use std::time::Duration;

use serde_json::json;
use tokio::task::LocalSet;

use dynamic_translator::network::{AjaxRequest, AjaxResponse};
use dynamic_translator::parsers::html::dom::{
    create_element, find_by_id, find_descendants, get_node_name, set_text_content, text_content,
};
use dynamic_translator::translation::{
    BatchDispatcher, CacheKey, CurrentLanguage, MutationWatcher, RemoteTranslationClient,
    TextCollector, TranslationQueue, TranslationRequest,
};
use dynamic_translator::Document;

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{HtmlTestHelper, RecordingTransport};

struct Pipeline {
    document: Rc<Document>,
    queue: Rc<TranslationQueue>,
    dispatcher: Rc<BatchDispatcher>,
    transport: Rc<RecordingTransport>,
}

fn pipeline(html: &str, transport: RecordingTransport) -> Pipeline {
    let document = Rc::new(Document::parse(html));
    let transport = Rc::new(transport);
    let client = Rc::new(RemoteTranslationClient::new(
        transport.clone(),
        document.clone(),
        "nonce-123",
    ));
    let queue = Rc::new(TranslationQueue::new());
    let dispatcher = BatchDispatcher::new(queue.clone(), client);
    Pipeline {
        document,
        queue,
        dispatcher,
        transport,
    }
}

/// 排队内容修剪后总是长于 3 个字符
#[test]
fn test_queue_rejects_trivial_content() {
    let queue = TranslationQueue::new();

    assert!(!queue.push(TranslationRequest::detached("abc", "en", "it")));
    assert!(!queue.push(TranslationRequest::detached("   ok   ", "en", "it")));
    assert!(!queue.push(TranslationRequest::detached("", "en", "it")));
    assert!(queue.push(TranslationRequest::detached("  Shop  ", "en", "it")));

    assert_eq!(queue.contents(), vec!["Shop".to_string()]);
    assert!(queue.contents().iter().all(|content| content.trim().chars().count() > 3));
}

#[test]
fn test_collector_skips_scripts_and_short_text() {
    let document = Document::parse(HtmlTestHelper::dropdown_page());
    let collector = TextCollector::new();

    let texts: Vec<String> = collector
        .collect_text_nodes(&document.root())
        .iter()
        .map(|node| text_content(node).trim().to_string())
        .collect();

    assert!(texts.contains(&"Hello world".to_string()));
    assert!(texts.contains(&"Our products are handmade".to_string()));
    assert!(!texts.contains(&"OK".to_string()));
    assert!(!texts.iter().any(|text| text.contains("Not translated text")));
}

/// 一个周期最多取出 5 条，周期进行中再次 drain 不做任何事
#[tokio::test(start_paused = true)]
async fn test_drain_takes_five_per_cycle() {
    LocalSet::new()
        .run_until(async {
            let p = pipeline("<body><p>placeholder</p></body>", RecordingTransport::echo());
            for i in 0..8 {
                p.queue.push(TranslationRequest::detached(&format!("Item number {}", i), "en", "de"));
            }

            assert_eq!(p.dispatcher.drain(), 5);
            assert_eq!(p.queue.len(), 3);
            assert_eq!(p.dispatcher.drain(), 0);
            assert_eq!(p.queue.len(), 3);

            tokio::time::sleep(Duration::from_millis(999)).await;
            assert_eq!(p.queue.len(), 3);
            assert_eq!(p.transport.request_count(), 5);

            tokio::time::sleep(Duration::from_millis(2)).await;
            assert!(p.queue.is_empty());

            p.dispatcher.wait_idle().await;
            assert_eq!(p.transport.request_count(), 8);
            assert_eq!(p.dispatcher.stats().batches, 2);
        })
        .await;
}

/// 没有元素引用的请求替换所有内容完全相同的文本节点
#[tokio::test(start_paused = true)]
async fn test_content_match_replaces_exact_nodes() {
    LocalSet::new()
        .run_until(async {
            let html = r#"<body>
                <p id="a">Hello world</p>
                <p id="b">  Hello world  </p>
                <p id="c">Hello world!</p>
                <p id="d">Hello <b>world</b></p>
            </body>"#;
            let p = pipeline(
                html,
                RecordingTransport::new(|_| Ok(AjaxResponse::ok(json!({ "translation": "Ciao mondo" })))),
            );

            p.queue.push(TranslationRequest::detached("Hello world", "en", "it"));
            p.dispatcher.drain();
            p.dispatcher.wait_idle().await;

            let root = p.document.root();
            let text = |id: &str| text_content(&find_by_id(&root, id).unwrap());
            assert_eq!(text("a"), "Ciao mondo");
            assert_eq!(text("b"), "Ciao mondo");
            assert_eq!(text("c"), "Hello world!");
            assert_eq!(text("d"), "Hello world");
            assert_eq!(p.dispatcher.stats().patched_by_content, 1);
        })
        .await;
}

/// 请求携带确定的缓存键，失败的条目被丢弃且不重试
#[tokio::test(start_paused = true)]
async fn test_cache_key_and_failures() {
    LocalSet::new()
        .run_until(async {
            let p = pipeline(
                "<body><p>Good evening</p><p>Broken entry</p></body>",
                RecordingTransport::new(|request| match request {
                    AjaxRequest::TranslateElement { content, .. } if content == "Broken entry" => {
                        Ok(AjaxResponse::error(json!("quota exceeded")))
                    }
                    _ => Ok(AjaxResponse::ok(json!({ "translation": "Buonasera" }))),
                }),
            );

            p.queue.push(TranslationRequest::detached("Good evening", "en", "it"));
            p.queue.push(TranslationRequest::detached("Broken entry", "en", "it"));
            p.dispatcher.drain();
            p.dispatcher.wait_idle().await;

            let expected = CacheKey::generate("Good evening", "en", "it");
            assert_eq!(expected, CacheKey::generate("Good evening", "en", "it"));
            assert_ne!(expected, CacheKey::generate("Good evening", "en", "de"));

            match &p.transport.requests()[0] {
                AjaxRequest::TranslateElement {
                    cache_key, nonce, ..
                } => {
                    assert_eq!(cache_key.as_deref(), Some(expected.as_str()));
                    assert_eq!(nonce, "nonce-123");
                }
                other => panic!("unexpected request {:?}", other),
            }

            assert_eq!(p.transport.request_count(), 2);
            assert_eq!(p.dispatcher.stats().failed, 1);
            assert_eq!(text_content(&p.document.body().unwrap()), "BuonaseraBroken entry");
        })
        .await;
}

/// 插入的内容只入队，下一次 drain 才会发出
#[tokio::test(start_paused = true)]
async fn test_watcher_queues_inserted_content() {
    LocalSet::new()
        .run_until(async {
            let p = pipeline(HtmlTestHelper::dropdown_page(), RecordingTransport::echo());
            p.document.observe(Rc::new(MutationWatcher::new(
                p.queue.clone(),
                "en",
                CurrentLanguage::new("it"),
            )));

            let comments = find_by_id(&p.document.root(), "comments").unwrap();
            let comment = create_element("p", &[("class", "comment")]);
            set_text_content(&comment, "Great service, thanks!");
            p.document.append_child(&comments, comment.clone());

            let tiny = create_element("p", &[]);
            set_text_content(&tiny, "ok");
            p.document.append_child(&comments, tiny);

            assert_eq!(p.queue.contents(), vec!["Great service, thanks!".to_string()]);

            tokio::time::sleep(Duration::from_secs(5)).await;
            assert_eq!(p.transport.request_count(), 0);

            p.dispatcher.drain();
            p.dispatcher.wait_idle().await;
            assert_eq!(text_content(&comment), "[it] Great service, thanks!");
            assert_eq!(p.dispatcher.stats().patched_direct, 1);
        })
        .await;
}

/// 节点移出文档后写回不会出错
#[tokio::test(start_paused = true)]
async fn test_patch_to_detached_node_is_harmless() {
    LocalSet::new()
        .run_until(async {
            let p = pipeline(
                "<body><div id=\"feed\"><p>Temporary notice</p></div></body>",
                RecordingTransport::echo().with_latency(Duration::from_millis(500)),
            );
            let feed = find_by_id(&p.document.root(), "feed").unwrap();
            let paragraph = find_descendants(&feed, |n| get_node_name(n) == Some("p")).remove(0);

            for node in TextCollector::new().collect_text_nodes(&feed) {
                let content = text_content(&node);
                p.queue.push(TranslationRequest::for_node(node, &content, "en", "fr"));
            }
            p.dispatcher.drain();

            tokio::time::sleep(Duration::from_millis(100)).await;
            p.document.remove(&feed);

            p.dispatcher.wait_idle().await;
            assert_eq!(text_content(&paragraph), "[fr] Temporary notice");
            assert!(find_by_id(&p.document.root(), "feed").is_none());
        })
        .await;
}
