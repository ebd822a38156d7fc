//! Agent 集成测试：分类、分发、会话状态与读写往返

use std::sync::Arc;
use std::time::Duration;

use codepilot::classifier::ActionClassifier;
use codepilot::core::InactivePolicy;
use codepilot::executors::{AnalyzeExecutor, ActionExecutor, CreateExecutor, ExecutorContext};
use codepilot::host::{InMemoryWorkspace, LocalWorkspace, NotifyLevel, ScriptedUi};
use codepilot::llm::{BoundedLlm, LlmClient, MockLlmClient, ScriptedLlmClient};
use codepilot::{Action, ActionKind, Agent, AgentSettings, Request};
use tempfile::TempDir;

fn settings() -> AgentSettings {
    AgentSettings {
        request_timeout: Duration::from_millis(500),
        stream_timeout: Duration::from_millis(500),
        ..AgentSettings::default()
    }
}

async fn started_agent(
    llm: Arc<dyn LlmClient>,
    files: Arc<InMemoryWorkspace>,
    ui: Arc<ScriptedUi>,
) -> Agent {
    let agent = Agent::new(llm, files, ui, settings());
    agent.start().await;
    agent
}

fn context(
    llm: Arc<dyn LlmClient>,
    files: Arc<InMemoryWorkspace>,
    ui: Arc<ScriptedUi>,
) -> ExecutorContext {
    ExecutorContext {
        llm: BoundedLlm::new(llm, Duration::from_secs(1), Duration::from_secs(1)),
        files,
        ui,
        picker_limit: 20,
        open_first_match: true,
    }
}

#[tokio::test]
async fn test_response_carries_request_id_and_clears_task() {
    let files = Arc::new(InMemoryWorkspace::default().with_file("src/app.ts", "login();"));
    let agent = started_agent(Arc::new(MockLlmClient), files, Arc::new(ScriptedUi::new())).await;

    for prompt in [
        "hello",
        "find all usages of login",
        "explain this",
        "update the code",
        "create a new file called foo.ts",
    ] {
        let request = Request::new(prompt).unwrap();
        let response = agent.process_request(&request).await;
        assert_eq!(response.request_id, request.id(), "prompt: {prompt}");
        assert_eq!(agent.session().await.current_task, None, "prompt: {prompt}");
    }
}

#[tokio::test]
async fn test_fallback_classification_when_llm_is_unparseable() {
    let llm = Arc::new(ScriptedLlmClient::new().always("I think you want to create something"));
    let classifier = ActionClassifier::new(BoundedLlm::new(
        llm,
        Duration::from_secs(1),
        Duration::from_secs(1),
    ));

    let create = classifier
        .determine(&Request::new("create a new file called foo.ts").unwrap())
        .await;
    assert_eq!(create.kind, ActionKind::Create);

    let search = classifier
        .determine(&Request::new("find all usages of login").unwrap())
        .await;
    assert_eq!(search.kind, ActionKind::Search);
}

#[tokio::test]
async fn test_fallback_classification_on_llm_timeout() {
    let slow = ScriptedLlmClient::new()
        .always(r#"{"type": "respond"}"#)
        .with_delay(Duration::from_millis(300));
    let classifier = ActionClassifier::new(BoundedLlm::new(
        Arc::new(slow),
        Duration::from_millis(20),
        Duration::from_millis(20),
    ));
    let action = classifier
        .determine(&Request::new("find all usages of login").unwrap())
        .await;
    assert_eq!(action.kind, ActionKind::Search);
    assert!(action.reasoning.starts_with("Keyword fallback"));
}

#[tokio::test]
async fn test_search_with_zero_matches_is_informational() {
    let files = Arc::new(InMemoryWorkspace::default().with_file("src/a.ts", "const a = 1;"));
    let ui = Arc::new(ScriptedUi::new());
    let llm = ScriptedLlmClient::new().reply(r#"{"type": "search", "reasoning": "lookup"}"#);
    let agent = started_agent(Arc::new(llm), files.clone(), ui.clone()).await;

    let request = Request::new("find all usages of nonexistent_symbol").unwrap();
    let response = agent.process_request(&request).await;

    assert_eq!(response.action.kind, ActionKind::Search);
    assert!(response.action.content.unwrap().starts_with("No matches found"));
    assert!(files.opened().is_empty());
    assert!(ui.notifications().iter().all(|(l, _)| *l != NotifyLevel::Error));
}

#[tokio::test]
async fn test_create_strips_fence_before_writing() {
    let files = Arc::new(InMemoryWorkspace::default());
    let llm = ScriptedLlmClient::new()
        .reply(r#"{"type": "create", "reasoning": "new file"}"#)
        .reply("```js\nconsole.log(1)\n```");
    let agent = started_agent(Arc::new(llm), files.clone(), Arc::new(ScriptedUi::new())).await;

    let request = Request::new("write a script that logs one").unwrap();
    let response = agent.process_request(&request).await;

    assert_eq!(response.action.kind, ActionKind::Create);
    assert_eq!(response.action.content.as_deref(), Some("console.log(1)"));
    let path = response.action.target.unwrap();
    assert_eq!(path, "/workspace/script.js");
    assert_eq!(files.file(&path).as_deref(), Some("console.log(1)"));
}

#[tokio::test]
async fn test_edit_with_empty_output_never_writes() {
    let files = Arc::new(
        InMemoryWorkspace::default()
            .with_file("src/util.ts", "export const x = 1;")
            .with_active("src/util.ts"),
    );
    let ui = Arc::new(ScriptedUi::new());
    let llm = ScriptedLlmClient::new()
        .reply(r#"{"type": "edit", "reasoning": "change"}"#)
        .reply("```ts\n```");
    let agent = started_agent(Arc::new(llm), files.clone(), ui.clone()).await;

    let request = Request::new("rename x to y").unwrap();
    let response = agent.process_request(&request).await;

    assert_eq!(response.action.kind, ActionKind::Respond);
    assert!(response.action.content.unwrap().starts_with("Error:"));
    assert!(files.writes().is_empty());
    assert_eq!(files.file("src/util.ts").as_deref(), Some("export const x = 1;"));
    assert_eq!(agent.session().await.current_task, None);
}

#[tokio::test]
async fn test_create_then_analyze_reads_back_written_content() {
    let files = Arc::new(InMemoryWorkspace::default());
    let create_llm =
        Arc::new(ScriptedLlmClient::new().reply("```ts\nexport const answer = 42;\n```"));
    let create = CreateExecutor::new(context(
        create_llm,
        files.clone(),
        Arc::new(ScriptedUi::new()),
    ));

    let request = Request::new("create a file called answer.ts").unwrap();
    let created = create
        .execute(&request, &Action::classified(ActionKind::Create, "new file"))
        .await;
    assert_eq!(created.kind, ActionKind::Create);
    let path = created.target.unwrap();

    let ui = Arc::new(ScriptedUi::new().pick(Some(path.as_str())));
    let analyze = AnalyzeExecutor::new(context(Arc::new(MockLlmClient), files.clone(), ui));
    let analyzed = analyze
        .execute(
            &Request::new("what does it export?").unwrap(),
            &Action::classified(ActionKind::Analyze, "question"),
        )
        .await;

    assert_eq!(analyzed.kind, ActionKind::Analyze);
    assert_eq!(analyzed.target.as_deref(), Some(path.as_str()));
    assert!(analyzed.content.unwrap().contains("export const answer = 42;"));
    assert_eq!(files.file(&path).as_deref(), Some("export const answer = 42;"));
}

#[tokio::test]
async fn test_local_workspace_round_trip() {
    let dir = TempDir::new().unwrap();
    let workspace = Arc::new(LocalWorkspace::new(dir.path()));
    let agent = Agent::new(
        Arc::new(MockLlmClient),
        workspace.clone(),
        Arc::new(ScriptedUi::new()),
        settings(),
    );
    agent.start().await;

    let created = agent
        .process_request(&Request::new("create a new file called hello.js").unwrap())
        .await;
    assert_eq!(created.action.kind, ActionKind::Create);
    let path = created.action.target.unwrap();
    assert!(path.ends_with("hello.js"));
    let on_disk = std::fs::read_to_string(dir.path().join("hello.js")).unwrap();
    assert_eq!(Some(on_disk.as_str()), created.action.content.as_deref());

    let analyzed = agent
        .process_request(&Request::new("explain what it does").unwrap())
        .await;
    assert_eq!(analyzed.action.kind, ActionKind::Analyze);
    assert!(analyzed.action.content.unwrap().contains(&on_disk));
}

#[tokio::test]
async fn test_inactive_policies() {
    let files = Arc::new(InMemoryWorkspace::default());

    let reject = Agent::new(
        Arc::new(MockLlmClient),
        files.clone(),
        Arc::new(ScriptedUi::new()),
        settings(),
    );
    let request = Request::new("hello").unwrap();
    let response = reject.process_request(&request).await;
    assert_eq!(response.request_id, request.id());
    assert_eq!(response.action.kind, ActionKind::Respond);
    assert_eq!(response.action.content.as_deref(), Some("Error: agent is not active"));

    let process = Agent::new(
        Arc::new(MockLlmClient),
        files,
        Arc::new(ScriptedUi::new()),
        AgentSettings {
            inactive_policy: InactivePolicy::Process,
            ..settings()
        },
    );
    let response = process.process_request(&request).await;
    assert_eq!(response.action.content.as_deref(), Some("Echo from Mock: hello"));
    assert!(!process.is_active().await);
}

#[tokio::test]
async fn test_streaming_bypasses_classification() {
    let llm = Arc::new(ScriptedLlmClient::new().reply("streamed answer"));
    let files = Arc::new(InMemoryWorkspace::default());
    let agent = started_agent(llm.clone(), files.clone(), Arc::new(ScriptedUi::new())).await;

    let mut received = String::new();
    let request = Request::new("create a new file called foo.ts").unwrap();
    let response = agent
        .process_request_streaming(&request, &mut |t: &str| received.push_str(t))
        .await;

    assert_eq!(received, "streamed answer");
    assert_eq!(response.action.kind, ActionKind::Respond);
    assert_eq!(llm.prompts(), vec!["create a new file called foo.ts"]);
    assert!(files.writes().is_empty());
}
