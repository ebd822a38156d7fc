//! 关键词回退分类：纯函数，不依赖 LLM
//!
//! 顺序固定、先匹配先返回：Create -> Edit -> Search（仅在无 Create 迹象时）-> Analyze -> Respond。
//! Create 放在最前，因为 "create a function to search X" 这类请求同时含有搜索 / 分析的字眼。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::{Action, ActionKind};

const CREATE_VERBS: &[&str] = &[
    "create", "new", "add", "generate", "make", "build", "write", "implement",
];
const CREATE_NOUNS: &[&str] = &[
    "component", "function", "class", "file", "script", "module", "service",
];
const EDIT_WORDS: &[&str] = &["edit", "modify", "change", "update", "fix", "refactor"];
const SEARCH_WORDS: &[&str] = &["search", "find"];
const ANALYZE_WORDS: &[&str] = &["analyze", "review", "explain", "check", "examine"];

/// 带已知扩展名的文件名，如 foo.ts、Button.tsx
static FILENAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b[\w-]+\.(?:js|jsx|ts|tsx|css|scss|html|json|py|rs|go|java|md|txt|sh|ya?ml|toml)\b",
    )
    .expect("static filename regex")
});

/// "create a new file" 一类短语
static CREATE_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b(?:create|make|generate|add|write)\s+(?:a\s+|an\s+)?(?:new\s+)?",
        r"(?:file|component|function|class|script|module|service)\b",
    ))
    .expect("static create phrase regex")
});

static LOOK_FOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\blook\s+for\b").expect("static look-for regex"));

/// 小写后按非字母数字切词
fn words(lower: &str) -> Vec<&str> {
    lower
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .collect()
}

fn first_word<'a>(words: &[&'a str], candidates: &[&str]) -> Option<&'a str> {
    words.iter().copied().find(|w| candidates.contains(w))
}

/// 返回触发 Create 的迹象（短语、文件名、动词或名词）
pub fn create_indicator(prompt: &str) -> Option<String> {
    let lower = prompt.to_lowercase();
    if let Some(m) = CREATE_PHRASE_RE.find(&lower) {
        return Some(m.as_str().to_string());
    }
    let ws = words(&lower);
    if let Some(w) = first_word(&ws, CREATE_VERBS).or_else(|| first_word(&ws, CREATE_NOUNS)) {
        return Some(w.to_string());
    }
    FILENAME_RE.find(&lower).map(|m| m.as_str().to_string())
}

/// 关键词分类，结果附带命中的规则作为理由
pub fn classify_by_keywords(prompt: &str) -> Action {
    let lower = prompt.to_lowercase();
    let ws = words(&lower);

    if let Some(hit) = create_indicator(prompt) {
        return Action::classified(
            ActionKind::Create,
            format!("Keyword fallback: create indicator '{hit}'"),
        );
    }
    if let Some(hit) = first_word(&ws, EDIT_WORDS) {
        return Action::classified(
            ActionKind::Edit,
            format!("Keyword fallback: edit keyword '{hit}'"),
        );
    }
    let search_hit = first_word(&ws, SEARCH_WORDS)
        .map(String::from)
        .or_else(|| LOOK_FOR_RE.find(&lower).map(|m| m.as_str().to_string()));
    if let Some(hit) = search_hit {
        return Action::classified(
            ActionKind::Search,
            format!("Keyword fallback: search keyword '{hit}'"),
        );
    }
    if let Some(hit) = first_word(&ws, ANALYZE_WORDS) {
        return Action::classified(
            ActionKind::Analyze,
            format!("Keyword fallback: analyze keyword '{hit}'"),
        );
    }
    Action::classified(
        ActionKind::Respond,
        "Keyword fallback: no action keyword, answering directly",
    )
}
