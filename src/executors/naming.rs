//! 新文件命名
//!
//! 优先级：(a) 内容开头注释中的文件名 -> (b) prompt 中显式的文件名 ->
//! (c) 按内容 / 关键词推断扩展名，并从 prompt 名词取通用名 -> (d) 无通用名时取内容中的标识符。

use once_cell::sync::Lazy;
use regex::Regex;

/// 注释行只写了一个文件名，如 `// src/Button.tsx`、`# filename: utils.py`
static CONTENT_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^\s*(?://+|#|/\*+|<!--|--)\s*(?:(?:file(?:name)?|path)\s*:\s*)?",
        r"([\w./-]+\.[A-Za-z][A-Za-z0-9]{0,5})\s*(?:\*/|-->)?\s*$",
    ))
    .expect("static content name regex")
});

static PROMPT_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b((?:[\w-]+/)*[\w-]+\.",
        r"(?:jsx|js|tsx|ts|scss|css|html|json|py|rs|go|java|md|txt|sh|ya?ml|toml))\b",
    ))
    .expect("static prompt name regex")
});

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?m)^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?",
        r"(?:class|function|const|def)\s+([A-Za-z_][A-Za-z0-9_]*)",
    ))
    .expect("static identifier regex")
});

static CSS_RULE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*[.#:@]?[\w\-\[\]=\x22, >:*]+\s*\{\s*[^{}]*[\w-]+\s*:\s*[^;{}]+;")
        .expect("static css regex")
});

static TS_HINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\binterface\s+\w+|:\s*(?:string|number|boolean|void)\b|\btype\s+\w+\s*=")
        .expect("static ts regex")
});

static PY_HINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?m)^\s*(?:def\s+\w+\s*\(.*\)\s*(?:->\s*[\w\[\], ]+)?:\s*$",
        r"|from\s+[\w.]+\s+import\s|if\s+__name__\s*==)",
    ))
    .expect("static python regex")
});

fn has_word(lower: &str, word: &str) -> bool {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w == word)
}

/// 规范化相对路径：去掉前导 `./` 与 `/`，拒绝 `..`
fn sanitize(path: &str) -> Option<String> {
    let path = path.trim().trim_start_matches("./").trim_start_matches('/');
    if path.is_empty() || path.split('/').any(|seg| seg == "..") {
        None
    } else {
        Some(path.to_string())
    }
}

/// (a) 内容前三个非空行中的文件名注释
pub fn name_from_content(content: &str) -> Option<String> {
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(3)
        .find_map(|line| CONTENT_NAME_RE.captures(line))
        .and_then(|c| c.get(1))
        .and_then(|m| sanitize(m.as_str()))
}

/// (b) prompt 中带已知扩展名的文件名
pub fn name_from_prompt(prompt: &str) -> Option<String> {
    PROMPT_NAME_RE
        .captures(prompt)
        .and_then(|c| c.get(1))
        .and_then(|m| sanitize(m.as_str()))
}

/// (c) 推断扩展名（含点）
pub fn infer_extension(prompt: &str, content: &str) -> &'static str {
    let lower = prompt.to_lowercase();
    let head = content.trim_start().to_lowercase();

    if head.starts_with("<!doctype") || head.starts_with("<html") || has_word(&lower, "html") {
        return ".html";
    }
    let looks_like_script = content.contains("function ") || content.contains("=>");
    if has_word(&lower, "css")
        || has_word(&lower, "stylesheet")
        || (!looks_like_script && CSS_RULE_RE.is_match(content))
    {
        return ".css";
    }
    let trimmed = content.trim_start();
    if has_word(&lower, "json")
        || ((trimmed.starts_with('{') || trimmed.starts_with('['))
            && serde_json::from_str::<serde_json::Value>(content).is_ok())
    {
        return ".json";
    }
    if has_word(&lower, "python") || PY_HINT_RE.is_match(content) {
        return ".py";
    }
    let typescript = has_word(&lower, "typescript")
        || has_word(&lower, "ts")
        || TS_HINT_RE.is_match(content);
    let react = has_word(&lower, "react")
        || has_word(&lower, "component")
        || content.contains("from 'react'")
        || content.contains("from \"react\"");
    if react || has_word(&lower, "tsx") {
        return ".tsx";
    }
    if typescript {
        return ".ts";
    }
    if has_word(&lower, "javascript")
        || has_word(&lower, "node")
        || looks_like_script
        || content.contains("const ")
        || content.contains("console.log")
    {
        return ".js";
    }
    ".txt"
}

/// (c) prompt 名词对应的通用文件名
pub fn generic_stem(prompt: &str, extension: &str) -> Option<&'static str> {
    let lower = prompt.to_lowercase();
    let by_noun = [
        ("component", "component"),
        ("styles", "styles"),
        ("style", "styles"),
        ("css", "styles"),
        ("service", "service"),
        ("module", "module"),
        ("script", "script"),
        ("config", "config"),
        ("configuration", "config"),
    ]
    .into_iter()
    .find(|(noun, _)| has_word(&lower, noun))
    .map(|(_, stem)| stem);
    by_noun.or(match extension {
        ".html" => Some("index"),
        ".css" => Some("styles"),
        _ => None,
    })
}

/// `LoginForm` / `login_form` / `HTTPServer` -> `login-form` / `login-form` / `http-server`
fn to_kebab_case(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
            if (prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower))
                && !out.ends_with('-')
            {
                out.push('-');
            }
        }
        out.extend(c.to_lowercase());
    }
    out.trim_matches('-').to_string()
}

/// (d) 内容中第一个 class / function / const / def 标识符，转为 kebab-case
pub fn identifier_stem(content: &str) -> Option<String> {
    IDENTIFIER_RE
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| to_kebab_case(m.as_str()))
        .filter(|s| !s.is_empty())
}

/// 按优先级得出新文件名（可含相对目录）
pub fn derive_file_name(prompt: &str, content: &str) -> String {
    if let Some(name) = name_from_content(content) {
        return name;
    }
    if let Some(name) = name_from_prompt(prompt) {
        return name;
    }
    let extension = infer_extension(prompt, content);
    let stem = generic_stem(prompt, extension)
        .map(String::from)
        .or_else(|| identifier_stem(content))
        .unwrap_or_else(|| "untitled".to_string());
    format!("{stem}{extension}")
}

/// 在文件名的扩展名前插入 `-n`：`styles.css` -> `styles-2.css`
pub fn with_suffix(name: &str, n: usize) -> String {
    let (dir, file) = match name.rfind('/') {
        Some(i) => (&name[..=i], &name[i + 1..]),
        None => ("", name),
    };
    match file.rfind('.') {
        Some(dot) if dot > 0 => format!("{dir}{}-{n}{}", &file[..dot], &file[dot..]),
        _ => format!("{dir}{file}-{n}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_from_leading_comment() {
        let content = "// src/components/Button.tsx\nexport const Button = () => null;";
        assert_eq!(
            derive_file_name("make a button", content),
            "src/components/Button.tsx"
        );
        assert_eq!(
            name_from_content("# filename: tools/report.py\nprint(1)").as_deref(),
            Some("tools/report.py")
        );
    }

    #[test]
    fn test_shebang_is_not_a_name() {
        assert_eq!(name_from_content("#!/usr/bin/env python\nprint(1)"), None);
    }

    #[test]
    fn test_name_from_prompt() {
        assert_eq!(
            derive_file_name("create a new file called foo.ts", "export {}"),
            "foo.ts"
        );
    }

    #[test]
    fn test_parent_dirs_rejected() {
        // `..` 不会进入匹配，只剩工作区内的相对路径
        assert_eq!(
            name_from_prompt("write ../../etc/passwd.txt").as_deref(),
            Some("etc/passwd.txt")
        );
        assert_eq!(name_from_content("// ../secret.js\n"), None);
    }

    #[test]
    fn test_extension_heuristics() {
        assert_eq!(infer_extension("", "<!DOCTYPE html><html></html>"), ".html");
        assert_eq!(infer_extension("", ".btn {\n  color: red;\n}"), ".css");
        assert_eq!(infer_extension("", "{\"name\": \"demo\"}"), ".json");
        assert_eq!(infer_extension("", "def main():\n    pass"), ".py");
        assert_eq!(
            infer_extension("a react component", "export default function App() {}"),
            ".tsx"
        );
        assert_eq!(infer_extension("", "interface User { name: string }"), ".ts");
        assert_eq!(infer_extension("", "console.log(1)"), ".js");
        assert_eq!(infer_extension("", "just some notes"), ".txt");
    }

    #[test]
    fn test_generic_stem_before_identifier() {
        assert_eq!(
            derive_file_name("build a login component", "export function LoginForm() {}"),
            "component.tsx"
        );
    }

    #[test]
    fn test_identifier_when_no_generic_stem() {
        assert_eq!(
            derive_file_name("a helper that adds numbers", "function add(a, b) { return a + b; }"),
            "add.js"
        );
        assert_eq!(derive_file_name("hello", "some notes"), "untitled.txt");
        assert_eq!(
            derive_file_name(
                "a date helper",
                "export class DateFormatter {}\nconst fmt = new DateFormatter();"
            ),
            "date-formatter.js"
        );
    }

    #[test]
    fn test_kebab_case() {
        assert_eq!(to_kebab_case("LoginForm"), "login-form");
        assert_eq!(to_kebab_case("parse_config"), "parse-config");
        assert_eq!(to_kebab_case("HTTPServer"), "http-server");
        assert_eq!(to_kebab_case("_private"), "private");
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(with_suffix("styles.css", 2), "styles-2.css");
        assert_eq!(with_suffix("src/app.test.ts", 1), "src/app.test-1.ts");
        assert_eq!(with_suffix("Makefile", 1), "Makefile-1");
        assert_eq!(with_suffix(".env", 1), ".env-1");
    }
}
