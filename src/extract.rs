//! Default regex-based function extractor / 默认的正则函数提取器
//!
//! Best-effort: per-language definition patterns, a generic fallback for
//! unknown languages. Malformed input never fails, it just yields fewer
//! functions. / 尽力而为：按语言匹配定义模式，未知语言走通用回退。

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::store::{ExtractedFunction, FunctionExtractor};

static PYTHON_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(").unwrap());

static RUST_FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+([A-Za-z_]\w*)")
        .unwrap()
});

static JS_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)\bfunction\s+([A-Za-z_$][\w$]*)\s*\(").unwrap());

static JS_ARROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\b(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:\([^)\n]*\)|[A-Za-z_$][\w$]*)\s*=>")
        .unwrap()
});

static GO_FUNC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^func\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)\s*\(").unwrap());

static JAVA_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\b(?:public|protected|private)\s+(?:static\s+)?(?:final\s+)?[\w<>\[\],\s]+?\s+(\w+)\s*\(")
        .unwrap()
});

/// Regex-based extractor covering the common corpus languages / 覆盖常见语言的正则提取器
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexFunctionExtractor;

impl RegexFunctionExtractor {
    pub fn new() -> Self {
        Self
    }

    fn patterns_for(language: Option<&str>) -> Vec<&'static Regex> {
        let lang = language.map(|l| l.trim().to_lowercase()).unwrap_or_default();
        match lang.as_str() {
            "python" | "py" => vec![&PYTHON_DEF],
            "rust" | "rs" => vec![&RUST_FN],
            "javascript" | "js" | "typescript" | "ts" | "jsx" | "tsx" => {
                vec![&JS_FUNCTION, &JS_ARROW]
            }
            "go" | "golang" => vec![&GO_FUNC],
            "java" => vec![&JAVA_METHOD],
            // Unknown language: try everything / 未知语言：全部尝试
            _ => vec![&PYTHON_DEF, &RUST_FN, &JS_FUNCTION, &JS_ARROW, &GO_FUNC],
        }
    }
}

impl FunctionExtractor for RegexFunctionExtractor {
    fn extract_functions(
        &self,
        content: &str,
        language: Option<&str>,
    ) -> Result<Vec<ExtractedFunction>> {
        let mut functions = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for pattern in Self::patterns_for(language) {
            for caps in pattern.captures_iter(content) {
                let Some(name) = caps.get(1) else { continue };
                if name.as_str().is_empty() || !seen.insert(name.as_str().to_string()) {
                    continue;
                }
                let line = content[..name.start()].matches('\n').count() + 1;
                functions.push(ExtractedFunction {
                    name: name.as_str().to_string(),
                    line,
                });
            }
        }

        Ok(functions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(content: &str, language: &str) -> Vec<String> {
        RegexFunctionExtractor::new()
            .extract_functions(content, Some(language))
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect()
    }

    #[test]
    fn test_python_defs() {
        let code = "def foo():\n    pass\n\nasync def bar(x):\n    return x\n";
        assert_eq!(names(code, "python"), vec!["foo", "bar"]);
    }

    #[test]
    fn test_rust_fns() {
        let code = "pub fn alpha() {}\nasync fn beta() {}\nfn gamma(x: u32) -> u32 { x }\n";
        assert_eq!(names(code, "rust"), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_javascript_functions_and_arrows() {
        let code = "function hello() {}\nconst world = async (a, b) => a + b;\nlet id = x => x;\n";
        let found = names(code, "javascript");
        assert!(found.contains(&"hello".to_string()));
        assert!(found.contains(&"world".to_string()));
        assert!(found.contains(&"id".to_string()));
    }

    #[test]
    fn test_go_funcs() {
        let code = "func main() {}\nfunc (s *Server) Handle(w http.ResponseWriter) {}\n";
        assert_eq!(names(code, "go"), vec!["main", "Handle"]);
    }

    #[test]
    fn test_line_numbers() {
        let code = "# header\n\ndef later():\n    pass\n";
        let funcs = RegexFunctionExtractor::new()
            .extract_functions(code, Some("python"))
            .unwrap();
        assert_eq!(funcs[0].line, 3);
    }

    #[test]
    fn test_malformed_input_yields_empty() {
        let funcs = RegexFunctionExtractor::new()
            .extract_functions("\u{0}\u{1}garbage((((", Some("python"))
            .unwrap();
        assert!(funcs.is_empty());
    }
}
