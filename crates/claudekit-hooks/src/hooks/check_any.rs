//! Forbidden-`any` scanner for changed TypeScript files
//!
//! The scan works on a stripped copy of the source in which comments,
//! string literals, and template literals are blanked out (newlines
//! preserved), so an `any` inside a comment or a string can never fire.
//! `expect.any(...)` is excluded in test files. `as any` is reported: it
//! is an explicit `any` in a type position.

use crate::hooks::{
    is_test_file, is_typescript_source, soft_skip, Hook, HookCategory, HookContext,
    HookDescriptor, HookOutcome,
};
use async_trait::async_trait;
use claudekit_core::constants::limits::DEFAULT_HOOK_TIMEOUT_MS;
use claudekit_core::error::Result;
use claudekit_core::output::ErrorBlock;
use claudekit_core::path::is_within;
use claudekit_core::HookEvent;
use once_cell::sync::Lazy;
use regex::Regex;

pub static CHECK_ANY_CHANGED: HookDescriptor = HookDescriptor {
    id: "check-any-changed",
    display_name: "Forbid `any` (changed file)",
    description: "Reject explicit `any` types in a changed TypeScript file",
    category: HookCategory::Validation,
    trigger_event: HookEvent::PostToolUse,
    dependencies: &[],
    default_timeout_ms: DEFAULT_HOOK_TIMEOUT_MS,
    default_command: None,
};

/// One offending occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnyUsage {
    /// 1-based line number
    pub line: usize,
    /// The original source line, trimmed
    pub text: String,
}

static ANY_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bany\b").expect("static regex"));

/// Scan TypeScript source for explicit `any` usages.
pub fn scan_any_usages(source: &str, test_file: bool) -> Vec<AnyUsage> {
    let stripped = strip_non_code(source);
    let mut usages = Vec::new();

    for (index, (stripped_line, original_line)) in
        stripped.lines().zip(source.lines()).enumerate()
    {
        for found in ANY_TOKEN.find_iter(stripped_line) {
            if test_file && stripped_line[..found.start()].trim_end().ends_with("expect.") {
                continue;
            }
            usages.push(AnyUsage {
                line: index + 1,
                text: original_line.trim().to_string(),
            });
            break; // one report per line is enough
        }
    }
    usages
}

/// Scanner mode stack entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    LineComment,
    BlockComment,
    Str(char),
    Template,
}

/// Blank out comments, strings, and template literals, preserving
/// newlines and code byte positions. Template interpolations (`${…}`)
/// count as code again, nested templates included.
fn strip_non_code(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut stack = vec![Mode::Code];
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        let mode = *stack.last().expect("stack never empty");
        match mode {
            Mode::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    out.push_str("  ");
                    stack.push(Mode::LineComment);
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push_str("  ");
                    stack.push(Mode::BlockComment);
                }
                '\'' | '"' => {
                    out.push(' ');
                    stack.push(Mode::Str(c));
                }
                '`' => {
                    out.push(' ');
                    stack.push(Mode::Template);
                }
                '{' => {
                    out.push(c);
                    stack.push(Mode::Code);
                }
                '}' if stack.len() > 1 => {
                    out.push(c);
                    stack.pop();
                }
                _ => out.push(c),
            },
            Mode::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    stack.pop();
                } else {
                    out.push(' ');
                }
            }
            Mode::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    stack.pop();
                } else if c == '\n' {
                    out.push('\n');
                } else {
                    out.push(' ');
                }
            }
            Mode::Str(delim) => {
                if c == '\\' {
                    out.push(' ');
                    if let Some(escaped) = chars.next() {
                        out.push(if escaped == '\n' { '\n' } else { ' ' });
                    }
                } else if c == delim {
                    out.push(' ');
                    stack.pop();
                } else if c == '\n' {
                    // Unterminated string; fail open back to code
                    out.push('\n');
                    stack.pop();
                } else {
                    out.push(' ');
                }
            }
            Mode::Template => {
                if c == '\\' {
                    out.push(' ');
                    if let Some(escaped) = chars.next() {
                        out.push(if escaped == '\n' { '\n' } else { ' ' });
                    }
                } else if c == '`' {
                    out.push(' ');
                    stack.pop();
                } else if c == '$' && chars.peek() == Some(&'{') {
                    chars.next();
                    out.push_str("  ");
                    stack.push(Mode::Code);
                } else if c == '\n' {
                    out.push('\n');
                } else {
                    out.push(' ');
                }
            }
        }
    }
    out
}

/// Reject explicit `any` types in a changed file
pub struct CheckAnyChangedHook;

#[async_trait]
impl Hook for CheckAnyChangedHook {
    fn descriptor(&self) -> &'static HookDescriptor {
        &CHECK_ANY_CHANGED
    }

    async fn execute(&self, ctx: &HookContext) -> Result<HookOutcome> {
        let Some(file) = ctx.payload.file_path() else {
            tracing::debug!("no file path in payload; nothing to scan");
            return Ok(HookOutcome::allow());
        };
        if !is_typescript_source(&file) {
            return Ok(HookOutcome::allow());
        }
        if !is_within(&file, &ctx.project.root) {
            return Ok(soft_skip(
                ctx,
                &format!("{} is outside the project root — skipping", file.display()),
            ));
        }

        let source = match std::fs::read_to_string(&file) {
            Ok(source) => source,
            Err(err) => {
                tracing::debug!("cannot read {}: {err}", file.display());
                return Ok(HookOutcome::allow());
            }
        };

        let usages = scan_any_usages(&source, is_test_file(&file));
        if usages.is_empty() {
            return Ok(HookOutcome::allow());
        }

        let mut body = format!(
            "{} uses the `any` type on {} line(s):\n",
            file.display(),
            usages.len()
        );
        for usage in usages.iter().take(20) {
            body.push_str(&format!("  line {}: {}\n", usage.line, usage.text));
        }
        if usages.len() > 20 {
            body.push_str(&format!("  … and {} more\n", usages.len() - 20));
        }

        let block = ErrorBlock::new("Forbidden `any` types", body)
            .fix("Replace each `any` with the specific type the value actually has")
            .fix("When the type is genuinely unknown, use `unknown` and narrow before use");
        ctx.reporter.error_block(&block);

        let lines: Vec<String> = usages.iter().map(|u| u.line.to_string()).collect();
        Ok(HookOutcome::block(format!(
            "`any` on line(s) {}",
            lines.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::test_support::context_for;
    use claudekit_core::ExitCode;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn reports_plain_any_annotations() {
        let usages = scan_any_usages("const x: any = 1;\nlet ok: string;\n", false);
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].line, 1);
        assert_eq!(usages[0].text, "const x: any = 1;");
    }

    #[test]
    fn ignores_comments() {
        let source = "// any in a line comment\n/* any in a block\n   any again */\nlet ok = 1;\n";
        assert!(scan_any_usages(source, false).is_empty());
    }

    #[test]
    fn ignores_strings_and_templates() {
        let source = "const a = 'any';\nconst b = \"any\";\nconst c = `any ${ok} any`;\n";
        assert!(scan_any_usages(source, false).is_empty());
    }

    #[test]
    fn catches_any_inside_template_interpolation() {
        let source = "const c = `x ${value as any} y`;\n";
        let usages = scan_any_usages(source, false);
        assert_eq!(usages.len(), 1);
    }

    #[test]
    fn as_any_is_reported() {
        let usages = scan_any_usages("const y = x as any as Other;\n", false);
        assert_eq!(usages.len(), 1);
    }

    #[test]
    fn anything_is_not_any() {
        assert!(scan_any_usages("type Anything = unknown; let anybody = 1;\n", false).is_empty());
    }

    #[test]
    fn expect_any_excluded_only_in_test_files() {
        let source = "expect(fn).toHaveBeenCalledWith(expect.any(Number));\n";
        assert!(scan_any_usages(source, true).is_empty());
        assert_eq!(scan_any_usages(source, false).len(), 1);
    }

    #[test]
    fn block_comment_spanning_lines_keeps_line_numbers() {
        let source = "/*\nany\n*/\nconst x: any = 1;\n";
        let usages = scan_any_usages(source, false);
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].line, 4);
    }

    proptest! {
        #[test]
        fn stripping_preserves_line_count(source in "[ -~\n]{0,400}") {
            let stripped = strip_non_code(&source);
            prop_assert_eq!(
                stripped.chars().filter(|&c| c == '\n').count(),
                source.chars().filter(|&c| c == '\n').count()
            );
        }
    }

    #[tokio::test]
    async fn hook_blocks_on_offending_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let file = dir.path().join("src.ts");
        std::fs::write(&file, "export const x: any = 1;\n").unwrap();

        let ctx = context_for(
            &CHECK_ANY_CHANGED,
            dir.path(),
            json!({
                "hook_event_name": "PostToolUse",
                "tool_input": {"file_path": file}
            }),
        );
        let outcome = CheckAnyChangedHook.execute(&ctx).await.unwrap();
        assert_eq!(outcome.exit_code, ExitCode::Block);
        assert!(outcome.stderr_tail.unwrap().contains("line(s) 1"));
    }

    #[tokio::test]
    async fn hook_allows_clean_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let file = dir.path().join("src.ts");
        std::fs::write(&file, "export const x: number = 1;\n").unwrap();

        let ctx = context_for(
            &CHECK_ANY_CHANGED,
            dir.path(),
            json!({
                "hook_event_name": "PostToolUse",
                "tool_input": {"file_path": file}
            }),
        );
        let outcome = CheckAnyChangedHook.execute(&ctx).await.unwrap();
        assert_eq!(outcome.exit_code, ExitCode::Success);
    }

    #[tokio::test]
    async fn file_outside_root_soft_skips() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let outside = tempfile::tempdir().unwrap();
        let file = outside.path().join("esc.ts");
        std::fs::write(&file, "const x: any = 1;\n").unwrap();

        let ctx = context_for(
            &CHECK_ANY_CHANGED,
            dir.path(),
            json!({
                "hook_event_name": "PostToolUse",
                "tool_input": {"file_path": file}
            }),
        );
        let outcome = CheckAnyChangedHook.execute(&ctx).await.unwrap();
        assert_eq!(outcome.exit_code, ExitCode::Success);
    }
}
