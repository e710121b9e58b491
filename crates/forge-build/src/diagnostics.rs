//! Compiler and linker output → structured diagnostics.
//!
//! A single greedy pass over the output. One entry is open at a time; marker
//! lines (`^`, `~`, `>`) and source-gutter lines (`12 | code`) that follow it
//! become its context, `note:` lines are folded into that context too, and any
//! other line closes it. Lines matching no grammar are dropped; the caller
//! keeps the raw text.
//!
//! Grammars, first match wins:
//! 1. GCC/Clang compile: `file:line:col: severity: message`
//! 2. MSVC compile: `file(line[,col]): severity [Cnnnn]: message`
//! 3. Generic link: `ld: ...`, `/usr/bin/ld: ...`, `LINK : ...`
//! 4. MSVC link: `file : severity LNKnnnn: message`
//! 5. Unresolved symbol: ``undefined reference to `sym'``

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    /// Map a compiler severity word. "fatal error" counts as an error; anything
    /// unrecognised defaults to an error.
    fn from_label(label: &str) -> Self {
        let label = label.to_ascii_lowercase();
        if label.contains("error") {
            Self::Error
        } else if label.contains("warning") {
            Self::Warning
        } else if label.contains("note") {
            Self::Note
        } else {
            Self::Error
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Note => "note",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build step a diagnostic came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Compile,
    Link,
}

/// One structured diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    pub severity: Severity,
    /// Lexically normalized; empty when the line named no file.
    pub file: PathBuf,
    /// 1-based; 0 when unknown.
    pub line: u32,
    /// 1-based; 0 when unknown.
    pub column: u32,
    pub message: String,
    /// Toolchain code such as `C2065` or `LNK2019`.
    pub code: Option<String>,
    pub stage: Stage,
    /// Source excerpt, caret lines and notes that followed the diagnostic.
    pub context: String,
}

impl fmt::Display for DiagnosticEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.file.as_os_str().is_empty() {
            write!(f, "{}:{}:{}: ", self.file.display(), self.line, self.column)?;
        }
        write!(f, "{}", self.severity)?;
        if let Some(code) = &self.code {
            write!(f, " {code}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Result of one parse call, already split into buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDiagnostics {
    pub errors: Vec<DiagnosticEntry>,
    pub warnings: Vec<DiagnosticEntry>,
}

impl ParsedDiagnostics {
    pub fn into_parts(self) -> (Vec<DiagnosticEntry>, Vec<DiagnosticEntry>) {
        (self.errors, self.warnings)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    fn push(&mut self, entry: DiagnosticEntry) {
        match entry.severity {
            Severity::Error => self.errors.push(entry),
            Severity::Warning => self.warnings.push(entry),
            // Notes are folded into context before they get here.
            Severity::Note => {}
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Grammar {
    GnuCompile,
    MsvcCompile,
    GenericLink,
    MsvcLink,
    Unresolved,
}

struct Grammars {
    ordered: [(Grammar, Regex); 5],
    undefined_reference: Regex,
    function_header: Regex,
    gutter: Regex,
}

fn grammars() -> &'static Grammars {
    static GRAMMARS: OnceLock<Grammars> = OnceLock::new();
    GRAMMARS.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("valid diagnostic grammar");
        Grammars {
            ordered: [
                (
                    Grammar::GnuCompile,
                    re(r"^(?P<file>.+?):(?P<line>\d+):(?P<column>\d+): (?P<severity>fatal error|error|warning|note): (?P<message>.+)$"),
                ),
                (
                    Grammar::MsvcCompile,
                    re(r"^(?P<file>.+?)\((?P<line>\d+)(?:,(?P<column>\d+))?\)\s?: (?P<severity>fatal error|error|warning|note)(?: (?P<code>C\d+))?: (?P<message>.+)$"),
                ),
                (
                    Grammar::GenericLink,
                    re(r"^(?:LINK|(?:\S*[/\\-])?ld(?:\.\w+)?)\s?: (?:(?P<severity>fatal error|error|warning)(?: (?P<code>LNK\d+))?: )?(?P<message>.*)$"),
                ),
                (
                    Grammar::MsvcLink,
                    re(r"^(?P<file>.+?)\s?: (?P<severity>fatal error|error|warning) (?P<code>LNK\d+): (?P<message>.+)$"),
                ),
                (
                    Grammar::Unresolved,
                    re(r"undefined reference to [`'‘](?P<symbol>[^'’]+)['’]"),
                ),
            ],
            undefined_reference: re(r"undefined reference to [`'‘](?P<symbol>[^'’]+)['’]"),
            function_header: re(r"^.+?:\s+[Ii]n (?:member )?function [`'‘].+['’]:$"),
            gutter: re(r"^\d*\s*\|"),
        }
    })
}

/// Parse raw toolchain output into error and warning entries.
///
/// Never fails: unrecognised lines are skipped.
pub fn parse_compiler_output(output: &str) -> ParsedDiagnostics {
    let grammars = grammars();
    let mut parsed = ParsedDiagnostics::default();
    let mut open: Option<DiagnosticEntry> = None;
    let mut context: Vec<&str> = Vec::new();

    // `x.o: in function 'main':` headers introduce the entry on the next line.
    let mut header: Option<&str> = None;

    for raw in output.lines() {
        let line = raw.trim();
        if grammars.function_header.is_match(line) {
            close_entry(&mut open, &mut context, &mut parsed);
            header = Some(line);
            continue;
        }
        let pending_header = header.take();
        let matched = match_line(grammars, line);

        if open.is_some() && matched.is_none() && is_continuation(grammars, line) {
            context.push(raw.trim_end());
            continue;
        }

        if let Some(entry) = &matched
            && entry.severity == Severity::Note
        {
            // A note belongs to whatever diagnostic is open; orphans are dropped.
            if open.is_some() {
                context.push(line);
            }
            continue;
        }

        close_entry(&mut open, &mut context, &mut parsed);
        if matched.is_some()
            && let Some(function) = pending_header
        {
            context.push(function);
        }
        open = matched;
    }
    close_entry(&mut open, &mut context, &mut parsed);

    tracing::debug!(
        errors = parsed.errors.len(),
        warnings = parsed.warnings.len(),
        "parsed compiler output"
    );
    parsed
}

fn close_entry(
    open: &mut Option<DiagnosticEntry>,
    context: &mut Vec<&str>,
    parsed: &mut ParsedDiagnostics,
) {
    if let Some(mut entry) = open.take() {
        entry.context = context.join("\n");
        parsed.push(entry);
    }
    context.clear();
}

fn is_continuation(grammars: &Grammars, line: &str) -> bool {
    line.contains(['^', '~', '>']) || grammars.gutter.is_match(line)
}

fn match_line(grammars: &Grammars, line: &str) -> Option<DiagnosticEntry> {
    if line.is_empty() {
        return None;
    }
    let (grammar, caps) = grammars
        .ordered
        .iter()
        .find_map(|(grammar, re)| re.captures(line).map(|caps| (*grammar, caps)))?;

    let mut entry = entry_from_captures(grammar, &caps, line);

    if let Some(symbol) = grammars
        .undefined_reference
        .captures(line)
        .and_then(|c| c.name("symbol"))
    {
        entry.severity = Severity::Error;
        entry.stage = Stage::Link;
        entry.message = format!("Undefined symbol: {}", symbol.as_str());
    }
    Some(entry)
}

fn entry_from_captures(grammar: Grammar, caps: &Captures<'_>, line: &str) -> DiagnosticEntry {
    let text = |name: &str| caps.name(name).map(|m| m.as_str());
    let number = |name: &str| -> u32 { text(name).and_then(|v| v.parse().ok()).unwrap_or(0) };

    let message = text("message").unwrap_or(line).to_string();
    let code = text("code").map(str::to_string);

    let severity = match (grammar, text("severity")) {
        (_, Some(label)) => Severity::from_label(label),
        (Grammar::GenericLink, None) if message.to_ascii_lowercase().contains("warning") => {
            Severity::Warning
        }
        _ => Severity::Error,
    };

    let is_link_code = code.as_deref().is_some_and(|c| c.starts_with("LNK"));
    let stage = match grammar {
        Grammar::GenericLink | Grammar::MsvcLink | Grammar::Unresolved => Stage::Link,
        _ if is_link_code => Stage::Link,
        _ => Stage::Compile,
    };

    DiagnosticEntry {
        severity,
        file: text("file").map(normalize_path).unwrap_or_default(),
        line: number("line"),
        column: number("column"),
        message,
        code,
        stage,
        context: String::new(),
    }
}

/// Fold `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !matches!(
                    out.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_))
                ) {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcc_error_with_caret_context() {
        let output = "\
src/main.cpp:12:9: error: 'foo' was not declared in this scope
   12 |     int y = foo(3);
      |             ^~~
";
        let (errors, warnings) = parse_compiler_output(output).into_parts();
        assert!(warnings.is_empty());
        assert_eq!(errors.len(), 1);
        let e = &errors[0];
        assert_eq!(e.file, PathBuf::from("src/main.cpp"));
        assert_eq!((e.line, e.column), (12, 9));
        assert_eq!(e.stage, Stage::Compile);
        assert_eq!(e.context.lines().count(), 2);
        assert!(e.context.contains("^~~"));
    }

    #[test]
    fn test_note_folds_into_open_entry() {
        let output = "\
a.cpp:3:5: warning: unused variable 'x' [-Wunused-variable]
a.cpp:1:1: note: declared here
b.cpp:7:1: error: expected '}' at end of input
";
        let parsed = parse_compiler_output(output);
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.warnings[0].context.contains("note: declared here"));
        assert_eq!(parsed.errors[0].file, PathBuf::from("b.cpp"));
    }

    #[test]
    fn test_orphan_note_is_dropped() {
        let parsed = parse_compiler_output("a.cpp:1:1: note: candidate function\n");
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_header_line_with_angle_bracket_opens_new_entry() {
        let output = "\
a.cpp:1:1: error: first
b.cpp:2:2: error: no match for 'operator<<' (operand types are 'std::ostream' and 'Foo')
";
        let parsed = parse_compiler_output(output);
        assert_eq!(parsed.errors.len(), 2);
        assert!(parsed.errors[0].context.is_empty());
    }

    #[test]
    fn test_fatal_error_is_an_error() {
        let parsed = parse_compiler_output("x.c:1:10: fatal error: missing.h: No such file or directory");
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].severity, Severity::Error);
        assert_eq!(parsed.errors[0].message, "missing.h: No such file or directory");
    }

    #[test]
    fn test_msvc_link_error() {
        let output = "main.obj : error LNK2019: unresolved external symbol \"int __cdecl f(void)\"";
        let parsed = parse_compiler_output(output);
        let e = &parsed.errors[0];
        assert_eq!(e.code.as_deref(), Some("LNK2019"));
        assert_eq!(e.stage, Stage::Link);
        assert_eq!(e.file, PathBuf::from("main.obj"));
    }

    #[test]
    fn test_generic_link_lines() {
        let output = "\
/usr/bin/ld: warning: libfoo.so, needed by libbar.so, not found
LINK : fatal error LNK1104: cannot open file 'gtest.lib'
ld: cannot find -lgtest
";
        let parsed = parse_compiler_output(output);
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.errors.len(), 2);
        assert_eq!(parsed.errors[0].code.as_deref(), Some("LNK1104"));
        assert_eq!(parsed.errors[1].message, "cannot find -lgtest");
        assert!(parsed.errors.iter().all(|e| e.stage == Stage::Link));
    }

    #[test]
    fn test_undefined_reference_behind_ld_prefix() {
        let output =
            "/usr/bin/ld: main.o: in function `main': main.cpp:(.text+0x9): undefined reference to `helper()'";
        let parsed = parse_compiler_output(output);
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].message, "Undefined symbol: helper()");
        assert_eq!(parsed.errors[0].stage, Stage::Link);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./src/../lib/a.cpp"), PathBuf::from("lib/a.cpp"));
        assert_eq!(normalize_path("../a.cpp"), PathBuf::from("../a.cpp"));
        assert_eq!(normalize_path("/x/./y/../z.h"), PathBuf::from("/x/z.h"));
        assert_eq!(normalize_path(""), PathBuf::new());
    }

    #[test]
    fn test_display() {
        let parsed = parse_compiler_output("main.cpp(5,1): error C2065: 'x': undeclared identifier");
        assert_eq!(
            parsed.errors[0].to_string(),
            "main.cpp:5:1: error C2065: 'x': undeclared identifier"
        );
    }
}
