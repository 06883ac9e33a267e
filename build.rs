use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::error::Error;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// Directories holding the crate's own Rust sources.
const SOURCE_ROOTS: [&str; 4] = ["annulus", "cli", "tests", "benches"];

// One source-hygiene rule enforced at build time.
struct LintRule {
    name: &'static str,
    pattern: &'static str,
    advice: &'static str,
    // Lines for which a regex hit is not a real violation.
    exempt: fn(&str) -> bool,
}

// Collects the offending lines of a single file for one rule.
struct RuleHits {
    exempt: fn(&str) -> bool,
    lines: Vec<String>,
}

impl Sink for RuleHits {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();
        if !(self.exempt)(line_text) {
            self.lines.push(format!("{line_number}:{line_text}"));
        }
        Ok(true)
    }
}

fn never_exempt(_: &str) -> bool {
    false
}

// Underscore names inside comments or string literals are not bindings.
fn in_comment_or_string(line: &str) -> bool {
    line.trim_start().starts_with("//")
        || line
            .split('"')
            .skip(1)
            .step_by(2)
            .any(|quoted| quoted.contains('_'))
}

fn is_doc_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("///") || trimmed.starts_with("//!")
}

fn rules() -> [LintRule; 4] {
    [
        LintRule {
            name: "underscore-prefixed names",
            pattern: r"\b(_[a-zA-Z0-9_]+)\b",
            advice: "Either use the variable (removing the underscore) or remove it completely.",
            exempt: in_comment_or_string,
        },
        LintRule {
            name: "#[allow(dead_code)] attributes",
            pattern: r"#\s*\[\s*allow\s*\(\s*dead_code\s*\)\s*\]",
            advice: "Either use the code or remove it completely.",
            exempt: never_exempt,
        },
        LintRule {
            name: "edit-history markers in comments",
            pattern: concat!(
                r"(//|/\*).*\b(FIXED|CORRECTED|FIX|FIXES|NEW|CHANGED|CHANGES|CHANGE",
                r"|MODIFIED|MODIFIES|MODIFY|UPDATED|UPDATES|UPDATE)\b",
            ),
            advice: "Comments describe the code as it is, not how it got there.",
            exempt: never_exempt,
        },
        LintRule {
            name: "'**' in plain comments",
            pattern: r"(//|/\*).*\*\*",
            advice: "Emphasis markup belongs in doc comments only.",
            exempt: is_doc_comment,
        },
    ]
}

fn rust_sources() -> Vec<PathBuf> {
    SOURCE_ROOTS
        .iter()
        .map(Path::new)
        .filter(|root| root.exists())
        .flat_map(|root| WalkDir::new(root).into_iter().filter_map(|e| e.ok()))
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| e.into_path())
        .collect()
}

fn run_lint_gate() -> Result<(), Box<dyn Error>> {
    let sources = rust_sources();
    let mut searcher = Searcher::new();
    let mut report = String::new();

    for rule in rules() {
        let matcher = RegexMatcher::new_line_matcher(rule.pattern)?;
        for path in &sources {
            let mut hits = RuleHits {
                exempt: rule.exempt,
                lines: Vec::new(),
            };
            searcher.search_path(&matcher, path, &mut hits)?;
            if hits.lines.is_empty() {
                continue;
            }
            report.push_str(&format!(
                "\n❌ ERROR: Found {} {} in {}:\n",
                hits.lines.len(),
                rule.name,
                path.display()
            ));
            for line in &hits.lines {
                report.push_str(&format!("   {line}\n"));
            }
            report.push_str(&format!("⚠️ {}\n", rule.advice));
        }
    }

    if report.is_empty() {
        Ok(())
    } else {
        Err(report.into())
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for root in SOURCE_ROOTS {
        println!("cargo:rerun-if-changed={root}");
    }

    if let Err(e) = run_lint_gate() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
