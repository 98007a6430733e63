//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code in the narrator crates MUST NOT call sleep
//! methods. Waiting happens on I/O, channels or timeouts.
//! **Exceptions**: Reconnect backoff (retry logic only), test code

use std::fs;
use std::path::Path;

use architectural_enforcement::production_dirs;

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let violations = find_sleep_violations();

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Sleep calls found in production code!\n");

        for violation in &violations {
            eprintln!("  ❌ {}", violation);
        }

        eprintln!("\n✅ ACCEPTABLE sleep uses:");
        eprintln!("  - Backoff between stream reconnect attempts");
        eprintln!("  - Test code (#[test] or #[tokio::test] functions)");
        eprintln!("\n❌ FORBIDDEN:");
        eprintln!("  - Sleep in polling loops");
        eprintln!("  - Sleep as poor man's synchronization");
        eprintln!("  - Sleep to 'wait' for events (use async I/O or tokio::time::timeout)");

        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

/// Find all sleep() calls in production code
fn find_sleep_violations() -> Vec<String> {
    let mut violations = Vec::new();
    let policy = SleepPolicy {
        allow_backoff: true,
        allow_tests: true,
    };

    for dir in production_dirs() {
        assert!(dir.exists(), "missing source directory {}", dir.display());
        check_directory(&dir, &mut violations, &policy);
    }

    violations
}

struct SleepPolicy {
    allow_backoff: bool,
    allow_tests: bool,
}

fn check_directory(dir: &Path, violations: &mut Vec<String>, policy: &SleepPolicy) {
    for entry in walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.path().extension().and_then(|s| s.to_str()) == Some("rs") {
            check_file(entry.path(), violations, policy);
        }
    }
}

fn check_file(path: &Path, violations: &mut Vec<String>, policy: &SleepPolicy) {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return,
    };

    let lines: Vec<&str> = content.lines().collect();
    let test_module_start = test_module_start(&lines);

    for (idx, line) in lines.iter().enumerate() {
        let line_number = idx + 1;

        // Skip comments
        let code_part = line.split("//").next().unwrap_or(line);

        if !(code_part.contains("::sleep(") || code_part.contains(".sleep(")) {
            continue;
        }

        if policy.allow_tests
            && (test_module_start.is_some_and(|start| idx > start)
                || is_in_test_function(&lines, idx))
        {
            continue;
        }

        if policy.allow_backoff && is_backoff_context(&lines, idx) {
            continue;
        }

        violations.push(format!(
            "{}:{} - {}",
            path.display(),
            line_number,
            line.trim()
        ));
    }
}

/// Index of the `#[cfg(test)]` attribute that opens the file's test module
fn test_module_start(lines: &[&str]) -> Option<usize> {
    lines.iter().enumerate().find_map(|(idx, line)| {
        let next = lines.get(idx + 1).map(|l| l.trim()).unwrap_or("");
        (line.trim() == "#[cfg(test)]" && next.starts_with("mod ")).then_some(idx)
    })
}

/// Check if line is inside a test function
fn is_in_test_function(lines: &[&str], current_idx: usize) -> bool {
    // Scan backwards for #[test] or #[tokio::test]
    for i in (0..current_idx).rev() {
        let line = lines[i].trim();

        if line.starts_with("#[test]") || line.starts_with("#[tokio::test") {
            return true;
        }

        if (line.starts_with("fn ") || line.starts_with("async fn ")) && !line.contains("test") {
            return false;
        }

        // Stop at module boundaries
        if line.starts_with("mod ") || line.starts_with("impl ") {
            return false;
        }
    }
    false
}

/// Check if sleep is waiting out a reconnect backoff
fn is_backoff_context(lines: &[&str], current_idx: usize) -> bool {
    let context_range = current_idx.saturating_sub(15)..std::cmp::min(current_idx + 5, lines.len());

    let mut has_backoff_calc = false;
    let mut has_retry_context = false;

    for line in &lines[context_range] {
        let line = line.to_lowercase();

        // Delay computed by the retry policy, or inline growth
        if line.contains("delay_for_attempt")
            || line.contains("saturating_mul")
            || line.contains("<<")
            || line.contains("pow")
        {
            has_backoff_calc = true;
        }

        if line.contains("retry")
            || line.contains("reconnect")
            || line.contains("backoff")
            || line.contains("attempt")
        {
            has_retry_context = true;
        }
    }

    has_backoff_calc && has_retry_context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_sleep_is_not_exempt() {
        let code = vec![
            "async fn wait_for_server() {",
            "    tokio::time::sleep(Duration::from_millis(10)).await;",
            "}",
        ];

        assert!(!is_in_test_function(&code, 1));
        assert!(!is_backoff_context(&code, 1));
    }

    #[test]
    fn test_backoff_detection() {
        let code = vec![
            "    failures += 1;",
            "    let delay = self.policy.delay_for_attempt(failures);",
            "    tracing::warn!(attempt, \"Stream connect failed, retrying\");",
            "    tokio::time::sleep(delay).await;",
        ];

        assert!(is_backoff_context(&code, 3));
    }

    #[test]
    fn test_test_module_detection() {
        let code = vec![
            "fn production() {}",
            "#[cfg(test)]",
            "mod tests {",
            "    async fn helper() { tokio::time::sleep(d).await; }",
            "}",
        ];

        assert_eq!(test_module_start(&code), Some(1));
    }
}
