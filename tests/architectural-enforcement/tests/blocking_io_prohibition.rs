//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Async production code in the narrator crates MUST NOT use
//! blocking I/O.
//! **Required**: `tokio::fs`, `tokio::net`, `tokio::io`, async `reqwest`

use std::fs;
use std::path::Path;

use architectural_enforcement::production_dirs;

/// Test that production code does not use blocking I/O
#[test]
fn test_no_blocking_io_in_production_code() {
    let violations = find_blocking_io_violations();

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Blocking I/O calls found in production code!\n");

        for violation in &violations {
            eprintln!("  ❌ {}", violation);
        }

        eprintln!("\n❌ FORBIDDEN blocking I/O:");
        eprintln!("  - std::fs::read(), std::fs::write(), std::fs::File");
        eprintln!("  - std::net::TcpStream, std::net::TcpListener");
        eprintln!("  - std::process::Command::output()");
        eprintln!("  - reqwest::blocking::*");
        eprintln!("  - std::io::stdin() inside async functions");
        eprintln!("\n✅ REQUIRED async I/O:");
        eprintln!("  - tokio::fs::read_to_string().await");
        eprintln!("  - tokio::net::TcpListener::bind().await");
        eprintln!("  - tokio::io::stdin() with AsyncBufReadExt");
        eprintln!("  - reqwest::Client::send().await");
        eprintln!("\n✅ ACCEPTABLE blocking I/O:");
        eprintln!("  - Non-async functions (terminal flushes, logging setup)");
        eprintln!("  - Test code");

        panic!(
            "\nFound {} blocking I/O violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

/// Find all blocking I/O calls in production code
fn find_blocking_io_violations() -> Vec<String> {
    let mut violations = Vec::new();

    for dir in production_dirs() {
        assert!(dir.exists(), "missing source directory {}", dir.display());
        check_directory(&dir, &mut violations);
    }

    violations
}

fn check_directory(dir: &Path, violations: &mut Vec<String>) {
    for entry in walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.path().extension().and_then(|s| s.to_str()) == Some("rs") {
            check_file(entry.path(), violations);
        }
    }
}

fn check_file(path: &Path, violations: &mut Vec<String>) {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return,
    };

    let lines: Vec<&str> = content.lines().collect();

    for (idx, line) in lines.iter().enumerate() {
        let line_number = idx + 1;

        // Skip comments
        let code_part = line.split("//").next().unwrap_or(line);

        if is_in_test_function(&lines, idx) || is_in_non_async_function(&lines, idx) {
            continue;
        }

        let mut flag = |kind: &str| {
            violations.push(format!(
                "{}:{} - {}: {}",
                path.display(),
                line_number,
                kind,
                line.trim()
            ));
        };

        if code_part.contains("std::fs::") || code_part.contains("use std::fs") {
            flag("Blocking file I/O");
        }

        if code_part.contains("std::net::TcpStream")
            || code_part.contains("std::net::TcpListener")
            || code_part.contains("std::net::UdpSocket")
        {
            flag("Blocking network I/O");
        }

        if code_part.contains("std::process::Command") {
            flag("Blocking process I/O");
        }

        if code_part.contains("reqwest::blocking") {
            flag("Blocking HTTP client");
        }

        if code_part.contains("std::io::stdin()") && is_in_async_function(&lines, idx) {
            flag("Blocking stdin in async");
        }
    }
}

/// Check if line is inside a test function
fn is_in_test_function(lines: &[&str], current_idx: usize) -> bool {
    // Scan backwards to find the enclosing function
    let mut found_fn_idx = None;
    for i in (0..current_idx).rev() {
        let line = lines[i].trim();

        if line.starts_with("fn ") || line.contains(" fn ") {
            found_fn_idx = Some(i);
            break;
        }

        // Stop at module boundaries
        if line.starts_with("mod ") || (line.starts_with("impl ") && line.contains('{')) {
            return false;
        }
    }

    // If we found a function, check if it has a test marker
    if let Some(fn_idx) = found_fn_idx {
        for i in (0..fn_idx).rev() {
            let line = lines[i].trim();

            if line.starts_with("#[test]")
                || line.starts_with("#[tokio::test")
                || line.starts_with("#[cfg(test)]")
            {
                return true;
            }

            // Stop if we hit another function or boundary
            if line.starts_with("fn ") || line.starts_with("mod ") || line.starts_with("impl ") {
                break;
            }
        }
    }

    false
}

/// Check if line is inside an async function
fn is_in_async_function(lines: &[&str], current_idx: usize) -> bool {
    for i in (0..current_idx).rev() {
        let line = lines[i].trim();

        if line.contains("async fn ") {
            return true;
        }

        if line.contains("fn ") && !line.contains("async") {
            return false;
        }

        // Stop at module/impl boundaries
        if line.starts_with("mod ") || (line.starts_with("impl ") && line.contains('{')) {
            return false;
        }
    }
    false
}

/// Check if line is inside a non-async function (blocking I/O is acceptable there)
fn is_in_non_async_function(lines: &[&str], current_idx: usize) -> bool {
    for i in (0..current_idx).rev() {
        let line = lines[i].trim();

        if line.contains("async fn ") {
            return false;
        }

        if (line.starts_with("fn ") || line.contains(" fn ")) && !line.contains("async") {
            return true;
        }

        // Stop at module/impl boundaries
        if line.starts_with("mod ") || (line.starts_with("impl ") && line.contains('{')) {
            return false;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_async_function_detection() {
        let code = vec![
            "    pub async fn load(path: &Path) -> Result<String> {",
            "        let contents = std::fs::read_to_string(path)?;",
            "    }",
        ];

        assert!(is_in_async_function(&code, 1));
        assert!(!is_in_non_async_function(&code, 1));
    }

    #[test]
    fn test_non_async_function_detection() {
        let code = vec![
            "fn prompt() {",
            "    let _ = std::io::stdout().flush();",
            "}",
        ];

        assert!(is_in_non_async_function(&code, 1));
    }

    #[test]
    fn test_test_function_detection() {
        let code = vec![
            "#[tokio::test]",
            "async fn test_open_refused() {",
            "    let listener = std::net::TcpListener::bind(\"127.0.0.1:0\").unwrap();",
            "}",
        ];

        assert!(is_in_test_function(&code, 2));
    }
}
