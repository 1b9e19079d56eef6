//! Remote reference listing for Rust
//!
//! A type-safe interface to `git ls-remote` that never clones or touches a
//! working tree.
//!
//! # Example
//!
//! ```no_run
//! use git_remote::GitRemote;
//!
//! let git = GitRemote::new()?;
//!
//! // Branch "main" plus the peeled entry of a tag named "main"
//! let refs = git.ls_remote(
//!     "https://android.googlesource.com/platform/build",
//!     &["main", "main^{}"],
//! )?;
//! for (name, id) in &refs {
//!     println!("{id} {name}");
//! }
//! # Ok::<(), git_remote::Error>(())
//! ```

use std::collections::BTreeMap;
use std::process::Command;
use thiserror::Error;

/// Errors that can occur when listing remote references
#[derive(Error, Debug)]
pub enum Error {
    #[error("git is not installed or not in PATH")]
    NotInstalled,

    /// The remote host answered with HTTP 429 or an equivalent throttle
    #[error("Rate limited by {url}: {message}")]
    RateLimited { url: String, message: String },

    #[error("Failed to execute git command: {0}")]
    CommandFailed(String),

    #[error("Failed to parse output: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for git-remote operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reference listing: fully-qualified ref name to object id
pub type RefMap = BTreeMap<String, String>;

/// git CLI wrapper for remote queries
#[derive(Debug, Clone, Copy, Default)]
pub struct GitRemote;

impl GitRemote {
    /// Create a new GitRemote instance
    pub fn new() -> Result<Self> {
        let git = GitRemote;
        if !git.is_available() {
            return Err(Error::NotInstalled);
        }
        Ok(git)
    }

    /// Check if git is available
    pub fn is_available(&self) -> bool {
        self.run_command(&["--version"]).is_ok()
    }

    /// List the references of `url` matching any of `patterns`
    ///
    /// Patterns follow `git ls-remote` matching rules: a plain name
    /// matches any ref ending in `/<name>`, and a `^{}` suffix selects the
    /// peeled entry of an annotated tag. No patterns lists every ref.
    pub fn ls_remote(&self, url: &str, patterns: &[&str]) -> Result<RefMap> {
        let mut args = vec!["ls-remote", url];
        args.extend_from_slice(patterns);

        let stdout = self.run_command(&args).map_err(|e| match e {
            Error::CommandFailed(msg) if is_rate_limit_message(&msg) => Error::RateLimited {
                url: url.to_string(),
                message: msg.trim().to_string(),
            },
            other => other,
        })?;

        parse_ls_remote(&stdout)
    }

    // --- Private helpers ---

    /// Run git and return its stdout
    fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("git");
        cmd.args(args);

        // Never block on a credential prompt
        cmd.env("GIT_TERMINAL_PROMPT", "0");

        let output = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotInstalled
            } else {
                Error::Io(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                format!("git {} exited with {}", args.join(" "), output.status)
            } else {
                stderr.to_string()
            };
            return Err(Error::CommandFailed(message));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Parse `git ls-remote` output (`<id>\t<ref>` per line)
pub fn parse_ls_remote(output: &str) -> Result<RefMap> {
    let mut refs = RefMap::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(id), Some(name)) => {
                refs.insert(name.to_string(), id.to_string());
            }
            _ => {
                return Err(Error::ParseError(format!(
                    "unexpected ls-remote line: {}",
                    line
                )))
            }
        }
    }

    Ok(refs)
}

/// git reports throttling only through its stderr text
fn is_rate_limit_message(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("429") || lower.contains("too many requests") || lower.contains("rate limit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_available() {
        // This test only passes if git is installed
        if let Ok(git) = GitRemote::new() {
            assert!(git.is_available());
        }
    }

    #[test]
    fn test_parse_ls_remote() {
        let output = "\
033d50e2298811d81de7db8cdea63e349a96c9ba\trefs/heads/main
5b8a3b9e0f6a1d2c3e4f5a6b7c8d9e0f1a2b3c4d\trefs/tags/v1
a94a8fe5ccb19ba61c4c0873d391e987982fbbd3\trefs/tags/v1^{}
";
        let refs = parse_ls_remote(output).unwrap();
        assert_eq!(refs.len(), 3);
        assert_eq!(
            refs.get("refs/heads/main").map(String::as_str),
            Some("033d50e2298811d81de7db8cdea63e349a96c9ba")
        );
        assert_eq!(
            refs.get("refs/tags/v1^{}").map(String::as_str),
            Some("a94a8fe5ccb19ba61c4c0873d391e987982fbbd3")
        );
    }

    #[test]
    fn test_parse_ls_remote_empty() {
        assert!(parse_ls_remote("").unwrap().is_empty());
        assert!(parse_ls_remote("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_ls_remote_garbage() {
        assert!(matches!(
            parse_ls_remote("not-a-listing"),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(is_rate_limit_message(
            "fatal: unable to access 'https://host/x/': The requested URL returned error: 429"
        ));
        assert!(is_rate_limit_message("remote: Too Many Requests"));
        assert!(!is_rate_limit_message(
            "fatal: repository 'https://host/x/' not found"
        ));
    }

    fn git(dir: &std::path::Path, args: &[&str]) {
        let status = Command::new("git")
            .args(["-c", "user.name=test", "-c", "user.email=test@example.org"])
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap()
            .status;
        assert!(status.success(), "git {:?} failed", args);
    }

    #[test]
    fn test_ls_remote_peels_annotated_tag() {
        let Ok(remote) = GitRemote::new() else {
            return;
        };

        let repo = tempfile::TempDir::new().unwrap();
        git(repo.path(), &["init", "-q"]);
        git(repo.path(), &["commit", "-q", "--allow-empty", "-m", "init"]);
        git(repo.path(), &["tag", "-a", "v1", "-m", "release"]);

        let url = repo.path().to_str().unwrap();

        let plain = remote.ls_remote(url, &["v1"]).unwrap();
        assert!(plain.contains_key("refs/tags/v1"));
        assert!(!plain.contains_key("refs/tags/v1^{}"));

        let both = remote.ls_remote(url, &["v1", "v1^{}"]).unwrap();
        let tag = &both["refs/tags/v1"];
        let commit = &both["refs/tags/v1^{}"];
        assert_ne!(tag, commit);

        let head = remote.ls_remote(url, &["HEAD"]).unwrap();
        assert_eq!(head.get("HEAD"), Some(commit));
    }

    // Integration tests (require git and network access)
    #[test]
    #[ignore]
    fn test_ls_remote_live() {
        if let Ok(git) = GitRemote::new() {
            let refs = git.ls_remote("https://github.com/git/git", &["HEAD"]);
            assert!(refs.is_ok());
        }
    }
}
