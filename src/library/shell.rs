//! Quoting album paths for `sh -c`.
//!
//! Quoting policy:
//! - a path with both `'` and `"` is wrapped in double quotes, with `"`
//!   (and the other characters special inside double quotes) escaped
//! - a path with only `"` is wrapped in single quotes, where nothing is
//!   special
//! - any other path is wrapped in double quotes with `$`, `` ` `` and `\`
//!   escaped
//!
//! Paths that are not valid UTF-8 or contain NUL cannot be passed through a
//! shell command string and are rejected.

use std::path::Path;

use super::LibraryError;

/// Quote `path` so that `sh` reads it back as one unaltered word.
pub fn quote_path(path: &Path) -> Result<String, LibraryError> {
    let escape_error = |reason: &str| LibraryError::Escape {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let raw = path.to_str().ok_or_else(|| escape_error("path is not valid UTF-8"))?;
    if raw.contains('\0') {
        return Err(escape_error("path contains a NUL byte"));
    }

    let has_single = raw.contains('\'');
    let has_double = raw.contains('"');

    if has_double && !has_single {
        return Ok(format!("'{raw}'"));
    }

    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for c in raw.chars() {
        if matches!(c, '"' | '$' | '`' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    Ok(quoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    /// Run `printf %s <quoted>` through sh and return what it printed.
    fn shell_echo(quoted: &str) -> String {
        let output = Command::new("sh")
            .arg("-c")
            .arg(format!("printf %s {quoted}"))
            .output()
            .expect("sh is available");
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    }

    #[test]
    fn test_plain_path_uses_double_quotes() {
        let quoted = quote_path(Path::new("/sync/Artist - Album")).unwrap();
        assert_eq!(quoted, "\"/sync/Artist - Album\"");
    }

    #[test]
    fn test_single_quote_uses_double_quotes() {
        let quoted = quote_path(Path::new("/sync/It's")).unwrap();
        assert_eq!(quoted, "\"/sync/It's\"");
    }

    #[test]
    fn test_double_quote_uses_single_quotes() {
        let quoted = quote_path(Path::new("/sync/The \"Best\" $1")).unwrap();
        assert_eq!(quoted, "'/sync/The \"Best\" $1'");
    }

    #[test]
    fn test_both_quotes_escape_double_quotes() {
        let quoted = quote_path(Path::new("/sync/It's \"Best\"")).unwrap();
        assert_eq!(quoted, "\"/sync/It's \\\"Best\\\"\"");
    }

    #[test]
    fn test_dollar_is_escaped_in_double_quotes() {
        let quoted = quote_path(Path::new("/sync/$HOME")).unwrap();
        assert_eq!(quoted, "\"/sync/\\$HOME\"");
    }

    #[test]
    fn test_nul_is_rejected() {
        let result = quote_path(Path::new("/sync/a\0b"));
        assert!(matches!(result, Err(LibraryError::Escape { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"/sync/\xff"));
        assert!(quote_path(path).unwrap_err().is_escape());
    }

    #[test]
    fn test_shell_reads_back_awkward_paths() {
        for raw in [
            "/sync/Artist - Album",
            "/sync/It's",
            "/sync/The \"Best\"",
            "/sync/It's \"Best\" $HOME",
            "/sync/$(echo nope) `echo nope` \\n",
            "/sync/50% & more; ok | !",
        ] {
            let quoted = quote_path(Path::new(raw)).unwrap();
            assert_eq!(shell_echo(&quoted), raw, "quoted as {quoted}");
        }
    }
}
