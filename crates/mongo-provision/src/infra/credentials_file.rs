use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use chrono::Local;
use uuid::Uuid;

use mongo_provision_core::Credentials;

/// Writes `username`/`password` in Java properties syntax for the web
/// front end, replacing any previous file atomically.
pub fn write_credentials_file(
    path: &Path,
    creds: &Credentials,
    comment: &str,
) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("credentials dir create failed ({})", parent.display()))?;

    let contents = render_properties(creds, comment);
    let tmp_path = parent.join(format!(".{}.tmp", Uuid::now_v7()));
    let mut file = fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&tmp_path)
        .with_context(|| format!("credentials file create failed ({})", tmp_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("credentials file chmod failed ({})", tmp_path.display()))?;
    }

    let written = file
        .write_all(contents.as_bytes())
        .and_then(|()| file.sync_all());
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(err)
            .with_context(|| format!("credentials file write failed ({})", tmp_path.display()));
    }

    fs::rename(&tmp_path, path)
        .with_context(|| format!("credentials file rename failed ({})", path.display()))?;
    tracing::info!(event = "credentials_file_written", path = %path.display());
    Ok(())
}

pub(crate) fn render_properties(creds: &Credentials, comment: &str) -> String {
    let mut out = String::new();
    for line in comment.lines() {
        out.push('#');
        out.push_str(line);
        out.push('\n');
    }
    out.push('#');
    out.push_str(&Local::now().format("%a %b %d %H:%M:%S %Z %Y").to_string());
    out.push('\n');
    out.push_str("username=");
    out.push_str(&escape_value(creds.username()));
    out.push('\n');
    out.push_str("password=");
    out.push_str(&escape_value(creds.password()));
    out.push('\n');
    out
}

/// Escapes a property value the way `java.util.Properties#store` does.
pub(crate) fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (index, ch) in value.chars().enumerate() {
        match ch {
            ' ' if index == 0 => out.push_str("\\ "),
            '\\' | '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(ch);
            }
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            ch if (ch as u32) < 0x20 || (ch as u32) > 0x7e => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{unit:04X}"));
                }
            }
            ch => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_separators_and_leading_space() {
        assert_eq!(escape_value("plain"), "plain");
        assert_eq!(escape_value("a=b:c"), "a\\=b\\:c");
        assert_eq!(escape_value(" lead"), "\\ lead");
        assert_eq!(escape_value("in side"), "in side");
        assert_eq!(escape_value("#!\\"), "\\#\\!\\\\");
        assert_eq!(escape_value("tab\there"), "tab\\there");
        assert_eq!(escape_value("é"), "\\u00E9");
    }

    #[test]
    fn properties_layout() {
        let creds = Credentials::new("agent", "pa=ss");
        let rendered = render_properties(&creds, "Backing storage connection credentials.");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "#Backing storage connection credentials.");
        assert!(lines[1].starts_with('#'));
        assert_eq!(lines[2], "username=agent");
        assert_eq!(lines[3], "password=pa\\=ss");
    }

    #[test]
    fn writes_file_with_private_permissions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("etc").join("web.auth");
        let creds = Credentials::new("agent", "s3cret");
        write_credentials_file(&path, &creds, "comment").expect("write");
        write_credentials_file(&path, &creds, "comment").expect("overwrite");

        let contents = fs::read_to_string(&path).expect("read");
        assert!(contents.contains("username=agent\n"));
        assert!(contents.contains("password=s3cret\n"));
        let leftovers = fs::read_dir(path.parent().expect("parent"))
            .expect("read dir")
            .count();
        assert_eq!(leftovers, 1);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).expect("metadata").permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
