use std::path::Path;

/// JSON output when `LOG_FORMAT` asks for it; production defaults to JSON.
pub fn use_json_logs(log_format: Option<&str>, production: bool) -> bool {
    match log_format {
        Some(format) => format.eq_ignore_ascii_case("json"),
        None => production,
    }
}

/// Initialize tracing for the CLI. `RUST_LOG` overrides the default filter;
/// `LOG_FORMAT=json|text` picks the output format.
pub fn init_tracing(production: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("encore=info"));

    let log_format = std::env::var("LOG_FORMAT").ok();

    if use_json_logs(log_format.as_deref(), production) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// MIME type guessed from a file extension; unknown extensions map to
/// `application/octet-stream` and are left to the validator.
pub fn content_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("aac") => "audio/aac",
        Some("m4a") => "audio/mp4",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_selection() {
        assert!(use_json_logs(Some("json"), false));
        assert!(use_json_logs(Some("JSON"), false));
        assert!(!use_json_logs(Some("text"), true));
        assert!(use_json_logs(None, true));
        assert!(!use_json_logs(None, false));
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for_path(Path::new("a/b/take.MP3")), "audio/mpeg");
        assert_eq!(content_type_for_path(Path::new("take.m4a")), "audio/mp4");
        assert_eq!(
            content_type_for_path(Path::new("notes.txt")),
            "application/octet-stream"
        );
        assert_eq!(
            content_type_for_path(Path::new("no_extension")),
            "application/octet-stream"
        );
    }
}
