//! Filename tags.

/// Reduces `input` to a filename-safe tag.
///
/// Every character outside `[A-Za-z0-9._-]` becomes `-`, runs of `-` collapse
/// into one, and leading/trailing `-` are removed.
#[must_use]
pub fn sanitize_tag(input: &str) -> String {
    let mut tag = String::with_capacity(input.len());
    for c in input.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '-'
        };
        if c == '-' && tag.ends_with('-') {
            continue;
        }
        tag.push(c);
    }
    tag.trim_matches('-').to_string()
}

/// Removes one archive-ish extension (`.zip`, `.tar`, `.gz`, `.tgz`), case-insensitively.
pub(crate) fn strip_archive_extension(file_name: &str) -> &str {
    const EXTENSIONS: &[&str] = &[".zip", ".tar", ".tgz", ".gz"];
    let lower = file_name.to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map_or(file_name, |ext| &file_name[..file_name.len() - ext.len()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_image_references() {
        assert_eq!(sanitize_tag("nginx:1.25.5"), "nginx-1.25.5");
        assert_eq!(sanitize_tag("ghcr.io/org/app@sha256:ab"), "ghcr.io-org-app-sha256-ab");
    }

    #[test]
    fn collapses_and_trims_dashes() {
        assert_eq!(sanitize_tag("  a // b?? "), "a-b");
        assert_eq!(sanitize_tag("--x--"), "x");
        assert_eq!(sanitize_tag("ünï"), "n");
    }

    #[test]
    fn strips_one_archive_extension() {
        assert_eq!(strip_archive_extension("source.zip"), "source");
        assert_eq!(strip_archive_extension("source.tar.gz"), "source.tar");
        assert_eq!(strip_archive_extension("SOURCE.TGZ"), "SOURCE");
        assert_eq!(strip_archive_extension("notes.txt"), "notes.txt");
    }
}
