//! Type policy module
//!
//! The policy is a static table mapping a file's declared content type and
//! filename extension to a category with a size ceiling and a display label.
//! Matching precedence is load-bearing: the reserved publication extension
//! wins unconditionally, before any content-type lookup, so that catch-all
//! types like `application/octet-stream` cannot shadow it.

use serde::{Deserialize, Serialize};

/// Reserved extension that always classifies as [`CategoryKind::Publication`],
/// regardless of the declared content type.
pub const RESERVED_PUBLICATION_EXTENSION: &str = "jwpub";

/// Classification bucket for an inbound file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Image,
    Document,
    Spreadsheet,
    Video,
    Audio,
    Publication,
}

/// One category of the policy table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub kind: CategoryKind,
    /// Accepted content types, normalized (no parameters, lowercase).
    pub content_types: Vec<String>,
    /// Accepted extensions, lowercase, without the leading dot.
    pub extensions: Vec<String>,
    /// Size ceiling in megabytes.
    pub max_size_mb: f64,
    /// Human label used in the welcome text.
    pub label: String,
}

/// The policy table. Immutable after construction; categories are scanned in
/// declaration order.
#[derive(Debug, Clone)]
pub struct TypePolicy {
    rules: Vec<CategoryRule>,
}

impl TypePolicy {
    /// Build a policy from a rule list. Content types and extensions are
    /// normalized so callers can pass them in any case, with or without dots.
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|mut rule| {
                rule.content_types = rule
                    .content_types
                    .iter()
                    .map(|ct| normalize_content_type(ct))
                    .collect();
                rule.extensions = rule
                    .extensions
                    .iter()
                    .map(|ext| normalize_extension(ext))
                    .collect();
                rule
            })
            .collect();
        Self { rules }
    }

    /// The standard policy table.
    pub fn standard() -> Self {
        Self::new(vec![
            CategoryRule {
                kind: CategoryKind::Image,
                content_types: vec![
                    "image/jpeg".into(),
                    "image/png".into(),
                    "image/gif".into(),
                ],
                extensions: vec!["jpg".into(), "jpeg".into(), "png".into(), "gif".into()],
                max_size_mb: 5.0,
                label: "Images".into(),
            },
            CategoryRule {
                kind: CategoryKind::Document,
                content_types: vec![
                    "application/pdf".into(),
                    "application/msword".into(),
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                        .into(),
                ],
                extensions: vec!["pdf".into(), "doc".into(), "docx".into()],
                max_size_mb: 10.0,
                label: "Documents".into(),
            },
            CategoryRule {
                kind: CategoryKind::Spreadsheet,
                content_types: vec![
                    "application/vnd.ms-excel".into(),
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".into(),
                ],
                extensions: vec!["xls".into(), "xlsx".into()],
                max_size_mb: 5.0,
                label: "Spreadsheets".into(),
            },
            CategoryRule {
                kind: CategoryKind::Video,
                content_types: vec![
                    "video/mp4".into(),
                    "video/quicktime".into(),
                    "video/x-msvideo".into(),
                    "video/x-matroska".into(),
                ],
                extensions: vec!["mp4".into(), "mov".into(), "avi".into(), "mkv".into()],
                max_size_mb: 100.0,
                label: "Videos".into(),
            },
            CategoryRule {
                kind: CategoryKind::Audio,
                content_types: vec![
                    "audio/mpeg".into(),
                    "audio/mp4".into(),
                    "audio/ogg".into(),
                ],
                extensions: vec!["mp3".into(), "m4a".into(), "ogg".into()],
                max_size_mb: 50.0,
                label: "Audio".into(),
            },
            CategoryRule {
                kind: CategoryKind::Publication,
                // octet-stream covers transports that do not know the format
                content_types: vec![
                    "application/jwpub".into(),
                    "application/octet-stream".into(),
                ],
                extensions: vec![RESERVED_PUBLICATION_EXTENSION.into()],
                max_size_mb: 5.0,
                label: "Publications".into(),
            },
        ])
    }

    /// Classify by content type and extension.
    ///
    /// The reserved publication extension matches first and unconditionally;
    /// otherwise categories are scanned in declaration order and the first
    /// whose content-type set or extension set contains the input wins.
    pub fn classify(&self, content_type: &str, extension: &str) -> Option<&CategoryRule> {
        let content_type = normalize_content_type(content_type);
        let extension = normalize_extension(extension);

        if extension == RESERVED_PUBLICATION_EXTENSION {
            if let Some(rule) = self.rule(CategoryKind::Publication) {
                return Some(rule);
            }
        }

        self.rules.iter().find(|rule| {
            rule.content_types.iter().any(|ct| *ct == content_type)
                || rule.extensions.iter().any(|ext| *ext == extension)
        })
    }

    /// Look up a rule by category kind.
    pub fn rule(&self, kind: CategoryKind) -> Option<&CategoryRule> {
        self.rules.iter().find(|rule| rule.kind == kind)
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// One line per category for the welcome text, e.g.
    /// `• Images (jpg, jpeg, png, gif) - up to 5.0 МБ`.
    pub fn describe(&self) -> String {
        self.rules
            .iter()
            .map(|rule| {
                format!(
                    "• {} ({}) - up to {}",
                    rule.label,
                    rule.extensions.join(", "),
                    format_size_mb(rule.max_size_mb)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for TypePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Strip MIME parameters and lowercase, e.g.
/// `image/jpeg; charset=utf-8` -> `image/jpeg`.
fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

/// Lowercase and strip a leading dot, e.g. `.JPG` -> `jpg`.
fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_lowercase()
}

/// Render a size in megabytes with unit auto-scaling: megabytes below 1024,
/// gigabytes at or above, one decimal place.
pub fn format_size_mb(size_mb: f64) -> String {
    if size_mb >= 1024.0 {
        format!("{:.1} ГБ", size_mb / 1024.0)
    } else {
        format!("{:.1} МБ", size_mb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_extension_wins_over_octet_stream() {
        let policy = TypePolicy::standard();
        // octet-stream also appears in the publication content-type set, but
        // the precedence must come from the extension alone.
        let rule = policy
            .classify("application/octet-stream", "jwpub")
            .expect("publication must classify");
        assert_eq!(rule.kind, CategoryKind::Publication);
    }

    #[test]
    fn reserved_extension_wins_regardless_of_content_type() {
        let policy = TypePolicy::standard();
        let rule = policy.classify("image/jpeg", ".JWPUB").unwrap();
        assert_eq!(rule.kind, CategoryKind::Publication);
    }

    #[test]
    fn content_type_match() {
        let policy = TypePolicy::standard();
        let rule = policy.classify("image/jpeg; charset=binary", "bin").unwrap();
        assert_eq!(rule.kind, CategoryKind::Image);
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let policy = TypePolicy::standard();
        let rule = policy.classify("application/unknown", ".PDF").unwrap();
        assert_eq!(rule.kind, CategoryKind::Document);
    }

    #[test]
    fn unmatched_input_is_unsupported() {
        let policy = TypePolicy::standard();
        assert!(policy.classify("text/x-rust", "rs").is_none());
    }

    #[test]
    fn size_formatting_auto_scales() {
        assert_eq!(format_size_mb(10.0), "10.0 МБ");
        assert_eq!(format_size_mb(1023.9), "1023.9 МБ");
        assert_eq!(format_size_mb(1024.0), "1.0 ГБ");
        assert_eq!(format_size_mb(1536.0), "1.5 ГБ");
    }

    #[test]
    fn describe_lists_every_category() {
        let policy = TypePolicy::standard();
        let description = policy.describe();
        for rule in policy.rules() {
            assert!(description.contains(&rule.label));
        }
        assert!(description.contains("up to 5.0 МБ"));
    }
}
