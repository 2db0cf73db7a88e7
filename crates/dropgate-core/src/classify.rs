//! Classifier module
//!
//! Pure evaluation of an inbound file descriptor against the type policy.
//! Classification has no side effects; the only session input is the count of
//! already-accepted files, needed for the generated-name counter.

use crate::models::{InboundFile, PendingFile, UnsupportedFile};
use crate::policy::{format_size_mb, CategoryKind, TypePolicy};

/// Content type assumed when the transport does not declare one.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Verdict for one inbound file.
#[derive(Debug, Clone)]
pub enum Classification {
    Accepted(PendingFile),
    Rejected(UnsupportedFile),
}

/// Evaluates inbound files against a [`TypePolicy`].
#[derive(Debug, Clone)]
pub struct Classifier {
    policy: TypePolicy,
    /// Transport-imposed ceiling for files arriving through the native video
    /// slot. Checked before the category's own ceiling.
    video_transport_limit_mb: f64,
}

impl Classifier {
    pub fn new(policy: TypePolicy, video_transport_limit_mb: f64) -> Self {
        Self {
            policy,
            video_transport_limit_mb,
        }
    }

    pub fn policy(&self) -> &TypePolicy {
        &self.policy
    }

    /// Evaluate one inbound file. `accepted_count` is the number of files the
    /// session has already accepted, used for generated photo names.
    pub fn evaluate(&self, file: &InboundFile, accepted_count: usize) -> Classification {
        // Bare photos carry no filename; they are a fixed image category with
        // a generated index-based name.
        let (file_name, forced_kind) = match &file.file_name {
            Some(name) => (name.clone(), None),
            None => (
                format!("image_{}.jpg", accepted_count + 1),
                Some(CategoryKind::Image),
            ),
        };

        let content_type = file
            .content_type
            .as_deref()
            .unwrap_or(FALLBACK_CONTENT_TYPE);
        let extension = file_name.rsplit('.').next().unwrap_or("");

        let rule = match forced_kind {
            Some(kind) => self.policy.rule(kind),
            None => self.policy.classify(content_type, extension),
        };

        let rule = match rule {
            Some(rule) => rule,
            None => {
                tracing::debug!(file_name = %file_name, content_type = %content_type, "Unsupported format");
                return Classification::Rejected(UnsupportedFile {
                    file_name,
                    reason: "unsupported format".into(),
                });
            }
        };

        let size_mb = file.size_mb();

        // The transport ceiling for video-slot deliveries is distinct from
        // and usually smaller than the storage policy's own ceiling.
        if file.via_video_slot && rule.kind == CategoryKind::Video && size_mb > self.video_transport_limit_mb {
            return Classification::Rejected(UnsupportedFile {
                file_name,
                reason: format!(
                    "exceeds transfer limit of {}, send a link instead",
                    format_size_mb(self.video_transport_limit_mb)
                ),
            });
        }

        if size_mb > rule.max_size_mb {
            return Classification::Rejected(UnsupportedFile {
                file_name,
                reason: format!("exceeds size limit of {}", format_size_mb(rule.max_size_mb)),
            });
        }

        Classification::Accepted(PendingFile {
            fetch_token: file.fetch_token.clone(),
            file_name,
            category: rule.kind,
            size_mb,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(TypePolicy::standard(), 20.0)
    }

    fn inbound(name: Option<&str>, content_type: Option<&str>, size_mb: f64) -> InboundFile {
        InboundFile {
            fetch_token: "token".into(),
            file_name: name.map(str::to_string),
            content_type: content_type.map(str::to_string),
            size_bytes: (size_mb * 1024.0 * 1024.0) as u64,
            via_video_slot: false,
        }
    }

    #[test]
    fn accepted_file_keeps_sender_name() {
        let verdict = classifier().evaluate(&inbound(Some("trip.jpg"), Some("image/jpeg"), 1.0), 0);
        match verdict {
            Classification::Accepted(file) => {
                assert_eq!(file.file_name, "trip.jpg");
                assert_eq!(file.category, CategoryKind::Image);
            }
            Classification::Rejected(rejected) => panic!("rejected: {}", rejected.reason),
        }
    }

    #[test]
    fn bare_photo_gets_generated_index_name() {
        let verdict = classifier().evaluate(&inbound(None, None, 1.0), 2);
        match verdict {
            Classification::Accepted(file) => {
                assert_eq!(file.file_name, "image_3.jpg");
                assert_eq!(file.category, CategoryKind::Image);
            }
            Classification::Rejected(rejected) => panic!("rejected: {}", rejected.reason),
        }
    }

    #[test]
    fn oversized_document_reports_formatted_limit() {
        let verdict = classifier().evaluate(&inbound(Some("plan.pdf"), Some("application/pdf"), 11.0), 0);
        match verdict {
            Classification::Rejected(rejected) => {
                assert_eq!(rejected.reason, "exceeds size limit of 10.0 МБ");
            }
            Classification::Accepted(_) => panic!("11 MB document must be rejected"),
        }
    }

    #[test]
    fn unknown_format_is_rejected() {
        let verdict = classifier().evaluate(&inbound(Some("tool.exe"), Some("application/x-msdownload"), 1.0), 0);
        match verdict {
            Classification::Rejected(rejected) => assert_eq!(rejected.reason, "unsupported format"),
            Classification::Accepted(_) => panic!("exe must be rejected"),
        }
    }

    #[test]
    fn video_slot_ceiling_applies_before_category_ceiling() {
        let mut file = inbound(Some("talk.mp4"), Some("video/mp4"), 30.0);
        file.via_video_slot = true;
        // 30 MB is far below the 100 MB video category ceiling, but above the
        // 20 MB transport ceiling.
        let verdict = classifier().evaluate(&file, 0);
        match verdict {
            Classification::Rejected(rejected) => {
                assert_eq!(
                    rejected.reason,
                    "exceeds transfer limit of 20.0 МБ, send a link instead"
                );
            }
            Classification::Accepted(_) => panic!("video over the transport ceiling must be rejected"),
        }
    }

    #[test]
    fn video_outside_the_slot_uses_category_ceiling_only() {
        let file = inbound(Some("talk.mp4"), Some("video/mp4"), 30.0);
        let verdict = classifier().evaluate(&file, 0);
        assert!(matches!(verdict, Classification::Accepted(_)));
    }

    #[test]
    fn publication_accepts_octet_stream_content_type() {
        let verdict = classifier().evaluate(
            &inbound(Some("issue.jwpub"), Some("application/octet-stream"), 1.0),
            0,
        );
        match verdict {
            Classification::Accepted(file) => assert_eq!(file.category, CategoryKind::Publication),
            Classification::Rejected(rejected) => panic!("rejected: {}", rejected.reason),
        }
    }

    #[test]
    fn accepted_size_never_exceeds_ceiling() {
        let c = classifier();
        for (name, ct, size) in [
            ("a.jpg", "image/jpeg", 4.8),
            ("b.pdf", "application/pdf", 9.9),
            ("c.mp4", "video/mp4", 99.0),
        ] {
            match c.evaluate(&inbound(Some(name), Some(ct), size), 0) {
                Classification::Accepted(file) => {
                    let rule = c.policy().rule(file.category).unwrap();
                    assert!(file.size_mb <= rule.max_size_mb);
                }
                Classification::Rejected(rejected) => panic!("rejected: {}", rejected.reason),
            }
        }
    }
}
