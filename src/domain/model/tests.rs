// Unit tests for domain models

#[cfg(test)]
mod tests {
    use crate::domain::errors::*;
    use crate::domain::model::*;
    use std::path::{Path, PathBuf};

    fn context_for(source: &str) -> JobContext {
        let job_id = JobId::parse("job-1").unwrap();
        JobContext::new(source, job_id, Path::new("/tmp/hlspack-tests")).unwrap()
    }

    #[test]
    fn test_job_id_parse_trims_and_validates() {
        assert_eq!(JobId::parse("  abc_1 ").unwrap().as_str(), "abc_1");
        assert!(JobId::parse("../escape").is_err());
        assert!(JobId::parse("").is_err());
    }

    #[test]
    fn test_generated_job_ids_are_unique_and_valid() {
        let a = JobId::generate();
        let b = JobId::generate();
        assert_ne!(a, b);
        assert!(JobId::parse(a.as_str()).is_ok());
    }

    #[test]
    fn test_context_derives_names() {
        let ctx = context_for("/videos/clip.mp4");
        assert_eq!(ctx.file_name(), "clip.mp4");
        assert_eq!(ctx.staged_source_name(), "source.mp4");
        assert_eq!(ctx.archive_name(), "clip.mp4.zip");
        assert_eq!(
            ctx.working_dir(),
            Path::new("/tmp/hlspack-tests/job-1-clip.mp4")
        );
    }

    #[test]
    fn test_context_artifact_paths_live_in_working_dir() {
        let ctx = context_for("/videos/clip.mp4");
        for path in [
            ctx.staged_source(),
            ctx.key_file(),
            ctx.key_descriptor(),
            ctx.manifest(),
            ctx.partial_manifest(),
            ctx.status_marker(),
            ctx.archive(),
        ] {
            assert_eq!(path.parent().unwrap(), ctx.working_dir());
        }
        assert!(ctx.key_file().is_absolute());
    }

    #[test]
    fn test_final_output_sits_next_to_source() {
        let ctx = context_for("/videos/clip.mp4");
        assert_eq!(ctx.final_output(), PathBuf::from("/videos/clip.mp4.zip"));
    }

    #[test]
    fn test_source_without_extension() {
        let ctx = context_for("/videos/raw");
        assert_eq!(ctx.staged_source_name(), "source");
    }

    #[test]
    fn test_context_rejects_path_without_file_name() {
        let err = JobContext::new("/", JobId::generate(), Path::new("/tmp")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadArgs);
    }

    #[test]
    fn test_checkpoint_artifacts_cover_checkpointed_stages() {
        let ctx = context_for("/videos/clip.mp4");
        for stage in Stage::CHECKPOINTED {
            assert!(ctx.checkpoint_artifact(stage).is_some(), "{}", stage);
        }
        assert!(ctx.checkpoint_artifact(Stage::Init).is_none());
        assert!(ctx.checkpoint_artifact(Stage::Cleaned).is_none());
    }

    #[test]
    fn test_stage_order() {
        assert!(Stage::Init < Stage::SourceStaged);
        assert!(Stage::Packaged < Stage::Finalized);

        let mut sorted = Stage::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, Stage::ALL.to_vec());
    }

    #[test]
    fn test_context_rejects_control_characters_in_file_name() {
        for source in ["/videos/a\nb.mp4", "/videos/a\rb.mp4", "/videos/tab\t.mp4"] {
            let err = JobContext::new(source, JobId::generate(), Path::new("/tmp")).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BadArgs, "{:?}", source);
        }
        assert!(JobContext::new("/videos/50%off clip.mp4", JobId::generate(), Path::new("/tmp")).is_ok());
    }

    #[test]
    fn test_key_material_debug_hides_bytes() {
        let key = KeyMaterial::new([0xab; KEY_LEN]);
        assert!(!format!("{:?}", key).contains("171"));
    }

    #[test]
    fn test_iv_hex_is_32_lowercase_chars() {
        let iv = InitVector::new([0xAB; IV_LEN]);
        let hex = iv.to_hex();
        assert_eq!(hex.len(), 32);
        assert_eq!(hex, "ab".repeat(16));
    }

    #[test]
    fn test_descriptor_render_and_parse() {
        let iv = InitVector::new([1u8; IV_LEN]);
        let descriptor = KeyDescriptor::new(DEFAULT_KEY_URI, "/work/enc.key", &iv);
        let text = descriptor.render();

        assert_eq!(text.lines().count(), 3);
        assert!(!text.ends_with('\n'));
        assert_eq!(text.lines().next(), Some(DEFAULT_KEY_URI));

        let parsed = KeyDescriptor::parse(&text).unwrap();
        assert_eq!(parsed, descriptor);
    }

    #[test]
    fn test_descriptor_parse_rejects_bad_input() {
        assert!(KeyDescriptor::parse("only\ntwo").is_err());
        assert!(KeyDescriptor::parse("uri\n/key\nNOTHEX").is_err());
        assert!(KeyDescriptor::parse(&format!("uri\n/key\n{}", "AB".repeat(16))).is_err());
        assert!(KeyDescriptor::parse(&format!("\n/key\n{}", "ab".repeat(16))).is_err());
    }

    #[test]
    fn test_stage_event_builder() {
        let job_id = JobId::parse("j").unwrap();
        let event = StageEvent::new(&job_id, Stage::Transcoded, StageStatus::Failed)
            .with_detail("ffmpeg")
            .with_error("exit 1");
        assert_eq!(event.stage, Stage::Transcoded);
        assert_eq!(event.detail.as_deref(), Some("ffmpeg"));
        assert_eq!(event.error.as_deref(), Some("exit 1"));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["stage"], "transcoded");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["job_id"], "j");
    }
}
