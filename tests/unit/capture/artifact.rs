use super::*;

#[test]
fn mint_concatenates_in_order() {
    let mut store = ArtifactStore::new();
    let a = store.mint(
        vec![b"ab".to_vec(), b"cde".to_vec(), b"f".to_vec()],
        VideoFormat::VP9_WEBM,
    );
    assert_eq!(a.size_bytes, 6);
    assert_eq!(a.chunk_count, 3);
    assert_eq!(a.mime_type, "video/webm;codecs=vp9");
    assert_eq!(store.bytes(a.handle), Some(&b"abcdef"[..]));
}

#[test]
fn empty_artifact_is_valid() {
    let mut store = ArtifactStore::new();
    let a = store.mint(Vec::new(), VideoFormat::MATROSKA);
    assert_eq!(a.size_bytes, 0);
    assert_eq!(a.chunk_count, 0);
    assert_eq!(store.bytes(a.handle), Some(&[][..]));
    assert!(a.suggested_filename().ends_with(".mkv"));
}

#[test]
fn handles_are_unique_and_release_once() {
    let mut store = ArtifactStore::new();
    let a = store.mint(vec![vec![1]], VideoFormat::VP8_WEBM);
    let b = store.mint(vec![vec![2]], VideoFormat::VP8_WEBM);
    assert_ne!(a.handle, b.handle);
    assert_eq!(store.live_count(), 2);

    assert!(store.release(a.handle));
    assert!(!store.release(a.handle));
    assert!(!store.is_live(a.handle));
    assert_eq!(store.bytes(a.handle), None);
    assert_eq!(store.live_count(), 1);
}

#[test]
fn uri_and_filename_patterns() {
    let mut store = ArtifactStore::new();
    let a = store.mint(vec![vec![0]], VideoFormat::VP9_WEBM);
    assert_eq!(a.handle.uri(), format!("blob:textreel/{}", a.handle.id()));
    assert_eq!(a.handle.to_string(), a.handle.uri());
    assert_eq!(
        a.suggested_filename(),
        format!("text-video-{}.webm", a.created_unix_ms)
    );
}

#[test]
fn save_writes_suggested_file_and_fails_after_release() {
    let dir = std::env::temp_dir().join(format!("textreel-artifact-{}", std::process::id()));
    let mut store = ArtifactStore::new();
    let a = store.mint(vec![b"webm!".to_vec()], VideoFormat::VP9_WEBM);

    let path = store.save(&a, &dir).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"webm!");
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some(a.suggested_filename().as_str())
    );

    store.release(a.handle);
    assert!(store.save(&a, &dir).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}
