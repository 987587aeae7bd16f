//! Persistence behavior of the saved-voice library.

use std::path::{Path, PathBuf};

use voice_studio::{ProfileKind, VoiceLibrary};

fn fake_audio(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    // The library copies reference audio verbatim; content is opaque to it.
    std::fs::write(&path, b"RIFF....WAVEfmt fake").unwrap();
    path
}

#[test]
fn save_clone_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let library = VoiceLibrary::new(dir.path().join("voices")).unwrap();
    let reference = fake_audio(dir.path(), "ref.wav");

    let saved = library
        .save_clone("Studio Narrator", &reference, "a quick brown fox")
        .unwrap();
    assert!(saved.id.starts_with("Studio_Narrator_"));
    assert!(saved.audio_path().is_file());

    let listed = library.list().unwrap();
    assert_eq!(listed.len(), 1);
    let entry = &listed[0];
    assert_eq!(entry.profile.name, "Studio Narrator");
    match &entry.profile.kind {
        ProfileKind::Clone { ref_text } => assert_eq!(ref_text, "a quick brown fox"),
        other => panic!("unexpected kind: {other:?}"),
    }

    let fetched = library.get(&saved.id).unwrap();
    assert_eq!(fetched.profile.name, "Studio Narrator");
    let copied = std::fs::read(fetched.audio_path()).unwrap();
    assert_eq!(copied, std::fs::read(&reference).unwrap());
}

#[test]
fn save_design_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let library = VoiceLibrary::new(dir.path().join("voices")).unwrap();
    let generated = fake_audio(dir.path(), "designed.wav");

    let saved = library
        .save_design(
            "Radio Host",
            "deep male voice with a calm delivery",
            "welcome to the evening show",
            &generated,
        )
        .unwrap();

    let fetched = library.get(&saved.id).unwrap();
    match &fetched.profile.kind {
        ProfileKind::Design {
            design_instruct,
            target_text,
        } => {
            assert_eq!(design_instruct, "deep male voice with a calm delivery");
            assert_eq!(target_text, "welcome to the evening show");
        }
        other => panic!("unexpected kind: {other:?}"),
    }
}

#[test]
fn delete_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let library = VoiceLibrary::new(dir.path().join("voices")).unwrap();
    let reference = fake_audio(dir.path(), "ref.wav");

    let saved = library.save_clone("temp", &reference, "text").unwrap();
    assert!(library.delete(&saved.id).unwrap());
    assert!(!library.delete(&saved.id).unwrap());
    assert!(library.list().unwrap().is_empty());
}

#[test]
fn list_skips_corrupt_entries() {
    let dir = tempfile::tempdir().unwrap();
    let voices_dir = dir.path().join("voices");
    let library = VoiceLibrary::new(&voices_dir).unwrap();
    let reference = fake_audio(dir.path(), "ref.wav");
    library.save_clone("good", &reference, "text").unwrap();

    // A directory with mangled metadata must not poison the listing.
    let junk = voices_dir.join("junk_20240101_000000");
    std::fs::create_dir_all(&junk).unwrap();
    std::fs::write(junk.join("meta.json"), "{not json").unwrap();
    // And one with no metadata at all.
    std::fs::create_dir_all(voices_dir.join("empty_dir")).unwrap();

    let listed = library.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].profile.name, "good");
}

#[test]
fn list_orders_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let voices_dir = dir.path().join("voices");
    let library = VoiceLibrary::new(&voices_dir).unwrap();

    for (id, created) in [
        ("older_20240101_000000", "2024-01-01T00:00:00Z"),
        ("newer_20250601_000000", "2025-06-01T00:00:00Z"),
    ] {
        let profile_dir = voices_dir.join(id);
        std::fs::create_dir_all(&profile_dir).unwrap();
        std::fs::write(profile_dir.join("reference.wav"), b"fake").unwrap();
        let meta = format!(
            r#"{{"name":"{id}","created":"{created}","ref_audio":"reference.wav","type":"clone","ref_text":"hi"}}"#
        );
        std::fs::write(profile_dir.join("meta.json"), meta).unwrap();
    }

    let listed = library.list().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, "newer_20250601_000000");
    assert_eq!(listed[1].id, "older_20240101_000000");
}

#[test]
fn get_rejects_path_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let library = VoiceLibrary::new(dir.path().join("voices")).unwrap();
    assert!(library.get("../outside").is_err());
    assert!(library.delete("../outside").is_err());
}
