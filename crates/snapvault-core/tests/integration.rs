use std::path::{Path, PathBuf};

use snapvault_core::commands::{list, prune, restore, snapshot};
use snapvault_core::digest::Digest;
use snapvault_core::error::VaultError;
use snapvault_core::repo::Repository;

struct Fixture {
    _tmp: tempfile::TempDir,
    repo: Repository,
    source: PathBuf,
    out: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let repo = Repository::open(&tmp.path().join("repo")).unwrap();
        let source = tmp.path().join("source");
        let out = tmp.path().join("out");
        std::fs::create_dir_all(&source).unwrap();
        Self {
            _tmp: tmp,
            repo,
            source,
            out,
        }
    }

    fn write(&self, rel: &str, content: &[u8]) {
        let path = self.source.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// On-disk path of a blob inside the repository, for corruption tests.
    fn blob_path(&self, digest: &Digest) -> PathBuf {
        self.repo
            .root
            .join("blobs")
            .join(digest.shard_prefix())
            .join(digest.to_hex())
    }
}

fn assert_tree_equal(a: &Path, b: &Path, rels: &[&str]) {
    for rel in rels {
        let left = std::fs::read(a.join(rel)).unwrap();
        let right = std::fs::read(b.join(rel)).unwrap();
        assert_eq!(left, right, "content mismatch for {rel}");
    }
}

#[test]
fn snapshot_restore_round_trip() {
    let mut fx = Fixture::new();
    fx.write("file1.txt", b"Hello World");
    fx.write("subdir/file2.bin", &(0u16..1024).map(|i| (i % 251) as u8).collect::<Vec<_>>());

    let stats = snapshot::run(&mut fx.repo, &fx.source).unwrap();
    assert_eq!(stats.files, 2);

    restore::run(&mut fx.repo, stats.snapshot_id, &fx.out).unwrap();
    assert_tree_equal(&fx.source, &fx.out, &["file1.txt", "subdir/file2.bin"]);
}

#[test]
fn restore_overwrites_stale_destination_files() {
    let mut fx = Fixture::new();
    fx.write("a.txt", b"fresh");
    let id = snapshot::run(&mut fx.repo, &fx.source).unwrap().snapshot_id;

    std::fs::create_dir_all(&fx.out).unwrap();
    std::fs::write(fx.out.join("a.txt"), b"stale stale stale").unwrap();

    restore::run(&mut fx.repo, id, &fx.out).unwrap();
    assert_eq!(std::fs::read(fx.out.join("a.txt")).unwrap(), b"fresh");
}

#[test]
fn dedup_and_prune_lifecycle() {
    // The concrete scenario: a.txt and b.txt share content, c.txt arrives
    // later, snapshots are pruned one by one.
    let mut fx = Fixture::new();
    fx.write("a.txt", b"hello");
    fx.write("b.txt", b"hello");

    let s1 = snapshot::run(&mut fx.repo, &fx.source).unwrap();
    assert_eq!(s1.files, 2);
    assert_eq!(fx.repo.blobs.count().unwrap(), 1);

    let entries = fx.repo.meta.file_entries(s1.snapshot_id).unwrap();
    assert!(entries.iter().all(|e| e.digest == Digest::compute(b"hello")));

    fx.write("c.txt", b"world");
    let s2 = snapshot::run(&mut fx.repo, &fx.source).unwrap();
    assert_eq!(s2.files, 3);
    assert_eq!(fx.repo.blobs.count().unwrap(), 2);

    // Pruning snapshot 1 keeps "hello": snapshot 2 still references it.
    prune::run(&mut fx.repo, s1.snapshot_id).unwrap();
    assert_eq!(fx.repo.blobs.count().unwrap(), 2);
    assert!(fx.repo.blobs.exists(&Digest::compute(b"hello")).unwrap());

    // Snapshot 2 is still fully restorable.
    restore::run(&mut fx.repo, s2.snapshot_id, &fx.out).unwrap();
    assert_tree_equal(&fx.source, &fx.out, &["a.txt", "b.txt", "c.txt"]);

    // Pruning the last snapshot empties the store.
    prune::run(&mut fx.repo, s2.snapshot_id).unwrap();
    assert_eq!(fx.repo.blobs.count().unwrap(), 0);
    assert!(list::run(&fx.repo).unwrap().is_empty());
}

#[test]
fn empty_directory_round_trips_to_empty_tree() {
    let mut fx = Fixture::new();
    let id = snapshot::run(&mut fx.repo, &fx.source).unwrap().snapshot_id;

    let stats = restore::run(&mut fx.repo, id, &fx.out).unwrap();
    assert_eq!(stats.files, 0);
    assert!(std::fs::read_dir(&fx.out).unwrap().next().is_none());
}

#[test]
fn modified_file_gets_new_blob_and_old_survives_for_old_snapshot() {
    let mut fx = Fixture::new();
    fx.write("file1.txt", b"Snapshot1");
    let s1 = snapshot::run(&mut fx.repo, &fx.source).unwrap().snapshot_id;

    fx.write("file1.txt", b"Snapshot2");
    let s2 = snapshot::run(&mut fx.repo, &fx.source).unwrap().snapshot_id;
    assert_eq!(fx.repo.blobs.count().unwrap(), 2);

    prune::run(&mut fx.repo, s1).unwrap();

    restore::run(&mut fx.repo, s2, &fx.out).unwrap();
    assert_eq!(std::fs::read(fx.out.join("file1.txt")).unwrap(), b"Snapshot2");
}

#[test]
fn deleted_blob_fails_restore_with_corruption() {
    let mut fx = Fixture::new();
    fx.write("a.txt", b"precious");
    let id = snapshot::run(&mut fx.repo, &fx.source).unwrap().snapshot_id;

    std::fs::remove_file(fx.blob_path(&Digest::compute(b"precious"))).unwrap();

    let err = restore::run(&mut fx.repo, id, &fx.out).unwrap_err();
    assert!(matches!(err, VaultError::Corrupt(_)), "got: {err}");
    // The destination never received wrong content.
    assert!(!fx.out.join("a.txt").exists());
}

#[test]
fn truncated_blob_fails_restore_with_corruption() {
    let mut fx = Fixture::new();
    fx.write("a.txt", b"precious content that gets truncated");
    let id = snapshot::run(&mut fx.repo, &fx.source).unwrap().snapshot_id;

    let blob = fx.blob_path(&Digest::compute(b"precious content that gets truncated"));
    std::fs::write(&blob, b"precious").unwrap();

    let err = restore::run(&mut fx.repo, id, &fx.out).unwrap_err();
    assert!(matches!(err, VaultError::Corrupt(_)), "got: {err}");
}

#[test]
fn re_snapshot_of_same_content_repairs_truncated_blob() {
    let mut fx = Fixture::new();
    fx.write("a.txt", b"precious content");
    snapshot::run(&mut fx.repo, &fx.source).unwrap();

    let blob = fx.blob_path(&Digest::compute(b"precious content"));
    std::fs::write(&blob, b"prec").unwrap();

    // The second snapshot holds the correct bytes; it must notice the
    // damaged object and rewrite it rather than no-op on the existing key.
    let s2 = snapshot::run(&mut fx.repo, &fx.source).unwrap();
    assert_eq!(s2.blobs_written, 1);

    restore::run(&mut fx.repo, s2.snapshot_id, &fx.out).unwrap();
    assert_eq!(
        std::fs::read(fx.out.join("a.txt")).unwrap(),
        b"precious content"
    );
}

#[test]
fn corruption_in_one_snapshot_leaves_others_restorable() {
    let mut fx = Fixture::new();
    fx.write("stable.txt", b"stable");
    let ok_snap = snapshot::run(&mut fx.repo, &fx.source).unwrap().snapshot_id;

    fx.write("doomed.txt", b"doomed");
    let bad_snap = snapshot::run(&mut fx.repo, &fx.source).unwrap().snapshot_id;

    std::fs::remove_file(fx.blob_path(&Digest::compute(b"doomed"))).unwrap();

    assert!(restore::run(&mut fx.repo, bad_snap, &fx.out).is_err());
    let out2 = fx.out.with_file_name("out2");
    restore::run(&mut fx.repo, ok_snap, &out2).unwrap();
    assert_eq!(std::fs::read(out2.join("stable.txt")).unwrap(), b"stable");
}

#[test]
fn unreadable_source_file_aborts_whole_snapshot() {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut fx = Fixture::new();
        fx.write("ok.txt", b"fine");
        fx.write("secret.txt", b"no access");
        std::fs::set_permissions(
            fx.source.join("secret.txt"),
            std::fs::Permissions::from_mode(0o000),
        )
        .unwrap();
        if std::fs::read(fx.source.join("secret.txt")).is_ok() {
            // Permission bits don't restrict this user (root); nothing to test.
            return;
        }

        let err = snapshot::run(&mut fx.repo, &fx.source).unwrap_err();
        assert!(matches!(err, VaultError::SourceRead { .. }), "got: {err}");
        // No partial snapshot was committed.
        assert!(list::run(&fx.repo).unwrap().is_empty());

        std::fs::set_permissions(
            fx.source.join("secret.txt"),
            std::fs::Permissions::from_mode(0o644),
        )
        .unwrap();
    }
}
