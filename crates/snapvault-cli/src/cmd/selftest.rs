use snapvault_core::commands;
use snapvault_core::digest::Digest;
use snapvault_core::repo::Repository;

/// Exercise the full snapshot→modify→snapshot→restore→prune round trip
/// against a throwaway repository and verify the deduplication and
/// integrity invariants along the way. Fails on the first broken check.
pub(crate) fn run_selftest() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let mut repo = Repository::open(&tmp.path().join("repo"))?;
    let source = tmp.path().join("source");
    std::fs::create_dir_all(&source)?;

    // Two identical files must collapse into a single stored blob.
    std::fs::write(source.join("a.txt"), b"hello")?;
    std::fs::write(source.join("b.txt"), b"hello")?;
    let s1 = commands::snapshot::run(&mut repo, &source)?;
    check(s1.files == 2, "first snapshot records two file entries")?;
    check(
        repo.blobs.count()? == 1,
        "identical content is stored exactly once",
    )?;
    check(
        repo.blobs.exists(&Digest::compute(b"hello"))?,
        "stored blob is addressed by its content digest",
    )?;

    // New content in a second snapshot adds exactly one blob.
    std::fs::write(source.join("c.txt"), b"world")?;
    let s2 = commands::snapshot::run(&mut repo, &source)?;
    check(s2.files == 3, "second snapshot records three file entries")?;
    check(s2.blobs_written == 1, "only the new content is written")?;
    check(repo.blobs.count()? == 2, "blob store holds two objects")?;

    // Restore must reproduce the tree byte for byte.
    let out = tmp.path().join("restore");
    let restored = commands::restore::run(&mut repo, s2.snapshot_id, &out)?;
    check(restored.files == 3, "restore writes all three files")?;
    check(
        std::fs::read(out.join("a.txt"))? == b"hello"
            && std::fs::read(out.join("c.txt"))? == b"world",
        "restored content matches the source",
    )?;

    // Pruning the first snapshot keeps everything the second references.
    let pruned = commands::prune::run(&mut repo, s1.snapshot_id)?;
    check(pruned.blobs_deleted == 0, "no blob referenced by a survivor is reclaimed")?;
    check(
        repo.blobs.exists(&Digest::compute(b"hello"))?,
        "shared blob survives the first prune",
    )?;

    // Pruning the last snapshot empties the store.
    commands::prune::run(&mut repo, s2.snapshot_id)?;
    check(repo.blobs.count()? == 0, "pruning the last snapshot empties the store")?;
    check(
        commands::list::run(&repo)?.is_empty(),
        "no snapshot records remain",
    )?;

    println!("Self-test passed.");
    Ok(())
}

fn check(ok: bool, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    if ok {
        println!("  ok: {what}");
        Ok(())
    } else {
        Err(format!("self-test failed: {what}").into())
    }
}
