//! Integration coverage for the command layer (resolver + session driver
//! + record store working together). CWD preference is covered at the
//! resolver unit-test level in `agency-core`, since it needs a real git
//! repo on disk to exercise the CWD branch meaningfully; everything
//! reachable with a synthetic, non-git data directory is covered here.

use agency_cli::cli::RunArgs;
use agency_cli::commands::{attach, kill, stop};
use agency_core::model::RunMeta;
use agency_core::store;
use agency_tmux::fake::FakeSessionDriver;
use agency_tmux::SessionDriver;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

async fn seed(data_dir: &std::path::Path, repo_id: &str, run_id: &str, name: &str) {
    let dir = store::run_dir(data_dir, repo_id, run_id);
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let meta = RunMeta::new_for_test(repo_id, run_id, Some(name));
    tokio::fs::write(dir.join("meta.json"), serde_json::to_vec_pretty(&meta).unwrap())
        .await
        .unwrap();
}

fn run_args(run_ref: &str) -> RunArgs {
    RunArgs {
        run_ref: run_ref.to_string(),
        repo: None,
    }
}

#[tokio::test]
async fn command_protocol_scenarios() {
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("AGENCY_DATA_DIR", tmp.path());
    let token = CancellationToken::new();

    // An id prefix shared by two runs is ambiguous.
    seed(tmp.path(), "repoA", "20260110120000-a3f2", "one").await;
    seed(tmp.path(), "repoA", "20260110120000-a3f7", "two").await;

    let driver = FakeSessionDriver::default();
    let err = kill::run(&run_args("20260110120000-a"), &driver, &token)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "ERunIDAmbiguous");

    // A name shared by runs in different repos is ambiguous too (no
    // --repo, and the synthetic CWD here matches neither repo, so this
    // exercises the global branch).
    seed(tmp.path(), "repoB", "20260110130000-9911", "refactor").await;
    seed(tmp.path(), "repoC", "20260110140000-0001", "refactor").await;
    let err = kill::run(&run_args("refactor"), &driver, &token)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "ERunRefAmbiguous");
    let rendered = err.details().unwrap().get("candidates").unwrap().clone();
    let expected = "20260110130000-9911 (refactor) in repo repoB\n\
         20260110140000-0001 (refactor) in repo repoC\n\
         hint: use the full run id, or pass --repo to narrow the scope";
    assert_eq!(rendered, expected);

    // Stopping a run with no live session is a no-op: exit 0, meta
    // untouched.
    let exit = stop::run(&run_args("one"), &driver, &token).await.unwrap();
    assert_eq!(exit, 0);
    let meta = store::read_meta(tmp.path(), "repoA", "20260110120000-a3f2")
        .await
        .unwrap();
    assert!(!meta.flags.needs_attention);

    // Stopping a run with a live session sends C-c, flips
    // needs_attention, and appends one stop event.
    driver
        .new_session("agency-20260110120000-a3f2", std::path::Path::new("/tmp"), &[])
        .await
        .unwrap();
    let exit = stop::run(&run_args("one"), &driver, &token).await.unwrap();
    assert_eq!(exit, 0);
    assert_eq!(
        driver.sent_keys("agency-20260110120000-a3f2"),
        vec![vec!["C-c".to_string()]]
    );
    let meta = store::read_meta(tmp.path(), "repoA", "20260110120000-a3f2")
        .await
        .unwrap();
    assert!(meta.flags.needs_attention);

    // Attaching to a run whose session does not exist surfaces a
    // suggestion to resume it.
    let err = attach::run(&run_args("two"), &driver, &token)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "ESessionNotFound");
    assert_eq!(
        err.details().unwrap().get("suggestion").unwrap(),
        "try: resume 20260110120000-a3f7"
    );

    std::env::remove_var("AGENCY_DATA_DIR");
}
