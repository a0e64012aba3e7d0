#![allow(clippy::disallowed_methods)]

mod common;

use std::error::Error;
use std::ffi::OsStr;

use crawl_core::{CoreError, JobRequest};
use launcher::{LauncherError, QueueRegistry, RunDir, project_list, queue_path};

use common::{deploy_packages, memory_config};

#[tokio::test]
async fn test_project_list_concatenates_sources() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = memory_config()
        .with_project("shared", "shared.settings")
        .with_project("static-only", "static.settings");
    deploy_packages(dir.path(), &config, &["zeta", "alpha", "shared"])?;

    let projects = project_list(&config, &RunDir::new(dir.path())).await?;

    // Packages first (sorted), then [settings] keys; duplicates kept.
    assert_eq!(
        projects,
        vec!["alpha", "shared", "zeta", "shared", "static-only"]
    );
    Ok(())
}

#[tokio::test]
async fn test_project_list_includes_files_without_recursing() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = memory_config();
    let eggs_dir = dir.path().join("eggs");
    std::fs::create_dir_all(eggs_dir.join("nested").join("inner"))?;
    std::fs::write(eggs_dir.join("bundle"), b"egg")?;

    let projects = project_list(&config, &RunDir::new(dir.path())).await?;

    assert_eq!(projects, vec!["bundle", "nested"]);
    Ok(())
}

#[tokio::test]
async fn test_project_list_tolerates_missing_sources() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;

    let none = project_list(&memory_config(), &RunDir::new(dir.path())).await?;
    assert!(none.is_empty());

    let settings_only = project_list(
        &memory_config().with_project("solo", "solo.settings"),
        &RunDir::new(dir.path()),
    )
    .await?;
    assert_eq!(settings_only, vec!["solo"]);
    Ok(())
}

#[tokio::test]
async fn test_registry_opens_one_queue_per_project() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = memory_config().with_project("news", "news.settings");
    deploy_packages(dir.path(), &config, &["blog", "news"])?;

    let registry = QueueRegistry::open(&config, &RunDir::new(dir.path())).await?;

    // "news" appears in both sources but gets a single queue.
    assert_eq!(registry.projects(), vec!["blog", "news"]);
    assert_eq!(registry.len(), 2);
    assert!(!registry.is_empty());

    let dbs_dir = dir.path().join("dbs");
    assert!(dbs_dir.is_dir());
    assert_eq!(registry.dbs_dir(), dbs_dir.as_path());

    let news = registry.queue("news")?;
    assert_eq!(news.path(), dbs_dir.join("news.db").as_path());
    assert_eq!(news.path(), queue_path(&dbs_dir, "news").as_path());

    assert!(registry.get("missing").is_none());
    assert!(matches!(
        registry.queue("missing"),
        Err(LauncherError::UnknownProject(name)) if name == "missing"
    ));
    Ok(())
}

#[tokio::test]
async fn test_registry_creates_nested_storage_dir() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = memory_config()
        .with("dbs_dir", "state/queues/dbs")
        .with_project("solo", "solo.settings");

    let registry = QueueRegistry::open(&config, &RunDir::new(dir.path())).await?;

    let dbs_dir = dir.path().join("state/queues/dbs");
    assert!(dbs_dir.is_dir());
    assert_eq!(
        registry.queue("solo")?.path(),
        dbs_dir.join("solo.db").as_path()
    );
    Ok(())
}

#[tokio::test]
async fn test_registry_with_no_projects_is_empty() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;

    let registry = QueueRegistry::open(&memory_config(), &RunDir::new(dir.path())).await?;

    assert!(registry.is_empty());
    assert!(registry.pending_counts().await?.is_empty());
    assert!(dir.path().join("dbs").is_dir());
    Ok(())
}

#[tokio::test]
async fn test_rundir_override_leaves_cwd_untouched() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = memory_config();
    deploy_packages(dir.path(), &config, &["remote"])?;

    let before = std::env::current_dir()?;
    let run_dir = RunDir::from_args([
        OsStr::new("scrapyd"),
        OsStr::new("--rundir"),
        dir.path().as_os_str(),
    ])?;
    let registry = QueueRegistry::open(&config, &run_dir).await?;
    let after = std::env::current_dir()?;

    assert_eq!(before, after);
    assert_eq!(run_dir.path(), dir.path());
    assert_eq!(registry.projects(), vec!["remote"]);
    assert_eq!(
        registry.queue("remote")?.path(),
        dir.path().join("dbs").join("remote.db").as_path()
    );
    Ok(())
}

#[tokio::test]
async fn test_storage_dir_creation_failure_is_fatal() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = memory_config().with_project("solo", "solo.settings");
    std::fs::write(dir.path().join("dbs"), b"not a directory")?;

    let result = QueueRegistry::open(&config, &RunDir::new(dir.path())).await;

    assert!(matches!(result, Err(LauncherError::Io(_))));
    Ok(())
}

#[tokio::test]
async fn test_invalid_backend_is_rejected_before_opening() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = memory_config()
        .with("queue_backend", "sqlite")
        .with_project("solo", "solo.settings");

    let result = QueueRegistry::open(&config, &RunDir::new(dir.path())).await;

    assert!(matches!(result, Err(LauncherError::Db(_))));
    assert!(!dir.path().join("dbs").exists());
    Ok(())
}

#[tokio::test]
async fn test_refresh_opens_only_new_projects() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let run_dir = RunDir::new(dir.path());
    let config = memory_config();
    deploy_packages(dir.path(), &config, &["first"])?;

    let mut registry = QueueRegistry::open(&config, &run_dir).await?;
    registry
        .queue("first")?
        .add(JobRequest::new("first", "spider"), 0.0)
        .await?;

    deploy_packages(dir.path(), &config, &["second", "third"])?;
    let added = registry.refresh(&config, &run_dir).await?;

    assert_eq!(added, vec!["second", "third"]);
    assert_eq!(registry.projects(), vec!["first", "second", "third"]);

    // The existing queue was kept, not reopened.
    assert_eq!(
        registry.pending_counts().await?,
        vec![
            ("first".to_string(), 1),
            ("second".to_string(), 0),
            ("third".to_string(), 0),
        ]
    );

    assert!(registry.refresh(&config, &run_dir).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_queue_open_failure_keeps_no_partial_registry() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = memory_config().with("queue_backend", "surrealkv");
    deploy_packages(dir.path(), &config, &["aaa", "bbb"])?;

    // A regular file where the second project's store should go.
    let dbs_dir = dir.path().join("dbs");
    std::fs::create_dir_all(&dbs_dir)?;
    std::fs::write(queue_path(&dbs_dir, "bbb"), b"not a store")?;

    let result = QueueRegistry::open(&config, &RunDir::new(dir.path())).await;

    match result {
        Err(LauncherError::QueueOpen { project, .. }) => assert_eq!(project, "bbb"),
        other => panic!("expected QueueOpen error, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_failed_refresh_leaves_registry_unchanged() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let run_dir = RunDir::new(dir.path());
    let config = memory_config().with("queue_backend", "surrealkv");
    deploy_packages(dir.path(), &config, &["aaa"])?;

    let mut registry = QueueRegistry::open(&config, &run_dir).await?;
    assert_eq!(registry.projects(), vec!["aaa"]);

    // "abb" opens before "bbb" fails; neither may be kept.
    deploy_packages(dir.path(), &config, &["abb", "bbb"])?;
    std::fs::write(queue_path(registry.dbs_dir(), "bbb"), b"not a store")?;

    let result = registry.refresh(&config, &run_dir).await;

    assert!(matches!(
        result,
        Err(LauncherError::QueueOpen { ref project, .. }) if project == "bbb"
    ));
    assert_eq!(registry.projects(), vec!["aaa"]);
    assert!(registry.get("abb").is_none());
    Ok(())
}

#[tokio::test]
async fn test_enqueue_refuses_requests_that_cannot_launch() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = memory_config().with_project("news", "news.settings");
    let registry = QueueRegistry::open(&config, &RunDir::new(dir.path())).await?;

    let bad_settings = JobRequest::new("news", "frontpage").with_arg("settings", "x");
    assert!(matches!(
        registry.enqueue(bad_settings, 0.0).await,
        Err(LauncherError::Job(CoreError::InvalidSettings))
    ));

    let unknown = JobRequest::new("elsewhere", "frontpage");
    assert!(matches!(
        registry.enqueue(unknown, 0.0).await,
        Err(LauncherError::UnknownProject(name)) if name == "elsewhere"
    ));
    assert_eq!(registry.queue("news")?.count().await?, 0);

    let good = JobRequest::new("news", "frontpage")
        .try_with_arg("page", "2")?
        .with_setting("LOG_LEVEL", "INFO");
    registry.enqueue(good.clone(), 1.0).await?;

    let popped = registry
        .queue("news")?
        .pop()
        .await?
        .ok_or("queue unexpectedly empty")?;
    assert_eq!(popped, good);
    Ok(())
}
