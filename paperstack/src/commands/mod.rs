use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use paperstack_core::event::Listener;
use paperstack_core::id::UuidSource;
use paperstack_core::storage::{CollectionTree, DocumentBundle, DocumentWritten, SourceFile, Store};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cli::{BundleArgs, PushArgs, ResolveArgs, TreeArgs};
use crate::AppContext;

mod tree;
pub use tree::format_tree;

// --- Handler Functions ---

pub async fn handle_tree(args: TreeArgs, cx: &AppContext) -> Result<()> {
    let tree = load_tree(&cx.store).await?;
    println!("{}", format_tree(&tree, args.ids));
    Ok(())
}

pub async fn handle_resolve(args: ResolveArgs, cx: &AppContext) -> Result<()> {
    let tree = load_tree(&cx.store).await?;
    let identifier = tree
        .resolve(&args.path)
        .with_context(|| format!("No collection at path '{}'", args.path))?;
    println!("{identifier}");
    Ok(())
}

pub async fn handle_bundle(args: BundleArgs, cx: &AppContext) -> Result<()> {
    let tree = load_tree(&cx.store).await?;
    let parent = resolve_collection(&tree, args.collection.as_deref())?;
    let (_, bundle) = synthesize(&args.file, parent).await?;
    println!("{}", serde_json::to_string_pretty(&bundle)?);
    Ok(())
}

pub async fn handle_push(args: PushArgs, cx: &AppContext) -> Result<()> {
    let tree = load_tree(&cx.store).await?;
    let parent = resolve_collection(&tree, args.collection.as_deref())?;
    let (source, bundle) = synthesize(&args.file, parent).await?;

    let restart_command = if args.restart {
        let command = cx
            .settings
            .restart_command
            .clone()
            .filter(|argv| !argv.is_empty())
            .context("--restart given but no restart_command is configured")?;
        Some(command)
    } else {
        None
    };

    if !args.yes {
        let destination = args.collection.as_deref().unwrap_or("the root collection");
        let prompt = format!(
            "Add '{}' ({} pages) to {}?",
            bundle.metadata.visible_name, bundle.content.page_count, destination
        );
        if !confirm(prompt).await? {
            info!("Push cancelled");
            return Ok(());
        }
    }

    // Kept alive until the write has been announced
    let restarts: Arc<Mutex<Vec<JoinHandle<()>>>> = Arc::default();
    let _restart = restart_command.map(|argv| {
        let restarts = restarts.clone();
        Listener::new(&cx.store.on.document_written, move |event: &DocumentWritten| {
            if let Some(handle) = run_restart(&argv, event) {
                if let Ok(mut handles) = restarts.lock() {
                    handles.push(handle);
                }
            }
        })
    });

    let identifier = Uuid::new_v4().to_string();
    cx.store
        .write_bundle(&identifier, &source, &bundle)
        .await
        .with_context(|| format!("Failed to write {} to {}", source.path().display(), cx.store.path().display()))?;

    println!("{} {} as {}", style("Added").green(), bundle.metadata.visible_name, identifier);

    let handles = restarts.lock().map(|mut handles| std::mem::take(&mut *handles)).unwrap_or_default();
    for handle in handles {
        handle.await.context("Restart task failed (panic)")?;
    }
    Ok(())
}

// --- Helpers ---

async fn load_tree(store: &Store) -> Result<CollectionTree> {
    let records = store
        .load()
        .await
        .with_context(|| format!("Failed to load store at {}", store.path().display()))?;
    Ok(CollectionTree::build(&records)?)
}

/// Destination collection for a path given on the command line. No path means
/// the root; a path that does not resolve is an error rather than a silent
/// fallback to the root.
fn resolve_collection<'a>(tree: &'a CollectionTree, path: Option<&str>) -> Result<Option<&'a str>> {
    match path {
        None => Ok(None),
        Some(path) => tree
            .resolve(path)
            .map(Some)
            .with_context(|| format!("No collection at path '{path}'")),
    }
}

async fn synthesize(path: &std::path::Path, parent: Option<&str>) -> Result<(SourceFile, DocumentBundle)> {
    let source = SourceFile::open(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let parser = source.parser()?;
    let bundle = DocumentBundle::from_source(&source, parent, parser.as_ref(), &mut UuidSource)
        .await
        .with_context(|| format!("Failed to prepare {}", path.display()))?;
    Ok((source, bundle))
}

async fn confirm(prompt: String) -> Result<bool> {
    let result = tokio::task::spawn_blocking(move || {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("Failed to read confirmation")
    })
    .await;
    result.context("Blocking task failed (panic)")?
}

/// Starts the restart command on the runtime so the listener returns at once.
/// Returns `None` when no command is configured.
fn run_restart(argv: &[String], event: &DocumentWritten) -> Option<JoinHandle<()>> {
    let (program, args) = argv.split_first()?;
    info!(identifier = %event.identifier, "Running restart command {:?}", argv);

    let mut command = Command::new(program);
    command.args(args);
    let program = program.clone();
    Some(tokio::spawn(async move {
        match command.status().await {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("Restart command exited with {status}"),
            Err(e) => error!("Failed to run restart command {program}: {e}"),
        }
    }))
}
