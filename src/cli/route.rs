//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::config::{CertmergeConfig, ConfigLoader};
use crate::error::{ApiError, StorageError};
use crate::journal::MergeJournal;
use crate::reconcile::{MergeProgress, Reconciler, ResolutionAction};
use crate::store::{documents_from_json, import_documents, SledDocumentStore, StoreAccessor};
use crate::types::CollectionId;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_conflicts_json, format_conflicts_text, format_events_text, format_history_json,
    format_import_summary, format_init_summary, format_merge_result_text, format_preview_text,
    format_records_json, format_records_text, format_resolution_text, format_runs_text,
    to_pretty_json,
};
use crate::cli::{command_name, is_mutating};

/// Runtime context for CLI execution: workspace, config, the sled-backed store and journal.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: CertmergeConfig,
    store: Arc<SledDocumentStore>,
    journal: MergeJournal,
    reconciler: Reconciler,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        config.ensure_valid()?;

        let store_path = config.store.resolve_path(&workspace_root);
        std::fs::create_dir_all(&store_path)
            .map_err(|e| ApiError::StorageError(StorageError::IoError(e)))?;

        let db = sled::open(&store_path).map_err(|e| {
            ApiError::StorageError(StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to open sled database: {}", e),
            )))
        })?;
        let store = Arc::new(SledDocumentStore::from_db(db.clone()));
        let journal = MergeJournal::new(db)?;

        let interrupted = journal.mark_interrupted_runs()?;
        if interrupted > 0 {
            warn!(
                count = interrupted,
                "Found merge runs that never finished; marked as interrupted"
            );
        }

        let accessor = StoreAccessor::new(store.clone(), config.engine.on_permission_denied);
        let reconciler = Reconciler::new(accessor, config.store.collections())
            .with_atomic_moves(config.engine.atomic_moves);

        debug!(store_path = %store_path.display(), "Run context ready");
        Ok(Self {
            workspace_root,
            config,
            store,
            journal,
            reconciler,
        })
    }

    pub fn config(&self) -> &CertmergeConfig {
        &self.config
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn journal(&self) -> &MergeJournal {
        &self.journal
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        if is_mutating(command) {
            self.store.flush()?;
        }
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Init { force } => init_workspace_config(&self.workspace_root, *force),
            Commands::Import { collection, file } => self.handle_import(collection, file),
            Commands::List { collection, format } => {
                let collection = self.collection(collection);
                let records = self.reconciler.accessor().list_all(&collection)?;
                Ok(if format == "json" {
                    format_records_json(&collection, &records)
                } else {
                    format_records_text(&collection, &records)
                })
            }
            Commands::Conflicts {
                diverging_only,
                format,
            } => {
                let mut pairs = self.reconciler.conflicts()?;
                if *diverging_only {
                    pairs.retain(|p| p.is_divergent());
                }
                let collections = self.reconciler.collections();
                Ok(if format == "json" {
                    format_conflicts_json(&pairs, collections)
                } else {
                    format_conflicts_text(&pairs, collections)
                })
            }
            Commands::Preview { from, to, format } => {
                let preview = self
                    .reconciler
                    .preview(&self.collection(from), &self.collection(to))?;
                Ok(if format == "json" {
                    to_pretty_json(&preview)
                } else {
                    format_preview_text(&preview)
                })
            }
            Commands::Merge {
                from,
                to,
                yes,
                format,
            } => self.handle_merge(&self.collection(from), &self.collection(to), *yes, format),
            Commands::Resolve {
                cert_number,
                action,
                yes,
                format,
            } => self.handle_resolve(cert_number, action, *yes, format),
            Commands::History { run, limit, format } => {
                self.handle_history(run.as_deref(), *limit, format)
            }
        }
    }

    fn collection(&self, reference: &str) -> CollectionId {
        self.reconciler.collections().resolve(reference)
    }

    fn handle_import(&self, collection: &str, file: &Path) -> Result<String, ApiError> {
        let collection = self.collection(collection);
        let raw = std::fs::read_to_string(file).map_err(|e| {
            ApiError::InvalidInput(format!("Failed to read {}: {}", file.display(), e))
        })?;
        let payload: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            ApiError::InvalidInput(format!("{} is not valid JSON: {}", file.display(), e))
        })?;
        let documents = documents_from_json(&collection, &payload)?;
        let count = import_documents(self.store.as_ref(), &collection, &documents)?;
        info!(collection = %collection, count, "Import finished");
        Ok(format_import_summary(&collection, count))
    }

    fn handle_merge(
        &self,
        source: &CollectionId,
        dest: &CollectionId,
        yes: bool,
        format: &str,
    ) -> Result<String, ApiError> {
        let preview = self.reconciler.preview(source, dest)?;
        if preview.total_in_source == 0 {
            return Ok(format!("Nothing to merge: {} is empty.", source));
        }

        if !yes {
            use dialoguer::Confirm;
            eprintln!("{}\n", format_preview_text(&preview));
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Move {} record(s) from '{}' into '{}'? Duplicates in '{}' will be overwritten.",
                    preview.total_in_source, source, dest, dest
                ))
                .default(false)
                .interact()
                .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;
            if !confirmed {
                return Ok("Merge cancelled".to_string());
            }
        }

        let mut writer = self.journal.start_run(source, dest)?;
        let run_id = writer.run_id().to_string();
        let show_progress = format != "json" && std::io::stderr().is_terminal();

        let outcome = self
            .reconciler
            .executor()
            .on_progress(|progress: &MergeProgress<'_>| {
                if let Err(e) = writer.record_progress(progress) {
                    warn!(run_id = %run_id, error = %e, "Failed to journal merge progress");
                }
                if show_progress {
                    let mut stderr = std::io::stderr().lock();
                    let _ = write!(stderr, "\r  {}/{} {}", progress.current, progress.total, progress.cert_number);
                    if progress.current == progress.total {
                        let _ = writeln!(stderr);
                    }
                }
            })
            .run(source, dest);

        let run = writer.finish(outcome.as_ref().map_err(|e| e.to_string()))?;
        let pruned = self.journal.prune(self.config.engine.journal_retention)?;
        if pruned > 0 {
            debug!(pruned, "Pruned old merge runs");
        }

        let result = outcome?;
        Ok(if format == "json" {
            to_pretty_json(&serde_json::json!({
                "run_id": run.run_id,
                "status": run.status,
                "result": result,
            }))
        } else {
            format_merge_result_text(&result, source, dest, Some(&run.run_id))
        })
    }

    fn handle_resolve(
        &self,
        cert_number: &str,
        action: &str,
        yes: bool,
        format: &str,
    ) -> Result<String, ApiError> {
        let action: ResolutionAction = action.parse()?;

        if !yes {
            use dialoguer::Confirm;
            let collections = self.reconciler.collections();
            let prompt = match action {
                ResolutionAction::KeepPrimary => format!(
                    "Delete {} from '{}' and keep the '{}' copy?",
                    cert_number, collections.secondary, collections.primary
                ),
                ResolutionAction::KeepSecondary => format!(
                    "Delete {} from '{}' and keep the '{}' copy?",
                    cert_number, collections.primary, collections.secondary
                ),
                ResolutionAction::MergeToPrimary => format!(
                    "Overwrite {} in '{}' with the '{}' copy?",
                    cert_number, collections.primary, collections.secondary
                ),
            };
            let confirmed = Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
                .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;
            if !confirmed {
                return Ok("Resolution cancelled".to_string());
            }
        }

        let outcome = self.reconciler.resolve(cert_number, action)?;
        Ok(if format == "json" {
            to_pretty_json(&outcome)
        } else {
            format_resolution_text(&outcome)
        })
    }

    fn handle_history(&self, run: Option<&str>, limit: usize, format: &str) -> Result<String, ApiError> {
        match run {
            Some(run_id) => {
                let record = self.journal.get_run(run_id)?.ok_or_else(|| {
                    ApiError::InvalidInput(format!("No merge run with id '{}'", run_id))
                })?;
                let events = self.journal.read_events(run_id)?;
                Ok(if format == "json" {
                    format_history_json(std::slice::from_ref(&record), Some(&events))
                } else {
                    format_events_text(&record, &events)
                })
            }
            None => {
                let mut runs = self.journal.list_runs()?;
                runs.truncate(limit);
                Ok(if format == "json" {
                    format_history_json(&runs, None)
                } else {
                    format_runs_text(&runs)
                })
            }
        }
    }
}

/// Write `config/config.toml` with the built-in defaults.
pub fn init_workspace_config(workspace_root: &Path, force: bool) -> Result<String, ApiError> {
    let config_dir = workspace_root.join("config");
    let config_path = config_dir.join("config.toml");
    let existed = config_path.exists();
    if existed && !force {
        return Err(ApiError::InvalidInput(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )));
    }
    std::fs::create_dir_all(&config_dir)
        .map_err(|e| ApiError::StorageError(StorageError::IoError(e)))?;
    let rendered = CertmergeConfig::default().to_toml()?;
    std::fs::write(&config_path, rendered)
        .map_err(|e| ApiError::StorageError(StorageError::IoError(e)))?;
    info!(path = %config_path.display(), "Wrote default configuration");
    Ok(format_init_summary(&config_path, existed))
}
