// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Release ↔ iteration reconciliation.
//!
//! Releases on the internal side and iteration nodes on the external side
//! are auto-provisioned in whichever direction is missing. Iteration
//! creation is eventually consistent: the structure service accepts the
//! node, then the tree catches up, so the engine polls with backoff until
//! the node id becomes visible.

use crate::context::ProjectState;
use crate::cycle::SyncEngine;
use chrono::Duration;
use tb_clients::pms::{PmsClient, Release};
use tb_clients::wits::WitsClient;
use tb_core::{ArtifactKind, Clock, LogSeverity, Mapping};
use tb_store::MappingStore;

/// Version string stamped on auto-created releases.
pub const RELEASE_VERSION_PREFIX: &str = "TFS-";

/// Characters the external structure service refuses in node names.
const RESERVED_NAME_CHARS: &[char] =
    &['\\', '/', '$', '?', '*', ':', '"', '&', '>', '<', '#', '%', '|'];

const ITERATION_POLL_ATTEMPTS: u32 = 5;
const ITERATION_POLL_BASE_MS: u64 = 500;

/// Strip the reserved character set from a release name before using it as
/// an iteration node name.
pub fn sanitize_iteration_name(name: &str) -> String {
    name.chars().filter(|c| !RESERVED_NAME_CHARS.contains(c)).collect::<String>().trim().to_string()
}

impl<P, W, S, C> SyncEngine<P, W, S, C>
where
    P: PmsClient,
    W: WitsClient,
    S: MappingStore,
    C: Clock,
{
    /// Resolve the iteration node for an internal release, creating the
    /// node when missing. `None` means the artifact goes out without an
    /// iteration assignment.
    pub(crate) async fn iteration_for_release(
        &self,
        state: &mut ProjectState,
        release_id: i32,
    ) -> Option<i32> {
        if let Some(mapping) = state.mapping_for(ArtifactKind::Release, release_id) {
            let mapping = mapping.clone();
            match mapping.external_key.parse::<i32>() {
                Ok(node_id) => {
                    // Verify the node still exists; a vanished iteration
                    // retires the mapping and falls through to re-create.
                    match self.wits.iteration_tree(&state.project_name).await {
                        Ok(tree) if tree.find(node_id).is_some() => return Some(node_id),
                        Ok(_) => {
                            self.log_event(
                                LogSeverity::Info,
                                &format!(
                                    "iteration {node_id} for release {release_id} is gone; remapping"
                                ),
                            );
                            state.retire_release_mapping(mapping);
                        }
                        Err(_) => return Some(node_id),
                    }
                }
                Err(_) => {
                    self.log_event(
                        LogSeverity::Warning,
                        &format!(
                            "release {release_id} has non-numeric iteration key '{}'",
                            mapping.external_key
                        ),
                    );
                    return None;
                }
            }
        }

        let release = match self.pms.release(release_id).await {
            Ok(release) => release,
            Err(e) => {
                self.log_event(
                    LogSeverity::Info,
                    &format!("release {release_id} could not be read: {e}"),
                );
                return None;
            }
        };
        let name = sanitize_iteration_name(&release.name);
        if name.is_empty() {
            self.log_event(
                LogSeverity::Warning,
                &format!("release {release_id} name '{}' is empty after sanitizing", release.name),
            );
            return None;
        }

        if let Err(e) = self.wits.create_iteration(&state.project_name, &name).await {
            self.log_event(
                LogSeverity::Warning,
                &format!("could not create iteration '{name}': {e}"),
            );
            return None;
        }

        for attempt in 0..ITERATION_POLL_ATTEMPTS {
            match self.wits.iteration_tree(&state.project_name).await {
                Ok(tree) => {
                    if let Some(node) = tree.find_by_name(&name) {
                        let node_id = node.id;
                        state.add_mapping(
                            ArtifactKind::Release,
                            Mapping::new(state.project_id, release_id, node_id.to_string()),
                        );
                        return Some(node_id);
                    }
                }
                Err(e) => {
                    self.log_event(
                        LogSeverity::Warning,
                        &format!("iteration tree read failed: {e}"),
                    );
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(
                ITERATION_POLL_BASE_MS * (attempt as u64 + 1),
            ))
            .await;
        }

        self.log_event(
            LogSeverity::Warning,
            &format!("iteration '{name}' did not become visible; continuing without it"),
        );
        None
    }

    /// Resolve the internal release for an iteration node, creating the
    /// release when missing.
    pub(crate) async fn release_for_iteration(
        &self,
        state: &mut ProjectState,
        iteration_id: i32,
    ) -> Option<i32> {
        if let Some(mapping) =
            state.mapping_for_external(ArtifactKind::Release, &iteration_id.to_string())
        {
            return Some(mapping.internal_id);
        }

        let tree = match self.wits.iteration_tree(&state.project_name).await {
            Ok(tree) => tree,
            Err(e) => {
                self.log_event(LogSeverity::Warning, &format!("iteration tree read failed: {e}"));
                return None;
            }
        };
        let name = match tree.find(iteration_id) {
            Some(node) => node.name.clone(),
            None => {
                self.log_event(
                    LogSeverity::Info,
                    &format!("iteration {iteration_id} not found in the project tree"),
                );
                return None;
            }
        };

        let today = self.clock.now_utc();
        let release = Release {
            id: 0,
            project_id: state.project_id,
            name,
            version_number: format!("{RELEASE_VERSION_PREFIX}{iteration_id}"),
            creator_id: self.config.auto_release_creator_id,
            start_date: today,
            end_date: today + Duration::days(self.config.auto_release_duration_days),
            active: true,
            non_working_days: 0,
        };
        match self.pms.create_release(release).await {
            Ok(created) => {
                state.add_mapping(
                    ArtifactKind::Release,
                    Mapping::new(state.project_id, created.id, iteration_id.to_string()),
                );
                Some(created.id)
            }
            Err(e) => {
                self.log_event(
                    LogSeverity::Warning,
                    &format!("could not create release for iteration {iteration_id}: {e}"),
                );
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "releases_tests.rs"]
mod tests;
