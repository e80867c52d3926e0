// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom-property bridge.
//!
//! Internal artifacts carry up to 30 positional typed slots; work items
//! carry a named field dictionary typed by the work-item-type definition.
//! Each slot crosses the boundary through its property-definition mapping
//! (slot number → field name), with list and multi-list values translated
//! through the property-value tables and users through the user mapping.
//!
//! Reserved destination names short-circuit the normal copy: `"Area"` sets
//! the numeric area id, `"TfsWorkItemId"` receives the work item id on the
//! internal side, and `"Incident.ID"` belongs to the opposite direction and
//! is ignored here.

use crate::context::ProjectState;
use crate::cycle::SyncEngine;
use crate::error::EngineError;
use tb_clients::pms::{CustomProperties, PmsClient, PropertyType, PropertyValue};
use tb_clients::wits::{FieldValue, WitsClient, WitsFieldType, WorkItem, WorkItemTypeDefinition};
use tb_core::{utc_to_wits_local, wits_local_to_utc, ArtifactKind, Clock, LogSeverity};
use tb_store::MappingStore;

/// Reserved destination: maps a list property onto the numeric area id.
pub(crate) const RESERVED_AREA: &str = "Area";
/// Reserved destination: receives the external work-item id internally.
pub(crate) const RESERVED_WORK_ITEM_ID: &str = "TfsWorkItemId";
/// Reserved destination consumed by the inbound id write-back; the forward
/// copy must ignore it.
pub(crate) const RESERVED_INCIDENT_ID: &str = "Incident.ID";

/// Multi-list values cross the boundary as one delimited string.
pub(crate) const MULTI_LIST_SEPARATOR: char = ';';

/// String form used for trimmed change comparison.
pub(crate) fn property_text(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Text(s) => s.clone(),
        PropertyValue::Integer(i) => i.to_string(),
        PropertyValue::Boolean(b) => b.to_string(),
        PropertyValue::Decimal(d) => d.to_string(),
        PropertyValue::Date(d) => d.to_rfc3339(),
        PropertyValue::List(id) => id.to_string(),
        PropertyValue::MultiList(ids) => {
            ids.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(";")
        }
        PropertyValue::User(id) => id.to_string(),
    }
}

fn differs(a: Option<&PropertyValue>, b: &PropertyValue) -> bool {
    match a {
        Some(old) => property_text(old).trim() != property_text(b).trim(),
        None => true,
    }
}

/// Coerce a scalar slot value into the destination field's declared type.
fn scalar_field_value(field_type: WitsFieldType, value: &PropertyValue) -> FieldValue {
    match field_type {
        WitsFieldType::Integer => match value {
            PropertyValue::Integer(i) => FieldValue::Integer(*i),
            PropertyValue::Decimal(d) => FieldValue::Integer(*d as i64),
            PropertyValue::Boolean(b) => FieldValue::Integer(*b as i64),
            other => FieldValue::Text(property_text(other)),
        },
        WitsFieldType::Double => match value {
            PropertyValue::Decimal(d) => FieldValue::Double(*d),
            PropertyValue::Integer(i) => FieldValue::Double(*i as f64),
            other => FieldValue::Text(property_text(other)),
        },
        WitsFieldType::Boolean => match value {
            PropertyValue::Boolean(b) => FieldValue::Bool(*b),
            other => FieldValue::Text(property_text(other)),
        },
        _ => FieldValue::Text(property_text(value)),
    }
}

impl<P, W, S, C> SyncEngine<P, W, S, C>
where
    P: PmsClient,
    W: WitsClient,
    S: MappingStore,
    C: Clock,
{
    /// The artifact kind used for custom-property definition and mapping
    /// lookups. Tasks historically borrow the requirement tables; the
    /// strict flag opts into the task tables instead.
    pub(crate) fn property_kind_for(&self, kind: ArtifactKind) -> ArtifactKind {
        if kind == ArtifactKind::Task && !self.config.strict_task_properties {
            ArtifactKind::Requirement
        } else {
            kind
        }
    }

    /// Copy internal custom properties onto a work item.
    pub(crate) async fn copy_properties_outbound(
        &self,
        state: &mut ProjectState,
        kind: ArtifactKind,
        props: &CustomProperties,
        work_item: &mut WorkItem,
        type_def: &WorkItemTypeDefinition,
    ) -> Result<(), EngineError> {
        let lookup_kind = self.property_kind_for(kind);
        let definitions = state.property_definitions.get(&lookup_kind).cloned().unwrap_or_default();
        for def in &definitions {
            let Some(value) = props.get(&def.number) else {
                continue;
            };
            let Some(mapping) = self
                .store
                .custom_property_mapping(state.project_id, lookup_kind, def.number)
                .await?
            else {
                self.log_event(
                    LogSeverity::Warning,
                    &format!("custom property {} ('{}') has no field mapping", def.number, def.name),
                );
                continue;
            };
            let dest = mapping.external_field.as_str();

            if dest == RESERVED_INCIDENT_ID || dest == RESERVED_WORK_ITEM_ID {
                continue;
            }
            if dest == RESERVED_AREA {
                match value {
                    PropertyValue::List(id) => {
                        let table = self
                            .store
                            .list_custom_property_value_mappings(
                                state.project_id,
                                lookup_kind,
                                def.number,
                            )
                            .await?;
                        match crate::translate::internal_to_external(&table, *id)
                            .and_then(|key| key.parse::<i32>().ok())
                        {
                            Some(area_id) => work_item.area_id = Some(area_id),
                            None => self.log_event(
                                LogSeverity::Warning,
                                &format!("no area mapping for list value {id}"),
                            ),
                        }
                    }
                    PropertyValue::MultiList(_) => self.log_event(
                        LogSeverity::Warning,
                        &format!(
                            "custom property {} is multi-list and cannot set the area",
                            def.number
                        ),
                    ),
                    _ => self.log_event(
                        LogSeverity::Warning,
                        &format!("custom property {} is not a list; area skipped", def.number),
                    ),
                }
                continue;
            }

            let Some(field_def) = type_def.field(dest) else {
                self.log_event(
                    LogSeverity::Warning,
                    &format!("field '{dest}' is not defined on type '{}'", type_def.name),
                );
                continue;
            };

            match value {
                PropertyValue::List(id) => {
                    let table = self
                        .store
                        .list_custom_property_value_mappings(
                            state.project_id,
                            lookup_kind,
                            def.number,
                        )
                        .await?;
                    match crate::translate::internal_to_external(&table, *id) {
                        Some(external) => work_item.set_field(dest, FieldValue::Text(external)),
                        None => self.log_event(
                            LogSeverity::Warning,
                            &format!("no value mapping for list value {id} in slot {}", def.number),
                        ),
                    }
                }
                PropertyValue::MultiList(ids) => {
                    let table = self
                        .store
                        .list_custom_property_value_mappings(
                            state.project_id,
                            lookup_kind,
                            def.number,
                        )
                        .await?;
                    let mut parts = Vec::new();
                    for id in ids {
                        match crate::translate::internal_to_external(&table, *id) {
                            Some(external) => parts.push(external),
                            None => self.log_event(
                                LogSeverity::Warning,
                                &format!(
                                    "no value mapping for multi-list value {id} in slot {}",
                                    def.number
                                ),
                            ),
                        }
                    }
                    let joined: String = parts.join(&MULTI_LIST_SEPARATOR.to_string());
                    work_item.set_field(dest, FieldValue::Text(joined));
                }
                PropertyValue::User(id) => {
                    if let Some(display) = self.user_display_for(state, *id).await {
                        work_item.set_field(dest, FieldValue::Text(display));
                    }
                }
                PropertyValue::Date(utc) => {
                    let local = utc_to_wits_local(*utc, self.config.time_offset_hours);
                    work_item.set_field(dest, FieldValue::Date(local));
                }
                scalar => {
                    work_item.set_field(dest, scalar_field_value(field_def.field_type, scalar));
                }
            }
        }
        Ok(())
    }

    /// Copy work-item fields onto internal custom properties. Returns true
    /// when any slot actually changed, so idempotent cycles skip the save.
    pub(crate) async fn copy_properties_inbound(
        &self,
        state: &mut ProjectState,
        kind: ArtifactKind,
        work_item: &WorkItem,
        props: &mut CustomProperties,
    ) -> Result<bool, EngineError> {
        let lookup_kind = self.property_kind_for(kind);
        let definitions = state.property_definitions.get(&lookup_kind).cloned().unwrap_or_default();
        let mut changed = false;
        for def in &definitions {
            let Some(mapping) = self
                .store
                .custom_property_mapping(state.project_id, lookup_kind, def.number)
                .await?
            else {
                continue;
            };
            let dest = mapping.external_field.as_str();

            let new_value: Option<PropertyValue> = if dest == RESERVED_WORK_ITEM_ID {
                match def.property_type {
                    PropertyType::Text => Some(PropertyValue::Text(work_item.id.to_string())),
                    _ => Some(PropertyValue::Integer(work_item.id as i64)),
                }
            } else if dest == RESERVED_INCIDENT_ID {
                continue;
            } else if dest == RESERVED_AREA {
                match work_item.area_id {
                    Some(area_id) => {
                        let table = self
                            .store
                            .list_custom_property_value_mappings(
                                state.project_id,
                                lookup_kind,
                                def.number,
                            )
                            .await?;
                        crate::translate::external_to_internal(&table, &area_id.to_string())
                            .map(PropertyValue::List)
                    }
                    None => None,
                }
            } else {
                let Some(field_value) = work_item.field(dest) else {
                    continue;
                };
                match def.property_type {
                    PropertyType::List => {
                        let table = self
                            .store
                            .list_custom_property_value_mappings(
                                state.project_id,
                                lookup_kind,
                                def.number,
                            )
                            .await?;
                        crate::translate::external_to_internal(&table, field_value.as_text().trim())
                            .map(PropertyValue::List)
                    }
                    PropertyType::MultiList => {
                        let table = self
                            .store
                            .list_custom_property_value_mappings(
                                state.project_id,
                                lookup_kind,
                                def.number,
                            )
                            .await?;
                        let ids: Vec<i32> = field_value
                            .as_text()
                            .split(MULTI_LIST_SEPARATOR)
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .filter_map(|part| {
                                crate::translate::external_to_internal(&table, part)
                            })
                            .collect();
                        if ids.is_empty() {
                            None
                        } else {
                            Some(PropertyValue::MultiList(ids))
                        }
                    }
                    PropertyType::User => {
                        let display = field_value.as_text();
                        self.user_id_for(state, &display).await.map(PropertyValue::User)
                    }
                    PropertyType::Date => field_value.as_date().map(|local| {
                        PropertyValue::Date(wits_local_to_utc(
                            local,
                            self.config.time_offset_hours,
                        ))
                    }),
                    PropertyType::Integer => {
                        field_value.as_integer().map(PropertyValue::Integer)
                    }
                    PropertyType::Decimal => field_value.as_double().map(PropertyValue::Decimal),
                    PropertyType::Boolean => match field_value {
                        FieldValue::Bool(b) => Some(PropertyValue::Boolean(*b)),
                        other => other.as_text().trim().parse().ok().map(PropertyValue::Boolean),
                    },
                    PropertyType::Text => Some(PropertyValue::Text(field_value.as_text())),
                }
            };

            if let Some(value) = new_value {
                if differs(props.get(&def.number), &value) {
                    props.insert(def.number, value);
                    changed = true;
                }
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
#[path = "props_tests.rs"]
mod tests;
