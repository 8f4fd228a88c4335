//! Menu and table administration

use std::collections::HashSet;

use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::models::{DiningTable, DiningTableDraft, DiningTableNotesUpdate, Menu};
use till_client::{Collection, Query};

use super::Register;
use crate::events::RegisterEvent;
use crate::utils::RegisterResult;

/// Trim names, reject blanks and duplicates, sort by name
fn validate_tables(drafts: Vec<DiningTableDraft>) -> Result<Vec<DiningTableDraft>, AppError> {
    let mut seen = HashSet::new();
    let mut tables = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::required("name"));
        }
        if !seen.insert(name.clone()) {
            return Err(AppError::with_message(
                ErrorCode::TableNameExists,
                format!("Table '{}' already exists", name),
            )
            .with_detail("name", name));
        }
        tables.push(DiningTableDraft {
            name,
            notes: draft.notes,
        });
    }
    tables.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(tables)
}

impl Register {
    /// Replace the whole remote menu with `menu`
    pub async fn replace_menu(&self, menu: Menu) -> RegisterResult<()> {
        let menu = menu.sorted();
        let rows = menu.to_rows();

        self.delete(Collection::Menu, &Query::all().not_null("id"))
            .await
            .map_err(|e| self.reported("replace_menu", e))?;
        if !rows.is_empty() {
            let _: Vec<Value> = self
                .insert(Collection::Menu, &rows)
                .await
                .map_err(|e| self.reported("replace_menu", e))?;
        }

        tracing::info!(items = rows.len(), "Menu replaced");
        self.inner.state.lock().menu = menu;
        self.emit(RegisterEvent::MenuRefreshed);
        Ok(())
    }

    /// Replace the table list.
    ///
    /// Orders of tables that no longer exist are dropped; editing a removed
    /// table ends editing.
    pub async fn replace_tables(&self, drafts: Vec<DiningTableDraft>) -> RegisterResult<Vec<DiningTable>> {
        let drafts = validate_tables(drafts).map_err(|e| self.reported("replace_tables", e.into()))?;

        self.delete(Collection::Tables, &Query::all().not_null("id"))
            .await
            .map_err(|e| self.reported("replace_tables", e))?;
        let tables: Vec<DiningTable> = if drafts.is_empty() {
            Vec::new()
        } else {
            self.insert(Collection::Tables, &drafts)
                .await
                .map_err(|e| self.reported("replace_tables", e))?
        };

        let selected_removed = {
            let mut state = self.inner.state.lock();
            let names: HashSet<&str> = tables.iter().map(|t| t.name.as_str()).collect();
            state.orders.retain_tables(|name| names.contains(name));
            let removed = state.mode.table().is_some_and(|t| !names.contains(t));
            state.tables = tables.clone();
            removed
        };
        if selected_removed {
            self.return_to_idle();
        }

        tracing::info!(tables = tables.len(), "Tables replaced");
        self.emit(RegisterEvent::TablesRefreshed);
        Ok(tables)
    }

    /// Set the free-text notes of the selected table
    pub async fn update_table_notes(&self, notes: &str) -> RegisterResult<()> {
        let table = self.require_table("update_table_notes")?;
        let patch = DiningTableNotesUpdate {
            notes: notes.to_string(),
        };
        self.update(Collection::Tables, &Query::all().eq("name", table.as_str()), &patch)
            .await
            .map_err(|e| self.reported("update_table_notes", e))?;

        let mut state = self.inner.state.lock();
        if let Some(entry) = state.tables.iter_mut().find(|t| t.name == table) {
            entry.notes = Some(patch.notes);
        }
        Ok(())
    }
}
