//! In-memory stand-in for a rendered data table.
//!
//! [`MemoryGrid`] keeps a small table model, renders it to HTML on every
//! query and resolves selectors with scraper, so the selectors built by
//! [`SelectorCatalog`](crate::table::SelectorCatalog) are exercised as-is.
//! Clicks and typing update the model the way the real grid would: header
//! clicks cycle the sort, the filter narrows rows, the action dropdown and
//! delete modal open and close.
//!
//! Rows and headers carry a render generation, so handles taken before a
//! sort, filter or delete go stale exactly like detached DOM references.
//! Waiting on something that is not yet in the markup advances the grid's
//! pending work one step at a time (spinner shows, spinner clears, delete
//! finishes) until the condition holds or nothing is left to do.

use crate::core::{CssSelector, PageDriver, WaitCondition};
use crate::dom::document::{HtmlDocument, NodePath};
use crate::errors::{DriverError, DriverResult};
use async_trait::async_trait;
use std::fmt::Write as _;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct Column {
    label: String,
    key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Spinner {
    Idle,
    Pending,
    Visible,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Modal {
    Closed,
    Prompt(String),
    Deleting(String),
}

#[derive(Debug)]
struct GridState {
    container_id: String,
    columns: Vec<Column>,
    key_index: usize,
    rows: Vec<Vec<String>>,
    sort: Option<(usize, bool)>,
    filter: String,
    menu_for: Option<String>,
    menu_labels: Vec<String>,
    modal: Modal,
    spinner: Spinner,
    spinner_enabled: bool,
    spinner_stuck: bool,
    generation: u64,
    clicks: Vec<String>,
    opened_forms: Vec<(String, String)>,
}

impl GridState {
    fn visible_rows(&self) -> Vec<&Vec<String>> {
        let needle = self.filter.trim().to_lowercase();
        let mut rows: Vec<&Vec<String>> = self
            .rows
            .iter()
            .filter(|row| {
                needle.is_empty() || row.iter().any(|cell| cell.to_lowercase().contains(&needle))
            })
            .collect();

        if let Some((column, ascending)) = self.sort {
            rows.sort_by(|a, b| a.get(column).cmp(&b.get(column)));
            if !ascending {
                rows.reverse();
            }
        }
        rows
    }

    fn visible_keys(&self) -> Vec<String> {
        self.visible_rows()
            .into_iter()
            .map(|row| self.key_of(row).to_string())
            .collect()
    }

    fn key_of<'r>(&self, row: &'r [String]) -> &'r str {
        row.get(self.key_index).map(String::as_str).unwrap_or_default()
    }

    /// A change that re-renders the table body.
    fn refresh(&mut self) {
        self.generation += 1;
        self.menu_for = None;
        if self.spinner_enabled {
            self.spinner = Spinner::Pending;
        }
    }

    /// Advance pending work by one step. Returns false when idle.
    fn tick(&mut self) -> bool {
        let mut progressed = false;

        match self.spinner {
            Spinner::Pending => {
                self.spinner = Spinner::Visible;
                progressed = true;
            }
            Spinner::Visible if !self.spinner_stuck => {
                self.spinner = Spinner::Idle;
                progressed = true;
            }
            _ => {}
        }

        if let Modal::Deleting(key) = self.modal.clone() {
            let key_index = self.key_index;
            self.rows
                .retain(|row| row.get(key_index).map(String::as_str) != Some(key.as_str()));
            self.modal = Modal::Closed;
            self.generation += 1;
            progressed = true;
        }

        progressed
    }

    fn render(&self) -> String {
        let stamp = self.generation;
        let visible = self.visible_rows();
        let mut html = String::from("<html><body>");

        let _ = write!(html, r#"<div id="{}">"#, escape(&self.container_id));
        let _ = write!(
            html,
            r#"<div class="table-caption"><span class="shared-collectioncount">{} Inputs</span></div>"#,
            visible.len()
        );
        let _ = write!(
            html,
            r#"<div class="table-filter"><input type="text" class="search-query" data-node="filter-input" data-role="filter-input" value="{}"><a class="control-clear" data-node="filter-clear" data-role="filter-clear">x</a></div>"#,
            escape(&self.filter)
        );
        if self.spinner == Spinner::Visible {
            html.push_str(r#"<div class="shared-waitspinner"></div>"#);
        }

        html.push_str("<table><thead><tr>");
        for (index, column) in self.columns.iter().enumerate() {
            let order = match self.sort {
                Some((sorted, true)) if sorted == index => " asc",
                Some((sorted, false)) if sorted == index => " desc",
                _ => "",
            };
            let _ = write!(
                html,
                r##"<th class="sortable{order}" data-node="th-{stamp}-{index}" data-role="header" data-column="{index}"><a href="#">{label}</a></th>"##,
                label = escape(&column.label),
            );
        }
        let _ = write!(html, r#"<th class="col-actions" data-node="th-{}-actions"></th>"#, stamp);
        html.push_str("</tr></thead><tbody>");

        for row in visible {
            let key = escape(self.key_of(row));
            let _ = write!(
                html,
                r#"<tr class="apps-table-tablerow" data-node="tr-{stamp}-{key}">"#
            );
            for (column, value) in self.columns.iter().zip(row.iter()) {
                let _ = write!(
                    html,
                    r#"<td class="col-{}">{}</td>"#,
                    escape(&column.key),
                    escape(value)
                );
            }
            let _ = write!(
                html,
                r#"<td class="col-actions"><a class="dropdown-toggle" data-node="toggle-{stamp}-{key}" data-role="toggle" data-row="{key}">Action</a></td></tr>"#
            );
        }
        html.push_str("</tbody></table></div>");

        if self.menu_for.is_some() {
            html.push_str(r#"<div class="dropdown-menu open"><ul>"#);
            for label in &self.menu_labels {
                let role = label.to_lowercase();
                let _ = write!(
                    html,
                    r#"<li><a class="{role}" data-node="menu-{role}" data-role="menu-{role}">{}</a></li>"#,
                    escape(label)
                );
            }
            html.push_str("</ul></div>");
        }

        let modal_row = match &self.modal {
            Modal::Closed => None,
            Modal::Prompt(key) | Modal::Deleting(key) => Some(key),
        };
        if let Some(key) = modal_row {
            html.push_str(r#"<div class="modal-dialog">"#);
            html.push_str(r#"<button class="close" data-node="modal-close" data-role="modal-close">x</button>"#);
            let _ = write!(
                html,
                r#"<div class="delete-prompt">Are you sure you want to delete "{}"?</div>"#,
                escape(key)
            );
            if matches!(self.modal, Modal::Deleting(_)) {
                html.push_str(r#"<div class="msg-loading">Deleting...</div>"#);
            }
            html.push_str(r#"<button class="cancel-btn" data-node="modal-cancel" data-role="modal-cancel">Cancel</button>"#);
            html.push_str(r#"<button class="submit-btn" data-node="modal-submit" data-role="modal-submit">Delete</button>"#);
            html.push_str("</div>");
        }

        html.push_str("</body></html>");
        html
    }

    fn with_document<T>(&self, f: impl FnOnce(&HtmlDocument) -> DriverResult<T>) -> DriverResult<T> {
        let document = HtmlDocument::parse(&self.render());
        f(&document)
    }

    fn role_of(&self, element: &NodePath) -> DriverResult<(Option<String>, NodeData)> {
        self.with_document(|doc| {
            let role = doc.attribute(element, "data-role")?;
            let data = NodeData {
                column: doc.attribute(element, "data-column")?,
                row: doc.attribute(element, "data-row")?,
            };
            Ok((role, data))
        })
    }

    fn click(&mut self, element: &NodePath) -> DriverResult<()> {
        let (role, data) = self.role_of(element)?;
        let role = role.unwrap_or_default();

        match role.as_str() {
            "header" => {
                let index: usize = data
                    .column
                    .and_then(|c| c.parse().ok())
                    .filter(|i| *i < self.columns.len())
                    .ok_or_else(|| DriverError::Session("header without column".to_string()))?;
                self.clicks.push(format!("header:{}", self.columns[index].label));
                self.sort = match self.sort {
                    Some((sorted, true)) if sorted == index => Some((index, false)),
                    _ => Some((index, true)),
                };
                self.refresh();
            }
            "toggle" => {
                self.clicks.push("toggle".to_string());
                self.menu_for = data.row;
            }
            "menu-edit" | "menu-clone" => {
                let row = self.menu_for.take().unwrap_or_default();
                let kind = role.trim_start_matches("menu-").to_string();
                self.clicks.push(kind.clone());
                self.opened_forms.push((kind, row));
            }
            "menu-delete" => {
                self.clicks.push("delete".to_string());
                if let Some(row) = self.menu_for.take() {
                    self.modal = Modal::Prompt(row);
                }
            }
            "modal-cancel" | "modal-close" => {
                self.clicks.push(role.clone());
                self.modal = Modal::Closed;
            }
            "modal-submit" => {
                self.clicks.push(role.clone());
                if let Modal::Prompt(row) = self.modal.clone() {
                    self.modal = Modal::Deleting(row);
                }
            }
            "filter-clear" => {
                self.clicks.push(role.clone());
                self.filter.clear();
                self.refresh();
            }
            _ => {
                self.clicks.push("other".to_string());
            }
        }

        Ok(())
    }

    fn input_role(&self, element: &NodePath) -> DriverResult<()> {
        match self.role_of(element)?.0.as_deref() {
            Some("filter-input") => Ok(()),
            _ => Err(DriverError::Unsupported(
                "only the filter box accepts input".to_string(),
            )),
        }
    }
}

struct NodeData {
    column: Option<String>,
    row: Option<String>,
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Builder-style in-memory grid; see the module docs.
pub struct MemoryGrid {
    container_id: String,
    state: Mutex<GridState>,
}

impl MemoryGrid {
    /// `columns` are `(display label, markup key)` pairs; the column whose
    /// key is `name` identifies rows.
    pub fn new(container_id: &str, columns: &[(&str, &str)]) -> Self {
        let columns: Vec<Column> = columns
            .iter()
            .map(|(label, key)| Column {
                label: label.to_string(),
                key: key.to_string(),
            })
            .collect();
        let key_index = columns.iter().position(|c| c.key == "name").unwrap_or(0);

        Self {
            container_id: container_id.to_string(),
            state: Mutex::new(GridState {
                container_id: container_id.to_string(),
                columns,
                key_index,
                rows: Vec::new(),
                sort: None,
                filter: String::new(),
                menu_for: None,
                menu_labels: vec!["Edit".to_string(), "Clone".to_string(), "Delete".to_string()],
                modal: Modal::Closed,
                spinner: Spinner::Idle,
                spinner_enabled: true,
                spinner_stuck: false,
                generation: 0,
                clicks: Vec::new(),
                opened_forms: Vec::new(),
            }),
        }
    }

    /// Append a row of cell values in column order. Missing trailing cells
    /// render empty; values beyond the last column are dropped.
    pub fn with_row(mut self, values: &[&str]) -> Self {
        let state = self.state.get_mut();
        let mut row: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        row.resize(state.columns.len(), String::new());
        state.rows.push(row);
        self
    }

    /// Updates apply instantly and no spinner is ever rendered.
    pub fn without_spinner(mut self) -> Self {
        self.state.get_mut().spinner_enabled = false;
        self
    }

    /// The spinner shows up but never goes away.
    pub fn with_stuck_spinner(mut self) -> Self {
        self.state.get_mut().spinner_stuck = true;
        self
    }

    pub fn with_menu_labels(mut self, labels: &[&str]) -> Self {
        self.state.get_mut().menu_labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn container(&self) -> String {
        format!("#{}", self.container_id)
    }

    pub async fn header_clicks(&self, label: &str) -> usize {
        let wanted = format!("header:{}", label);
        self.state
            .lock()
            .await
            .clicks
            .iter()
            .filter(|c| **c == wanted)
            .count()
    }

    pub async fn click_log(&self) -> Vec<String> {
        self.state.lock().await.clicks.clone()
    }

    pub async fn visible_keys(&self) -> Vec<String> {
        self.state.lock().await.visible_keys()
    }

    pub async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }

    /// `(form kind, row key)` for every edit or clone form opened.
    pub async fn opened_forms(&self) -> Vec<(String, String)> {
        self.state.lock().await.opened_forms.clone()
    }

    pub async fn html(&self) -> String {
        self.state.lock().await.render()
    }
}

#[async_trait]
impl PageDriver for MemoryGrid {
    type Element = NodePath;

    async fn locate(&self, selector: &CssSelector) -> DriverResult<NodePath> {
        let state = self.state.lock().await;
        state.with_document(|doc| doc.select_first(None, selector.as_str()))
    }

    async fn locate_all(&self, selector: &CssSelector) -> DriverResult<Vec<NodePath>> {
        let state = self.state.lock().await;
        state.with_document(|doc| doc.select_all(None, selector.as_str()))
    }

    async fn locate_within(&self, parent: &NodePath, selector: &CssSelector) -> DriverResult<NodePath> {
        let state = self.state.lock().await;
        state.with_document(|doc| doc.select_first(Some(parent), selector.as_str()))
    }

    async fn text(&self, element: &NodePath) -> DriverResult<String> {
        let state = self.state.lock().await;
        state.with_document(|doc| doc.text(element))
    }

    async fn attribute(&self, element: &NodePath, name: &str) -> DriverResult<Option<String>> {
        let state = self.state.lock().await;
        state.with_document(|doc| doc.attribute(element, name))
    }

    async fn click(&self, element: &NodePath) -> DriverResult<()> {
        let mut state = self.state.lock().await;
        state.click(element)
    }

    async fn send_keys(&self, element: &NodePath, text: &str) -> DriverResult<()> {
        let mut state = self.state.lock().await;
        state.input_role(element)?;
        state.filter.push_str(text);
        state.refresh();
        Ok(())
    }

    async fn clear(&self, element: &NodePath) -> DriverResult<()> {
        let mut state = self.state.lock().await;
        state.input_role(element)?;
        state.filter.clear();
        state.refresh();
        Ok(())
    }

    async fn wait_for(
        &self,
        selector: &CssSelector,
        condition: WaitCondition,
        timeout: Duration,
    ) -> DriverResult<()> {
        let mut state = self.state.lock().await;

        loop {
            let present = state.with_document(|doc| doc.contains(selector.as_str()))?;
            let satisfied = match condition {
                WaitCondition::Appear => present,
                WaitCondition::Disappear => !present,
            };
            if satisfied {
                return Ok(());
            }
            if !state.tick() {
                return Err(DriverError::Timeout {
                    selector: selector.to_string(),
                    condition,
                    waited_ms: timeout.as_millis() as u64,
                });
            }
        }
    }
}
