use crate::core::{CssSelector, TableLayout};
use crate::errors::{Result, TableError};

/// Logical elements of a rendered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableElement {
    Rows,
    Header,
    ActionTrigger,
    ActionMenuItems,
    EditTrigger,
    CloneTrigger,
    DeleteTrigger,
    DeletePrompt,
    DeleteConfirm,
    DeleteCancel,
    DeleteClose,
    DeleteLoading,
    Spinner,
    CountLabel,
    FilterInput,
    FilterClear,
}

/// Selectors for one table container. Built once, immutable afterwards.
#[derive(Debug, Clone)]
pub struct SelectorCatalog {
    container: String,
    cell_template: String,
    rows: CssSelector,
    header: CssSelector,
    action_trigger: CssSelector,
    action_menu_items: CssSelector,
    edit_trigger: CssSelector,
    clone_trigger: CssSelector,
    delete_trigger: CssSelector,
    delete_prompt: CssSelector,
    delete_confirm: CssSelector,
    delete_cancel: CssSelector,
    delete_close: CssSelector,
    delete_loading: CssSelector,
    spinner: CssSelector,
    count_label: CssSelector,
    filter_input: CssSelector,
    filter_clear: CssSelector,
}

impl SelectorCatalog {
    pub fn new(container: &str, layout: &TableLayout) -> Result<Self> {
        let container = container.trim();
        if container.is_empty() {
            return Err(TableError::InvalidLayout(
                "table container selector is empty".to_string(),
            ));
        }

        let scoped = |rest: String| CssSelector::new(format!("{} {}", container, rest));
        let modal = |rest: &str| CssSelector::new(format!("{} {}", layout.modal_root, rest));

        Ok(Self {
            container: container.to_string(),
            cell_template: format!("{} td.col-{{column}}", container),
            rows: scoped(format!("tr.{}", layout.row_class)),
            header: scoped("th".to_string()),
            action_trigger: scoped(format!("a.{}", layout.action_toggle_class)),
            action_menu_items: CssSelector::new(format!("{} li a", layout.open_menu)),
            edit_trigger: CssSelector::new(layout.edit_trigger.clone()),
            clone_trigger: CssSelector::new(layout.clone_trigger.clone()),
            delete_trigger: CssSelector::new(layout.delete_trigger.clone()),
            delete_prompt: modal(&layout.delete_prompt),
            delete_confirm: modal(&layout.delete_confirm),
            delete_cancel: modal(&layout.delete_cancel),
            delete_close: modal(&layout.delete_close),
            delete_loading: modal(&layout.delete_loading),
            spinner: scoped(format!("div.{}", layout.spinner_class)),
            count_label: scoped(format!(".{}", layout.count_class)),
            filter_input: scoped(format!("input.{}", layout.search_class)),
            filter_clear: scoped(format!("a.{}", layout.clear_class)),
        })
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn locate(&self, element: TableElement) -> &CssSelector {
        match element {
            TableElement::Rows => &self.rows,
            TableElement::Header => &self.header,
            TableElement::ActionTrigger => &self.action_trigger,
            TableElement::ActionMenuItems => &self.action_menu_items,
            TableElement::EditTrigger => &self.edit_trigger,
            TableElement::CloneTrigger => &self.clone_trigger,
            TableElement::DeleteTrigger => &self.delete_trigger,
            TableElement::DeletePrompt => &self.delete_prompt,
            TableElement::DeleteConfirm => &self.delete_confirm,
            TableElement::DeleteCancel => &self.delete_cancel,
            TableElement::DeleteClose => &self.delete_close,
            TableElement::DeleteLoading => &self.delete_loading,
            TableElement::Spinner => &self.spinner,
            TableElement::CountLabel => &self.count_label,
            TableElement::FilterInput => &self.filter_input,
            TableElement::FilterClear => &self.filter_clear,
        }
    }

    /// Cell selector for an already translated, lower-cased column key.
    pub fn cell(&self, column_key: &str) -> CssSelector {
        CssSelector::new(self.cell_template.replace("{column}", column_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SelectorCatalog {
        SelectorCatalog::new("#inputs", &TableLayout::default()).unwrap()
    }

    #[test]
    fn container_scoped_selectors() {
        let catalog = catalog();
        assert_eq!(catalog.locate(TableElement::Rows).as_str(), "#inputs tr.apps-table-tablerow");
        assert_eq!(catalog.locate(TableElement::Header).as_str(), "#inputs th");
        assert_eq!(catalog.locate(TableElement::Spinner).as_str(), "#inputs div.shared-waitspinner");
        assert_eq!(catalog.locate(TableElement::FilterInput).as_str(), "#inputs input.search-query");
        assert_eq!(catalog.locate(TableElement::FilterClear).as_str(), "#inputs a.control-clear");
        assert_eq!(catalog.locate(TableElement::CountLabel).as_str(), "#inputs .shared-collectioncount");
    }

    #[test]
    fn overlay_selectors_are_global() {
        let catalog = catalog();
        assert_eq!(catalog.locate(TableElement::ActionMenuItems).as_str(), ".dropdown-menu.open li a");
        assert_eq!(catalog.locate(TableElement::DeleteTrigger).as_str(), "a.delete");
        assert_eq!(catalog.locate(TableElement::DeletePrompt).as_str(), ".modal-dialog div.delete-prompt");
        assert_eq!(catalog.locate(TableElement::DeleteClose).as_str(), ".modal-dialog button.close");
    }

    #[test]
    fn cell_template_substitution() {
        assert_eq!(catalog().cell("disabled").as_str(), "#inputs td.col-disabled");
    }

    #[test]
    fn empty_container_rejected() {
        let err = SelectorCatalog::new("  ", &TableLayout::default()).unwrap_err();
        assert!(matches!(err, TableError::InvalidLayout(_)));
    }
}
