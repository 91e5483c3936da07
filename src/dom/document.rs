use crate::errors::{DriverError, DriverResult};
use scraper::{ElementRef, Html, Selector};
use std::fmt;

/// Attribute carrying a render-scoped identity. When present, a path only
/// resolves while the element at each step still carries the same value.
pub const IDENTITY_ATTR: &str = "data-node";

#[derive(Debug, Clone, PartialEq, Eq)]
struct PathStep {
    selector: String,
    index: usize,
    identity: Option<String>,
}

/// Address of an element as a chain of `(selector, index)` lookups from
/// the document root, re-resolved against the current markup on every use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    steps: Vec<PathStep>,
}

impl NodePath {
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    fn child(&self, selector: &str, index: usize, identity: Option<String>) -> Self {
        let mut steps = self.steps.clone();
        steps.push(PathStep {
            selector: selector.to_string(),
            index,
            identity,
        });
        Self { steps }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .steps
            .iter()
            .map(|s| format!("{}[{}]", s.selector, s.index))
            .collect();
        f.write_str(&rendered.join(" >> "))
    }
}

/// A parsed HTML page. Not `Send`; build one per call and drop it before awaiting.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    fn compile(css: &str) -> DriverResult<Selector> {
        Selector::parse(css).map_err(|e| DriverError::InvalidSelector(format!("{}: {:?}", css, e)))
    }

    /// All matches of `css`, either document-wide or under `scope`.
    pub fn select_all(&self, scope: Option<&NodePath>, css: &str) -> DriverResult<Vec<NodePath>> {
        let selector = Self::compile(css)?;
        let root = NodePath { steps: Vec::new() };

        let paths = match scope {
            None => self
                .html
                .select(&selector)
                .enumerate()
                .map(|(index, el)| root.child(css, index, identity_of(&el)))
                .collect(),
            Some(parent_path) => {
                let parent = self.resolve(parent_path)?;
                parent
                    .select(&selector)
                    .enumerate()
                    .map(|(index, el)| parent_path.child(css, index, identity_of(&el)))
                    .collect()
            }
        };

        Ok(paths)
    }

    pub fn select_first(&self, scope: Option<&NodePath>, css: &str) -> DriverResult<NodePath> {
        self.select_all(scope, css)?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NotFound(css.to_string()))
    }

    pub fn contains(&self, css: &str) -> DriverResult<bool> {
        let selector = Self::compile(css)?;
        let found = self.html.select(&selector).next().is_some();
        Ok(found)
    }

    pub fn resolve(&self, path: &NodePath) -> DriverResult<ElementRef<'_>> {
        let mut current: Option<ElementRef<'_>> = None;

        for step in &path.steps {
            let selector = Self::compile(&step.selector)?;
            let next = match current {
                None => self.html.select(&selector).nth(step.index),
                Some(parent) => parent.select(&selector).nth(step.index),
            };

            let element = next.ok_or_else(|| DriverError::StaleElement(path.to_string()))?;
            if identity_of(&element) != step.identity {
                return Err(DriverError::StaleElement(path.to_string()));
            }
            current = Some(element);
        }

        current.ok_or_else(|| DriverError::StaleElement("empty node path".to_string()))
    }

    /// Whitespace-normalized text content, the way a browser reports visible text.
    pub fn text(&self, path: &NodePath) -> DriverResult<String> {
        let element = self.resolve(path)?;
        let raw: String = element.text().collect();
        Ok(raw.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    pub fn attribute(&self, path: &NodePath, name: &str) -> DriverResult<Option<String>> {
        let element = self.resolve(path)?;
        Ok(element.value().attr(name).map(str::to_string))
    }
}

fn identity_of(element: &ElementRef<'_>) -> Option<String> {
    element.value().attr(IDENTITY_ATTR).map(str::to_string)
}
