use std::collections::{HashMap, HashSet};

use url::Url;

/// Trigger control mounted into the host page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorButton {
    pub id: String,
    pub beatmapset_id: String,
    pub label: String,
    pub sublabel: String,
}

/// What the agent needs from the page it runs in.
pub trait HostPage: Send {
    fn href(&self) -> String;

    fn pathname(&self) -> String;

    /// Location fragment including its leading `#`, or empty.
    fn hash(&self) -> String;

    /// Trimmed text content of the first element matching `selector`.
    fn text(&self, selector: &str) -> Option<String>;

    fn has_element(&self, selector: &str) -> bool;

    fn has_element_id(&self, id: &str) -> bool;

    /// Appends `button` to the container; false when there is no container.
    fn append_button(&mut self, container: &str, button: MirrorButton) -> bool;

    fn remove_element_id(&mut self, id: &str) -> bool;
}

/// In-memory page snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticPage {
    href: String,
    location: Option<Url>,
    texts: HashMap<String, String>,
    containers: HashSet<String>,
    buttons: Vec<(String, MirrorButton)>,
}

impl StaticPage {
    pub fn new(href: &str) -> Self {
        let mut page = Self::default();
        page.navigate(href);
        page
    }

    /// Client-side navigation: the location changes, the content stays.
    pub fn navigate(&mut self, href: &str) {
        self.href = href.to_string();
        self.location = Url::parse(href).ok();
        if self.location.is_none() {
            log::warn!("Page location {:?} is not a valid URL", href);
        }
    }

    pub fn with_container(mut self, selector: &str) -> Self {
        self.containers.insert(selector.to_string());
        self
    }

    pub fn with_text(mut self, selector: &str, text: &str) -> Self {
        self.texts.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn add_container(&mut self, selector: &str) {
        self.containers.insert(selector.to_string());
    }

    pub fn buttons(&self) -> impl Iterator<Item = &MirrorButton> {
        self.buttons.iter().map(|(_, button)| button)
    }
}

impl HostPage for StaticPage {
    fn href(&self) -> String {
        self.href.clone()
    }

    fn pathname(&self) -> String {
        self.location
            .as_ref()
            .map(|url| url.path().to_string())
            .unwrap_or_default()
    }

    fn hash(&self) -> String {
        self.location
            .as_ref()
            .and_then(|url| url.fragment())
            .filter(|fragment| !fragment.is_empty())
            .map(|fragment| format!("#{}", fragment))
            .unwrap_or_default()
    }

    fn text(&self, selector: &str) -> Option<String> {
        self.texts.get(selector).map(|text| text.trim().to_string())
    }

    fn has_element(&self, selector: &str) -> bool {
        self.containers.contains(selector)
    }

    fn has_element_id(&self, id: &str) -> bool {
        self.buttons.iter().any(|(_, button)| button.id == id)
    }

    fn append_button(&mut self, container: &str, button: MirrorButton) -> bool {
        if !self.containers.contains(container) {
            return false;
        }
        self.buttons.push((container.to_string(), button));
        true
    }

    fn remove_element_id(&mut self, id: &str) -> bool {
        let before = self.buttons.len();
        self.buttons.retain(|(_, button)| button.id != id);
        before != self.buttons.len()
    }
}
