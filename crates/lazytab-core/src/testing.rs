//! In-memory host used by the controller tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use lazytab_navigation::{LoadFlags, LoadRequest, NavigationCapability, SessionHistoryEntry};
use lazytab_tabs::{ProgressEvents, SessionSnapshot, SessionStore, TabCollection, TabId};

/// What a page's content has been asked to do.
#[derive(Debug, Default)]
pub struct Page {
    pub loads: Vec<LoadRequest>,
    pub gotos: Vec<usize>,
    pub reloads: Vec<LoadFlags>,
    pub stops: usize,
    pub current: Option<String>,
    pub history: Vec<SessionHistoryEntry>,
}

pub type PageHandle = Rc<RefCell<Page>>;

pub struct MockNavigation(pub PageHandle);

impl NavigationCapability for MockNavigation {
    fn load_uri(&mut self, request: LoadRequest) {
        let mut page = self.0.borrow_mut();
        page.current = Some(request.uri.clone());
        page.loads.push(request);
    }
    fn goto_index(&mut self, index: usize) {
        let mut page = self.0.borrow_mut();
        page.current = page.history.get(index).map(|e| e.uri.clone());
        page.gotos.push(index);
    }
    fn reload(&mut self, flags: LoadFlags) {
        self.0.borrow_mut().reloads.push(flags);
    }
    fn stop(&mut self) {
        self.0.borrow_mut().stops += 1;
    }
    fn go_back(&mut self) {}
    fn go_forward(&mut self) {}
    fn current_uri(&self) -> Option<String> {
        self.0.borrow().current.clone()
    }
    fn can_go_back(&self) -> bool {
        false
    }
    fn can_go_forward(&self) -> bool {
        false
    }
    fn document_title(&self) -> Option<String> {
        None
    }
    fn history_len(&self) -> usize {
        self.0.borrow().history.len()
    }
    fn history_entry(&self, index: usize) -> Option<SessionHistoryEntry> {
        self.0.borrow().history.get(index).cloned()
    }
}

#[derive(Default)]
pub struct MockHost {
    pub strip: Vec<TabId>,
    pub hidden: HashSet<TabId>,
    pub selected: Option<TabId>,
    pub owners: HashMap<TabId, TabId>,
    /// Relations of tabs already removed from the strip
    pub closed_next_sibling: HashMap<TabId, TabId>,
    pub pages: HashMap<TabId, PageHandle>,
    pub subscribed: HashSet<TabId>,
    pub labels: HashMap<TabId, String>,
    pub icons: HashMap<TabId, Option<String>>,
    pub busy: HashMap<TabId, bool>,
    pub snapshots: HashMap<TabId, SessionSnapshot>,
    pub restored: Vec<(TabId, SessionSnapshot)>,
    pub tree: bool,
    pub parents: HashMap<TabId, TabId>,
    pub attached: Vec<(TabId, TabId)>,
    pub selections: Vec<TabId>,
}

impl MockHost {
    /// Append a tab showing `uri` and return its id, page and capability.
    pub fn add_tab(&mut self, uri: Option<&str>) -> (TabId, PageHandle, Box<dyn NavigationCapability>) {
        let id = TabId::new();
        let page = Rc::new(RefCell::new(Page {
            current: uri.map(str::to_string),
            ..Page::default()
        }));
        self.strip.push(id);
        self.pages.insert(id, page.clone());
        (id, page.clone(), Box::new(MockNavigation(page)))
    }

    pub fn page(&self, tab: TabId) -> PageHandle {
        self.pages[&tab].clone()
    }

    /// Remove a tab from the strip as the host does before announcing the close.
    pub fn remove_tab(&mut self, tab: TabId) {
        if let Some(index) = self.strip.iter().position(|t| *t == tab) {
            if let Some(next) = self.strip.get(index + 1) {
                self.closed_next_sibling.insert(tab, *next);
            }
            self.strip.remove(index);
        }
    }
}

impl TabCollection for MockHost {
    fn tabs(&self) -> Vec<TabId> {
        self.strip.clone()
    }
    fn visible_tabs(&self) -> Vec<TabId> {
        self.strip.iter().copied().filter(|t| !self.hidden.contains(t)).collect()
    }
    fn selected(&self) -> Option<TabId> {
        self.selected
    }
    fn select(&mut self, tab: TabId) {
        self.selected = Some(tab);
        self.selections.push(tab);
    }
    fn position(&self, tab: TabId) -> Option<usize> {
        self.strip.iter().position(|t| *t == tab)
    }
    fn owner(&self, tab: TabId) -> Option<TabId> {
        self.owners.get(&tab).copied()
    }
    fn next_sibling(&self, tab: TabId) -> Option<TabId> {
        match self.position(tab) {
            Some(index) => self.strip.get(index + 1).copied(),
            None => self.closed_next_sibling.get(&tab).copied(),
        }
    }
    fn parent(&self, tab: TabId) -> Option<TabId> {
        self.parents.get(&tab).copied()
    }
    fn children(&self, tab: TabId) -> Vec<TabId> {
        self.strip
            .iter()
            .copied()
            .filter(|t| self.parents.get(t) == Some(&tab))
            .collect()
    }
    fn supports_tree(&self) -> bool {
        self.tree
    }
    fn attach_child(&mut self, child: TabId, parent: TabId) {
        self.attached.push((child, parent));
    }
    fn open_blank_tab(&mut self, index: usize) -> (TabId, Box<dyn NavigationCapability>) {
        let id = TabId::new();
        let page = Rc::new(RefCell::new(Page {
            current: Some("about:blank".to_string()),
            ..Page::default()
        }));
        self.strip.insert(index.min(self.strip.len()), id);
        self.pages.insert(id, page.clone());
        (id, Box::new(MockNavigation(page)))
    }
    fn swap_contents_and_close(&mut self, keep: TabId, donor: TabId) {
        if let Some(page) = self.pages.remove(&donor) {
            self.pages.insert(keep, page);
        }
        self.strip.retain(|t| *t != donor);
    }
    fn set_label(&mut self, tab: TabId, title: &str) {
        self.labels.insert(tab, title.to_string());
    }
    fn set_icon(&mut self, tab: TabId, icon: Option<&str>) {
        self.icons.insert(tab, icon.map(str::to_string));
    }
    fn set_busy(&mut self, tab: TabId, busy: bool) {
        self.busy.insert(tab, busy);
    }
}

impl ProgressEvents for MockHost {
    fn subscribe(&mut self, tab: TabId) {
        self.subscribed.insert(tab);
    }
    fn unsubscribe(&mut self, tab: TabId) {
        self.subscribed.remove(&tab);
    }
}

impl SessionStore for MockHost {
    fn capture_state(&mut self, tab: TabId) -> Option<SessionSnapshot> {
        self.snapshots.get(&tab).cloned()
    }
    fn restore_state(&mut self, tab: TabId, snapshot: SessionSnapshot) {
        self.restored.push((tab, snapshot));
    }
}
