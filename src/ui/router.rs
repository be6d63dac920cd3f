/// Hash-keyed panel routing
///
/// Resolves a location hash (`#whitelist`, `#antibanner3`, ...) to the panel
/// shown in the central area. Category panels only exist once the filter
/// list has rendered them; navigating to one before that is deferred and
/// retried by `set_rendered_categories`.

use crate::models::GroupId;
use std::collections::BTreeSet;

pub const GENERAL_HASH: &str = "#general-settings";
pub const FILTERS_HASH: &str = "#antibanner";
pub const WHITELIST_HASH: &str = "#whitelist";
pub const USER_FILTER_HASH: &str = "#userfilter";
pub const ABOUT_HASH: &str = "#about";

/// Settings panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    General,
    Filters,
    Category(GroupId),
    Whitelist,
    UserFilter,
    About,
}

impl Default for Panel {
    fn default() -> Self {
        Panel::General
    }
}

impl Panel {
    /// Top-level entries shown in the navigation column, in order
    pub const NAV: [Panel; 5] = [
        Panel::General,
        Panel::Filters,
        Panel::Whitelist,
        Panel::UserFilter,
        Panel::About,
    ];

    pub fn hash(&self) -> String {
        match self {
            Panel::General => GENERAL_HASH.to_string(),
            Panel::Filters => FILTERS_HASH.to_string(),
            Panel::Category(gid) => format!("{}{}", FILTERS_HASH, gid),
            Panel::Whitelist => WHITELIST_HASH.to_string(),
            Panel::UserFilter => USER_FILTER_HASH.to_string(),
            Panel::About => ABOUT_HASH.to_string(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Panel::General => "General settings",
            Panel::Filters | Panel::Category(_) => "Filters",
            Panel::Whitelist => "Whitelist",
            Panel::UserFilter => "User filter",
            Panel::About => "About",
        }
    }

    /// Parse a hash. Unknown hashes return None.
    pub fn from_hash(hash: &str) -> Option<Panel> {
        let hash = hash.trim();
        let hash = if hash.starts_with('#') {
            hash.to_string()
        } else {
            format!("#{}", hash)
        };
        match hash.as_str() {
            GENERAL_HASH => Some(Panel::General),
            FILTERS_HASH => Some(Panel::Filters),
            WHITELIST_HASH => Some(Panel::Whitelist),
            USER_FILTER_HASH => Some(Panel::UserFilter),
            ABOUT_HASH => Some(Panel::About),
            other => other
                .strip_prefix(FILTERS_HASH)
                .and_then(|rest| rest.parse::<GroupId>().ok())
                .map(Panel::Category),
        }
    }

    /// Nav entry highlighted while this panel is visible. Every category
    /// panel keeps the filters root highlighted.
    pub fn nav_entry(&self) -> Panel {
        match self {
            Panel::Category(_) => Panel::Filters,
            other => *other,
        }
    }
}

/// Result of a navigation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Switched { previous: Panel, current: Panel },
    Unchanged,
    Deferred,
}

pub struct TabRouter {
    current: Panel,
    pending: Option<GroupId>,
    rendered: Option<BTreeSet<GroupId>>,
    on_whitelist: Option<Box<dyn FnMut() + Send>>,
}

impl Default for TabRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl TabRouter {
    pub fn new() -> Self {
        Self {
            current: Panel::default(),
            pending: None,
            rendered: None,
            on_whitelist: None,
        }
    }

    /// Callback fired every time the whitelist panel becomes visible
    pub fn with_whitelist_callback(mut self, callback: Box<dyn FnMut() + Send>) -> Self {
        self.on_whitelist = Some(callback);
        self
    }

    pub fn current(&self) -> Panel {
        self.current
    }

    pub fn pending(&self) -> Option<GroupId> {
        self.pending
    }

    pub fn is_visible(&self, panel: Panel) -> bool {
        self.current == panel
    }

    pub fn nav_highlight(&self) -> Panel {
        self.current.nav_entry()
    }

    pub fn navigate(&mut self, hash: &str) -> NavOutcome {
        let target = match Panel::from_hash(hash) {
            Some(Panel::Category(gid)) if !self.is_rendered(gid) => {
                log::debug!("[Router] Deferring {} until the category is rendered", hash);
                self.pending = Some(gid);
                return NavOutcome::Deferred;
            }
            Some(panel) => panel,
            None => {
                log::debug!("[Router] Unresolved hash '{}', showing default panel", hash);
                Panel::default()
            }
        };
        self.pending = None;
        self.switch_to(target)
    }

    pub fn show(&mut self, panel: Panel) -> NavOutcome {
        self.navigate(&panel.hash())
    }

    /// Record the category panels that now exist and retry a deferred
    /// navigation. A deferred category that still doesn't exist stays pending.
    pub fn set_rendered_categories<I>(&mut self, group_ids: I) -> Option<NavOutcome>
    where
        I: IntoIterator<Item = GroupId>,
    {
        self.rendered = Some(group_ids.into_iter().collect());

        // A category that vanished on re-render takes the user back to the list
        if let Panel::Category(gid) = self.current {
            if !self.is_rendered(gid) {
                return Some(self.switch_to(Panel::Filters));
            }
        }

        self.retry_deferred()
    }

    /// Open the pending category if it exists now. Returns None while
    /// nothing is pending or the category is still missing.
    pub fn retry_deferred(&mut self) -> Option<NavOutcome> {
        let gid = self.pending?;
        if !self.is_rendered(gid) {
            return None;
        }
        self.pending = None;
        Some(self.switch_to(Panel::Category(gid)))
    }

    fn is_rendered(&self, gid: GroupId) -> bool {
        self.rendered
            .as_ref()
            .map(|ids| ids.contains(&gid))
            .unwrap_or(false)
    }

    fn switch_to(&mut self, target: Panel) -> NavOutcome {
        if target == self.current {
            return NavOutcome::Unchanged;
        }
        let previous = self.current;
        self.current = target;
        log::debug!("[Router] {} -> {}", previous.hash(), target.hash());

        if target == Panel::Whitelist {
            if let Some(ref mut callback) = self.on_whitelist {
                callback();
            }
        }
        NavOutcome::Switched {
            previous,
            current: target,
        }
    }
}
