use serde::{Deserialize, Serialize};

/// What a failed asset does to the load count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadFailurePolicy {
    /// Report the error, then count the item as loaded so completion stays reachable
    #[default]
    CountAsLoaded,
    /// Report the error and leave the item outstanding
    Block,
}

/// Aggregate progress across every tracked asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadProgress {
    pub items_loaded: u32,
    pub items_total: u32,
}

impl LoadProgress {
    /// Fraction of items finished, 0 when nothing is tracked
    pub fn ratio(&self) -> f32 {
        if self.items_total == 0 {
            0.0
        } else {
            self.items_loaded as f32 / self.items_total as f32
        }
    }

    pub fn is_done(&self) -> bool {
        self.items_total > 0 && self.items_loaded == self.items_total
    }
}

/// Notification produced by the loading manager
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    /// First item of a batch started
    Started {
        url: String,
        items_loaded: u32,
        items_total: u32,
    },
    /// An item finished, successfully or counted as such
    Progress {
        url: String,
        items_loaded: u32,
        items_total: u32,
    },
    /// An item failed
    Error { url: String },
    /// Every tracked item finished; emitted once per lifetime
    Completed,
}

/// Tracks outstanding assets and emits progress and completion events
///
/// Completion is terminal: once `Completed` has been emitted, further
/// start/end/error calls are logged and produce no events.
#[derive(Debug, Clone)]
pub struct LoadingManager {
    progress: LoadProgress,
    policy: LoadFailurePolicy,
    loading: bool,
    completed: bool,
}

impl LoadingManager {
    pub fn new(policy: LoadFailurePolicy) -> Self {
        Self {
            progress: LoadProgress::default(),
            policy,
            loading: false,
            completed: false,
        }
    }

    pub fn progress(&self) -> LoadProgress {
        self.progress
    }

    pub fn policy(&self) -> LoadFailurePolicy {
        self.policy
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Register a new asset request
    pub fn item_start(&mut self, url: &str) -> Vec<LoadEvent> {
        if self.completed {
            log::warn!("Ignoring asset request after load completion: {}", url);
            return Vec::new();
        }

        self.progress.items_total += 1;
        log::debug!(
            "Asset started: {} ({}/{})",
            url,
            self.progress.items_loaded,
            self.progress.items_total
        );

        if self.loading {
            return Vec::new();
        }
        self.loading = true;

        vec![LoadEvent::Started {
            url: url.to_string(),
            items_loaded: self.progress.items_loaded,
            items_total: self.progress.items_total,
        }]
    }

    /// Mark an asset as finished
    pub fn item_end(&mut self, url: &str) -> Vec<LoadEvent> {
        if self.completed {
            log::warn!("Ignoring asset event after load completion: {}", url);
            return Vec::new();
        }
        if self.progress.items_loaded >= self.progress.items_total {
            log::warn!("Asset finished without a matching start: {}", url);
            return Vec::new();
        }

        self.progress.items_loaded += 1;
        log::debug!(
            "Asset loaded: {} ({}/{})",
            url,
            self.progress.items_loaded,
            self.progress.items_total
        );

        let mut events = vec![LoadEvent::Progress {
            url: url.to_string(),
            items_loaded: self.progress.items_loaded,
            items_total: self.progress.items_total,
        }];

        if self.progress.is_done() {
            self.loading = false;
            self.completed = true;
            log::info!("All {} asset(s) loaded", self.progress.items_total);
            events.push(LoadEvent::Completed);
        }

        events
    }

    /// Mark an asset as failed, then apply the failure policy
    pub fn item_error(&mut self, url: &str) -> Vec<LoadEvent> {
        if self.completed {
            log::warn!("Ignoring asset error after load completion: {}", url);
            return Vec::new();
        }

        log::warn!("Asset failed to load: {}", url);
        let mut events = vec![LoadEvent::Error {
            url: url.to_string(),
        }];

        match self.policy {
            LoadFailurePolicy::CountAsLoaded => events.extend(self.item_end(url)),
            LoadFailurePolicy::Block => events.push(LoadEvent::Progress {
                url: url.to_string(),
                items_loaded: self.progress.items_loaded,
                items_total: self.progress.items_total,
            }),
        }

        events
    }
}
