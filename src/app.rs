//! Application state management for the national sites browser
//!
//! This module contains the main application state, handling keyboard input,
//! pipeline calls and state transitions between the state prompt, the site
//! list and the nearby places view.

use crossterm::event::{KeyCode, KeyEvent};
use tracing::{info, warn};

use crate::data::{NearbyPlace, ParksClient, RegionIndex, Site, VicinityClient};

/// Application state enum representing the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Waiting on the network or the cache
    Loading,
    /// Text prompt for a state name
    RegionPrompt,
    /// Numbered list of sites in the chosen state
    SiteList,
    /// Places near the selected site
    NearbyList,
}

/// Work queued by a key press, run by the event loop between frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    /// Build the state index from the landing page
    LoadRegionIndex,
    /// Extract every site of a state; carries the listing URL
    LoadRegion(String),
    /// Look up places near the site at this index
    LoadNearby(usize),
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Text typed at the state prompt
    pub input: String,
    /// State name -> listing URL, once built
    pub region_index: Option<RegionIndex>,
    /// Name of the state whose sites are listed
    pub region_name: Option<String>,
    /// Sites of the current state, in listing order
    pub sites: Vec<Site>,
    /// Number of sites in the current state that failed to extract
    pub skipped_sites: usize,
    /// Index of currently selected site in list view
    pub selected_index: usize,
    /// Places near the selected site
    pub nearby: Vec<NearbyPlace>,
    /// One-line message shown at the bottom of the screen
    pub status: Option<String>,
    /// Work to run before the next key is read
    pub pending: Option<PendingAction>,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// State to open once the index is built (from --state)
    initial_state: Option<String>,
    /// Site directory client
    parks: ParksClient,
    /// Radius search client; `None` without credentials
    vicinity: Option<VicinityClient>,
}

impl App {
    /// Creates a new App that starts by building the state index
    ///
    /// # Arguments
    /// * `parks` - Client for the site directory
    /// * `vicinity` - Client for nearby places, if credentials are configured
    /// * `initial_state` - State to open once the index is available
    pub fn new(
        parks: ParksClient,
        vicinity: Option<VicinityClient>,
        initial_state: Option<String>,
    ) -> Self {
        Self {
            state: AppState::Loading,
            input: String::new(),
            region_index: None,
            region_name: None,
            sites: Vec::new(),
            skipped_sites: 0,
            selected_index: 0,
            nearby: Vec::new(),
            status: None,
            pending: Some(PendingAction::LoadRegionIndex),
            should_quit: false,
            show_help: false,
            initial_state,
            parks,
            vicinity,
        }
    }

    /// Returns the number of listed sites
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    /// Returns the currently selected site, if any
    pub fn selected_site(&self) -> Option<&Site> {
        self.sites.get(self.selected_index)
    }

    /// Handles keyboard input based on current state
    ///
    /// Key bindings:
    /// - `?`: Toggle help (outside the prompt)
    /// - Prompt: type a state name, `Enter` to open it, `Esc` to clear or quit
    /// - Site list: `Up`/`k`, `Down`/`j` to move, `Enter` for nearby places,
    ///   `Esc`/`b` back to the prompt, `q` to quit
    /// - Nearby list: `Esc`/`b` back to the site list, `q` to quit
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Handle help overlay - intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {}
            }
            return;
        }

        match self.state {
            AppState::Loading => {
                if key_event.code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            AppState::RegionPrompt => match key_event.code {
                KeyCode::Char(c) => {
                    self.input.push(c);
                }
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Esc => {
                    if self.input.is_empty() {
                        self.should_quit = true;
                    } else {
                        self.input.clear();
                    }
                }
                KeyCode::Enter => {
                    self.submit_region();
                }
                _ => {}
            },
            AppState::SiteList => match key_event.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                }
                KeyCode::Esc | KeyCode::Char('b') => {
                    self.back_to_prompt();
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.move_selection_up();
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.move_selection_down();
                }
                KeyCode::Enter => {
                    if self.selected_site().is_some() {
                        self.pending = Some(PendingAction::LoadNearby(self.selected_index));
                    }
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
            AppState::NearbyList => match key_event.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                }
                KeyCode::Esc | KeyCode::Char('b') => {
                    self.nearby.clear();
                    self.status = None;
                    self.state = AppState::SiteList;
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
        }
    }

    /// Resolves the typed state name and queues its listing
    fn submit_region(&mut self) {
        let name = self.input.trim().to_lowercase();
        if name == "exit" {
            self.should_quit = true;
            return;
        }
        if name.is_empty() {
            return;
        }

        let Some(index) = self.region_index.as_ref() else {
            // Index failed to build earlier; try again.
            self.pending = Some(PendingAction::LoadRegionIndex);
            return;
        };

        match index.get(&name) {
            Some(url) => {
                self.pending = Some(PendingAction::LoadRegion(url.to_string()));
                self.region_name = Some(name);
                self.status = None;
            }
            None => {
                self.status = Some(format!("Enter a proper state name (got '{}')", self.input.trim()));
                self.input.clear();
            }
        }
    }

    fn back_to_prompt(&mut self) {
        self.input.clear();
        self.sites.clear();
        self.skipped_sites = 0;
        self.selected_index = 0;
        self.region_name = None;
        self.status = None;
        self.state = AppState::RegionPrompt;
    }

    /// Runs queued work, if any
    ///
    /// Each action awaits the pipeline to completion before returning, so at most
    /// one request is in flight.
    pub async fn run_pending(&mut self) {
        let Some(action) = self.pending.take() else {
            return;
        };

        match action {
            PendingAction::LoadRegionIndex => self.load_region_index().await,
            PendingAction::LoadRegion(url) => self.load_region(&url).await,
            PendingAction::LoadNearby(index) => self.load_nearby(index).await,
        }
    }

    async fn load_region_index(&mut self) {
        self.state = AppState::Loading;
        match self.parks.build_region_index().await {
            Ok(index) => {
                info!(regions = index.len(), "state index ready");
                self.region_index = Some(index);
                self.state = AppState::RegionPrompt;
                if let Some(name) = self.initial_state.take() {
                    self.input = name;
                    self.submit_region();
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to build state index");
                self.status = Some(format!("Could not load the state list: {}", err));
                self.state = AppState::RegionPrompt;
            }
        }
    }

    async fn load_region(&mut self, url: &str) {
        self.state = AppState::Loading;
        match self.parks.sites_for_region(url).await {
            Ok(listing) => {
                self.sites = listing.sites;
                self.skipped_sites = listing.failures.len();
                self.selected_index = 0;
                self.status = match self.skipped_sites {
                    0 => None,
                    1 => Some("1 site could not be read and was skipped".to_string()),
                    n => Some(format!("{} sites could not be read and were skipped", n)),
                };
                self.state = AppState::SiteList;
            }
            Err(err) => {
                warn!(url, error = %err, "failed to load state listing");
                self.status = Some(format!("Could not load sites: {}", err));
                self.input.clear();
                self.state = AppState::RegionPrompt;
            }
        }
    }

    async fn load_nearby(&mut self, index: usize) {
        let Some(site) = self.sites.get(index).cloned() else {
            return;
        };
        let Some(vicinity) = self.vicinity.clone() else {
            self.status = Some("Set MAPQUEST_API_KEY to look up nearby places".to_string());
            return;
        };

        self.state = AppState::Loading;
        match vicinity.find_nearby(&site).await {
            Ok(results) => {
                self.nearby = results.places;
                self.status = None;
                self.state = AppState::NearbyList;
            }
            Err(err) => {
                warn!(site = %site.name, error = %err, "nearby lookup failed");
                self.status = Some(format!("Nearby lookup failed: {}", err));
                self.state = AppState::SiteList;
            }
        }
    }

    /// Moves the selection up in the list, wrapping to bottom if at top
    fn move_selection_up(&mut self) {
        let count = self.site_count();
        if count == 0 {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = count - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    /// Moves the selection down in the list, wrapping to top if at bottom
    fn move_selection_down(&mut self) {
        let count = self.site_count();
        if count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }
}
