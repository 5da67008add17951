use std::time::Duration;

/// Configuration for the fetch relay
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Mirror root; archives are fetched from `<mirror_base>/d/<id>`.
    pub mirror_base: String,
    /// Media type placed in the data URI handed to the save action.
    pub archive_mime: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mirror_base: "https://osu.direct".to_string(),
            archive_mime: "application/x-osu-archive".to_string(),
        }
    }
}

/// Configuration for the in-page agent: timings and host page selectors.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub poll_interval: Duration,
    pub complete_close_delay: Duration,
    pub failed_close_delay: Duration,
    pub container_selector: String,
    pub artist_selector: String,
    pub title_selector: String,
    pub button_id: String,
    pub toast_id: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            complete_close_delay: Duration::from_millis(2500),
            failed_close_delay: Duration::from_millis(4000),
            container_selector: ".beatmapset-header__buttons".to_string(),
            artist_selector:
                ".beatmapset-header__details-text.beatmapset-header__details-text--artist a"
                    .to_string(),
            title_selector:
                ".beatmapset-header__details-text.beatmapset-header__details-text--title a"
                    .to_string(),
            button_id: "osu-direct-download".to_string(),
            toast_id: "osu-direct-toast".to_string(),
        }
    }
}
