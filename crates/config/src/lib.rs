// Configuration loading

pub mod settings;

pub use settings::{
    required, CatalogSettings, ConfigError, ExpertSettings, ResearchSettings, SearchSettings, Settings,
    StoreSettings, ThumbnailSettings, CATALOG_URL_ENV, CONFIG_ENV, RESEARCH_URL_ENV, SEARCH_URL_ENV, STORE_ENV,
};
